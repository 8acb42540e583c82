//! Explanation synthesis: question + SPARQL → short Korean rationale.

use crate::error::{SoftResult, StageFault};
use crate::llm::TextGenerator;

/// Fixed fallback when the provider fails.
pub const EXPLANATION_FALLBACK: &str = "쿼리 해석을 생성할 수 없습니다.";

/// Build the explanation prompt: a 2–3 sentence rationale naming the
/// properties and traversal steps the query used.
pub fn build_prompt(question: &str, query: &str) -> String {
    format!(
        "You are an expert in the Semantic Web and SPARQL.\n\
         Explain WHY this SPARQL query was constructed to answer the user's question.\n\
         \n\
         # User Question\n\
         {question}\n\
         \n\
         # SPARQL Query\n\
         {query}\n\
         \n\
         # Instructions\n\
         - Explain the logic step by step.\n\
         - Mention which properties were used (e.g. filtered by name, traversed :offers).\n\
         - Speak in Korean.\n\
         - Be concise (2-3 sentences).\n"
    )
}

/// Generate the rationale, fail-soft.
pub fn synthesize_explanation(
    generator: &dyn TextGenerator,
    question: &str,
    query: &str,
) -> SoftResult<String> {
    let prompt = build_prompt(question, query);
    match generator.generate(&prompt) {
        Ok(text) => SoftResult::Clean(text.trim().to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "explanation synthesis failed");
            SoftResult::Degraded {
                value: EXPLANATION_FALLBACK.to_string(),
                fault: StageFault::ExplanationSynthesis {
                    message: e.to_string(),
                },
            }
        }
    }
}
