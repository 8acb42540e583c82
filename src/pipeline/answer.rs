//! Answer synthesis: question + normalized rows → Korean prose.
//!
//! The rows arrive already capped by the pipeline facade so the prompt
//! stays bounded. A provider failure degrades to a fixed apology string.

use crate::error::{SoftResult, StageFault};
use crate::llm::TextGenerator;

use super::execute::ResultSet;

/// Fixed fallback when the provider fails.
pub const ANSWER_FALLBACK: &str = "죄송합니다. 답변을 생성하는 중에 오류가 발생했습니다.";

/// Build the answer-generation prompt. The rows are embedded as pretty
/// JSON so names and prices survive verbatim.
pub fn build_prompt(question: &str, rows: &ResultSet) -> String {
    let data = serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are a helpful assistant for Seoul National University cafeteria info.\n\
         Answer the user's question based on the provided data.\n\
         \n\
         # Question\n\
         {question}\n\
         \n\
         # Data (SPARQL results)\n\
         {data}\n\
         \n\
         # Instructions\n\
         - Provide a polite, concise, and accurate answer.\n\
         - If the data is empty, state explicitly that no matching results were found.\n\
         - Mention specific names and prices if available.\n\
         - Answer in Korean.\n"
    )
}

/// Generate the answer, fail-soft.
pub fn synthesize_answer(
    generator: &dyn TextGenerator,
    question: &str,
    rows: &ResultSet,
) -> SoftResult<String> {
    let prompt = build_prompt(question, rows);
    match generator.generate(&prompt) {
        Ok(text) => SoftResult::Clean(text.trim().to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "answer synthesis failed");
            SoftResult::Degraded {
                value: ANSWER_FALLBACK.to_string(),
                fault: StageFault::AnswerSynthesis {
                    message: e.to_string(),
                },
            }
        }
    }
}
