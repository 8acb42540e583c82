//! Query synthesis: natural-language question → SPARQL text.
//!
//! Prompt construction is a pure function so tests can assert its content
//! without a provider. A provider failure degrades to an empty query; the
//! executor treats that like any other unparsable query, so a failed
//! synthesis can never crash the pipeline.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{SoftResult, StageFault};
use crate::graph::PrefixMap;
use crate::llm::TextGenerator;
use crate::schema::SchemaSummary;

// ── Fence stripping ──────────────────────────────────────────────────────

static RE_FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```\w*\n").unwrap());

static RE_FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n```$").unwrap());

/// Remove a single surrounding triple-backtick block, if present, and trim.
///
/// The prompt forbids fences, but models ignore that often enough that the
/// raw output is cleaned unconditionally.
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let opened = RE_FENCE_OPEN.replace(trimmed, "");
    let closed = RE_FENCE_CLOSE.replace(&opened, "");
    closed.trim().to_string()
}

// ── Prompt ───────────────────────────────────────────────────────────────

/// Build the SPARQL-generation prompt.
///
/// Embeds the schema summary verbatim, the prefix declarations, the domain
/// traversal conventions, and the question. Exactly one output-format
/// instruction: query text only.
pub fn build_prompt(question: &str, schema_text: &str, prefixes: &PrefixMap) -> String {
    let prefix_block = prefixes.declaration_block();
    format!(
        "You are an expert in SPARQL and ontologies.\n\
         Convert the following natural language question into a SPARQL 1.1 query.\n\
         Use the provided schema information to understand the classes and properties.\n\
         \n\
         # Schema Information\n\
         {schema_text}\n\
         \n\
         # Prefixes\n\
         {prefix_block}\n\
         \n\
         # Question\n\
         {question}\n\
         \n\
         # Requirements\n\
         - Return ONLY the SPARQL query text. Do not include markdown code blocks.\n\
         - Use only the classes and properties defined in the schema if possible.\n\
         - For names (venues, menus), ALWAYS query the `:name` or `:menuName` property \
         and filter on it. Do NOT filter the subject URI.\n\
         - Example: `SELECT ?v WHERE {{ ?v a :Venue ; :name ?n . FILTER(CONTAINS(?n, \"301\")) }}`\n\
         - CRITICAL: The path from a venue to its menu is \
         `?venue :offers ?service . ?service :hasMenu ?menuItem`. Use this path; \
         never invent a direct venue-to-menu edge.\n\
         - If the question names a general area (e.g. an engineering zone), rely on \
         `:partOf` relationships or specific building names.\n"
    )
}

// ── Stage ────────────────────────────────────────────────────────────────

/// Generate a SPARQL query for the question.
///
/// A provider failure is absorbed: the result degrades to an empty query
/// string with the fault attached.
pub fn synthesize(
    generator: &dyn TextGenerator,
    question: &str,
    schema: &SchemaSummary,
    prefixes: &PrefixMap,
) -> SoftResult<String> {
    let prompt = build_prompt(question, &schema.render(), prefixes);
    match generator.generate(&prompt) {
        Ok(raw) => {
            let query = strip_code_fence(&raw);
            tracing::debug!(chars = query.len(), "SPARQL synthesized");
            SoftResult::Clean(query)
        }
        Err(e) => {
            tracing::warn!(error = %e, "SPARQL synthesis failed");
            SoftResult::Degraded {
                value: String::new(),
                fault: StageFault::QuerySynthesis {
                    message: e.to_string(),
                },
            }
        }
    }
}
