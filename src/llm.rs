//! Gemini client for the generative-model stages.
//!
//! The model is used **only** for:
//! - Translating a question plus schema summary into SPARQL
//! - Synthesizing a natural-language answer from query results
//! - Explaining the generated query in plain Korean
//!
//! Query execution and schema summarization are pure oxigraph and never
//! touch the network. All pipeline stages depend on the [`TextGenerator`]
//! trait, not on this client, so tests run with canned doubles.

use miette::Diagnostic;
use thiserror::Error;

/// Base URL of the Gemini REST API.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Errors from the generative-model subsystem.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerationError {
    #[error("no Gemini API key configured")]
    #[diagnostic(
        code(haksik::llm::missing_credential),
        help("Set GOOGLE_API_KEY in the environment or in a .env file in the \
              knowledge-base directory.")
    )]
    MissingCredential,

    #[error("Gemini request failed: {message}")]
    #[diagnostic(
        code(haksik::llm::request_failed),
        help("Check your network connection, the API key, and the model name.")
    )]
    RequestFailed { message: String },

    #[error("failed to parse Gemini response: {message}")]
    #[diagnostic(
        code(haksik::llm::parse_error),
        help("The provider returned an unexpected response format.")
    )]
    ParseError { message: String },
}

/// Text-in, text-out capability of a generative model.
///
/// One synchronous call per invocation; the call may fail. Production wires
/// [`GeminiClient`]; tests supply deterministic doubles.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent via the `x-goog-api-key` header.
    pub api_key: String,
    /// Model identifier, e.g. `gemini-2.0-flash`.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client, validating the credential.
    ///
    /// A missing credential is the one fatal configuration error of the
    /// pipeline; it is caught here, before any question is asked, so that
    /// per-call failures can stay fail-soft.
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::MissingCredential);
        }
        Ok(Self { config })
    }

    fn agent(&self) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .build()
    }

    /// List model identifiers that support `generateContent`.
    pub fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let url = format!("{GEMINI_API_BASE}/models");
        let resp = self
            .agent()
            .get(&url)
            .set("x-goog-api-key", &self.config.api_key)
            .call()
            .map_err(|e: ureq::Error| GenerationError::RequestFailed {
                message: e.to_string(),
            })?;

        let body = resp.into_string().map_err(|e| GenerationError::ParseError {
            message: e.to_string(),
        })?;
        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| GenerationError::ParseError {
                message: e.to_string(),
            })?;

        Ok(extract_model_names(&json))
    }

    /// The model name being used.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{GEMINI_API_BASE}/models/{}:generateContent",
            self.config.model
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        let body_str =
            serde_json::to_string(&body).map_err(|e| GenerationError::RequestFailed {
                message: format!("JSON serialize error: {e}"),
            })?;

        let resp = self
            .agent()
            .post(&url)
            .set("Content-Type", "application/json")
            .set("x-goog-api-key", &self.config.api_key)
            .send_string(&body_str)
            .map_err(|e: ureq::Error| GenerationError::RequestFailed {
                message: e.to_string(),
            })?;

        let resp_str = resp.into_string().map_err(|e| GenerationError::ParseError {
            message: e.to_string(),
        })?;
        let json: serde_json::Value =
            serde_json::from_str(&resp_str).map_err(|e| GenerationError::ParseError {
                message: e.to_string(),
            })?;

        extract_candidate_text(&json)
    }
}

/// Pull the first candidate's text out of a `generateContent` response.
fn extract_candidate_text(json: &serde_json::Value) -> Result<String, GenerationError> {
    json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| GenerationError::ParseError {
            message: "missing candidates[0].content.parts[0].text".into(),
        })
}

/// Names of models whose `supportedGenerationMethods` include `generateContent`.
fn extract_model_names(json: &serde_json::Value) -> Vec<String> {
    json["models"]
        .as_array()
        .map(|models| {
            models
                .iter()
                .filter(|m| {
                    m["supportedGenerationMethods"]
                        .as_array()
                        .is_some_and(|methods| {
                            methods.iter().any(|v| v.as_str() == Some("generateContent"))
                        })
                })
                .filter_map(|m| m["name"].as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}
