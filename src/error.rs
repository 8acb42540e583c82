//! Rich diagnostic error types for the haksik pipeline.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know exactly what went wrong and
//! how to fix it. Soft (absorbed) failures are carried separately as
//! [`StageFault`] inside a [`SoftResult`] rather than propagated.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for haksik.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user. Only configuration-level
/// problems surface here; everything downstream of construction degrades softly.
#[derive(Debug, Error, Diagnostic)]
pub enum HaksikError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Generation(#[from] crate::llm::GenerationError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("failed to create RDF store: {message}")]
    #[diagnostic(
        code(haksik::graph::store_init),
        help("The in-memory oxigraph store could not be created. This is not \
              related to your knowledge-base files; it usually indicates \
              memory pressure.")
    )]
    StoreInit { message: String },

    #[error("SPARQL query error: {message}")]
    #[diagnostic(
        code(haksik::graph::sparql),
        help("The SPARQL query failed. Check the query syntax and ensure the \
              store is initialized.")
    )]
    Sparql { message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    #[diagnostic(
        code(haksik::config::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {message}")]
    #[diagnostic(
        code(haksik::config::toml),
        help("haksik.toml must be valid TOML with the documented keys \
              (model, timeout-secs, namespace). Fix or remove the file.")
    )]
    Toml { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Soft failures
// ---------------------------------------------------------------------------

/// A failure that a pipeline stage absorbed instead of propagating.
///
/// Every stage after construction-time credential validation is fail-soft:
/// the user always receives some answer. The fault records which stage
/// degraded and why, so callers can distinguish "empty because no data"
/// from "empty because a dependency failed".
#[derive(Debug, Clone, Error)]
pub enum StageFault {
    #[error("schema relation sampling failed: {message}")]
    SchemaSampling { message: String },

    #[error("SPARQL synthesis failed: {message}")]
    QuerySynthesis { message: String },

    #[error("SPARQL execution failed: {message}")]
    QueryExecution { message: String },

    #[error("answer synthesis failed: {message}")]
    AnswerSynthesis { message: String },

    #[error("explanation synthesis failed: {message}")]
    ExplanationSynthesis { message: String },
}

/// Result of a fail-soft stage: always a usable value, possibly degraded.
///
/// `Clean` carries the stage's real output. `Degraded` carries the fallback
/// value the stage substituted (an empty query, an empty result set, a fixed
/// apology string) together with the absorbed [`StageFault`].
#[derive(Debug, Clone)]
pub enum SoftResult<T> {
    Clean(T),
    Degraded { value: T, fault: StageFault },
}

impl<T> SoftResult<T> {
    /// The stage's output, degraded or not.
    pub fn value(&self) -> &T {
        match self {
            SoftResult::Clean(v) => v,
            SoftResult::Degraded { value, .. } => value,
        }
    }

    /// Consume, keeping only the output value.
    pub fn into_value(self) -> T {
        match self {
            SoftResult::Clean(v) => v,
            SoftResult::Degraded { value, .. } => value,
        }
    }

    /// The absorbed fault, if the stage degraded.
    pub fn fault(&self) -> Option<&StageFault> {
        match self {
            SoftResult::Clean(_) => None,
            SoftResult::Degraded { fault, .. } => Some(fault),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SoftResult::Degraded { .. })
    }
}

/// Convenience alias for functions returning haksik results.
pub type HaksikResult<T> = std::result::Result<T, HaksikError>;
