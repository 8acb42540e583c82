//! The four-stage question-answering pipeline.
//!
//! Per question, strictly linear: synthesize SPARQL from the question and
//! the schema summary, execute it, then synthesize an answer and a
//! rationale. The store and summary are loaded once per session and shared
//! read-only; every per-question artifact lives in one [`Exchange`] and is
//! discarded by the caller.
//!
//! Everything downstream of construction is fail-soft: each stage returns a
//! [`SoftResult`] so callers can tell an empty result from a degraded one,
//! and the user always gets some answer.

pub mod answer;
pub mod execute;
pub mod explain;
pub mod synthesize;

use std::path::{Path, PathBuf};

use crate::config::{ABOX_REL_PATH, TBOX_REL_PATH};
use crate::error::{HaksikResult, SoftResult};
use crate::graph::{GraphStore, LoadReport};
use crate::llm::TextGenerator;
use crate::schema::{self, SchemaSummary};

pub use execute::{ResultRow, ResultSet};

/// Maximum rows forwarded to the answer prompt.
pub const ANSWER_ROW_CAP: usize = 5;

/// Paths of the two knowledge-base sources.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    pub tbox: PathBuf,
    pub abox: PathBuf,
}

impl KnowledgeBase {
    /// The fixed layout under a knowledge-base root.
    pub fn at_root(root: &Path) -> Self {
        Self {
            tbox: root.join(TBOX_REL_PATH),
            abox: root.join(ABOX_REL_PATH),
        }
    }
}

/// Every artifact of one pipeline run, with degradation markers.
#[derive(Debug)]
pub struct Exchange {
    pub question: String,
    /// The generated SPARQL; empty when synthesis degraded.
    pub query: SoftResult<String>,
    /// Normalized result rows; empty on execution failure or no matches.
    pub rows: SoftResult<ResultSet>,
    /// The natural-language answer, or the fixed apology on failure.
    pub answer: SoftResult<String>,
    /// The short rationale, or its fixed fallback on failure.
    pub explanation: SoftResult<String>,
}

/// Load the knowledge base and derive its schema summary.
///
/// Source-level failures are absorbed into the [`LoadReport`] and the
/// summary's degradation marker; only store creation can error.
pub fn load_knowledge_base(
    kb: &KnowledgeBase,
    namespace: &str,
) -> HaksikResult<(GraphStore, SoftResult<SchemaSummary>, LoadReport)> {
    let (store, report) = GraphStore::load(&kb.tbox, &kb.abox, namespace)?;
    let summary = schema::summarize(&store);
    Ok((store, summary, report))
}

/// Session facade owning the loaded store, its summary, and the generator.
pub struct Pipeline {
    store: GraphStore,
    summary: SchemaSummary,
    generator: Box<dyn TextGenerator>,
}

impl Pipeline {
    pub fn new(store: GraphStore, summary: SchemaSummary, generator: Box<dyn TextGenerator>) -> Self {
        Self {
            store,
            summary,
            generator,
        }
    }

    /// Run all four stages for one question.
    ///
    /// Answer and explanation are attempted unconditionally, even when an
    /// earlier stage degraded; their markers let the caller caption each
    /// section honestly.
    pub fn answer(&self, question: &str) -> Exchange {
        tracing::info!(question, "pipeline run");

        let query = synthesize::synthesize(
            self.generator.as_ref(),
            question,
            &self.summary,
            self.store.prefixes(),
        );

        let rows = execute::execute(&self.store, query.value());

        let capped: ResultSet = rows
            .value()
            .iter()
            .take(ANSWER_ROW_CAP)
            .cloned()
            .collect();
        let answer = answer::synthesize_answer(self.generator.as_ref(), question, &capped);

        let explanation =
            explain::synthesize_explanation(self.generator.as_ref(), question, query.value());

        Exchange {
            question: question.to_string(),
            query,
            rows,
            answer,
            explanation,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn summary(&self) -> &SchemaSummary {
        &self.summary
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("triples", &self.store.len())
            .field("classes", &self.summary.classes.len())
            .finish()
    }
}
