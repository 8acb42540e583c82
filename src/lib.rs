//! # haksik
//!
//! Graph-RAG assistant for campus dining: Korean natural-language questions
//! answered over an OWL ontology via SPARQL.
//!
//! ## Architecture
//!
//! - **Graph** (`graph`): in-memory oxigraph store merged from TBox/ABox
//!   Turtle sources, with compact-prefix IRI rendering
//! - **Schema summary** (`schema`): bounded textual description of classes,
//!   properties, and sample relations, fed to the model
//! - **Pipeline** (`pipeline`): question → SPARQL → normalized rows →
//!   answer + rationale, fail-soft at every stage
//! - **LLM** (`llm`): the `TextGenerator` capability and the Gemini client
//!
//! ## Library usage
//!
//! ```no_run
//! use haksik::pipeline::{self, KnowledgeBase};
//!
//! let kb = KnowledgeBase::at_root(std::path::Path::new("."));
//! let (store, summary, report) =
//!     pipeline::load_knowledge_base(&kb, "http://snu.ac.kr/dining/").unwrap();
//! println!("{} triples loaded", report.total_triples);
//! println!("{}", summary.value().render());
//! let rows = haksik::pipeline::execute::execute(
//!     &store,
//!     "SELECT ?s ?p ?o WHERE { ?s ?p ?o } LIMIT 3",
//! );
//! println!("{} rows", rows.value().len());
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod pipeline;
pub mod schema;
