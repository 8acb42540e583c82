//! Query execution and row normalization.
//!
//! The query text arrives from an unverified model, so this stage never
//! propagates: any parse or engine failure degrades to an empty result set.
//! SELECT rows are normalized to plain string maps keyed by projection
//! variable; unbound variables are omitted rather than present as empty.
//! ASK results become a single `{"result": "true"|"false"}` row so yes/no
//! questions still flow into the answer stage; CONSTRUCT and DESCRIBE have
//! no row shape honoring the projection-key contract and are rejected.

use std::collections::BTreeMap;

use oxigraph::model::Term;
use oxigraph::sparql::QueryResults;

use crate::error::{GraphError, SoftResult, StageFault};
use crate::graph::GraphStore;

/// One normalized result row: variable name → string value.
pub type ResultRow = BTreeMap<String, String>;

/// Ordered sequence of normalized rows.
pub type ResultSet = Vec<ResultRow>;

/// Execute SPARQL text against the store, fail-soft.
pub fn execute(graph: &GraphStore, query: &str) -> SoftResult<ResultSet> {
    match run(graph, query) {
        Ok(rows) => {
            tracing::debug!(rows = rows.len(), "query executed");
            SoftResult::Clean(rows)
        }
        Err(e) => {
            tracing::warn!(error = %e, "query execution failed");
            SoftResult::Degraded {
                value: Vec::new(),
                fault: StageFault::QueryExecution {
                    message: e.to_string(),
                },
            }
        }
    }
}

fn run(graph: &GraphStore, query: &str) -> Result<ResultSet, GraphError> {
    match graph.query(query)? {
        QueryResults::Solutions(solutions) => {
            let variables = solutions.variables().to_vec();
            let mut rows = Vec::new();
            for solution in solutions {
                let solution = solution.map_err(|e| GraphError::Sparql {
                    message: e.to_string(),
                })?;
                let mut row = ResultRow::new();
                for var in &variables {
                    if let Some(term) = solution.get(var.as_str()) {
                        row.insert(var.as_str().to_string(), term_to_string(term));
                    }
                }
                rows.push(row);
            }
            Ok(rows)
        }
        QueryResults::Boolean(b) => {
            let mut row = ResultRow::new();
            row.insert("result".to_string(), b.to_string());
            Ok(vec![row])
        }
        QueryResults::Graph(_) => Err(GraphError::Sparql {
            message: "CONSTRUCT/DESCRIBE queries are not supported".into(),
        }),
    }
}

/// Coerce a term to its plain string form: IRI text for named nodes,
/// lexical form for literals, id for blank nodes.
fn term_to_string(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        Term::BlankNode(node) => node.as_str().to_string(),
        Term::Literal(literal) => literal.value().to_string(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}
