//! Schema summarization: a bounded textual description of the graph.
//!
//! The summary is what the generative model sees instead of the raw
//! ontology — the declared classes, the declared properties, and at most
//! five sample relations showing how instances actually connect. It is
//! recomputed from a store snapshot and never mutated; rendering the same
//! snapshot twice yields byte-identical text.

use std::collections::BTreeSet;

use oxigraph::sparql::QueryResults;

use crate::error::{GraphError, SoftResult, StageFault};
use crate::graph::prefix::{OWL_NS, RDF_NS, RDFS_NS};
use crate::graph::GraphStore;

/// Cap on the sample-relations section.
pub const SAMPLE_RELATION_LIMIT: usize = 5;

/// Immutable snapshot of a store's schema, in compact-prefix notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSummary {
    /// Identifiers typed `owl:Class` or `rdfs:Class`, sorted.
    pub classes: BTreeSet<String>,
    /// Identifiers typed `owl:ObjectProperty` or `owl:DatatypeProperty`, sorted.
    pub properties: BTreeSet<String>,
    /// Up to [`SAMPLE_RELATION_LIMIT`] non-type, non-literal triples,
    /// each rendered `subject predicate object`.
    pub sample_relations: Vec<String>,
}

impl SchemaSummary {
    /// Render the three labeled sections as one text block. Empty sections
    /// fall back to an explicit placeholder so the prompt never contains a
    /// silently missing section.
    pub fn render(&self) -> String {
        let classes = if self.classes.is_empty() {
            "No classes found".to_string()
        } else {
            self.classes.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        let properties = if self.properties.is_empty() {
            "No properties found".to_string()
        } else {
            self.properties
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };
        let relations = if self.sample_relations.is_empty() {
            "No relations found".to_string()
        } else {
            self.sample_relations.join("\n")
        };
        format!("## Classes\n{classes}\n\n## Properties\n{properties}\n\n## Sample Relations\n{relations}\n")
    }
}

/// Derive a [`SchemaSummary`] from the store.
///
/// Any query failure is absorbed: the affected sections degrade to their
/// placeholders and the fault rides along in the `SoftResult`.
pub fn summarize(graph: &GraphStore) -> SoftResult<SchemaSummary> {
    let mut fault = None;

    let classes = match collect_typed(graph, &[format!("{OWL_NS}Class"), format!("{RDFS_NS}Class")]) {
        Ok(set) => set,
        Err(e) => {
            tracing::warn!(error = %e, "class collection failed");
            fault = Some(StageFault::SchemaSampling {
                message: e.to_string(),
            });
            BTreeSet::new()
        }
    };

    let properties = match collect_typed(
        graph,
        &[
            format!("{OWL_NS}ObjectProperty"),
            format!("{OWL_NS}DatatypeProperty"),
        ],
    ) {
        Ok(set) => set,
        Err(e) => {
            tracing::warn!(error = %e, "property collection failed");
            fault = Some(StageFault::SchemaSampling {
                message: e.to_string(),
            });
            BTreeSet::new()
        }
    };

    let sample_relations = match sample_relations(graph) {
        Ok(rels) => rels,
        Err(e) => {
            tracing::warn!(error = %e, "relation sampling failed");
            fault = Some(StageFault::SchemaSampling {
                message: e.to_string(),
            });
            Vec::new()
        }
    };

    let summary = SchemaSummary {
        classes,
        properties,
        sample_relations,
    };
    tracing::debug!(
        classes = summary.classes.len(),
        properties = summary.properties.len(),
        samples = summary.sample_relations.len(),
        "schema summarized"
    );

    match fault {
        None => SoftResult::Clean(summary),
        Some(fault) => SoftResult::Degraded {
            value: summary,
            fault,
        },
    }
}

/// Subjects typed as any of the given type IRIs, compacted and sorted.
fn collect_typed(graph: &GraphStore, type_iris: &[String]) -> Result<BTreeSet<String>, GraphError> {
    let values = type_iris
        .iter()
        .map(|iri| format!("<{iri}>"))
        .collect::<Vec<_>>()
        .join(" ");
    let sparql = format!(
        "SELECT DISTINCT ?s WHERE {{ ?s <{RDF_NS}type> ?t . VALUES ?t {{ {values} }} }}"
    );

    let mut set = BTreeSet::new();
    if let QueryResults::Solutions(solutions) = graph.query(&sparql)? {
        for solution in solutions {
            let solution = solution.map_err(|e| GraphError::Sparql {
                message: e.to_string(),
            })?;
            if let Some(oxigraph::model::Term::NamedNode(node)) = solution.get("s") {
                set.insert(graph.prefixes().compact(node.as_str()));
            }
        }
    }
    Ok(set)
}

/// Up to five triples whose predicate is not `rdf:type` and whose object is
/// not a literal, ordered for deterministic output.
fn sample_relations(graph: &GraphStore) -> Result<Vec<String>, GraphError> {
    let sparql = format!(
        "SELECT ?s ?p ?o WHERE {{ ?s ?p ?o . \
         FILTER(?p != <{RDF_NS}type>) FILTER(!isLiteral(?o)) }} \
         ORDER BY ?s ?p ?o LIMIT {SAMPLE_RELATION_LIMIT}"
    );

    let mut relations = Vec::new();
    if let QueryResults::Solutions(solutions) = graph.query(&sparql)? {
        for solution in solutions {
            let solution = solution.map_err(|e| GraphError::Sparql {
                message: e.to_string(),
            })?;
            let mut parts = Vec::with_capacity(3);
            for var in ["s", "p", "o"] {
                match solution.get(var) {
                    Some(oxigraph::model::Term::NamedNode(node)) => {
                        parts.push(graph.prefixes().compact(node.as_str()));
                    }
                    Some(term) => parts.push(term.to_string()),
                    None => {}
                }
            }
            if parts.len() == 3 {
                relations.push(parts.join(" "));
            }
        }
    }
    Ok(relations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const TBOX: &str = r#"
@prefix : <http://snu.ac.kr/dining/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
:Venue a owl:Class .
:Service a owl:Class .
:offers a owl:ObjectProperty .
:name a owl:DatatypeProperty .
"#;

    const ABOX: &str = r#"
@prefix : <http://snu.ac.kr/dining/> .
:venue301 a :Venue ; :offers :lunch301 .
:lunch301 a :Service .
"#;

    fn kb(dir: &Path) -> GraphStore {
        let tbox = dir.join("tbox.ttl");
        let abox = dir.join("abox.ttl");
        std::fs::write(&tbox, TBOX).unwrap();
        std::fs::write(&abox, ABOX).unwrap();
        GraphStore::load(&tbox, &abox, crate::graph::prefix::DEFAULT_DOMAIN_NS)
            .unwrap()
            .0
    }

    #[test]
    fn collects_classes_and_properties() {
        let dir = tempfile::TempDir::new().unwrap();
        let graph = kb(dir.path());
        let summary = summarize(&graph);
        assert!(!summary.is_degraded());

        let summary = summary.into_value();
        assert!(summary.classes.contains(":Venue"));
        assert!(summary.classes.contains(":Service"));
        assert!(summary.properties.contains(":offers"));
        assert!(summary.properties.contains(":name"));
    }

    #[test]
    fn samples_only_non_type_non_literal_relations() {
        let dir = tempfile::TempDir::new().unwrap();
        let graph = kb(dir.path());
        let summary = summarize(&graph).into_value();
        assert_eq!(summary.sample_relations, vec![":venue301 :offers :lunch301"]);
    }

    #[test]
    fn render_is_deterministic() {
        let dir = tempfile::TempDir::new().unwrap();
        let graph = kb(dir.path());
        let first = summarize(&graph).into_value().render();
        let second = summarize(&graph).into_value().render();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_store_renders_placeholders() {
        let graph = GraphStore::empty().unwrap();
        let summary = summarize(&graph);
        assert!(!summary.is_degraded());
        let text = summary.into_value().render();
        assert!(text.contains("No classes found"));
        assert!(text.contains("No properties found"));
        assert!(text.contains("No relations found"));
    }

    #[test]
    fn sample_relations_respect_cap() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut abox = String::from("@prefix : <http://snu.ac.kr/dining/> .\n");
        for i in 0..10 {
            abox.push_str(&format!(":a{i} :linksTo :b{i} .\n"));
        }
        let tbox = dir.path().join("tbox.ttl");
        let abox_path = dir.path().join("abox.ttl");
        std::fs::write(&tbox, TBOX).unwrap();
        std::fs::write(&abox_path, abox).unwrap();
        let (graph, _) =
            GraphStore::load(&tbox, &abox_path, crate::graph::prefix::DEFAULT_DOMAIN_NS).unwrap();

        let summary = summarize(&graph).into_value();
        assert_eq!(summary.sample_relations.len(), SAMPLE_RELATION_LIMIT);
    }
}
