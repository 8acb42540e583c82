//! Compact-prefix rendering of IRIs.
//!
//! Schema summaries and sample relations show IRIs as `prefix:local` so the
//! generative model sees the same notation the ontology files use. The map
//! holds the well-known RDF namespaces plus one configurable domain
//! namespace bound to the empty prefix.

/// RDF syntax namespace.
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// RDF Schema namespace.
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
/// OWL namespace.
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
/// XML Schema datatypes namespace.
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// Default domain namespace for the dining knowledge base.
pub const DEFAULT_DOMAIN_NS: &str = "http://snu.ac.kr/dining/";

/// Maps namespace IRIs to prefixes for compact rendering.
#[derive(Debug, Clone)]
pub struct PrefixMap {
    /// (prefix, namespace) pairs. The domain namespace uses the empty prefix.
    entries: Vec<(String, String)>,
}

impl PrefixMap {
    /// Build a map with the well-known namespaces plus the given domain
    /// namespace bound to `:`.
    pub fn with_domain(namespace: &str) -> Self {
        let entries = vec![
            ("rdf".to_string(), RDF_NS.to_string()),
            ("rdfs".to_string(), RDFS_NS.to_string()),
            ("owl".to_string(), OWL_NS.to_string()),
            ("xsd".to_string(), XSD_NS.to_string()),
            (String::new(), namespace.to_string()),
        ];
        Self { entries }
    }

    /// The domain namespace (the one bound to the empty prefix).
    pub fn domain(&self) -> &str {
        self.entries
            .iter()
            .find(|(p, _)| p.is_empty())
            .map(|(_, ns)| ns.as_str())
            .unwrap_or(DEFAULT_DOMAIN_NS)
    }

    /// Render an IRI as `prefix:local` using the longest matching namespace,
    /// or as `<iri>` when no namespace matches.
    pub fn compact(&self, iri: &str) -> String {
        let best = self
            .entries
            .iter()
            .filter(|(_, ns)| iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len());
        match best {
            Some((prefix, ns)) => format!("{prefix}:{}", &iri[ns.len()..]),
            None => format!("<{iri}>"),
        }
    }

    /// The `PREFIX` declaration block for prompts, one line per namespace.
    pub fn declaration_block(&self) -> String {
        self.entries
            .iter()
            .map(|(prefix, ns)| format!("PREFIX {prefix}: <{ns}>"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for PrefixMap {
    fn default() -> Self {
        Self::with_domain(DEFAULT_DOMAIN_NS)
    }
}
