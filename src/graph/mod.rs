//! In-memory RDF graph backed by oxigraph.
//!
//! The knowledge base is two Turtle files — a schema (TBox) source and an
//! instance (ABox) source — merged into one store at session start. Loading
//! is fail-soft per source: a missing or malformed file contributes zero
//! triples and is recorded in the [`LoadReport`], never raised. A store with
//! zero triples is a normal, if degenerate, outcome.

pub mod prefix;

use std::path::Path;

use oxigraph::io::RdfFormat;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use crate::error::GraphError;

pub use prefix::PrefixMap;

/// Outcome of loading one knowledge-base source file.
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    /// The source parsed in full; `triples` were merged into the store.
    Loaded { path: String, triples: usize },
    /// The source was missing or malformed; it contributed nothing.
    Failed { path: String, reason: String },
}

impl SourceOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SourceOutcome::Loaded { .. })
    }
}

/// Per-source record of one knowledge-base load.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub schema: SourceOutcome,
    pub instance: SourceOutcome,
    /// Triples in the merged store after both sources.
    pub total_triples: usize,
}

/// RDF triple store plus the prefix map used to render its IRIs.
pub struct GraphStore {
    store: Store,
    prefixes: PrefixMap,
}

impl GraphStore {
    /// Load the knowledge base: schema source first, then instance source,
    /// merged into one in-memory store.
    ///
    /// Each source is all-or-nothing and fail-soft: it is parsed into a
    /// scratch store first and merged only if the whole file parses, so a
    /// malformed source contributes zero triples instead of a partial
    /// prefix of itself. Source failures are logged and recorded in the
    /// report; only store creation itself can error.
    pub fn load(
        schema_path: &Path,
        instance_path: &Path,
        namespace: &str,
    ) -> Result<(Self, LoadReport), GraphError> {
        let store = Store::new().map_err(|e| GraphError::StoreInit {
            message: e.to_string(),
        })?;
        let graph = Self {
            store,
            prefixes: PrefixMap::with_domain(namespace),
        };

        let schema = graph.merge_source(schema_path);
        let instance = graph.merge_source(instance_path);
        let total_triples = graph.len();

        tracing::info!(
            triples = total_triples,
            schema_ok = schema.is_loaded(),
            instance_ok = instance.is_loaded(),
            "knowledge base loaded"
        );

        let report = LoadReport {
            schema,
            instance,
            total_triples,
        };
        Ok((graph, report))
    }

    /// An empty store with the default prefixes. Test seam.
    pub fn empty() -> Result<Self, GraphError> {
        let store = Store::new().map_err(|e| GraphError::StoreInit {
            message: e.to_string(),
        })?;
        Ok(Self {
            store,
            prefixes: PrefixMap::default(),
        })
    }

    /// Parse one Turtle source into a scratch store and merge it if the
    /// whole file parsed.
    fn merge_source(&self, path: &Path) -> SourceOutcome {
        let shown = path.display().to_string();
        match self.read_source(path) {
            Ok(triples) => {
                tracing::info!(path = %shown, triples, "loaded source");
                SourceOutcome::Loaded {
                    path: shown,
                    triples,
                }
            }
            Err(reason) => {
                tracing::warn!(path = %shown, %reason, "skipping source");
                SourceOutcome::Failed {
                    path: shown,
                    reason,
                }
            }
        }
    }

    fn read_source(&self, path: &Path) -> Result<usize, String> {
        let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;

        let scratch = Store::new().map_err(|e| e.to_string())?;
        scratch
            .load_from_reader(RdfFormat::Turtle, text.as_bytes())
            .map_err(|e| e.to_string())?;

        let mut merged = 0usize;
        for quad in scratch.iter() {
            let quad = quad.map_err(|e| e.to_string())?;
            self.store.insert(&quad).map_err(|e| e.to_string())?;
            merged += 1;
        }
        Ok(merged)
    }

    /// Run a SPARQL query against the store.
    pub fn query(&self, sparql: &str) -> Result<QueryResults, GraphError> {
        self.store.query(sparql).map_err(|e| GraphError::Sparql {
            message: e.to_string(),
        })
    }

    /// Number of triples in the store.
    pub fn len(&self) -> usize {
        self.store.len().unwrap_or(0)
    }

    /// Whether the store holds no triples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prefix map for rendering this store's IRIs.
    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    /// Internal store reference (for advanced oxigraph operations).
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("triples", &self.len())
            .finish()
    }
}
