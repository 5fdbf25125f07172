//! JSON-LD credential loading.
//!
//! Converts one JSON-LD document into quads and appends them to a store,
//! labelled with a named graph for the document's source:
//!
//! ```text
//! document ──▶ resolve remote contexts ──▶ inline ──▶ sophia_jsonld ──▶ quads ──▶ QuadStore
//!                   (ContextResolver)                    (to RDF)
//! ```
//!
//! Context resolution is the only I/O. Conversion of one document is all or
//! nothing: a document that fails leaves the store untouched.

pub mod bundled;
pub mod context;
mod expand;
pub mod resolver;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::{canonical_hash_hex, document_digest};
use crate::config::LoaderConfig;
use crate::store::QuadStore;
use crate::types::{Quad, Term};
use crate::vocab::{SOURCE_GRAPH_PREFIX, UNNAMED_GRAPH};

pub use context::{is_absolute_iri, ResolvedContexts};
pub use resolver::{CacheStats, CachingContextResolver, ContextError, ContextResolver, StaticContextResolver};

/// Length of the digest prefix used in blank node labels.
const BLANK_PREFIX_LEN: usize = 12;

/// Errors from loading a document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Top-level value is not a JSON object.
    #[error("Document is not a JSON object")]
    NotAnObject,

    /// Document carries no `@context`.
    #[error("Document has no @context")]
    MissingContext,

    /// A context could not be resolved.
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// A context is malformed.
    #[error("Invalid context: {0}")]
    InvalidContext(String),

    /// JSON-LD processing rejected the document.
    #[error("JSON-LD error: {0}")]
    JsonLd(String),

    /// The store rejected the quads.
    #[error("Store error: {0}")]
    StoreError(String),
}

impl LoadError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreError(e.to_string())
    }
}

/// A document converted to quads, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedDocument {
    /// Named graph the quads are labelled with.
    pub graph: Option<Term>,
    /// The quads, in emission order.
    pub quads: Vec<Quad>,
    /// SHA-256 digest of the document's canonical JSON.
    pub digest: String,
}

/// Result of loading one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOutcome {
    /// Named graph the quads were stored in.
    pub graph: Option<Term>,
    /// Number of quads appended.
    pub quad_count: usize,
    /// SHA-256 digest of the document's canonical JSON.
    pub digest: String,
}

/// Loads JSON-LD documents into a quad store.
pub struct DocumentLoader<R> {
    resolver: R,
    config: LoaderConfig,
}

impl<R: ContextResolver> DocumentLoader<R> {
    /// Create a loader over a context resolver.
    pub fn new(resolver: R, config: LoaderConfig) -> Self {
        Self { resolver, config }
    }

    /// Get the loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Get the context resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Convert a document to quads without storing them.
    pub async fn expand(&self, document: &Value, source_id: Option<&str>) -> Result<ExpandedDocument, LoadError> {
        let object = document.as_object().ok_or(LoadError::NotAnObject)?;
        if !object.contains_key("@context") {
            return Err(LoadError::MissingContext);
        }

        let digest = document_digest(document);
        let contexts =
            ResolvedContexts::resolve(&self.resolver, document, self.config.max_context_depth).await?;
        let inlined = contexts.inline(document)?;
        let graph = if self.config.label_graphs {
            Some(graph_label(source_id, document))
        } else {
            None
        };

        let quads = expand::to_quads(&inlined, graph.as_ref(), &digest[..BLANK_PREFIX_LEN])?;

        Ok(ExpandedDocument { graph, quads, digest })
    }

    /// Convert a document and append its quads to `store`.
    pub async fn load<S: QuadStore>(
        &self,
        store: &mut S,
        document: &Value,
        source_id: Option<&str>,
    ) -> Result<LoadOutcome, LoadError> {
        let expanded = self.expand(document, source_id).await?;
        let quad_count = store
            .extend_quads(expanded.quads)
            .map_err(LoadError::from_store)?;

        tracing::debug!(
            source = source_id.unwrap_or("-"),
            graph = ?expanded.graph.as_ref().map(Term::value),
            quad_count,
            "Loaded document"
        );

        Ok(LoadOutcome {
            graph: expanded.graph,
            quad_count,
            digest: expanded.digest,
        })
    }
}

/// Choose the named graph for a document.
///
/// An IRI source id names the graph directly; any other source id is hashed
/// into a `urn:untp:source:` IRI. Without a source id the document's own
/// `id` is used, falling back to a fixed graph for anonymous documents.
pub fn graph_label(source_id: Option<&str>, document: &Value) -> Term {
    if let Some(source) = source_id {
        if is_absolute_iri(source) {
            return Term::iri(source);
        }
        return Term::iri(format!("{}{}", SOURCE_GRAPH_PREFIX, canonical_hash_hex(&source)));
    }

    let own_id = document
        .get("id")
        .or_else(|| document.get("@id"))
        .and_then(Value::as_str)
        .filter(|id| is_absolute_iri(id));

    match own_id {
        Some(id) => Term::iri(id),
        None => Term::iri(UNNAMED_GRAPH),
    }
}
