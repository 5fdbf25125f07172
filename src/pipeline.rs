//! End-to-end verification runs.
//!
//! A run loads every credential document, then applies the rule modules,
//! then hands out a read-only [`EnrichedGraph`]:
//!
//! ```text
//! documents ──load──▶ store ══barrier══▶ inference ──▶ Arc<store>
//!                                                        ├─▶ products()
//!                                                        ├─▶ unattested_issuers()
//!                                                        └─▶ report()
//! ```
//!
//! Loading completes before inference starts. After inference the store is
//! never mutated again, so an [`EnrichedGraph`] can be cloned and queried
//! from several tasks at once.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::canonical::document_digest;
use crate::config::{LoadPolicy, VerificationConfig};
use crate::inference::{BundledRules, InferenceEngine, InferenceReport, RuleSource, RuleSourceError};
use crate::loader::{CacheStats, CachingContextResolver, ContextResolver, DocumentLoader, LoadError, StaticContextResolver};
use crate::query::{list_products, Query, QueryError};
use crate::store::{InMemoryQuadStore, QuadSource};
use crate::trust::{TrustChainResolver, TrustError};
use crate::types::{Product, Term, TrustChain, TrustedIssuers};

const PASSPORTS: &str = r#"
SELECT DISTINCT ?passport WHERE { ?passport a untp:DigitalProductPassport }"#;

/// One credential document to verify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialDocument {
    /// Where the document came from; names its graph when present.
    pub source_id: Option<String>,
    /// The JSON-LD document.
    pub document: Value,
}

impl CredentialDocument {
    /// A document without a source id.
    pub fn new(document: Value) -> Self {
        Self {
            source_id: None,
            document,
        }
    }

    /// A document with a source id.
    pub fn with_source(source_id: impl Into<String>, document: Value) -> Self {
        Self {
            source_id: Some(source_id.into()),
            document,
        }
    }
}

/// Pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The rule modules could not be fetched.
    #[error("Rule source failed: {0}")]
    RuleSource(#[from] RuleSourceError),

    /// A document failed to load under [`LoadPolicy::AbortOnFailure`].
    #[error("Document {index} failed to load: {source}")]
    Load {
        /// Position of the document in the input.
        index: usize,
        /// Underlying error.
        #[source]
        source: LoadError,
    },

    /// A query over the enriched graph failed.
    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    /// Trust resolution failed.
    #[error("Trust resolution failed: {0}")]
    Trust(#[from] TrustError),
}

/// What happened to one input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadEntry {
    /// The document's quads were added to the store.
    Loaded {
        /// Position in the input.
        index: usize,
        /// Caller-supplied source id.
        source_id: Option<String>,
        /// Named graph of the quads.
        graph: Option<Term>,
        /// Quads appended.
        quad_count: usize,
        /// Document digest.
        digest: String,
    },
    /// An identical document was already loaded in this run.
    Duplicate {
        /// Position in the input.
        index: usize,
        /// Caller-supplied source id.
        source_id: Option<String>,
        /// Document digest.
        digest: String,
    },
    /// The document could not be loaded.
    Failed {
        /// Position in the input.
        index: usize,
        /// Caller-supplied source id.
        source_id: Option<String>,
        /// Error description.
        error: String,
    },
}

impl LoadEntry {
    /// Whether the document failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-document load outcomes, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// One entry per input document.
    pub entries: Vec<LoadEntry>,
}

impl LoadReport {
    /// Documents that failed.
    pub fn failures(&self) -> impl Iterator<Item = &LoadEntry> {
        self.entries.iter().filter(|e| e.is_failed())
    }

    /// Number of documents loaded.
    pub fn loaded(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, LoadEntry::Loaded { .. }))
            .count()
    }
}

/// Trust gaps of one passport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportTrustGaps {
    /// Passport credential id.
    pub passport_id: String,
    /// Issuers lacking attestation or trust.
    pub unattested_issuers: Vec<String>,
}

/// Serializable summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Report schema version.
    pub schema_version: String,
    /// Run identifier.
    pub run_id: Uuid,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Fingerprint of the run configuration.
    pub params_hash: String,
    /// Quads in the enriched store.
    pub quad_count: usize,
    /// Document load outcomes.
    pub load: LoadReport,
    /// Rule module outcomes.
    pub inference: InferenceReport,
    /// Product listing.
    pub products: Vec<Product>,
    /// Trust gaps per passport.
    pub trust_gaps: Vec<PassportTrustGaps>,
}

/// The outcome of a run: a read-only enriched store plus its reports.
#[derive(Debug, Clone)]
pub struct EnrichedGraph {
    run_id: Uuid,
    config: Arc<VerificationConfig>,
    store: Arc<InMemoryQuadStore>,
    load_report: LoadReport,
    inference_report: InferenceReport,
}

impl EnrichedGraph {
    /// Run identifier.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The enriched store.
    pub fn store(&self) -> &Arc<InMemoryQuadStore> {
        &self.store
    }

    /// Document load outcomes.
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// Rule module outcomes.
    pub fn inference_report(&self) -> &InferenceReport {
        &self.inference_report
    }

    /// Every product described by a passport.
    pub fn products(&self) -> Result<Vec<Product>, QueryError> {
        list_products(self.store.as_ref())
    }

    /// Unattested issuers behind a passport, using the run's trusted issuers.
    pub fn unattested_issuers(&self, dpp_id: &str) -> Result<Vec<String>, TrustError> {
        self.unattested_issuers_with(dpp_id, &self.config.trusted_issuers)
    }

    /// Unattested issuers behind a passport, with an explicit trust set.
    pub fn unattested_issuers_with(&self, dpp_id: &str, trusted: &TrustedIssuers) -> Result<Vec<String>, TrustError> {
        TrustChainResolver::new(self.store.as_ref()).unattested_issuers(dpp_id, trusted)
    }

    /// Attestation path behind a credential, using the run's trusted issuers.
    pub fn trust_chain(&self, credential_id: &str) -> Result<TrustChain, TrustError> {
        TrustChainResolver::new(self.store.as_ref()).trust_chain(credential_id, &self.config.trusted_issuers)
    }

    /// Ids of every passport credential, in discovery order.
    pub fn passport_ids(&self) -> Result<Vec<String>, QueryError> {
        let rows = Query::parse(PASSPORTS)?.execute(self.store.as_ref())?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("passport")?.identifier())
            .collect())
    }

    /// Build the run report.
    pub fn report(&self) -> Result<VerificationReport, PipelineError> {
        let mut trust_gaps = Vec::new();
        for passport_id in self.passport_ids()? {
            let unattested_issuers = self.unattested_issuers(&passport_id)?;
            trust_gaps.push(PassportTrustGaps {
                passport_id,
                unattested_issuers,
            });
        }

        Ok(VerificationReport {
            schema_version: crate::REPORT_SCHEMA_VERSION.to_string(),
            run_id: self.run_id,
            generated_at: Utc::now(),
            params_hash: self.config.params_hash(),
            quad_count: self.store.len(),
            load: self.load_report.clone(),
            inference: self.inference_report.clone(),
            products: self.products()?,
            trust_gaps,
        })
    }
}

/// Runs the load, infer, enrich pipeline.
pub struct VerificationRun<S, R> {
    config: Arc<VerificationConfig>,
    rule_source: S,
    loader: DocumentLoader<CachingContextResolver<R>>,
    engine: InferenceEngine,
}

impl VerificationRun<BundledRules, StaticContextResolver> {
    /// A run using the bundled rules and contexts only.
    pub fn bundled(config: VerificationConfig) -> Self {
        Self::new(config, BundledRules, StaticContextResolver::bundled())
    }
}

impl<S: RuleSource, R: ContextResolver> VerificationRun<S, R> {
    /// Create a run. The context resolver is wrapped in a cache per
    /// `config.context_cache`.
    pub fn new(config: VerificationConfig, rule_source: S, context_resolver: R) -> Self {
        let resolver = CachingContextResolver::with_config(context_resolver, config.context_cache.clone());
        let loader = DocumentLoader::new(resolver, config.loader.clone());
        let engine = InferenceEngine::new(config.inference.clone());
        Self {
            config: Arc::new(config),
            rule_source,
            loader,
            engine,
        }
    }

    /// Get the run configuration.
    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Context cache statistics; `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.loader.resolver().cache_stats()
    }

    /// Verify a set of documents.
    pub async fn run(&self, documents: Vec<CredentialDocument>) -> Result<EnrichedGraph, PipelineError> {
        let run_id = Uuid::new_v4();
        tracing::info!(run_id = %run_id, documents = documents.len(), "Starting verification run");

        let modules = self.rule_source.modules().await?;

        let mut store = InMemoryQuadStore::new();
        let load_report = self.load_all(&mut store, &documents).await?;

        let inference_report = self.engine.run(&mut store, modules);

        tracing::info!(
            run_id = %run_id,
            loaded = load_report.loaded(),
            load_failures = load_report.failures().count(),
            module_failures = inference_report.failures().count(),
            derived = inference_report.derived_total(),
            quads = store.num_quads(),
            "Verification run complete"
        );

        Ok(EnrichedGraph {
            run_id,
            config: Arc::clone(&self.config),
            store: Arc::new(store),
            load_report,
            inference_report,
        })
    }

    async fn load_all(
        &self,
        store: &mut InMemoryQuadStore,
        documents: &[CredentialDocument],
    ) -> Result<LoadReport, PipelineError> {
        let mut report = LoadReport::default();
        let mut loaded_digests = BTreeSet::new();

        for (index, doc) in documents.iter().enumerate() {
            let source_id = doc.source_id.clone();
            let digest = document_digest(&doc.document);
            if loaded_digests.contains(&digest) {
                tracing::warn!(index, source = source_id.as_deref().unwrap_or("-"), digest = %digest, "Skipping duplicate document");
                report.entries.push(LoadEntry::Duplicate {
                    index,
                    source_id,
                    digest,
                });
                continue;
            }

            match self.loader.load(store, &doc.document, doc.source_id.as_deref()).await {
                Ok(outcome) => {
                    loaded_digests.insert(outcome.digest.clone());
                    report.entries.push(LoadEntry::Loaded {
                        index,
                        source_id,
                        graph: outcome.graph,
                        quad_count: outcome.quad_count,
                        digest: outcome.digest,
                    });
                }
                Err(e) => {
                    if self.config.load_policy == LoadPolicy::AbortOnFailure {
                        return Err(PipelineError::Load { index, source: e });
                    }
                    tracing::warn!(index, source = source_id.as_deref().unwrap_or("-"), error = %e, "Document failed to load, skipping");
                    report.entries.push(LoadEntry::Failed {
                        index,
                        source_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::StaticRuleSource;
    use serde_json::json;

    fn document(id: &str) -> Value {
        json!({
            "@context": { "@vocab": "https://example.org/" },
            "@id": id,
            "name": "Widget"
        })
    }

    fn run(config: VerificationConfig) -> VerificationRun<StaticRuleSource, StaticContextResolver> {
        VerificationRun::new(config, StaticRuleSource::default(), StaticContextResolver::new())
    }

    #[tokio::test]
    async fn test_duplicates_are_skipped() {
        let graph = run(VerificationConfig::default())
            .run(vec![
                CredentialDocument::new(document("urn:doc:1")),
                CredentialDocument::with_source("copy", document("urn:doc:1")),
            ])
            .await
            .unwrap();

        let entries = &graph.load_report().entries;
        assert!(matches!(entries[0], LoadEntry::Loaded { quad_count: 1, .. }));
        assert!(matches!(entries[1], LoadEntry::Duplicate { index: 1, .. }));
        assert_eq!(graph.store().num_quads(), 1);
    }

    #[tokio::test]
    async fn test_failed_documents_are_skipped_by_default() {
        let graph = run(VerificationConfig::default())
            .run(vec![
                CredentialDocument::new(json!({ "id": "urn:no-context" })),
                CredentialDocument::new(document("urn:doc:2")),
            ])
            .await
            .unwrap();

        assert_eq!(graph.load_report().failures().count(), 1);
        assert_eq!(graph.load_report().loaded(), 1);
    }

    #[tokio::test]
    async fn test_abort_on_failure() {
        let config = VerificationConfig::default().with_load_policy(LoadPolicy::AbortOnFailure);
        let result = run(config)
            .run(vec![
                CredentialDocument::new(document("urn:doc:3")),
                CredentialDocument::new(json!({ "@context": "https://missing.example/ctx" })),
            ])
            .await;

        assert!(matches!(result, Err(PipelineError::Load { index: 1, .. })));
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let graph = run(VerificationConfig::default())
            .run(vec![CredentialDocument::new(document("urn:doc:4"))])
            .await
            .unwrap();
        let report = graph.report().unwrap();

        assert_eq!(report.run_id, graph.run_id());
        assert!(report.products.is_empty());
        assert!(report.trust_gaps.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["load"]["entries"][0]["status"], "loaded");
        assert_eq!(json["params_hash"], VerificationConfig::default().params_hash());
    }

    #[tokio::test]
    async fn test_enriched_graph_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>(_: &T) {}

        let graph = run(VerificationConfig::default()).run(Vec::new()).await.unwrap();
        assert_send_sync(&graph);

        let shared = graph.clone();
        let handle = tokio::spawn(async move { shared.products().map(|p| p.len()) });
        assert_eq!(handle.await.unwrap().unwrap(), 0);
    }
}
