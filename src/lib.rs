//! # untp-trust-graph
//!
//! Trust-chain verification for UNTP verifiable credentials.
//!
//! The trust graph answers one question:
//!
//! > Given a product passport, which issuers behind its evidence are **not**
//! > backed by an identity attestation or an explicit trust anchor?
//!
//! ## Core Contract
//!
//! 1. Convert JSON-LD credentials into one graph of quads, each document in
//!    its own named graph
//! 2. Derive facts with rule modules applied once each, in name order
//! 3. List products with their claims and criteria, and report the
//!    unattested issuers behind each passport
//!
//! ## Architecture
//!
//! ```text
//! Credentials → DocumentLoader → QuadStore → InferenceEngine → EnrichedGraph
//!                    ↓                              ↓              ├→ list_products
//!              ContextResolver                 RuleSource          └→ unattested_issuers
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same document → identical quads, including blank node labels
//! - Rule modules run in ascending name order, each exactly once
//! - Re-running inference on an enriched store derives nothing new
//! - Results keep discovery order; trust gaps list each issuer once

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod vocab;
pub mod canonical;
pub mod config;
pub mod store;
pub mod pattern;
pub mod syntax;
pub mod loader;
pub mod inference;
pub mod query;
pub mod trust;
pub mod pipeline;

// Re-exports
pub use types::{Term, Literal, Quad, Product, Claim, Criterion, Verifier};
pub use types::{AttestationEdge, TrustedIssuers, TrustChain, ChainStatus};
pub use config::{
    VerificationConfig, LoaderConfig, InferenceConfig, CacheConfig, LoadPolicy, ConfigError,
};
pub use store::{QuadSource, QuadStore, InMemoryQuadStore, InMemoryError};
pub use loader::{
    DocumentLoader, LoadError, LoadOutcome, ContextResolver, ContextError,
    StaticContextResolver, CachingContextResolver, CacheStats,
};
pub use inference::{
    InferenceEngine, InferenceError, InferenceReport, ModuleOutcome,
    RuleSource, RuleSourceError, RuleModuleSource, StaticRuleSource, DirectoryRuleSource, BundledRules,
};
pub use query::{Query, QueryError, list_products, resolve_verifiers};
pub use trust::{unattested_issuers, TrustChainResolver, TrustError};
pub use pipeline::{
    VerificationRun, EnrichedGraph, CredentialDocument, VerificationReport,
    LoadReport, LoadEntry, PassportTrustGaps, PipelineError,
};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex, document_digest};

/// Schema version of serialized reports.
/// Increment on breaking changes to any report type.
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";
