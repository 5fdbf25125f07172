//! Core types for the trust graph.

pub mod term;
pub mod quad;
pub mod product;
pub mod attestation;

pub use term::{Term, Literal};
pub use quad::Quad;
pub use product::{Product, Claim, Criterion, Verifier};
pub use attestation::{AttestationEdge, TrustedIssuers, TrustChain, ChainStatus};
