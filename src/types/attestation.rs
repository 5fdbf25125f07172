//! Attestation edges and trust chains.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A derived `credential —issuerIdentityAttestedBy→ anchor` relation.
///
/// Implements `Ord` for deterministic ordering: (credential, anchor).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttestationEdge {
    /// Credential whose issuer identity is attested.
    pub credential: String,
    /// Digital Identity Anchor credential vouching for the issuer.
    pub anchor: String,
}

impl AttestationEdge {
    /// Create a new edge.
    pub fn new(credential: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            anchor: anchor.into(),
        }
    }
}

/// Caller-supplied roots of trust.
///
/// Not stored in the graph; passed at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustedIssuers(BTreeSet<String>);

impl TrustedIssuers {
    /// Create an empty set (nothing pre-trusted).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trusted issuer.
    pub fn insert(&mut self, issuer: impl Into<String>) -> bool {
        self.0.insert(issuer.into())
    }

    /// Check if an issuer is pre-trusted.
    pub fn contains(&self, issuer: &str) -> bool {
        self.0.contains(issuer)
    }

    /// Number of trusted issuers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no issuer is trusted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for TrustedIssuers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Outcome of walking a credential's attestation chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChainStatus {
    /// The chain reaches a credential whose issuer is pre-trusted.
    Trusted {
        /// The pre-trusted issuer that anchors the chain.
        root_issuer: String,
    },
    /// The chain ends at a credential with no attestation and no trusted issuer.
    Unanchored {
        /// The last credential reached.
        terminal: String,
    },
    /// The walk revisited a credential without reaching a trusted issuer.
    Cyclic {
        /// The credential that closed the cycle.
        repeated: String,
    },
}

impl ChainStatus {
    /// Whether the chain is anchored in a pre-trusted issuer.
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted { .. })
    }
}

/// The attestation path backing one credential's issuer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustChain {
    /// Credential the walk started from.
    pub credential_id: String,
    /// Attestation edges followed, in walk order.
    pub links: Vec<AttestationEdge>,
    /// How the walk ended.
    pub status: ChainStatus,
}
