//! Trust chain resolution.
//!
//! Answers which issuers behind a passport's evidence are neither attested
//! by a Digital Identity Anchor nor explicitly trusted, and explains the
//! attestation path behind a single credential.
//!
//! Both operations read the derived relations only:
//!
//! ```text
//! passport ──claimsAttestedBy──▶ conformity credential
//! credential ──issuerIdentityAttestedBy──▶ identity anchor
//! credential ──issuer──▶ issuer
//! ```
//!
//! Resolution is default-deny: a credential with no incoming attestation
//! path is reported unless its issuer is trusted.

use std::collections::BTreeSet;

use crate::query::{Query, QueryError};
use crate::store::QuadSource;
use crate::types::{AttestationEdge, ChainStatus, Term, TrustChain, TrustedIssuers};

const ATTESTED_CREDENTIALS: &str = r#"
SELECT ?credential WHERE { ?passport inf:claimsAttestedBy ?credential }"#;

const ATTESTATION_EDGES: &str = r#"
SELECT ?credential ?anchor WHERE { ?credential inf:issuerIdentityAttestedBy ?anchor }"#;

const ISSUERS: &str = r#"
SELECT ?issuer WHERE { ?credential cred:issuer ?issuer }"#;

/// Trust resolution errors.
///
/// Resolution is complete-or-error: a failed lookup never yields a partial
/// answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrustError {
    /// A lookup query failed.
    #[error("Trust query failed: {0}")]
    Query(#[from] QueryError),
}

/// Issuers in a passport's evidence chain lacking identity attestation.
///
/// The universe is the passport, every credential attesting its claims, and
/// every endpoint of every identity attestation edge in the graph. Sources
/// of attestation edges are attested; the remaining credentials contribute
/// their issuers, minus the trusted ones. Working on the whole edge set
/// keeps cycles harmless.
///
/// Returns issuers in discovery order, each once.
pub fn unattested_issuers<S: QuadSource + ?Sized>(
    dpp_id: &str,
    store: &S,
    trusted: &TrustedIssuers,
) -> Result<Vec<String>, TrustError> {
    TrustChainResolver::new(store).unattested_issuers(dpp_id, trusted)
}

/// Lookup queries, parsed once per resolution.
struct Lookups {
    attested: Query,
    edges: Query,
    issuers: Query,
}

impl Lookups {
    fn parse() -> Result<Self, QueryError> {
        Ok(Self {
            attested: Query::parse(ATTESTED_CREDENTIALS)?,
            edges: Query::parse(ATTESTATION_EDGES)?,
            issuers: Query::parse(ISSUERS)?,
        })
    }
}

/// Walks attestation relations over a read-only store.
#[derive(Debug)]
pub struct TrustChainResolver<'a, S: QuadSource + ?Sized> {
    store: &'a S,
}

impl<'a, S: QuadSource + ?Sized> TrustChainResolver<'a, S> {
    /// Create a resolver over a store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// See [`unattested_issuers`].
    pub fn unattested_issuers(&self, dpp_id: &str, trusted: &TrustedIssuers) -> Result<Vec<String>, TrustError> {
        let lookups = Lookups::parse()?;
        let mut universe = OrderedSet::default();
        universe.insert(dpp_id.to_string());

        let attested_claims = lookups
            .attested
            .execute_with(self.store, &[("passport", &Term::from_identifier(dpp_id))])?;
        for row in attested_claims {
            if let Some(credential) = row.get("credential") {
                universe.insert(identifier(credential));
            }
        }

        let edges = self.attestation_edges(&lookups)?;
        let attested: BTreeSet<&str> = edges.iter().map(|e| e.credential.as_str()).collect();
        for edge in &edges {
            universe.insert(edge.credential.clone());
            universe.insert(edge.anchor.clone());
        }

        let mut gaps = OrderedSet::default();
        for credential in universe.items.iter().filter(|c| !attested.contains(c.as_str())) {
            let issuers = self.issuers(&lookups, credential)?;
            if issuers.is_empty() {
                tracing::debug!(credential = %credential, "Unattested credential has no issuer");
            }
            for issuer in issuers.into_iter().filter(|i| !trusted.contains(i)) {
                gaps.insert(issuer);
            }
        }

        tracing::info!(
            passport = %dpp_id,
            credentials = universe.items.len(),
            attested = attested.len(),
            gaps = gaps.items.len(),
            "Computed trust gaps"
        );

        Ok(gaps.items)
    }

    /// Explain the attestation path behind one credential.
    ///
    /// Depth-first over `issuerIdentityAttestedBy` edges, stopping at the
    /// first credential whose issuer is trusted. Each credential is expanded
    /// at most once, so cyclic attestation terminates.
    pub fn trust_chain(&self, credential_id: &str, trusted: &TrustedIssuers) -> Result<TrustChain, TrustError> {
        let lookups = Lookups::parse()?;
        let mut walk = Walk {
            lookups: &lookups,
            trusted,
            visited: BTreeSet::new(),
            path: Vec::new(),
            links: Vec::new(),
        };
        let status = self.walk(credential_id, &mut walk)?.unwrap_or_else(|| ChainStatus::Unanchored {
            terminal: credential_id.to_string(),
        });

        tracing::debug!(credential = %credential_id, trusted = status.is_trusted(), links = walk.links.len(), "Resolved trust chain");

        Ok(TrustChain {
            credential_id: credential_id.to_string(),
            links: walk.links,
            status,
        })
    }

    /// Returns `None` when the credential was already explored on another
    /// branch and led nowhere.
    fn walk(&self, credential: &str, walk: &mut Walk<'_>) -> Result<Option<ChainStatus>, TrustError> {
        if walk.path.iter().any(|c| c == credential) {
            return Ok(Some(ChainStatus::Cyclic {
                repeated: credential.to_string(),
            }));
        }
        if !walk.visited.insert(credential.to_string()) {
            return Ok(None);
        }

        if let Some(root) = self
            .issuers(walk.lookups, credential)?
            .into_iter()
            .find(|i| walk.trusted.contains(i))
        {
            return Ok(Some(ChainStatus::Trusted { root_issuer: root }));
        }

        let anchors = self.anchors_of(walk.lookups, credential)?;
        if anchors.is_empty() {
            return Ok(Some(ChainStatus::Unanchored {
                terminal: credential.to_string(),
            }));
        }

        walk.path.push(credential.to_string());
        let depth = walk.links.len();
        let mut fallback: Option<(ChainStatus, Vec<AttestationEdge>)> = None;

        for anchor in anchors {
            walk.links.push(AttestationEdge::new(credential, anchor.clone()));
            match self.walk(&anchor, walk)? {
                Some(status) if status.is_trusted() => {
                    walk.path.pop();
                    return Ok(Some(status));
                }
                Some(status) => {
                    if fallback.is_none() {
                        fallback = Some((status, walk.links.clone()));
                    }
                }
                None => {}
            }
            walk.links.truncate(depth);
        }
        walk.path.pop();

        Ok(match fallback {
            Some((status, links)) => {
                walk.links = links;
                Some(status)
            }
            None => Some(ChainStatus::Unanchored {
                terminal: credential.to_string(),
            }),
        })
    }

    fn attestation_edges(&self, lookups: &Lookups) -> Result<Vec<AttestationEdge>, TrustError> {
        let rows = lookups.edges.execute(self.store)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(AttestationEdge::new(
                    identifier(row.get("credential")?),
                    identifier(row.get("anchor")?),
                ))
            })
            .collect())
    }

    fn anchors_of(&self, lookups: &Lookups, credential: &str) -> Result<Vec<String>, TrustError> {
        let rows = lookups
            .edges
            .execute_with(self.store, &[("credential", &Term::from_identifier(credential))])?;
        let mut anchors = OrderedSet::default();
        for row in rows {
            if let Some(anchor) = row.get("anchor") {
                anchors.insert(identifier(anchor));
            }
        }
        Ok(anchors.items)
    }

    fn issuers(&self, lookups: &Lookups, credential: &str) -> Result<Vec<String>, TrustError> {
        let rows = lookups
            .issuers
            .execute_with(self.store, &[("credential", &Term::from_identifier(credential))])?;
        let mut issuers = OrderedSet::default();
        for row in rows {
            if let Some(issuer) = row.get("issuer") {
                issuers.insert(identifier(issuer));
            }
        }
        Ok(issuers.items)
    }
}

struct Walk<'t> {
    lookups: &'t Lookups,
    trusted: &'t TrustedIssuers,
    visited: BTreeSet<String>,
    path: Vec<String>,
    links: Vec<AttestationEdge>,
}

/// Insertion-ordered set; first occurrence wins.
#[derive(Default)]
struct OrderedSet {
    seen: BTreeSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, item: String) {
        if self.seen.insert(item.clone()) {
            self.items.push(item);
        }
    }
}

fn identifier(term: &Term) -> String {
    term.identifier().unwrap_or_else(|| term.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryQuadStore, QuadStore};
    use crate::types::Quad;
    use crate::vocab::*;

    fn add(store: &mut InMemoryQuadStore, s: &str, p: &str, o: &str) {
        store
            .insert(Quad::triple(Term::iri(s), Term::iri(p), Term::iri(o)))
            .unwrap();
    }

    fn trusted(issuers: &[&str]) -> TrustedIssuers {
        issuers.iter().copied().collect()
    }

    /// dpp (issued by manufacturer) attested by dcc (issued by certifier).
    fn evidence_store() -> InMemoryQuadStore {
        let mut store = InMemoryQuadStore::new();
        add(&mut store, "urn:dpp", CRED_ISSUER, "did:web:manufacturer");
        add(&mut store, "urn:dcc", CRED_ISSUER, "did:web:certifier");
        add(&mut store, "urn:dpp", INF_CLAIMS_ATTESTED_BY, "urn:dcc");
        store
    }

    #[test]
    fn test_default_deny() {
        let gaps = unattested_issuers("urn:dpp", &evidence_store(), &TrustedIssuers::new()).unwrap();
        assert_eq!(gaps, vec!["did:web:manufacturer", "did:web:certifier"]);
    }

    #[test]
    fn test_attested_credentials_drop_out() {
        let mut store = evidence_store();
        add(&mut store, "urn:dcc", INF_ISSUER_IDENTITY_ATTESTED_BY, "urn:dia");
        add(&mut store, "urn:dia", CRED_ISSUER, "did:web:registry");

        let gaps = unattested_issuers("urn:dpp", &store, &TrustedIssuers::new()).unwrap();
        assert_eq!(gaps, vec!["did:web:manufacturer", "did:web:registry"]);

        let gaps = unattested_issuers("urn:dpp", &store, &trusted(&["did:web:registry"])).unwrap();
        assert_eq!(gaps, vec!["did:web:manufacturer"]);
    }

    #[test]
    fn test_issuers_are_deduplicated() {
        let mut store = evidence_store();
        add(&mut store, "urn:dpp", INF_CLAIMS_ATTESTED_BY, "urn:dcc2");
        add(&mut store, "urn:dcc2", CRED_ISSUER, "did:web:certifier");

        let gaps = unattested_issuers("urn:dpp", &store, &TrustedIssuers::new()).unwrap();
        assert_eq!(gaps, vec!["did:web:manufacturer", "did:web:certifier"]);
    }

    #[test]
    fn test_cyclic_attestation_terminates() {
        let mut store = InMemoryQuadStore::new();
        add(&mut store, "urn:a", CRED_ISSUER, "did:web:a");
        add(&mut store, "urn:b", CRED_ISSUER, "did:web:b");
        add(&mut store, "urn:a", INF_ISSUER_IDENTITY_ATTESTED_BY, "urn:b");
        add(&mut store, "urn:b", INF_ISSUER_IDENTITY_ATTESTED_BY, "urn:a");

        let gaps = unattested_issuers("urn:a", &store, &TrustedIssuers::new()).unwrap();
        assert!(gaps.is_empty());

        let chain = TrustChainResolver::new(&store)
            .trust_chain("urn:a", &TrustedIssuers::new())
            .unwrap();
        assert_eq!(chain.status, ChainStatus::Cyclic { repeated: "urn:a".into() });
        assert_eq!(chain.links.len(), 2);
    }

    #[test]
    fn test_missing_passport_yields_nothing() {
        let gaps = unattested_issuers("urn:nothing", &InMemoryQuadStore::new(), &TrustedIssuers::new()).unwrap();
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_trust_chain_reaches_trusted_root() {
        let mut store = evidence_store();
        add(&mut store, "urn:dcc", INF_ISSUER_IDENTITY_ATTESTED_BY, "urn:dead-end");
        add(&mut store, "urn:dcc", INF_ISSUER_IDENTITY_ATTESTED_BY, "urn:dia");
        add(&mut store, "urn:dia", CRED_ISSUER, "did:web:registry");

        let chain = TrustChainResolver::new(&store)
            .trust_chain("urn:dcc", &trusted(&["did:web:registry"]))
            .unwrap();
        assert_eq!(
            chain.status,
            ChainStatus::Trusted {
                root_issuer: "did:web:registry".into()
            }
        );
        assert_eq!(chain.links, vec![AttestationEdge::new("urn:dcc", "urn:dia")]);
    }

    #[test]
    fn test_trust_chain_short_circuits_on_trusted_issuer() {
        let chain = TrustChainResolver::new(&evidence_store())
            .trust_chain("urn:dcc", &trusted(&["did:web:certifier"]))
            .unwrap();
        assert!(chain.status.is_trusted());
        assert!(chain.links.is_empty());
    }

    #[test]
    fn test_trust_chain_unanchored() {
        let mut store = evidence_store();
        add(&mut store, "urn:dcc", INF_ISSUER_IDENTITY_ATTESTED_BY, "urn:dia");

        let chain = TrustChainResolver::new(&store)
            .trust_chain("urn:dcc", &TrustedIssuers::new())
            .unwrap();
        assert_eq!(chain.status, ChainStatus::Unanchored { terminal: "urn:dia".into() });
        assert_eq!(chain.links, vec![AttestationEdge::new("urn:dcc", "urn:dia")]);
    }
}
