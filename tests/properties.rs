//! Property tests for trust gap resolution.
//!
//! Random attestation graphs over a fixed pool of credentials, each with its
//! own issuer, check default-deny, trust short-circuiting, and termination
//! on cyclic attestation.

use proptest::prelude::*;
use untp_trust_graph::vocab::{CRED_ISSUER, INF_CLAIMS_ATTESTED_BY, INF_ISSUER_IDENTITY_ATTESTED_BY};
use untp_trust_graph::{
    unattested_issuers, InMemoryQuadStore, Quad, QuadStore, Term, TrustChainResolver, TrustedIssuers,
};

const POOL: usize = 8;

fn credential(i: usize) -> String {
    format!("urn:credential:{}", i)
}

fn issuer(i: usize) -> String {
    format!("did:web:issuer-{}.example", i)
}

fn add(store: &mut InMemoryQuadStore, s: &str, p: &str, o: &str) {
    store
        .insert(Quad::triple(Term::iri(s), Term::iri(p), Term::iri(o)))
        .unwrap();
}

/// Credential 0 is the passport. `claims` are credentials attesting its
/// claims; `edges` are identity attestations `(credential, anchor)`.
fn build(claims: &[usize], edges: &[(usize, usize)]) -> InMemoryQuadStore {
    let mut store = InMemoryQuadStore::new();
    for i in 0..POOL {
        add(&mut store, &credential(i), CRED_ISSUER, &issuer(i));
    }
    for &c in claims {
        add(&mut store, &credential(0), INF_CLAIMS_ATTESTED_BY, &credential(c));
    }
    for &(from, to) in edges {
        add(&mut store, &credential(from), INF_ISSUER_IDENTITY_ATTESTED_BY, &credential(to));
    }
    store
}

fn graph_strategy() -> impl Strategy<Value = (Vec<usize>, Vec<(usize, usize)>)> {
    (
        prop::collection::vec(1..POOL, 0..4),
        prop::collection::vec((0..POOL, 0..POOL), 0..12),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A credential in the passport's universe that no edge attests always
    /// contributes its issuer when nothing is trusted.
    #[test]
    fn prop_default_deny((claims, edges) in graph_strategy()) {
        let store = build(&claims, &edges);
        let gaps = unattested_issuers(&credential(0), &store, &TrustedIssuers::new()).unwrap();

        let attested: Vec<usize> = edges.iter().map(|&(from, _)| from).collect();
        let mut universe: Vec<usize> = vec![0];
        universe.extend(claims.iter().copied());
        universe.extend(edges.iter().flat_map(|&(from, to)| [from, to]));

        for i in universe {
            let expected = !attested.contains(&i);
            prop_assert_eq!(gaps.contains(&issuer(i)), expected, "credential {}", i);
        }
    }

    /// Trusted issuers never appear, and the result has no duplicates.
    #[test]
    fn prop_trusted_issuers_are_dropped(
        (claims, edges) in graph_strategy(),
        trusted_ids in prop::collection::vec(0..POOL, 0..POOL),
    ) {
        let store = build(&claims, &edges);
        let trusted: TrustedIssuers = trusted_ids.iter().map(|&i| issuer(i)).collect();
        let gaps = unattested_issuers(&credential(0), &store, &trusted).unwrap();

        for gap in &gaps {
            prop_assert!(!trusted.contains(gap));
        }
        let mut deduped = gaps.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), gaps.len());
    }

    /// Chain walks terminate on any graph, and a trusted issuer on the start
    /// credential short-circuits with no links.
    #[test]
    fn prop_trust_chain_terminates((claims, edges) in graph_strategy(), start in 0..POOL) {
        let store = build(&claims, &edges);
        let resolver = TrustChainResolver::new(&store);

        let chain = resolver.trust_chain(&credential(start), &TrustedIssuers::new()).unwrap();
        prop_assert!(!chain.status.is_trusted());
        prop_assert!(chain.links.len() <= edges.len());

        let trusted: TrustedIssuers = [issuer(start)].into_iter().collect();
        let chain = resolver.trust_chain(&credential(start), &trusted).unwrap();
        prop_assert!(chain.status.is_trusted());
        prop_assert!(chain.links.is_empty());
    }
}
