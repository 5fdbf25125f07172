//! Product listing.
//!
//! Materializes every product described by a Digital Product Passport, with
//! its claims and criteria and the verification status inference derived
//! for them.

use std::collections::BTreeSet;

use super::{Query, QueryError};
use crate::pattern::Bindings;
use crate::store::QuadSource;
use crate::types::{Claim, Criterion, Product, Term, Verifier};

const PRODUCTS: &str = r#"
SELECT ?passport ?product ?name WHERE {
  ?passport a untp:DigitalProductPassport ;
      cred:credentialSubject ?subject .
  ?subject untp:product ?product .
  OPTIONAL { ?product schema:name ?name }
}"#;

const CLAIMS: &str = r#"
SELECT ?claim ?topic ?conformance WHERE {
  ?passport cred:credentialSubject ?subject .
  ?subject untp:product ?product ;
      untp:conformityClaim ?claim .
  OPTIONAL { ?claim untp:conformityTopic ?topic }
  OPTIONAL { ?claim untp:conformance ?conformance }
}"#;

const CLAIM_VERIFIED: &str = r#"
SELECT * WHERE { ?claim inf:allCriteriaVerified true }"#;

const SIMPLE_CLAIM_VERIFIED: &str = r#"
SELECT * WHERE { ?claim inf:verified true }"#;

const CRITERIA: &str = r#"
SELECT ?criterion ?name WHERE {
  ?claim untp:referenceCriteria ?criterion .
  OPTIONAL { ?criterion schema:name ?name }
}"#;

const CRITERION_VERIFIED: &str = r#"
SELECT * WHERE { ?criterion inf:verified true }"#;

const VERIFIER: &str = r#"
SELECT ?credential ?issuer ?issuerName WHERE {
  ?criterion inf:verifiedBy ?credential .
  ?credential cred:issuer ?issuer .
  OPTIONAL { ?issuer schema:name ?issuerName }
}"#;

/// Listing queries, parsed once per call.
struct ProductQueries {
    products: Query,
    claims: Query,
    claim_verified: Query,
    simple_claim_verified: Query,
    criteria: Query,
    criterion_verified: Query,
}

impl ProductQueries {
    fn parse() -> Result<Self, QueryError> {
        Ok(Self {
            products: Query::parse(PRODUCTS)?,
            claims: Query::parse(CLAIMS)?,
            claim_verified: Query::parse(CLAIM_VERIFIED)?,
            simple_claim_verified: Query::parse(SIMPLE_CLAIM_VERIFIED)?,
            criteria: Query::parse(CRITERIA)?,
            criterion_verified: Query::parse(CRITERION_VERIFIED)?,
        })
    }
}

/// List every product reachable from a passport, with claims, criteria, and
/// their verifiers.
///
/// Products without claims are still listed. Order follows discovery order
/// in the store.
pub fn list_products<S: QuadSource + ?Sized>(store: &S) -> Result<Vec<Product>, QueryError> {
    let queries = ProductQueries::parse()?;
    let mut products = Vec::new();
    let mut seen = BTreeSet::new();

    for row in queries.products.execute(store)? {
        let (passport, product) = match (row.get("passport"), row.get("product")) {
            (Some(passport), Some(product)) => (passport.clone(), product.clone()),
            _ => continue,
        };
        if !seen.insert((passport.clone(), product.clone())) {
            continue;
        }

        products.push(Product {
            id: identifier(&product),
            name: row.get("name").map(Term::value),
            passport_id: identifier(&passport),
            claims: claims(store, &queries, &passport, &product)?,
        });
    }

    resolve_verifiers(store, products)
}

fn claims<S: QuadSource + ?Sized>(
    store: &S,
    queries: &ProductQueries,
    passport: &Term,
    product: &Term,
) -> Result<Vec<Claim>, QueryError> {
    let rows = queries
        .claims
        .execute_with(store, &[("passport", passport), ("product", product)])?;

    let mut claims: Vec<Claim> = Vec::new();
    for row in rows {
        let claim = match row.get("claim") {
            Some(claim) => claim,
            None => continue,
        };
        let id = identifier(claim);
        if claims.iter().any(|c| c.id == id) {
            continue;
        }

        let criteria = criteria(store, queries, claim)?;
        let verified = if criteria.is_empty() {
            holds(store, &queries.simple_claim_verified, "claim", claim)?
        } else {
            holds(store, &queries.claim_verified, "claim", claim)?
        };

        claims.push(Claim {
            id,
            topic: row.get("topic").map(Term::value),
            conformance: row.get("conformance").map(Term::value),
            verified,
            criteria,
        });
    }
    Ok(claims)
}

fn criteria<S: QuadSource + ?Sized>(
    store: &S,
    queries: &ProductQueries,
    claim: &Term,
) -> Result<Vec<Criterion>, QueryError> {
    let rows = queries.criteria.execute_with(store, &[("claim", claim)])?;

    let mut criteria: Vec<Criterion> = Vec::new();
    for row in rows {
        let criterion = match row.get("criterion") {
            Some(criterion) => criterion,
            None => continue,
        };
        let id = identifier(criterion);
        if criteria.iter().any(|c| c.id == id) {
            continue;
        }
        criteria.push(Criterion {
            id,
            name: row.get("name").map(Term::value),
            verified: holds(store, &queries.criterion_verified, "criterion", criterion)?,
            verified_by: None,
        });
    }
    Ok(criteria)
}

/// Attach a [`Verifier`] to every verified criterion.
///
/// A criterion only counts as verified when the credential it was verified
/// by can be traced to an issuer; otherwise it is downgraded to unverified.
pub fn resolve_verifiers<S: QuadSource + ?Sized>(
    store: &S,
    mut products: Vec<Product>,
) -> Result<Vec<Product>, QueryError> {
    let query = Query::parse(VERIFIER)?;
    for product in &mut products {
        for claim in &mut product.claims {
            for criterion in claim.criteria.iter_mut().filter(|c| c.verified) {
                criterion.verified_by = verifier(store, &query, &criterion.id)?;
                if criterion.verified_by.is_none() {
                    tracing::debug!(criterion = %criterion.id, "Verified criterion has no traceable verifier");
                    criterion.verified = false;
                }
            }
        }
    }
    Ok(products)
}

fn verifier<S: QuadSource + ?Sized>(store: &S, query: &Query, criterion: &str) -> Result<Option<Verifier>, QueryError> {
    let rows = query.execute_with(store, &[("criterion", &Term::from_identifier(criterion))])?;

    Ok(rows.into_iter().find_map(|row| {
        Some(Verifier {
            credential_id: identifier(row.get("credential")?),
            issuer_id: identifier(row.get("issuer")?),
            issuer_name: row.get("issuerName").map(Term::value),
        })
    }))
}

fn holds<S: QuadSource + ?Sized>(store: &S, query: &Query, variable: &str, value: &Term) -> Result<bool, QueryError> {
    let rows: Vec<Bindings> = query.execute_with(store, &[(variable, value)])?;
    Ok(!rows.is_empty())
}

fn identifier(term: &Term) -> String {
    term.identifier().unwrap_or_else(|| term.value())
}
