//! Product listing view types.
//!
//! These are materialized by the query layer from the enriched graph and are
//! plain data: serializable, cloneable, and detached from the store.

use serde::{Deserialize, Serialize};

/// A product described by a Digital Product Passport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier (IRI or `_:label`).
    pub id: String,
    /// Display name, if the passport declares one.
    pub name: Option<String>,
    /// Identity of the passport credential that describes the product.
    pub passport_id: String,
    /// Conformity claims in discovery order.
    pub claims: Vec<Claim>,
}

impl Product {
    /// Find a claim by identifier.
    pub fn claim(&self, id: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.id == id)
    }
}

/// A conformity claim made about a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim identifier.
    pub id: String,
    /// Conformity topic.
    pub topic: Option<String>,
    /// Declared conformance level (lexical form).
    pub conformance: Option<String>,
    /// Whether the claim is backed by derived verification facts.
    pub verified: bool,
    /// Reference criteria; empty for simple claims.
    pub criteria: Vec<Criterion>,
}

impl Claim {
    /// Whether this is a simple claim (no criteria).
    pub fn is_simple(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Find a criterion by identifier.
    pub fn criterion(&self, id: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == id)
    }
}

/// A named sub-requirement of a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Criterion identifier.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Whether a derived "criterion verified" fact exists.
    pub verified: bool,
    /// The credential (and its issuer) that verified the criterion.
    pub verified_by: Option<Verifier>,
}

/// The credential and issuer that verified a criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verifier {
    /// Identity of the verifying credential.
    pub credential_id: String,
    /// Issuer identity of the verifying credential.
    pub issuer_id: String,
    /// Issuer display name.
    pub issuer_name: Option<String>,
}
