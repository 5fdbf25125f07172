//! Shared credential fixtures for integration tests.
//!
//! One manufacturer issues a passport for a battery; a certifier issues a
//! conformity credential assessing it; a registry anchors the certifier's
//! identity.

#![allow(dead_code)]

use serde_json::{json, Value};
use untp_trust_graph::loader::bundled::CREDENTIALS_V2_URL;
use untp_trust_graph::vocab::UNTP_NS;
use untp_trust_graph::CredentialDocument;

pub const DPP_ID: &str = "https://manufacturer.example/credentials/dpp-1";
pub const DCC_ID: &str = "https://certifier.example/credentials/dcc-1";
pub const DIA_ID: &str = "https://registry.example/credentials/dia-1";

pub const MANUFACTURER: &str = "did:web:manufacturer.example";
pub const CERTIFIER: &str = "did:web:certifier.example";
pub const CERTIFIER_NAME: &str = "Acme Certification";
pub const REGISTRY: &str = "did:web:registry.example";

pub const PRODUCT_ID: &str = "https://manufacturer.example/products/battery-1";
pub const CLAIM_ID: &str = "https://manufacturer.example/claims/emissions";
pub const SIMPLE_CLAIM_ID: &str = "https://manufacturer.example/claims/recycling";
pub const CRITERION_ID: &str = "https://standards.example/criteria/carbon-intensity";

pub const SIMPLE_TOPIC: &str = "environment.recycling";

/// Install a test subscriber once; `RUST_LOG` controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn context() -> Value {
    json!([CREDENTIALS_V2_URL, { "@vocab": UNTP_NS }])
}

/// Passport with one claim citing one criterion.
pub fn dpp() -> Value {
    json!({
        "@context": context(),
        "id": DPP_ID,
        "type": ["VerifiableCredential", "DigitalProductPassport"],
        "issuer": { "id": MANUFACTURER, "name": "Battery Works" },
        "credentialSubject": {
            "type": "ProductPassport",
            "product": { "id": PRODUCT_ID, "name": "EV Battery" },
            "conformityClaim": [{
                "id": CLAIM_ID,
                "conformityTopic": "environment.emissions",
                "referenceCriteria": [{ "id": CRITERION_ID, "name": "Carbon intensity" }]
            }]
        }
    })
}

/// Passport with a single simple claim (no criteria).
pub fn dpp_simple_claim() -> Value {
    json!({
        "@context": context(),
        "id": DPP_ID,
        "type": ["VerifiableCredential", "DigitalProductPassport"],
        "issuer": { "id": MANUFACTURER, "name": "Battery Works" },
        "credentialSubject": {
            "product": { "id": PRODUCT_ID, "name": "EV Battery" },
            "conformityClaim": [{
                "id": SIMPLE_CLAIM_ID,
                "conformityTopic": SIMPLE_TOPIC
            }]
        }
    })
}

/// Conformity credential assessing the product against the criterion.
pub fn dcc() -> Value {
    json!({
        "@context": context(),
        "id": DCC_ID,
        "type": ["VerifiableCredential", "DigitalConformityCredential"],
        "issuer": { "id": CERTIFIER, "name": CERTIFIER_NAME },
        "credentialSubject": {
            "type": "ConformityAttestation",
            "assessment": [{
                "assessedProduct": { "id": PRODUCT_ID },
                "referenceCriteria": { "id": CRITERION_ID },
                "conformance": true
            }]
        }
    })
}

/// Conformity credential assessing the product on the simple claim's topic.
pub fn dcc_topic() -> Value {
    json!({
        "@context": context(),
        "id": DCC_ID,
        "type": ["VerifiableCredential", "DigitalConformityCredential"],
        "issuer": { "id": CERTIFIER, "name": CERTIFIER_NAME },
        "credentialSubject": {
            "assessment": [{
                "assessedProduct": { "id": PRODUCT_ID },
                "conformityTopic": SIMPLE_TOPIC,
                "conformance": true
            }]
        }
    })
}

/// Identity anchor issued by the registry for the certifier.
pub fn dia() -> Value {
    json!({
        "@context": context(),
        "id": DIA_ID,
        "type": ["VerifiableCredential", "DigitalIdentityAnchor"],
        "issuer": { "id": REGISTRY, "name": "National Business Register" },
        "credentialSubject": { "id": CERTIFIER, "name": CERTIFIER_NAME }
    })
}

pub fn documents(values: Vec<Value>) -> Vec<CredentialDocument> {
    values.into_iter().map(CredentialDocument::new).collect()
}
