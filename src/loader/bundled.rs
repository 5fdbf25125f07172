//! Context documents shipped with the crate.
//!
//! A subset of the W3C Verifiable Credentials v2 context: the base terms and
//! the `VerifiableCredential` type-scoped terms the trust rules rely on.

use serde_json::{json, Value};

/// URL of the Verifiable Credentials v2 context.
pub const CREDENTIALS_V2_URL: &str = "https://www.w3.org/ns/credentials/v2";

/// Bundled `(url, document)` pairs.
pub fn documents() -> Vec<(&'static str, Value)> {
    vec![(CREDENTIALS_V2_URL, credentials_v2())]
}

fn credentials_v2() -> Value {
    json!({
        "@context": {
            "@protected": true,
            "id": "@id",
            "type": "@type",
            "description": "https://schema.org/description",
            "name": "https://schema.org/name",
            "VerifiableCredential": {
                "@id": "https://www.w3.org/2018/credentials#VerifiableCredential",
                "@context": {
                    "@protected": true,
                    "id": "@id",
                    "type": "@type",
                    "credentialSchema": {
                        "@id": "https://www.w3.org/2018/credentials#credentialSchema",
                        "@type": "@id"
                    },
                    "credentialStatus": {
                        "@id": "https://www.w3.org/2018/credentials#credentialStatus",
                        "@type": "@id"
                    },
                    "credentialSubject": {
                        "@id": "https://www.w3.org/2018/credentials#credentialSubject",
                        "@type": "@id"
                    },
                    "description": "https://schema.org/description",
                    "evidence": {
                        "@id": "https://www.w3.org/2018/credentials#evidence",
                        "@type": "@id"
                    },
                    "issuer": {
                        "@id": "https://www.w3.org/2018/credentials#issuer",
                        "@type": "@id"
                    },
                    "name": "https://schema.org/name",
                    "validFrom": {
                        "@id": "https://www.w3.org/2018/credentials#validFrom",
                        "@type": "http://www.w3.org/2001/XMLSchema#dateTime"
                    },
                    "validUntil": {
                        "@id": "https://www.w3.org/2018/credentials#validUntil",
                        "@type": "http://www.w3.org/2001/XMLSchema#dateTime"
                    }
                }
            },
            "VerifiablePresentation": {
                "@id": "https://www.w3.org/2018/credentials#VerifiablePresentation",
                "@context": {
                    "@protected": true,
                    "id": "@id",
                    "type": "@type",
                    "holder": {
                        "@id": "https://www.w3.org/2018/credentials#holder",
                        "@type": "@id"
                    },
                    "verifiableCredential": {
                        "@id": "https://www.w3.org/2018/credentials#verifiableCredential",
                        "@type": "@id",
                        "@container": "@graph"
                    }
                }
            }
        }
    })
}
