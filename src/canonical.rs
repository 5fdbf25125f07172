//! Canonical serialization for deterministic hashing.
//!
//! Hashes produced here label blank nodes, name graphs for non-IRI sources,
//! skolemize rule conclusions, and fingerprint configuration. They must be
//! stable for the same input across runs.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable map order: `serde_json` objects serialize with sorted keys
//!   (the `preserve_order` feature is not enabled)
//! - No HashMap allowed: Use BTreeMap for maps in hashed data

use serde::Serialize;
use sha2::{Digest, Sha256};
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// This function produces deterministic output for the same input.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// SHA-256 digest of a document's canonical JSON bytes, hex encoded.
///
/// Two documents that differ only in key order have the same digest.
pub fn document_digest(document: &serde_json::Value) -> String {
    hex::encode(Sha256::digest(to_canonical_bytes(document)))
}
