//! Checksums for commit-log framing and content fingerprints
//!
//! - CRC32 (IEEE) guards every commit-log line
//! - SHA-256 fingerprints uploaded content for the version ledger

use crc32fast::Hasher;
use sha2::{Digest, Sha256};

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Returns `true` if `data` hashes to `expected`.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}

/// Hex SHA-256 of uploaded content.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
