//! Cryptographic Utilities

use rand::{RngCore, rngs::OsRng};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Lowercase hex encoding
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Random token of `byte_len` OS-random bytes, hex encoded.
///
/// The output is `2 * byte_len` characters from `[0-9a-f]`, so it can be
/// placed in a URL path segment without escaping.
pub fn random_hex_token(byte_len: usize) -> String {
    to_hex(&random_bytes(byte_len))
}
