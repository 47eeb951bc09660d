//! HMAC-SHA256 helpers shared by the gateway and storage adapters.
//!
//! # Security
//!
//! - Digests are compared in constant time via `subtle`
//! - Keys never leave `SecretString` except at the MAC boundary

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Raw HMAC-SHA256 digest of `message` under `key`.
///
/// HMAC accepts keys of any length, so the error arm is unreachable in
/// practice; it yields an empty digest that never verifies.
pub(crate) fn hmac_sha256(key: &SecretString, message: &[u8]) -> Vec<u8> {
    match HmacSha256::new_from_slice(key.expose_secret().as_bytes()) {
        Ok(mut mac) => {
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}

/// Lowercase hex HMAC-SHA256 digest.
pub(crate) fn hmac_sha256_hex(key: &SecretString, message: &[u8]) -> String {
    hex_encode(&hmac_sha256(key, message))
}

/// Checks a hex-encoded digest against the expected one in constant time.
///
/// Malformed hex is a mismatch, not an error.
pub(crate) fn verify_hex(key: &SecretString, message: &[u8], provided_hex: &str) -> bool {
    let Some(provided) = hex_decode(provided_hex) else {
        return false;
    };
    let expected = hmac_sha256(key, message);
    if expected.is_empty() {
        return false;
    }
    expected.as_slice().ct_eq(provided.as_slice()).unwrap_u8() == 1
}

/// Decode a hex string to bytes.
pub(crate) fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.is_empty() || !hex.is_ascii() || hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes as lowercase hex.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
