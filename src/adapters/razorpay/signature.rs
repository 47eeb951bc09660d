//! Razorpay checkout callback signatures.

use secrecy::SecretString;

use crate::adapters::signing::{hmac_sha256_hex, verify_hex};

/// The string Razorpay signs for a checkout callback.
fn payload(order_id: &str, payment_id: &str) -> String {
    format!("{}|{}", order_id, payment_id)
}

/// Hex signature for `(order_id, payment_id)` under `secret`.
pub fn sign(secret: &SecretString, order_id: &str, payment_id: &str) -> String {
    hmac_sha256_hex(secret, payload(order_id, payment_id).as_bytes())
}

/// Constant-time check of a callback signature.
pub fn verify(secret: &SecretString, order_id: &str, payment_id: &str, signature: &str) -> bool {
    verify_hex(secret, payload(order_id, payment_id).as_bytes(), signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_stable_hex_over_both_ids() {
        let secret = SecretString::new("s".to_string());
        let sig = sign(&secret, "order_1", "pay_1");
        assert_eq!(sig, sign(&secret, "order_1", "pay_1"));
        assert_eq!(sig.len(), 64);
        assert!(verify(&secret, "order_1", "pay_1", &sig));
        assert!(!verify(&secret, "order_1pay_1", "", &sig));
        assert_ne!(sig, sign(&secret, "order_2", "pay_1"));
    }
}
