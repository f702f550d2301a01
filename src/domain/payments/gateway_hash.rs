//! PayU payment hash protocol.
//!
//! Implements the gateway's pipe-delimited SHA-512 request signing and the
//! reverse-hash authentication of inbound notifications. The reverse hash is
//! the only thing standing between a forged callback and a free ticket, so
//! verification failure is a hard stop, never a soft warning.

use rust_decimal::Decimal;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::domain::foundation::format_amount;

/// Number of empty filler fields (udf1-udf5 plus five reserved slots)
/// between the email and the salt in the canonical string.
const FILLER_FIELDS: usize = 10;

/// Computes and verifies gateway hashes from the merchant credentials.
///
/// The key and salt are environment-held secrets. They are embedded in the
/// canonical strings but never persisted to any record, and this type
/// deliberately does not implement `Debug`.
pub struct GatewayHasher {
    merchant_key: String,
    salt: String,
}

impl GatewayHasher {
    /// Creates a hasher from the merchant credentials.
    pub fn new(merchant_key: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            merchant_key: merchant_key.into(),
            salt: salt.into(),
        }
    }

    /// Hash for the outbound payment request.
    ///
    /// Canonical form: `key|txnid|amount|productinfo|firstname|email`
    /// followed by ten empty filler fields and the salt. The amount is
    /// formatted to exactly two decimal places. Returns the lowercase
    /// SHA-512 hex digest.
    pub fn generate_payment_hash(
        &self,
        txnid: &str,
        amount: Decimal,
        productinfo: &str,
        firstname: &str,
        email: &str,
    ) -> String {
        let canonical =
            self.forward_canonical(txnid, &format_amount(amount), productinfo, firstname, email);
        sha512_hex(&canonical)
    }

    /// Hash the gateway is expected to send with a notification.
    ///
    /// Canonical form: `salt|status` followed by ten empty filler fields,
    /// then `email|firstname|productinfo|amount|txnid|key`. The amount is
    /// taken verbatim as the gateway sent it, not reformatted.
    pub fn reverse_hash(
        &self,
        status: &str,
        email: &str,
        firstname: &str,
        productinfo: &str,
        amount: &str,
        txnid: &str,
    ) -> String {
        let canonical =
            self.reverse_canonical(status, email, firstname, productinfo, amount, txnid);
        sha512_hex(&canonical)
    }

    /// Authenticates an inbound notification against its reported fields.
    ///
    /// Recomputes the reverse hash and compares it to `received_hash`
    /// case-insensitively in constant time. Returns false on any mismatch,
    /// including a malformed or truncated received hash.
    pub fn verify_reverse_hash(
        &self,
        status: &str,
        email: &str,
        firstname: &str,
        productinfo: &str,
        amount: &str,
        txnid: &str,
        received_hash: &str,
    ) -> bool {
        let expected = self.reverse_hash(status, email, firstname, productinfo, amount, txnid);
        let received = received_hash.to_ascii_lowercase();
        constant_time_compare(expected.as_bytes(), received.as_bytes())
    }

    fn forward_canonical(
        &self,
        txnid: &str,
        amount: &str,
        productinfo: &str,
        firstname: &str,
        email: &str,
    ) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(7 + FILLER_FIELDS);
        parts.extend([
            self.merchant_key.as_str(),
            txnid,
            amount,
            productinfo,
            firstname,
            email,
        ]);
        parts.extend(std::iter::repeat("").take(FILLER_FIELDS));
        parts.push(self.salt.as_str());
        parts.join("|")
    }

    fn reverse_canonical(
        &self,
        status: &str,
        email: &str,
        firstname: &str,
        productinfo: &str,
        amount: &str,
        txnid: &str,
    ) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(8 + FILLER_FIELDS);
        parts.extend([self.salt.as_str(), status]);
        parts.extend(std::iter::repeat("").take(FILLER_FIELDS));
        parts.extend([email, firstname, productinfo, amount, txnid, self.merchant_key.as_str()]);
        parts.join("|")
    }
}

/// SHA-512 hex digest, lowercase.
fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

/// Constant-time comparison of two byte slices.
///
/// Prevents timing attacks that could leak information about the expected hash.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "gtKFFx";
    const TEST_SALT: &str = "eCwWELxi";

    fn hasher() -> GatewayHasher {
        GatewayHasher::new(TEST_KEY, TEST_SALT)
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // ══════════════════════════════════════════════════════════════
    // Canonical String Construction Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn forward_canonical_layout() {
        let canonical =
            hasher().forward_canonical("txn1", "330.00", "Concert", "Asha", "asha@example.com");

        let expected = [
            TEST_KEY,
            "txn1",
            "330.00",
            "Concert",
            "Asha",
            "asha@example.com",
            "", "", "", "", "", "", "", "", "", "",
            TEST_SALT,
        ]
        .join("|");

        assert_eq!(canonical, expected);
        // 17 fields joined by 16 pipes
        assert_eq!(canonical.matches('|').count(), 16);
        assert!(canonical.starts_with(TEST_KEY));
        assert!(canonical.ends_with(TEST_SALT));
    }

    #[test]
    fn reverse_canonical_layout() {
        let canonical = hasher().reverse_canonical(
            "success",
            "asha@example.com",
            "Asha",
            "Concert",
            "330.00",
            "txn1",
        );

        let expected = [
            TEST_SALT,
            "success",
            "", "", "", "", "", "", "", "", "", "",
            "asha@example.com",
            "Asha",
            "Concert",
            "330.00",
            "txn1",
            TEST_KEY,
        ]
        .join("|");

        assert_eq!(canonical, expected);
        // 18 fields joined by 17 pipes
        assert_eq!(canonical.matches('|').count(), 17);
        assert!(canonical.starts_with(TEST_SALT));
        assert!(canonical.ends_with(TEST_KEY));
    }

    // ══════════════════════════════════════════════════════════════
    // Forward Hash Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn payment_hash_is_lowercase_sha512_hex() {
        let hash =
            hasher().generate_payment_hash("txn1", dec("330.00"), "Concert", "Asha", "a@b.c");

        assert_eq!(hash.len(), 128);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn payment_hash_is_deterministic() {
        let a = hasher().generate_payment_hash("txn1", dec("330.00"), "Concert", "Asha", "a@b.c");
        let b = hasher().generate_payment_hash("txn1", dec("330.00"), "Concert", "Asha", "a@b.c");
        assert_eq!(a, b);
    }

    #[test]
    fn payment_hash_formats_amount_to_two_decimals() {
        // "330" and "330.00" are the same money, so the same canonical string.
        let padded = hasher().generate_payment_hash("txn1", dec("330"), "Concert", "Asha", "a@b.c");
        let exact =
            hasher().generate_payment_hash("txn1", dec("330.00"), "Concert", "Asha", "a@b.c");
        assert_eq!(padded, exact);
    }

    #[test]
    fn payment_hash_changes_with_any_field() {
        let base = hasher().generate_payment_hash("txn1", dec("330.00"), "Concert", "Asha", "a@b.c");

        let other_txnid =
            hasher().generate_payment_hash("txn2", dec("330.00"), "Concert", "Asha", "a@b.c");
        let other_amount =
            hasher().generate_payment_hash("txn1", dec("330.01"), "Concert", "Asha", "a@b.c");
        let other_key = GatewayHasher::new("otherkey", TEST_SALT)
            .generate_payment_hash("txn1", dec("330.00"), "Concert", "Asha", "a@b.c");

        assert_ne!(base, other_txnid);
        assert_ne!(base, other_amount);
        assert_ne!(base, other_key);
    }

    // ══════════════════════════════════════════════════════════════
    // Reverse Hash Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_accepts_matching_hash() {
        let h = hasher();
        let sent = h.reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1");

        assert!(h.verify_reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1", &sent));
    }

    #[test]
    fn verify_accepts_uppercase_received_hash() {
        let h = hasher();
        let sent = h
            .reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1")
            .to_ascii_uppercase();

        assert!(h.verify_reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1", &sent));
    }

    #[test]
    fn verify_rejects_tampered_status() {
        let h = hasher();
        // Hash computed over "failure" presented with status "success".
        let sent = h.reverse_hash("failure", "a@b.c", "Asha", "Concert", "330.00", "txn1");

        assert!(!h.verify_reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1", &sent));
    }

    #[test]
    fn verify_rejects_tampered_amount() {
        let h = hasher();
        let sent = h.reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1");

        assert!(!h.verify_reverse_hash("success", "a@b.c", "Asha", "Concert", "1.00", "txn1", &sent));
    }

    #[test]
    fn verify_rejects_hash_from_wrong_salt() {
        let forged = GatewayHasher::new(TEST_KEY, "wrongsalt")
            .reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1");

        assert!(!hasher().verify_reverse_hash(
            "success", "a@b.c", "Asha", "Concert", "330.00", "txn1", &forged
        ));
    }

    #[test]
    fn verify_rejects_garbage_and_truncated_hashes() {
        let h = hasher();
        assert!(!h.verify_reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1", ""));
        assert!(!h.verify_reverse_hash(
            "success", "a@b.c", "Asha", "Concert", "330.00", "txn1", "deadbeef"
        ));
        assert!(!h.verify_reverse_hash(
            "success", "a@b.c", "Asha", "Concert", "330.00", "txn1",
            &"a".repeat(128)
        ));
    }

    #[test]
    fn verify_rejects_single_character_flip() {
        let h = hasher();
        let sent = h.reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1");

        let mut flipped = sent.into_bytes();
        flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
        let flipped = String::from_utf8(flipped).unwrap();

        assert!(!h.verify_reverse_hash(
            "success", "a@b.c", "Asha", "Concert", "330.00", "txn1", &flipped
        ));
    }

    #[test]
    fn verify_uses_amount_verbatim() {
        let h = hasher();
        // The gateway hashed "330.0"; verification must not reformat it.
        let sent = h.reverse_hash("success", "a@b.c", "Asha", "Concert", "330.0", "txn1");

        assert!(h.verify_reverse_hash("success", "a@b.c", "Asha", "Concert", "330.0", "txn1", &sent));
        assert!(!h.verify_reverse_hash("success", "a@b.c", "Asha", "Concert", "330.00", "txn1", &sent));
    }

    // ══════════════════════════════════════════════════════════════
    // Constant Time Comparison Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_equal_values() {
        assert!(constant_time_compare(b"abc123", b"abc123"));
    }

    #[test]
    fn constant_time_compare_different_values() {
        assert!(!constant_time_compare(b"abc123", b"abc124"));
    }

    #[test]
    fn constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }
}
