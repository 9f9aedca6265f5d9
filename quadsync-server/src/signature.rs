//! GitHub webhook signature verification.
//!
//! GitHub signs the raw request body with HMAC-SHA256 and sends the result
//! as `X-Hub-Signature-256: sha256=<hex>`. Verification must be constant
//! time; [`Mac::verify_slice`] provides that.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify `header` against the HMAC-SHA256 of `body` under `secret`.
///
/// Missing header, wrong prefix, non-hex digest, length mismatch, and MAC
/// mismatch all fail verification the same way.
pub fn verify(secret: &[u8], body: &[u8], header: Option<&str>) -> bool {
    let Some(signature) = header else {
        return false;
    };
    let Some(hex_digest) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(digest) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&digest).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key";
    const BODY: &[u8] = br#"{"ref":"refs/heads/main"}"#;

    fn sign(secret: &[u8], body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret).expect("mac");
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_verifies() {
        let header = sign(SECRET, BODY);
        assert!(verify(SECRET, BODY, Some(&header)));
    }

    #[test]
    fn missing_header_fails() {
        assert!(!verify(SECRET, BODY, None));
    }

    #[test]
    fn empty_header_fails() {
        assert!(!verify(SECRET, BODY, Some("")));
    }

    #[test]
    fn wrong_prefix_fails() {
        let digest = sign(SECRET, BODY).replace("sha256=", "sha1=");
        assert!(!verify(SECRET, BODY, Some(&digest)));
    }

    #[test]
    fn non_hex_digest_fails() {
        assert!(!verify(SECRET, BODY, Some("sha256=not-hex-at-all")));
    }

    #[test]
    fn truncated_digest_fails() {
        let header = sign(SECRET, BODY);
        assert!(!verify(SECRET, BODY, Some(&header[..header.len() - 4])));
    }

    #[test]
    fn wrong_secret_fails() {
        let header = sign(b"another-secret", BODY);
        assert!(!verify(SECRET, BODY, Some(&header)));
    }

    #[test]
    fn tampered_body_fails() {
        let header = sign(SECRET, BODY);
        assert!(!verify(SECRET, br#"{"ref":"refs/heads/evil"}"#, Some(&header)));
    }
}
