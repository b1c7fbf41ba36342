use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew between the envelope timestamp and our clock.
pub const SKEW_TOLERANCE_SECONDS: i64 = 600;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing signature header")]
    MissingHeader,
    #[error("Missing timestamp 't' in signature header")]
    MissingTimestamp,
    #[error("Malformed timestamp in signature header")]
    MalformedTimestamp,
    #[error("Missing v1 signature in signature header")]
    MissingSignature,
    #[error("Envelope timestamp outside the accepted skew")]
    SkewTooLarge,
    #[error("Signature mismatch")]
    Mismatch,
}

/// Compute the `t=...,v1=...` envelope for a payload. Production senders do
/// the same; internal cron triggers use this directly.
pub fn sign_envelope(payload: &[u8], key: &str, timestamp: i64) -> String {
    let signature = hmac_hex(payload, key, timestamp);
    format!("t={timestamp},v1={signature}")
}

fn hmac_hex(payload: &[u8], key: &str, timestamp: i64) -> String {
    // The key length is never invalid for HMAC
    #[allow(clippy::unwrap_used)]
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verify a `t=<unix>,v1=<hex>` envelope over `"{t}.{payload}"`.
///
/// Every provided `v1` signature is checked against every accepted key, so
/// a key rotation (current + next) never drops deliveries. The timestamp
/// must be within the skew tolerance of `now_unix`.
pub fn verify_envelope(
    payload: &[u8],
    signature_header: Option<&str>,
    keys: &[&str],
    now_unix: i64,
) -> Result<(), SignatureError> {
    let header = signature_header.ok_or(SignatureError::MissingHeader)?;

    let mut timestamp_str: Option<&str> = None;
    let mut provided_signatures: Vec<&str> = Vec::new();

    for item in header.split(',') {
        let mut parts = item.trim().splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some("t"), Some(value)) => timestamp_str = Some(value),
            (Some("v1"), Some(value)) => provided_signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp_str
        .ok_or(SignatureError::MissingTimestamp)?
        .parse::<i64>()
        .map_err(|_| SignatureError::MalformedTimestamp)?;

    if provided_signatures.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    if (now_unix - timestamp).abs() > SKEW_TOLERANCE_SECONDS {
        return Err(SignatureError::SkewTooLarge);
    }

    for key in keys {
        let expected = hmac_hex(payload, key, timestamp);
        for provided in &provided_signatures {
            if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
                return Ok(());
            }
        }
    }

    Err(SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
    const NOW: i64 = 1_741_000_000;

    #[test]
    fn accepts_a_valid_envelope() {
        let header = sign_envelope(PAYLOAD, "secret_a", NOW);
        assert_eq!(
            verify_envelope(PAYLOAD, Some(&header), &["secret_a"], NOW),
            Ok(())
        );
    }

    #[test]
    fn accepts_the_next_key_during_rotation() {
        let header = sign_envelope(PAYLOAD, "secret_b", NOW);
        assert_eq!(
            verify_envelope(PAYLOAD, Some(&header), &["secret_a", "secret_b"], NOW),
            Ok(())
        );
    }

    #[test]
    fn rejects_a_wrong_key() {
        let header = sign_envelope(PAYLOAD, "wrong", NOW);
        assert_eq!(
            verify_envelope(PAYLOAD, Some(&header), &["secret_a"], NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let header = sign_envelope(PAYLOAD, "secret_a", NOW);
        assert_eq!(
            verify_envelope(b"{}", Some(&header), &["secret_a"], NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamps() {
        let header = sign_envelope(PAYLOAD, "secret_a", NOW - SKEW_TOLERANCE_SECONDS - 1);
        assert_eq!(
            verify_envelope(PAYLOAD, Some(&header), &["secret_a"], NOW),
            Err(SignatureError::SkewTooLarge)
        );
        // Right at the tolerance boundary still passes
        let header = sign_envelope(PAYLOAD, "secret_a", NOW - SKEW_TOLERANCE_SECONDS);
        assert_eq!(
            verify_envelope(PAYLOAD, Some(&header), &["secret_a"], NOW),
            Ok(())
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(
            verify_envelope(PAYLOAD, None, &["secret_a"], NOW),
            Err(SignatureError::MissingHeader)
        );
        assert_eq!(
            verify_envelope(PAYLOAD, Some("v1=abc"), &["secret_a"], NOW),
            Err(SignatureError::MissingTimestamp)
        );
        assert_eq!(
            verify_envelope(PAYLOAD, Some("t=notanumber,v1=abc"), &["secret_a"], NOW),
            Err(SignatureError::MalformedTimestamp)
        );
        assert_eq!(
            verify_envelope(PAYLOAD, Some(&format!("t={NOW}")), &["secret_a"], NOW),
            Err(SignatureError::MissingSignature)
        );
    }

    #[test]
    fn any_matching_v1_of_several_passes() {
        let valid = sign_envelope(PAYLOAD, "secret_a", NOW);
        let valid_sig = valid.split("v1=").nth(1).unwrap();
        let header = format!("t={NOW},v1=deadbeef,v1={valid_sig}");
        assert_eq!(
            verify_envelope(PAYLOAD, Some(&header), &["secret_a"], NOW),
            Ok(())
        );
    }
}
