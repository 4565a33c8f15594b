//! Slack request signing (`v0` scheme).
//!
//! Slack sends `X-Slack-Request-Timestamp` and
//! `X-Slack-Signature: v0=<hex>`, where the hex is the HMAC-SHA256 of
//! `v0:{timestamp}:{raw body}` keyed with the app's signing secret.

use axum::http::{HeaderMap, StatusCode};
use bridge_std::WallClock;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Largest accepted distance between the request timestamp and now.
pub const MAX_CLOCK_SKEW_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Required Slack headers not found.")]
    MissingHeaders,
    #[error("Invalid request timestamp.")]
    InvalidTimestamp,
    #[error("Request time is too old.")]
    StaleTimestamp,
    #[error("Signature Mismatch.")]
    Mismatch,
}

impl SignatureError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeaders | Self::Mismatch => StatusCode::FORBIDDEN,
            Self::InvalidTimestamp | Self::StaleTimestamp => StatusCode::BAD_REQUEST,
        }
    }
}

/// `v0=<hex>` signature Slack would send for this timestamp and body.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Some(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

pub struct SlackSignatureVerifier<K> {
    signing_secret: String,
    clock: K,
}

impl<K: WallClock> SlackSignatureVerifier<K> {
    pub fn new(signing_secret: impl Into<String>, clock: K) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            clock,
        }
    }

    pub fn verify_headers(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        self.verify(header(TIMESTAMP_HEADER), header(SIGNATURE_HEADER), body)
    }

    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
            return Err(SignatureError::MissingHeaders);
        };

        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if self.clock.unix_timestamp().abs_diff(sent_at) > MAX_CLOCK_SKEW_SECS.unsigned_abs() {
            return Err(SignatureError::StaleTimestamp);
        }

        let expected = sign(&self.signing_secret, timestamp, body).ok_or(SignatureError::Mismatch)?;
        if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_std::MockClock;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const NOW: i64 = 1_700_000_000;
    const BODY: &[u8] = b"token=x&user_id=U1&text=deploy&response_url=https%3A%2F%2Fhooks.slack.com%2Fx";

    fn verifier() -> SlackSignatureVerifier<MockClock> {
        SlackSignatureVerifier::new(SECRET, MockClock::at(NOW))
    }

    fn signed(ts: i64) -> (String, String) {
        let ts = ts.to_string();
        let sig = sign(SECRET, &ts, BODY).unwrap();
        (ts, sig)
    }

    #[test]
    fn valid_signature_passes() {
        let (ts, sig) = signed(NOW);
        assert_eq!(verifier().verify(Some(&ts), Some(&sig), BODY), Ok(()));
    }

    #[test]
    fn sign_uses_v0_basestring() {
        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(b"v0:123:body");
        let expected = format!("v0={}", hex::encode(mac.finalize().into_bytes()));
        assert_eq!(sign("secret", "123", b"body").unwrap(), expected);
    }

    #[test]
    fn missing_headers_are_forbidden() {
        let (ts, sig) = signed(NOW);
        for (ts, sig) in [(None, Some(sig.as_str())), (Some(ts.as_str()), None), (None, None)] {
            let err = verifier().verify(ts, sig, BODY).unwrap_err();
            assert_eq!(err, SignatureError::MissingHeaders);
            assert_eq!(err.status(), StatusCode::FORBIDDEN);
            assert_eq!(err.to_string(), "Required Slack headers not found.");
        }
    }

    #[test]
    fn stale_timestamp_is_rejected_in_both_directions() {
        for ts in [NOW - 301, NOW + 301] {
            let (ts, sig) = signed(ts);
            let err = verifier().verify(Some(&ts), Some(&sig), BODY).unwrap_err();
            assert_eq!(err, SignatureError::StaleTimestamp);
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn skew_of_exactly_five_minutes_is_accepted() {
        let (ts, sig) = signed(NOW - 300);
        assert!(verifier().verify(Some(&ts), Some(&sig), BODY).is_ok());
    }

    #[test]
    fn non_numeric_timestamp_is_bad_request() {
        let sig = sign(SECRET, "yesterday", BODY).unwrap();
        let err = verifier().verify(Some("yesterday"), Some(&sig), BODY).unwrap_err();
        assert_eq!(err, SignatureError::InvalidTimestamp);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn single_bit_flip_in_body_fails() {
        let (ts, sig) = signed(NOW);
        for i in 0..BODY.len() {
            let mut body = BODY.to_vec();
            body[i] ^= 0x01;
            assert_eq!(
                verifier().verify(Some(&ts), Some(&sig), &body),
                Err(SignatureError::Mismatch)
            );
        }
    }

    #[test]
    fn single_bit_flip_in_signature_fails() {
        let (ts, sig) = signed(NOW);
        for i in 0..sig.len() {
            for bit in [0x01u8, 0x20] {
                let mut bytes = sig.clone().into_bytes();
                bytes[i] ^= bit;
                let Ok(mutated) = String::from_utf8(bytes) else {
                    continue;
                };
                assert_eq!(
                    verifier().verify(Some(&ts), Some(&mutated), BODY),
                    Err(SignatureError::Mismatch),
                    "{mutated}"
                );
            }
        }
    }

    #[test]
    fn single_bit_flip_in_timestamp_fails() {
        let (ts, sig) = signed(NOW);
        for i in 0..ts.len() {
            let mut bytes = ts.clone().into_bytes();
            bytes[i] ^= 0x01;
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(verifier().verify(Some(&mutated), Some(&sig), BODY).is_err());
        }
    }

    #[test]
    fn wrong_secret_fails() {
        let ts = NOW.to_string();
        let sig = sign("another-secret", &ts, BODY).unwrap();
        let err = verifier().verify(Some(&ts), Some(&sig), BODY).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Signature Mismatch.");
    }

    #[test]
    fn reads_headers_from_map() {
        let (ts, sig) = signed(NOW);
        let mut headers = HeaderMap::new();
        headers.insert(TIMESTAMP_HEADER, ts.parse().unwrap());
        headers.insert(SIGNATURE_HEADER, sig.parse().unwrap());
        assert_eq!(verifier().verify_headers(&headers, BODY), Ok(()));
    }
}
