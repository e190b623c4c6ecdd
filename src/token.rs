//! Compact HS256 session tokens.
//!
//! Format: `base64url(header).base64url(claims).base64url(signature)`, unpadded, with
//! header `{"type":"JWT","alg":"HS256"}` and an `exp` claim (unix seconds) injected at
//! issue time. Tokens are self-contained: there is no revocation store, they simply
//! stop verifying once `exp` has passed.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde_json::{json, Map, Value};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the expiry claim.
pub const EXPIRY_CLAIM: &str = "exp";

/// Uniform verification failure. Callers never learn which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid token")]
pub struct InvalidToken;

pub type Claims = Map<String, Value>;

/// Issues and verifies session tokens under one process-wide secret.
pub struct TokenCodec {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self { secret: secret.into(), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs `claims` with `exp = now + ttl`. A caller-supplied `exp` is overwritten.
    pub fn issue(&self, claims: Claims) -> String {
        self.issue_at(claims, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, mut claims: Claims, now: i64) -> String {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        claims.insert(EXPIRY_CLAIM.to_string(), Value::from(now.saturating_add(ttl)));

        let header = json!({ "type": "JWT", "alg": "HS256" });
        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_b64 = URL_SAFE_NO_PAD.encode(Value::Object(claims).to_string());
        let signing_input = format!("{}.{}", header_b64, claims_b64);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));

        format!("{}.{}", signing_input, signature)
    }

    /// Returns the claims (including `exp`) of a well-signed, unexpired token.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, InvalidToken> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(InvalidToken),
            };

        let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|_| InvalidToken)?;
        let mut mac = self.mac();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&signature).map_err(|_| InvalidToken)?;

        let raw = URL_SAFE_NO_PAD.decode(claims_b64).map_err(|_| InvalidToken)?;
        let claims = match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => return Err(InvalidToken),
        };

        let exp = claims.get(EXPIRY_CLAIM).and_then(Value::as_i64).ok_or(InvalidToken)?;
        if exp < now {
            return Err(InvalidToken);
        }

        Ok(claims)
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }
}
