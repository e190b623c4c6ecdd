//! Cross-Site Request Forgery (CSRF) guard.
//!
//! State-changing requests must carry the configured shared secret in the
//! `X-CSRF-Token` header. The secret is static for the lifetime of the process and
//! shared by every client; there is no per-session token issuance.

use axum::http::{HeaderMap, Method};
use subtle::ConstantTimeEq;

pub const CSRF_HEADER: &str = "x-csrf-token";

/// Compares request-supplied tokens against the configured secret.
#[derive(Debug, Clone)]
pub struct CsrfGuard {
    secret: Option<String>,
}

impl CsrfGuard {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret: secret.filter(|s| !s.is_empty()) }
    }

    /// `true` only when both the header and the configured secret are present and
    /// byte-for-byte equal. The comparison runs in constant time.
    pub fn verify(&self, header_value: Option<&str>) -> bool {
        match (header_value, self.secret.as_deref()) {
            (Some(provided), Some(expected)) => bool::from(provided.as_bytes().ct_eq(expected.as_bytes())),
            _ => false,
        }
    }

    pub fn verify_headers(&self, headers: &HeaderMap) -> bool {
        self.verify(headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()))
    }
}

/// Whether a request with this method and path must pass the CSRF guard.
pub fn requires_check(method: &Method, path: &str, exempt_paths: &[String]) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::DELETE | Method::PATCH)
        && !exempt_paths.iter().any(|p| p == path)
}
