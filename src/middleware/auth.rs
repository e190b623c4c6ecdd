use axum::http::{header, HeaderMap};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::token::TokenCodec;

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Identity recovered from a verified bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }

    /// Owners and admins may modify a resource.
    pub fn ensure_can_modify(&self, owner_id: Option<i64>) -> AppResult<()> {
        if self.is_admin() || owner_id == Some(self.id) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Accès refusé".to_string()))
        }
    }
}

/// Verifies the `Authorization: Bearer <token>` header and extracts the user.
///
/// Controllers call this themselves before any mutation; the dispatcher does not
/// authenticate.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenCodec) -> AppResult<AuthUser> {
    let auth_val = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Token non fourni".to_string()))?;

    let token = auth_val
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Authentication("Token non fourni".to_string()))?;

    let invalid = || AppError::Authentication("Token invalide".to_string());
    let claims = tokens.verify(token).map_err(|_| {
        tracing::debug!("Rejected bearer token");
        invalid()
    })?;

    let id = claims.get("id").and_then(Value::as_i64).ok_or_else(invalid)?;
    let email = claims.get("email").and_then(Value::as_str).unwrap_or_default().to_string();
    let roles = match claims.get("role") {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        Some(Value::String(role)) => vec![role.clone()],
        _ => Vec::new(),
    };

    Ok(AuthUser { id, email, roles })
}
