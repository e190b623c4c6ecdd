//! Controllers and the route list.
//!
//! - `articles`: article listing, lookup, CRUD and cover upload
//! - `users`: registration, login and email verification
//! - `recaptcha`: reCAPTCHA token check
//! - `health`: liveness and build info

pub mod articles;
pub mod health;
pub mod recaptcha;
pub mod users;

use axum::{
    extract::{Query, Request},
    http::Uri,
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};
use crate::router::{route, HandlerRef, RouteDef};

use articles::ArticleController;
use health::HealthController;
use recaptcha::RecaptchaController;
use users::UserController;

/// JSON bodies larger than this are rejected before parsing.
const JSON_BODY_LIMIT: usize = 1024 * 1024;

/// Every route the API answers, in match order. `/api/articles/id/{id}` must stay
/// ahead of `/api/articles/{slug}`, which would otherwise capture `id` as a slug.
pub fn route_defs() -> Vec<RouteDef<HandlerRef>> {
    vec![
        route!(GET "/healthz" => HealthController::healthz()),
        route!(GET "/version" => HealthController::version()),
        route!(POST "/api/register" => UserController::register()),
        route!(POST "/api/login" => UserController::login()),
        route!(GET "/api/valider-email" => UserController::verify_email()),
        route!(POST "/api/verify-recaptcha" => RecaptchaController::verify()),
        route!(GET "/api/articles" => ArticleController::index()),
        route!(GET "/api/articles/id/{id}" => ArticleController::show_by_id(id: i64)),
        route!(GET "/api/articles/{slug}" => ArticleController::show_by_slug(slug: String)),
        route!(POST "/api/articles" => ArticleController::create()),
        route!(PUT "/api/articles/{id}" => ArticleController::update(id: i64)),
        route!(DELETE "/api/article-delete/{id}" => ArticleController::delete(id: i64)),
        route!(POST "/api/articles/{id}/image" => ArticleController::upload_image(id: i64)),
    ]
}

/// Reads the whole body as JSON. Empty, oversized or malformed bodies are a 400.
pub(crate) async fn read_json<T: DeserializeOwned>(req: Request) -> AppResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), JSON_BODY_LIMIT)
        .await
        .map_err(|_| AppError::Validation("JSON invalide".to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!("Rejected JSON body: {}", e);
        AppError::Validation("JSON invalide".to_string())
    })
}

pub(crate) fn read_query<T: DeserializeOwned>(uri: &Uri) -> AppResult<T> {
    Query::<T>::try_from_uri(uri)
        .map(|Query(q)| q)
        .map_err(|e| AppError::Validation(format!("Paramètres invalides: {}", e.body_text())))
}

/// Trimmed, non-empty value or `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
