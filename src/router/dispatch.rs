use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
};

use crate::error::{AppError, AppResult};
use crate::middleware::csrf;
use crate::state::AppState;

pub const ROUTE_NOT_FOUND: &str = "Route introuvable";

/// Fallback handler that owns every `/api` request.
///
/// 1. Mutating verbs outside the exempt paths must pass the CSRF guard; otherwise
///    403 and no handler runs.
/// 2. The method's bucket is scanned in registration order, first match wins.
/// 3. Captures are coerced and passed positionally to a fresh controller.
/// 4. Every failure, including a route miss, is rendered as the JSON envelope.
pub async fn dispatch(State(state): State<AppState>, req: Request) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match route(state, req).await {
        Ok(res) => res,
        Err(err) => {
            match &err {
                AppError::Csrf => tracing::warn!(%method, %path, "CSRF check failed"),
                AppError::NotFound(msg) if msg == ROUTE_NOT_FOUND => {
                    tracing::debug!(%method, %path, "No route matched")
                }
                other => tracing::debug!(%method, %path, status = %other.status(), "Request failed: {}", other),
            }
            err.into_response()
        }
    }
}

async fn route(state: AppState, req: Request) -> AppResult<Response> {
    let method = req.method();
    let path = req.uri().path();

    if csrf::requires_check(method, path, &state.config.csrf.exempt_paths) && !state.csrf.verify_headers(req.headers())
    {
        return Err(AppError::Csrf);
    }

    let (handler, params) = match state.routes.find(method, path) {
        Some((entry, params)) => (entry.handler, params),
        None => return Err(AppError::NotFound(ROUTE_NOT_FOUND.to_string())),
    };

    tracing::debug!(
        route = %format!("{} {}", method, path),
        handler = ?handler,
        params = ?params.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "Dispatching"
    );

    (handler.call)(state, req, params).await
}
