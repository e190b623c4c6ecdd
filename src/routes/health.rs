use axum::{extract::Request, http::StatusCode, response::Response};

use crate::envelope;
use crate::error::AppResult;
use crate::router::Controller;
use crate::state::AppState;

pub struct HealthController;

impl Controller for HealthController {
    fn new(_state: &AppState) -> Self {
        HealthController
    }
}

impl HealthController {
    // Liveness probe, no DB access
    pub async fn healthz(self, _req: Request) -> AppResult<Response> {
        Ok(envelope::data(StatusCode::OK, "ok"))
    }

    // Version/Build info
    pub async fn version(self, _req: Request) -> AppResult<Response> {
        let body = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "package": {
                "description": env!("CARGO_PKG_DESCRIPTION"),
                "authors": env!("CARGO_PKG_AUTHORS"),
                "license": env!("CARGO_PKG_LICENSE"),
            },
            "build": {
                "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
                "os": std::env::consts::OS,
                "arch": std::env::consts::ARCH,
            }
        });
        Ok(envelope::data(StatusCode::OK, body))
    }
}
