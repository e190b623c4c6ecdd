use std::sync::Arc;

use axum::{extract::Request, http::StatusCode, response::Response};

use super::{non_empty, read_json};
use crate::envelope;
use crate::error::{AppError, AppResult};
use crate::router::Controller;
use crate::services::recaptcha::RecaptchaVerifier;
use crate::state::AppState;
use crate::types::RecaptchaRequest;

pub struct RecaptchaController {
    verifier: Arc<dyn RecaptchaVerifier>,
}

impl Controller for RecaptchaController {
    fn new(state: &AppState) -> Self {
        Self { verifier: state.recaptcha.clone() }
    }
}

impl RecaptchaController {
    /// `POST /api/verify-recaptcha`
    pub async fn verify(self, req: Request) -> AppResult<Response> {
        let body: RecaptchaRequest = read_json(req).await?;
        let token = non_empty(body.token).ok_or_else(|| AppError::Validation("Token manquant".to_string()))?;

        let accepted = self.verifier.verify(&token).await.unwrap_or_else(|e| {
            tracing::warn!("reCAPTCHA verification request failed: {}", e);
            false
        });
        if !accepted {
            return Err(AppError::Validation("Validation reCAPTCHA échouée".to_string()));
        }
        Ok(envelope::message(StatusCode::OK, "reCAPTCHA validé"))
    }
}
