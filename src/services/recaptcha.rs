use async_trait::async_trait;
use serde::Deserialize;

use crate::config::RecaptchaConfig;

#[async_trait]
pub trait RecaptchaVerifier: Send + Sync {
    /// `Ok(true)` when the provider accepts the token.
    async fn verify(&self, token: &str) -> anyhow::Result<bool>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Google `siteverify` client.
pub struct GoogleRecaptcha {
    client: reqwest::Client,
    secret: Option<String>,
    verify_url: String,
}

impl GoogleRecaptcha {
    pub fn new(cfg: &RecaptchaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret: cfg.secret_key.clone().filter(|s| !s.is_empty()),
            verify_url: cfg.verify_url.clone(),
        }
    }
}

#[async_trait]
impl RecaptchaVerifier for GoogleRecaptcha {
    async fn verify(&self, token: &str) -> anyhow::Result<bool> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!("recaptcha.secret_key is not set, rejecting token");
            return Ok(false);
        };

        let res: SiteVerifyResponse = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !res.success {
            tracing::debug!(errors = ?res.error_codes, "reCAPTCHA rejected token");
        }
        Ok(res.success)
    }
}
