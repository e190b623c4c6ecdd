use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::middleware::csrf::CsrfGuard;
use crate::router::{HandlerRef, RouteTable};
use crate::routes;
use crate::services::mail::{LogMailer, Mailer, SmtpMailer};
use crate::services::recaptcha::{GoogleRecaptcha, RecaptchaVerifier};
use crate::token::TokenCodec;

/// The shared application state.
///
/// Everything in here is either immutable after startup or internally
/// synchronized (the pool), so cloning it into each request is cheap and safe.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: sqlx::SqlitePool,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Compiled route table consulted by the dispatcher.
    pub routes: Arc<RouteTable<HandlerRef>>,
    /// Session token issuer/verifier, keyed from `auth.jwt_secret`.
    pub tokens: Arc<TokenCodec>,
    /// Shared-secret CSRF guard, keyed from `csrf.secret`.
    pub csrf: Arc<CsrfGuard>,
    /// Outgoing mail (verification links).
    pub mailer: Arc<dyn Mailer>,
    /// reCAPTCHA token verification.
    pub recaptcha: Arc<dyn RecaptchaVerifier>,
}

impl AppState {
    /// Creates a new `AppState`, compiling the route table and keying the token
    /// codec and CSRF guard from `config`.
    ///
    /// Fails if a route template is malformed. Mail goes through SMTP when
    /// `mail.enabled`, otherwise it is only logged.
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let routes = RouteTable::build(routes::route_defs())?;
        let tokens = TokenCodec::new(
            config.auth.jwt_secret.clone().into_bytes(),
            Duration::from_secs(config.auth.token_ttl_hours.saturating_mul(60 * 60)),
        );
        let csrf = CsrfGuard::new(config.csrf.secret.clone());

        let mailer: Arc<dyn Mailer> = if config.mail.enabled {
            Arc::new(SmtpMailer::new(&config.mail)?)
        } else {
            Arc::new(LogMailer)
        };
        let recaptcha: Arc<dyn RecaptchaVerifier> = Arc::new(GoogleRecaptcha::new(&config.recaptcha));

        Ok(Self {
            db,
            config: Arc::new(config),
            routes: Arc::new(routes),
            tokens: Arc::new(tokens),
            csrf: Arc::new(csrf),
            mailer,
            recaptcha,
        })
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_recaptcha(mut self, recaptcha: Arc<dyn RecaptchaVerifier>) -> Self {
        self.recaptcha = recaptcha;
        self
    }
}
