use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for session tokens. Required.
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsrfConfig {
    /// Shared secret expected in `X-CSRF-Token`. When unset every guarded request is rejected.
    pub secret: Option<String>,
    pub exempt_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub default_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    pub dir: String,
    pub max_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from: String,
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecaptchaConfig {
    pub secret_key: Option<String>,
    pub verify_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub csrf: CsrfConfig,
    pub cors: CorsConfig,
    pub uploads: UploadsConfig,
    pub mail: MailConfig,
    pub recaptcha: RecaptchaConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: infodot.toml (in CWD)
        .add_source(::config::File::with_name("infodot").required(false));

    if let Ok(custom_path) = std::env::var("INFODOT_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("INFODOT").separator("__"));

    // Legacy deployment variables, only when the prefixed form is absent
    builder = legacy_override(builder, "INFODOT__AUTH__JWT_SECRET", "JWT_SECRET_KEY", "auth.jwt_secret")?;
    builder = legacy_override(builder, "INFODOT__CSRF__SECRET", "CSRF_SECRET", "csrf.secret")?;
    builder = legacy_override(
        builder,
        "INFODOT__RECAPTCHA__SECRET_KEY",
        "RECAPTCHA_SECRET_KEY",
        "recaptcha.secret_key",
    )?;

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

type Builder = ::config::ConfigBuilder<::config::builder::DefaultState>;

fn legacy_override(builder: Builder, prefixed: &str, legacy: &str, key: &str) -> anyhow::Result<Builder> {
    if std::env::var(prefixed).is_ok() {
        return Ok(builder);
    }
    let value = std::env::var(legacy).ok().filter(|v| !v.is_empty());
    Ok(builder.set_override_option(key, value)?)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    // Warn for privileged ports on Unix-like systems
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Auth
    if cfg.auth.jwt_secret.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "auth.jwt_secret must be set (INFODOT__AUTH__JWT_SECRET or JWT_SECRET_KEY)"
        ));
    }
    if cfg.auth.token_ttl_hours == 0 {
        return Err(anyhow::anyhow!("auth.token_ttl_hours must be > 0"));
    }
    if !(4..=31).contains(&cfg.auth.bcrypt_cost) {
        return Err(anyhow::anyhow!("auth.bcrypt_cost must be in 4..=31"));
    }

    // CSRF: an unset secret is legal but locks every mutating endpoint
    if cfg.csrf.secret.as_deref().map_or(true, |s| s.is_empty()) {
        tracing::warn!("csrf.secret is not set - all guarded POST/PUT/DELETE/PATCH requests will be rejected");
    }

    // Uploads
    if cfg.uploads.max_bytes == 0 {
        return Err(anyhow::anyhow!("uploads.max_bytes must be > 0"));
    }
    if cfg.uploads.dir.trim().is_empty() {
        return Err(anyhow::anyhow!("uploads.dir must not be empty"));
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        // On Windows, handle URLs like sqlite:///C:/... by stripping the leading '/'
        #[cfg(windows)]
        let path = {
            let bytes = path.as_bytes();
            if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' && bytes[1].is_ascii_alphabetic() {
                &path[1..]
            } else {
                path
            }
        };
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
