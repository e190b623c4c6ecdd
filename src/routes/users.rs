use std::sync::Arc;

use axum::{extract::Request, http::StatusCode, response::Response};
use rand::RngCore;
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;

use super::{non_empty, read_json, read_query};
use crate::config::AppConfig;
use crate::envelope;
use crate::error::{AppError, AppResult};
use crate::repository::users;
use crate::router::Controller;
use crate::sanitize;
use crate::services::mail::{verification_mail, Mailer};
use crate::state::AppState;
use crate::token::TokenCodec;
use crate::types::{LoginRequest, NewUser, PublicUser, RegisterRequest, VerifyEmailQuery, ROLE_USER};

pub struct UserController {
    db: SqlitePool,
    config: Arc<AppConfig>,
    tokens: Arc<TokenCodec>,
    mailer: Arc<dyn Mailer>,
}

impl Controller for UserController {
    fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            config: state.config.clone(),
            tokens: state.tokens.clone(),
            mailer: state.mailer.clone(),
        }
    }
}

/// 32 random bytes, hex encoded.
fn email_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(e.into()))
}

/// A hash that fails to parse counts as a mismatch.
async fn password_matches(password: String, hash: String) -> AppResult<bool> {
    let res = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(res.unwrap_or_else(|e| {
        tracing::warn!("Stored password hash is unreadable: {}", e);
        false
    }))
}

impl UserController {
    /// `POST /api/register`
    pub async fn register(self, req: Request) -> AppResult<Response> {
        let body: RegisterRequest = read_json(req).await?;

        let username = non_empty(body.username).map(|u| sanitize::clean(&u));
        // The email is an identifier, stored and looked up as typed
        let email = non_empty(body.email);
        let password = body.password.filter(|p| !p.is_empty());
        let (Some(username), Some(email), Some(password)) = (username, email, password) else {
            return Err(AppError::Validation("Nom d'utilisateur, email et mot de passe requis".to_string()));
        };
        if !email.contains('@') {
            return Err(AppError::Validation("Email invalide".to_string()));
        }

        if users::find_by_email(&self.db, &email).await?.is_some() {
            return Err(AppError::Validation("Cet email est déjà utilisé".to_string()));
        }
        if users::find_by_username(&self.db, &username).await?.is_some() {
            return Err(AppError::Validation("Ce nom d'utilisateur est déjà pris".to_string()));
        }

        let password_hash = hash_password(password, self.config.auth.bcrypt_cost).await?;
        let token = email_token();
        let user = NewUser {
            username,
            email: email.clone(),
            password_hash,
            roles: vec![ROLE_USER.to_string()],
            avatar: non_empty(body.avatar),
            email_token: token.clone(),
        };

        let id = users::save(&self.db, &user).await.map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Validation("Utilisateur déjà existant".to_string())
            }
            other => other.into(),
        })?;
        tracing::info!(user_id = id, "Registered new user");

        let mail = verification_mail(&self.config.mail.frontend_url, &email, &token);
        if let Err(e) = self.mailer.send(mail).await {
            tracing::error!(user_id = id, "Failed to send verification mail: {}", e);
        }

        Ok(envelope::message(
            StatusCode::CREATED,
            "Utilisateur créé avec succès. Veuillez vérifier votre email.",
        ))
    }

    /// `POST /api/login`
    pub async fn login(self, req: Request) -> AppResult<Response> {
        let body: LoginRequest = read_json(req).await?;
        let (Some(email), Some(password)) = (non_empty(body.email), body.password.filter(|p| !p.is_empty())) else {
            return Err(AppError::Validation("Email et mot de passe requis".to_string()));
        };

        let bad_credentials = || AppError::Authentication("Identifiants incorrects".to_string());
        let user = users::find_by_email(&self.db, &email).await?.ok_or_else(bad_credentials)?;
        if !password_matches(password, user.password_hash.clone()).await? {
            return Err(bad_credentials());
        }
        if !user.is_verified {
            return Err(AppError::Authentication(
                "Veuillez vérifier votre email avant de vous connecter".to_string(),
            ));
        }

        let mut claims = Map::new();
        claims.insert("id".to_string(), Value::from(user.id));
        claims.insert("email".to_string(), Value::from(user.email.clone()));
        claims.insert("role".to_string(), json!(user.roles));
        let token = self.tokens.issue(claims);

        tracing::info!(user_id = user.id, "User logged in");
        Ok(envelope::data_with_message(
            StatusCode::OK,
            "Connexion réussie",
            json!({ "token": token, "user": PublicUser::from(&user) }),
        ))
    }

    /// `GET /api/valider-email?token=`
    pub async fn verify_email(self, req: Request) -> AppResult<Response> {
        let q: VerifyEmailQuery = read_query(req.uri())?;
        let token = non_empty(q.token).ok_or_else(|| AppError::Validation("Token manquant".to_string()))?;

        let user = users::find_by_token(&self.db, &token)
            .await?
            .ok_or_else(|| AppError::NotFound("Utilisateur introuvable".to_string()))?;
        users::mark_verified(&self.db, user.id).await?;

        tracing::info!(user_id = user.id, "Email verified");
        Ok(envelope::message(StatusCode::OK, "Email vérifié avec succès"))
    }
}
