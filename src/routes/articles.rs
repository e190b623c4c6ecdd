use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::StatusCode,
    response::Response,
};
use serde_json::json;
use sqlx::SqlitePool;

use super::{non_empty, read_json, read_query};
use crate::config::AppConfig;
use crate::envelope;
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::auth::{authenticate, AuthUser};
use crate::repository::{articles, now_timestamp};
use crate::router::Controller;
use crate::sanitize;
use crate::state::AppState;
use crate::token::TokenCodec;
use crate::types::{
    Article, ArticleDraft, ArticleFilters, ArticlePage, ArticleQuery, CreateArticleRequest, UpdateArticleRequest,
};
use crate::uploads;

const ARTICLE_NOT_FOUND: &str = "Article non trouvé";
const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 100;
/// Counter suffixes tried before falling back to a random one.
const SLUG_ATTEMPTS: u32 = 10;

/// `base`, then `base-2` .. `base-10`, then `base-<uuid fragment>`.
async fn free_slug(db: &SqlitePool, base: &str) -> AppResult<String> {
    if !articles::slug_exists(db, base).await? {
        return Ok(base.to_string());
    }
    for n in 2..=SLUG_ATTEMPTS {
        let candidate = format!("{}-{}", base, n);
        if !articles::slug_exists(db, &candidate).await? {
            return Ok(candidate);
        }
    }
    let fragment = uuid::Uuid::new_v4().simple().to_string();
    Ok(format!("{}-{}", base, &fragment[..8]))
}

pub struct ArticleController {
    db: SqlitePool,
    config: Arc<AppConfig>,
    tokens: Arc<TokenCodec>,
}

impl Controller for ArticleController {
    fn new(state: &AppState) -> Self {
        Self { db: state.db.clone(), config: state.config.clone(), tokens: state.tokens.clone() }
    }
}

impl ArticleController {
    fn authenticate(&self, req: &Request) -> AppResult<AuthUser> {
        authenticate(req.headers(), &self.tokens)
    }

    async fn find(&self, id: i64) -> AppResult<Article> {
        articles::get_by_id(&self.db, id).await?.ok_or_not_found(ARTICLE_NOT_FOUND)
    }

    /// Loads the article and checks the caller owns it or is an admin.
    async fn find_owned(&self, id: i64, user: &AuthUser) -> AppResult<Article> {
        let article = self.find(id).await?;
        if let Err(e) = user.ensure_can_modify(article.id_user) {
            tracing::warn!(article_id = id, user_id = user.id, "Refused modification of foreign article");
            return Err(e);
        }
        Ok(article)
    }

    /// `slugify(title)-NNNN`, made unique against existing articles.
    async fn unique_slug(&self, title: &str) -> AppResult<String> {
        let base = sanitize::slug_with_suffix(title, chrono::Utc::now().timestamp());
        free_slug(&self.db, &base).await
    }

    /// `GET /api/articles`
    pub async fn index(self, req: Request) -> AppResult<Response> {
        let q: ArticleQuery = read_query(req.uri())?;
        let page = q.page.unwrap_or(1).max(1);
        let per_page = q.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

        let date = non_empty(q.date);
        if let Some(d) = date.as_deref() {
            chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|_| AppError::Validation("Date invalide (format attendu AAAA-MM-JJ)".to_string()))?;
        }
        let filters = ArticleFilters { category: q.category, author: non_empty(q.author), date, tag: non_empty(q.tag) };

        let (items, total) = articles::list(&self.db, &filters, page, per_page).await?;
        Ok(envelope::data(StatusCode::OK, ArticlePage { articles: items, total, page, per_page }))
    }

    /// `GET /api/articles/id/{id}`
    pub async fn show_by_id(self, _req: Request, id: i64) -> AppResult<Response> {
        let article = self.find(id).await?;
        Ok(envelope::data(StatusCode::OK, article))
    }

    /// `GET /api/articles/{slug}`
    pub async fn show_by_slug(self, _req: Request, slug: String) -> AppResult<Response> {
        let article = articles::get_by_slug(&self.db, &slug).await?.ok_or_not_found(ARTICLE_NOT_FOUND)?;
        Ok(envelope::data(StatusCode::OK, article))
    }

    /// `POST /api/articles`
    pub async fn create(self, req: Request) -> AppResult<Response> {
        let user = self.authenticate(&req)?;
        let body: CreateArticleRequest = read_json(req).await?;

        let (Some(title), Some(content)) = (non_empty(body.title), non_empty(body.content)) else {
            return Err(AppError::Validation("Titre et contenu requis".to_string()));
        };

        let draft = ArticleDraft {
            cover_image: None,
            slug: self.unique_slug(&title).await?,
            title,
            introduction: non_empty(body.introduction),
            content,
            id_user: Some(user.id),
            published_at: Some(now_timestamp()),
            tags: body.tags.map(|t| t.into_tags()).unwrap_or_default(),
            categories: body.categories,
        };

        let id = articles::create(&self.db, &draft).await?;
        tracing::info!(article_id = id, user_id = user.id, slug = %draft.slug, "Created article");

        let article = self.find(id).await?;
        Ok(envelope::data_with_message(StatusCode::CREATED, "Article créé avec succès", article))
    }

    /// `PUT /api/articles/{id}`
    pub async fn update(self, req: Request, id: i64) -> AppResult<Response> {
        let user = self.authenticate(&req)?;
        let existing = self.find_owned(id, &user).await?;
        let body: UpdateArticleRequest = read_json(req).await?;

        let mut draft = ArticleDraft::from(&existing);
        if let Some(title) = body.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::Validation("Titre et contenu requis".to_string()));
            }
            if title != existing.title {
                draft.slug = self.unique_slug(&title).await?;
                draft.title = title;
            }
        }
        if let Some(content) = body.content {
            draft.content = non_empty(Some(content))
                .ok_or_else(|| AppError::Validation("Titre et contenu requis".to_string()))?;
        }
        if let Some(intro) = body.introduction {
            draft.introduction = non_empty(Some(intro));
        }
        if let Some(tags) = body.tags {
            draft.tags = tags.into_tags();
        }
        draft.categories = body.categories;

        if !articles::update(&self.db, id, &draft).await? {
            return Err(AppError::NotFound(ARTICLE_NOT_FOUND.to_string()));
        }
        tracing::info!(article_id = id, user_id = user.id, "Updated article");

        let article = self.find(id).await?;
        Ok(envelope::data_with_message(StatusCode::OK, "Article mis à jour avec succès", article))
    }

    /// `DELETE /api/article-delete/{id}`
    pub async fn delete(self, req: Request, id: i64) -> AppResult<Response> {
        let user = self.authenticate(&req)?;
        let existing = self.find_owned(id, &user).await?;

        if !articles::delete(&self.db, id).await? {
            return Err(AppError::NotFound(ARTICLE_NOT_FOUND.to_string()));
        }
        uploads::remove_public_file(&self.uploads_root(), existing.cover_image.as_deref()).await;
        tracing::info!(article_id = id, user_id = user.id, "Deleted article");

        Ok(envelope::message(StatusCode::OK, "Article supprimé avec succès"))
    }

    /// `POST /api/articles/{id}/image`, multipart field `image`.
    pub async fn upload_image(self, req: Request, id: i64) -> AppResult<Response> {
        let user = self.authenticate(&req)?;
        let existing = self.find_owned(id, &user).await?;

        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::Validation(format!("Requête multipart invalide: {}", e.body_text())))?;
        let bytes = self.read_image_field(&mut multipart).await?;
        let kind = uploads::validate_image(&bytes, self.config.uploads.max_bytes)?;

        let root = self.uploads_root();
        let public = uploads::store_article_image(&root, id, kind, &bytes).await?;
        if let Err(e) = articles::set_cover_image(&self.db, id, &public).await {
            uploads::remove_public_file(&root, Some(&public)).await;
            return Err(e.into());
        }
        uploads::remove_public_file(&root, existing.cover_image.as_deref()).await;
        tracing::info!(article_id = id, path = %public, "Updated cover image");

        Ok(envelope::data_with_message(StatusCode::OK, "Image téléchargée avec succès", json!({ "path": public })))
    }

    /// Reads the `image` field, stopping as soon as it exceeds the upload cap.
    async fn read_image_field(&self, multipart: &mut Multipart) -> AppResult<Vec<u8>> {
        let max = self.config.uploads.max_bytes;
        let bad_multipart = |e: axum::extract::multipart::MultipartError| {
            AppError::Validation(format!("Requête multipart invalide: {}", e.body_text()))
        };

        while let Some(mut field) = multipart.next_field().await.map_err(bad_multipart)? {
            if field.name() != Some("image") {
                continue;
            }
            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
                if (bytes.len() + chunk.len()) as u64 > max {
                    return Err(AppError::Validation(format!("Image trop volumineuse (max {} octets)", max)));
                }
                bytes.extend_from_slice(&chunk);
            }
            return Ok(bytes);
        }
        Err(AppError::Validation("Aucune image fournie".to_string()))
    }

    fn uploads_root(&self) -> PathBuf {
        PathBuf::from(&self.config.uploads.dir)
    }
}
