//! Cover image storage under `uploads.dir`.

use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Sub-directory (and public URL segment) holding article covers.
pub const ARTICLE_DIR: &str = "articles";
/// Mount point of the static file service.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
        }
    }
}

/// Identifies the image format from its leading bytes; the client-declared
/// content type is not trusted.
pub fn sniff(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageKind::Jpeg)
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageKind::Png)
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some(ImageKind::Webp)
    } else {
        None
    }
}

/// Checks size and format of an uploaded cover.
pub fn validate_image(bytes: &[u8], max_bytes: u64) -> AppResult<ImageKind> {
    if bytes.is_empty() {
        return Err(AppError::Validation("Fichier image vide".to_string()));
    }
    if bytes.len() as u64 > max_bytes {
        return Err(AppError::Validation(format!(
            "Image trop volumineuse (max {} octets)",
            max_bytes
        )));
    }
    sniff(bytes).ok_or_else(|| {
        AppError::Validation("Format d'image non supporté (JPEG, PNG ou WebP)".to_string())
    })
}

/// Writes the cover for `article_id` and returns its public path.
pub async fn store_article_image(root: &Path, article_id: i64, kind: ImageKind, bytes: &[u8]) -> AppResult<String> {
    let dir = root.join(ARTICLE_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = format!("article_{}_{}.{}", article_id, uuid::Uuid::new_v4().simple(), kind.extension());
    tokio::fs::write(dir.join(&file_name), bytes).await?;
    tracing::debug!(article_id, file = %file_name, "Stored cover image");

    Ok(format!("{}/{}/{}", PUBLIC_PREFIX, ARTICLE_DIR, file_name))
}

/// Maps a public `/uploads/articles/<file>` path back onto disk. Anything else,
/// including paths trying to leave the articles directory, maps to `None`.
pub fn resolve_public_path(root: &Path, public: &str) -> Option<PathBuf> {
    let rest = public.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
    let file = rest.strip_prefix(ARTICLE_DIR)?.strip_prefix('/')?;
    if file.is_empty() || file.contains('/') || file.contains('\\') || file.starts_with('.') {
        return None;
    }
    Some(root.join(ARTICLE_DIR).join(file))
}

/// Best-effort removal of a previously stored cover.
pub async fn remove_public_file(root: &Path, public: Option<&str>) {
    let Some(path) = public.and_then(|p| resolve_public_path(root, p)) else {
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed old cover image"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "Failed to remove cover image: {}", e),
    }
}
