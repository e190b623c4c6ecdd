use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "ROLE_USER";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Article {
    pub id_article: i64,
    pub cover_image: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub title: String,
    pub slug: String,
    pub introduction: Option<String>,
    pub content: String,
    pub id_user: Option<i64>,
    pub author_name: Option<String>,
    pub categories: Vec<i64>,
    pub tags: Vec<String>,
}

/// Field set written by create/update. Categories are `None` when untouched.
#[derive(Debug, Clone, Default)]
pub struct ArticleDraft {
    pub cover_image: Option<String>,
    pub title: String,
    pub slug: String,
    pub introduction: Option<String>,
    pub content: String,
    pub id_user: Option<i64>,
    pub published_at: Option<String>,
    pub tags: Vec<String>,
    pub categories: Option<Vec<i64>>,
}

impl From<&Article> for ArticleDraft {
    fn from(a: &Article) -> Self {
        Self {
            cover_image: a.cover_image.clone(),
            title: a.title.clone(),
            slug: a.slug.clone(),
            introduction: a.introduction.clone(),
            content: a.content.clone(),
            id_user: a.id_user,
            published_at: a.published_at.clone(),
            tags: a.tags.clone(),
            categories: None,
        }
    }
}

/// Tags arrive either as a JSON array or as a string holding a JSON-encoded array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Encoded(String),
}

impl TagsInput {
    /// Non-array encodings are ignored rather than rejected.
    pub fn into_tags(self) -> Vec<String> {
        let raw = match self {
            TagsInput::List(list) => list,
            TagsInput::Encoded(s) => serde_json::from_str::<Vec<String>>(&s).unwrap_or_default(),
        };
        raw.into_iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub introduction: Option<String>,
    pub tags: Option<TagsInput>,
    pub categories: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub introduction: Option<String>,
    pub tags: Option<TagsInput>,
    pub categories: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<i64>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilters {
    pub category: Option<i64>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub avatar: Option<String>,
    pub email_token: Option<String>,
    pub is_verified: bool,
    pub verified_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub avatar: Option<String>,
    pub email_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: Vec<String>,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self { id: u.id, email: u.email.clone(), username: u.username.clone(), role: u.roles.clone() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecaptchaRequest {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_input_shapes() {
        let list: TagsInput = serde_json::from_str(r#"["rust", " web ", ""]"#).unwrap();
        assert_eq!(list.into_tags(), vec!["rust", "web"]);

        let encoded: TagsInput = serde_json::from_str(r#""[\"a\",\"b\"]""#).unwrap();
        assert_eq!(encoded.into_tags(), vec!["a", "b"]);

        let garbage: TagsInput = serde_json::from_str(r#""not json""#).unwrap();
        assert!(garbage.into_tags().is_empty());
    }
}
