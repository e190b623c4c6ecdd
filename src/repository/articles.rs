use sqlx::{sqlite::SqliteRow, Row, Sqlite, SqlitePool, Transaction};

use super::{json_list, now_timestamp};
use crate::types::{Article, ArticleDraft, ArticleFilters};

const SELECT_ARTICLE: &str = r#"SELECT a.id_article, a.cover_image, a.title, a.slug, a.introduction, a.content,
       a.id_user, a.tags, a.published_at, a.created_at, u.username AS author_name
  FROM article a
  LEFT JOIN users u ON u.id_user = a.id_user"#;

fn map_article(r: &SqliteRow) -> Article {
    Article {
        id_article: r.get::<i64, _>("id_article"),
        cover_image: r.get::<Option<String>, _>("cover_image"),
        published_at: r.get::<Option<String>, _>("published_at"),
        created_at: r.get::<String, _>("created_at"),
        title: r.get::<String, _>("title"),
        slug: r.get::<String, _>("slug"),
        introduction: r.get::<Option<String>, _>("introduction"),
        content: r.get::<String, _>("content"),
        id_user: r.get::<Option<i64>, _>("id_user"),
        author_name: r.get::<Option<String>, _>("author_name"),
        categories: Vec::new(),
        tags: json_list(r.get::<Option<String>, _>("tags")),
    }
}

fn tags_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

async fn category_ids(pool: &SqlitePool, id: i64) -> sqlx::Result<Vec<i64>> {
    let rows = sqlx::query("SELECT id_categories FROM articles_categories WHERE id_article = ?1 ORDER BY id_categories")
        .bind(id)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(|r| r.get::<i64, _>("id_categories")).collect())
}

/// Links only categories that exist; unknown ids are skipped.
async fn link_categories(tx: &mut Transaction<'_, Sqlite>, id: i64, categories: &[i64]) -> sqlx::Result<()> {
    for cat in categories {
        sqlx::query(
            r#"INSERT OR IGNORE INTO articles_categories (id_article, id_categories)
               SELECT ?1, id_categories FROM categories WHERE id_categories = ?2"#,
        )
        .bind(id)
        .bind(cat)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn fetch_one_where(pool: &SqlitePool, clause: &str, value: impl ToString) -> sqlx::Result<Option<Article>> {
    let sql = format!("{} WHERE {} LIMIT 1", SELECT_ARTICLE, clause);
    let Some(row) = sqlx::query(&sql).bind(value.to_string()).fetch_optional(pool).await? else {
        return Ok(None);
    };
    let mut article = map_article(&row);
    article.categories = category_ids(pool, article.id_article).await?;
    Ok(Some(article))
}

pub async fn get_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Article>> {
    fetch_one_where(pool, "a.id_article = CAST(?1 AS INTEGER)", id).await
}

pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> sqlx::Result<Option<Article>> {
    fetch_one_where(pool, "a.slug = ?1", slug).await
}

pub async fn slug_exists(pool: &SqlitePool, slug: &str) -> sqlx::Result<bool> {
    let row = sqlx::query("SELECT 1 FROM article WHERE slug = ?1 LIMIT 1").bind(slug).fetch_optional(pool).await?;
    Ok(row.is_some())
}

/// Inserts the article and its category links in one transaction.
pub async fn create(pool: &SqlitePool, draft: &ArticleDraft) -> sqlx::Result<i64> {
    let mut tx = pool.begin().await?;
    let res = sqlx::query(
        r#"INSERT INTO article (cover_image, title, slug, introduction, content, id_user, tags, published_at, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
    )
    .bind(&draft.cover_image)
    .bind(&draft.title)
    .bind(&draft.slug)
    .bind(&draft.introduction)
    .bind(&draft.content)
    .bind(draft.id_user)
    .bind(tags_json(&draft.tags))
    .bind(&draft.published_at)
    .bind(now_timestamp())
    .execute(&mut *tx)
    .await?;
    let id = res.last_insert_rowid();

    if let Some(categories) = &draft.categories {
        link_categories(&mut tx, id, categories).await?;
    }
    tx.commit().await?;
    Ok(id)
}

/// Rewrites the article row; when `draft.categories` is set the links are replaced
/// in the same transaction. Returns false if the row is gone.
pub async fn update(pool: &SqlitePool, id: i64, draft: &ArticleDraft) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;
    let res = sqlx::query(
        r#"UPDATE article
              SET cover_image = ?1, title = ?2, slug = ?3, introduction = ?4, content = ?5, tags = ?6
            WHERE id_article = ?7"#,
    )
    .bind(&draft.cover_image)
    .bind(&draft.title)
    .bind(&draft.slug)
    .bind(&draft.introduction)
    .bind(&draft.content)
    .bind(tags_json(&draft.tags))
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if res.rows_affected() == 0 {
        return Ok(false);
    }

    if let Some(categories) = &draft.categories {
        sqlx::query("DELETE FROM articles_categories WHERE id_article = ?1").bind(id).execute(&mut *tx).await?;
        link_categories(&mut tx, id, categories).await?;
    }
    tx.commit().await?;
    Ok(true)
}

/// Removes links then the article. Returns false if nothing was deleted.
pub async fn delete(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM articles_categories WHERE id_article = ?1").bind(id).execute(&mut *tx).await?;
    let res = sqlx::query("DELETE FROM article WHERE id_article = ?1").bind(id).execute(&mut *tx).await?;
    if res.rows_affected() == 0 {
        return Ok(false);
    }
    tx.commit().await?;
    Ok(true)
}

pub async fn set_cover_image(pool: &SqlitePool, id: i64, path: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE article SET cover_image = ?1 WHERE id_article = ?2")
        .bind(path)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// One page of articles, newest first, plus the unpaged total for the same filters.
pub async fn list(
    pool: &SqlitePool,
    filters: &ArticleFilters,
    page: u32,
    per_page: u32,
) -> sqlx::Result<(Vec<Article>, i64)> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut binds: Vec<String> = Vec::new();
    let mut idx = 1;

    if let Some(cat) = filters.category {
        where_sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM articles_categories ac WHERE ac.id_article = a.id_article AND ac.id_categories = CAST(?{} AS INTEGER))",
            idx
        ));
        binds.push(cat.to_string());
        idx += 1;
    }
    if let Some(author) = filters.author.as_deref() {
        where_sql.push_str(&format!(" AND u.username LIKE ?{}", idx));
        binds.push(format!("%{}%", author));
        idx += 1;
    }
    if let Some(date) = filters.date.as_deref() {
        where_sql.push_str(&format!(" AND date(COALESCE(a.published_at, a.created_at)) = ?{}", idx));
        binds.push(date.to_string());
        idx += 1;
    }
    if let Some(tag) = filters.tag.as_deref() {
        where_sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM json_each(COALESCE(a.tags, '[]')) t WHERE t.value = ?{})",
            idx
        ));
        binds.push(tag.to_string());
        idx += 1;
    }

    let count_sql = format!(
        "SELECT COUNT(*) AS total FROM article a LEFT JOIN users u ON u.id_user = a.id_user{}",
        where_sql
    );
    let mut count_q = sqlx::query(&count_sql);
    for b in &binds {
        count_q = count_q.bind(b);
    }
    let total: i64 = count_q.fetch_one(pool).await?.get::<i64, _>("total");

    let page_sql = format!(
        "{}{} ORDER BY COALESCE(a.published_at, a.created_at) DESC, a.id_article DESC LIMIT ?{} OFFSET ?{}",
        SELECT_ARTICLE,
        where_sql,
        idx,
        idx + 1
    );
    let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);
    let mut page_q = sqlx::query(&page_sql);
    for b in &binds {
        page_q = page_q.bind(b);
    }
    let rows = page_q.bind(i64::from(per_page)).bind(offset).fetch_all(pool).await?;

    let mut articles = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut article = map_article(row);
        article.categories = category_ids(pool, article.id_article).await?;
        articles.push(article);
    }
    Ok((articles, total))
}
