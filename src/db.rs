use sqlx::SqlitePool;

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance (best-effort)
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }
    // Foreign keys are critical - fail if this doesn't work
    sqlx::query("PRAGMA foreign_keys=ON;").execute(pool).await?;
    if let Err(e) = sqlx::query("PRAGMA busy_timeout=10000;").execute(pool).await {
        tracing::warn!("Failed to set busy_timeout: {}", e);
    }

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
            id_user INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT '["ROLE_USER"]',
            avatar TEXT NULL,
            email_token TEXT NULL,
            is_verified INTEGER NOT NULL DEFAULT 0,
            verified_at TEXT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%S','now'))
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS categories (
            id_categories INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS article (
            id_article INTEGER PRIMARY KEY AUTOINCREMENT,
            cover_image TEXT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            introduction TEXT NULL,
            content TEXT NOT NULL,
            id_user INTEGER NULL,
            tags TEXT NULL,
            published_at TEXT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%S','now')),
            FOREIGN KEY(id_user) REFERENCES users(id_user) ON DELETE SET NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS articles_categories (
            id_article INTEGER NOT NULL,
            id_categories INTEGER NOT NULL,
            PRIMARY KEY (id_article, id_categories),
            FOREIGN KEY(id_article) REFERENCES article(id_article) ON DELETE CASCADE,
            FOREIGN KEY(id_categories) REFERENCES categories(id_categories) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_users_email_token", "CREATE INDEX IF NOT EXISTS idx_users_email_token ON users(email_token)"),
        ("idx_article_published", "CREATE INDEX IF NOT EXISTS idx_article_published ON article(published_at DESC)"),
        ("idx_article_user", "CREATE INDEX IF NOT EXISTS idx_article_user ON article(id_user)"),
        ("idx_ac_category", "CREATE INDEX IF NOT EXISTS idx_ac_category ON articles_categories(id_categories)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            tracing::warn!("Failed to create index {}: {}", name, e);
        }
    }

    Ok(())
}
