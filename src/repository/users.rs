use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{json_list, now_timestamp};
use crate::types::{NewUser, User};

const USER_COLUMNS: &str =
    "id_user, username, email, password_hash, role, avatar, email_token, is_verified, verified_at, created_at";

fn map_user(r: SqliteRow) -> User {
    User {
        id: r.get::<i64, _>("id_user"),
        username: r.get::<String, _>("username"),
        email: r.get::<String, _>("email"),
        password_hash: r.get::<String, _>("password_hash"),
        roles: json_list(r.get::<Option<String>, _>("role")),
        avatar: r.get::<Option<String>, _>("avatar"),
        email_token: r.get::<Option<String>, _>("email_token"),
        is_verified: r.get::<i64, _>("is_verified") != 0,
        verified_at: r.get::<Option<String>, _>("verified_at"),
        created_at: r.get::<String, _>("created_at"),
    }
}

async fn find_one(pool: &SqlitePool, column: &str, value: &str) -> sqlx::Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1 LIMIT 1", USER_COLUMNS, column);
    let row = sqlx::query(&sql).bind(value).fetch_optional(pool).await?;
    Ok(row.map(map_user))
}

/// Inserts an unverified user and returns its id.
pub async fn save(pool: &SqlitePool, user: &NewUser) -> sqlx::Result<i64> {
    let roles = serde_json::to_string(&user.roles).unwrap_or_else(|_| "[]".to_string());
    let res = sqlx::query(
        r#"INSERT INTO users (username, email, password_hash, role, avatar, email_token, is_verified, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)"#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(roles)
    .bind(&user.avatar)
    .bind(&user.email_token)
    .bind(now_timestamp())
    .execute(pool)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
    find_one(pool, "email", email).await
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
    find_one(pool, "username", username).await
}

pub async fn find_by_token(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<User>> {
    find_one(pool, "email_token", token).await
}

/// Flags the account verified and burns the email token.
pub async fn mark_verified(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET is_verified = 1, email_token = NULL, verified_at = ?1 WHERE id_user = ?2")
        .bind(now_timestamp())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
