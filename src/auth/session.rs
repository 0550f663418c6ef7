//! Server-side sessions.
//!
//! Only a SHA-256 of the token is stored; the raw token never leaves the client.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::account::User;
use crate::error::{CrmError, Result};

/// Random bytes in a session token.
pub const TOKEN_BYTES: usize = 32;

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lower-case hex SHA-256 of the token.
pub fn hash_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Opens a session for `user_id` and returns the raw token.
pub async fn create_session(pool: &PgPool, user_id: Uuid, ttl_days: i64) -> Result<String> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::days(ttl_days.max(1));

    sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(hash_token(&token))
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(|e| CrmError::query(format!("Failed to create session: {e}")))?;

    Ok(token)
}

/// The user owning an unexpired session, if any.
pub async fn find_session_user(pool: &PgPool, token: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.email, u.first_name, u.last_name, u.image_url, u.created_at
        FROM sessions s
        JOIN app_users u ON u.id = s.user_id
        WHERE s.token_hash = $1 AND s.expires_at > now()
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to look up session: {e}")))
}

/// Deletes the session; returns whether one existed.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(hash_token(token))
        .execute(pool)
        .await
        .map_err(|e| CrmError::query(format!("Failed to delete session: {e}")))?;
    Ok(result.rows_affected() > 0)
}

pub async fn purge_expired_sessions(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
        .execute(pool)
        .await
        .map_err(|e| CrmError::query(format!("Failed to purge sessions: {e}")))?;
    Ok(result.rows_affected())
}
