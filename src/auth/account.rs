//! Dashboard user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

use super::password::{dummy_hash, hash_password, verify_password};
use crate::error::{CrmError, Result};
use crate::records::validation::{non_blank, require_email, require_min_len};

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Returned for any failed sign-in, whether the email or the password was wrong.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// A dashboard user, without the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SignUp {
    pub fn validate(&self) -> Result<()> {
        require_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CrmError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        require_min_len("Name", &self.name, 2)
    }

    /// First word is the first name, the rest the last name.
    pub fn split_name(&self) -> (String, String) {
        let name = self.name.trim();
        match name.split_once(char::is_whitespace) {
            Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
            None => (name.to_string(), String::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image_url: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<()> {
        require_min_len("First name", &self.first_name, 2)?;
        require_min_len("Last name", &self.last_name, 2)?;
        require_email(&self.email)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .is_some_and(|code| code == "23505")
}

pub async fn create_user(pool: &PgPool, input: &SignUp) -> Result<User> {
    input.validate()?;
    let (first_name, last_name) = input.split_name();

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO app_users (email, first_name, last_name, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, first_name, last_name, image_url, created_at
        "#,
    )
    .bind(normalize_email(&input.email))
    .bind(first_name)
    .bind(last_name)
    .bind(hash_password(&input.password))
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            CrmError::validation("User already exists")
        } else {
            CrmError::query(format!("Failed to create user: {e}"))
        }
    })
}

#[derive(FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// The user matching the credentials, or an `Auth` error.
pub async fn authenticate(pool: &PgPool, credentials: &Credentials) -> Result<User> {
    let row = sqlx::query_as::<_, UserWithHash>(
        r#"
        SELECT id, email, first_name, last_name, image_url, created_at, password_hash
        FROM app_users
        WHERE email = $1
        "#,
    )
    .bind(normalize_email(&credentials.email))
    .fetch_optional(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to look up user: {e}")))?;

    let stored = row.as_ref().map(|r| r.password_hash.as_str());
    if !password_matches(&credentials.password, stored) {
        return Err(CrmError::auth(INVALID_CREDENTIALS));
    }
    row.map(|r| r.user)
        .ok_or_else(|| CrmError::auth(INVALID_CREDENTIALS))
}

/// Unknown users are checked against a dummy hash so they take as long as
/// a wrong password.
fn password_matches(password: &str, stored: Option<&str>) -> bool {
    let verified = verify_password(password, stored.unwrap_or_else(|| dummy_hash()));
    verified && stored.is_some()
}

pub async fn update_profile(pool: &PgPool, user_id: Uuid, update: &ProfileUpdate) -> Result<User> {
    update.validate()?;

    sqlx::query_as::<_, User>(
        r#"
        UPDATE app_users
        SET first_name = $2, last_name = $3, email = $4, image_url = $5, updated_at = now()
        WHERE id = $1
        RETURNING id, email, first_name, last_name, image_url, created_at
        "#,
    )
    .bind(user_id)
    .bind(update.first_name.trim())
    .bind(update.last_name.trim())
    .bind(normalize_email(&update.email))
    .bind(non_blank(update.image_url.clone()))
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            CrmError::validation("Email is already in use")
        } else {
            CrmError::query(format!("Failed to update profile: {e}"))
        }
    })?
    .ok_or_else(|| CrmError::not_found(format!("User {user_id}")))
}
