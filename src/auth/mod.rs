//! Dashboard authentication.
//!
//! Accounts live in `app_users`, sessions in `sessions`, and the raw session
//! token is kept on the operator's machine by a [`TokenStore`].

pub mod account;
pub mod password;
pub mod session;
pub mod token_store;

pub use account::{Credentials, ProfileUpdate, SignUp, User, INVALID_CREDENTIALS};
pub use token_store::TokenStore;

use sqlx::postgres::PgPool;
use tracing::{debug, info};

use crate::error::{CrmError, Result};

/// Message for commands that need a signed-in user.
pub const NOT_AUTHENTICATED: &str = "Not authenticated. Run `crm auth signin` first.";

/// Sign-in state of this machine against one database.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    store: &'a TokenStore,
    session_ttl_days: i64,
}

impl<'a> AuthService<'a> {
    pub fn new(pool: &'a PgPool, store: &'a TokenStore, session_ttl_days: i64) -> Self {
        Self {
            pool,
            store,
            session_ttl_days,
        }
    }

    async fn open_session(&self, user: &User) -> Result<()> {
        let purged = session::purge_expired_sessions(self.pool).await?;
        if purged > 0 {
            debug!(purged, "Removed expired sessions");
        }
        let token = session::create_session(self.pool, user.id, self.session_ttl_days).await?;
        self.store.save(&token)
    }

    /// Creates an account and signs it in.
    pub async fn sign_up(&self, input: SignUp) -> Result<User> {
        let user = account::create_user(self.pool, &input).await?;
        self.open_session(&user).await?;
        info!(user = %user.email, "Signed up");
        Ok(user)
    }

    pub async fn sign_in(&self, credentials: Credentials) -> Result<User> {
        let user = account::authenticate(self.pool, &credentials).await?;
        self.open_session(&user).await?;
        info!(user = %user.email, "Signed in");
        Ok(user)
    }

    /// Ends the current session on both sides. Returns false when there was none.
    pub async fn sign_out(&self) -> Result<bool> {
        let Some(token) = self.store.load()? else {
            return Ok(false);
        };
        let existed = session::delete_session(self.pool, &token).await?;
        self.store.clear()?;
        info!("Signed out");
        Ok(existed)
    }

    /// The signed-in user, if the stored token maps to a live session.
    pub async fn current_user(&self) -> Result<Option<User>> {
        let Some(token) = self.store.load()? else {
            debug!("No stored session token");
            return Ok(None);
        };
        session::find_session_user(self.pool, &token).await
    }

    pub async fn require_user(&self) -> Result<User> {
        self.current_user()
            .await?
            .ok_or_else(|| CrmError::auth(NOT_AUTHENTICATED))
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        let user = self.require_user().await?;
        account::update_profile(self.pool, user.id, &update).await
    }
}
