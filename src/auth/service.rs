use std::sync::Arc;

use tracing::{info, warn};

use super::security::{verify_password, TokenManager};
use crate::db::UserRepository;
use crate::error::AuthError;
use crate::Result;

/// Exchanges email/password credentials for a bearer token.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenManager>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenManager>) -> Self {
        Self { users, tokens }
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String> {
        let Some(user) = self.users.get_by_email(email).await? else {
            warn!(email = %email, reason = "unknown_email", "authentication failed");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_password(password, &user.hashed_password) {
            warn!(email = %email, reason = "bad_password", "authentication failed");
            return Err(AuthError::InvalidCredentials.into());
        }

        if !user.is_active {
            warn!(email = %email, reason = "inactive", "authentication failed");
            return Err(AuthError::AccountDisabled.into());
        }

        let token = self.tokens.issue(&user.email, None)?;
        info!(user_id = %user.id, "user authenticated");
        Ok(token)
    }
}
