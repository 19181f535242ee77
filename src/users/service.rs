use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::security::hash_password;
use crate::cache::CacheAside;
use crate::db::{ListQuery, Record, SearchFilter, User, UserRepository};
use crate::error::AppError;
use crate::items::ItemService;
use crate::validation::{require_email, require_length, require_min_length};
use crate::Result;

const NAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 8;

fn default_active() -> bool {
    true
}

/// Signup payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        require_email("email", &self.email)?;
        require_length("name", &self.name, 1, NAME_MAX)?;
        require_min_length("password", &self.password, PASSWORD_MIN)
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(email) = &self.email {
            require_email("email", email)?;
        }
        if let Some(name) = &self.name {
            require_length("name", name, 1, NAME_MAX)?;
        }
        if let Some(password) = &self.password {
            require_min_length("password", password, PASSWORD_MIN)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    cache: CacheAside<User>,
    items: Option<ItemService>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, cache: CacheAside<User>) -> Self {
        Self {
            repo,
            cache,
            items: None,
        }
    }

    /// Items go with their owner, so deleting a user also evicts their
    /// cached copies.
    pub fn with_owned_items(mut self, items: ItemService) -> Self {
        self.items = Some(items);
        self
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        if let Some(user) = self.cache.get(id).await {
            return Ok(user);
        }

        let user = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(User::RESOURCE, id))?;

        self.cache.put(&user).await;
        Ok(user)
    }

    /// Looks the user up in persistence, never in the cache.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.repo.get_by_email(email).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found(User::RESOURCE, email))
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<User>> {
        self.repo.list(query).await
    }

    pub async fn count(&self, filter: &SearchFilter) -> Result<i64> {
        self.repo.count(filter).await
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;
        self.ensure_email_available(&new_user.email).await?;

        let hashed_password = hash_password(&new_user.password)?;
        let user = User::new(
            new_user.email,
            new_user.name,
            hashed_password,
            new_user.is_active,
        );

        let user = self.repo.create(&user).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User> {
        patch.validate()?;
        let mut user = self.get_by_id(id).await?;

        if let Some(email) = patch.email {
            if email != user.email {
                self.ensure_email_available(&email).await?;
            }
            user.email = email;
        }
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(password) = patch.password {
            user.hashed_password = hash_password(&password)?;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        user.touch();

        let updated = self.repo.update(&user).await?;
        self.cache.invalidate(id).await;

        let updated = updated.ok_or_else(|| AppError::not_found(User::RESOURCE, id))?;
        info!(user_id = %id, "user updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.get_by_id(id).await?;

        // collected first, the cascade removes the rows
        let owned = match &self.items {
            Some(items) => items.ids_by_owner(id).await?,
            None => Vec::new(),
        };

        let deleted = self.repo.delete(id).await?;
        self.cache.invalidate(id).await;
        if let Some(items) = &self.items {
            items.evict(&owned).await;
        }

        if !deleted {
            return Err(AppError::not_found(User::RESOURCE, id));
        }
        info!(user_id = %id, items = owned.len(), "user deleted");
        Ok(())
    }

    async fn ensure_email_available(&self, email: &str) -> Result<()> {
        if self.repo.get_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                email
            )));
        }
        Ok(())
    }
}
