use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tracing::info;
use uuid::Uuid;

use crate::cache::CacheAside;
use crate::db::{Item, ItemRepository, ListQuery, Record, SearchFilter};
use crate::error::AppError;
use crate::validation::{require_length, require_non_negative};
use crate::Result;

const NAME_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 2000;

fn default_available() -> bool {
    true
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_description(description: Option<&str>) -> Result<()> {
    match description {
        Some(text) => require_length("description", text, 0, DESCRIPTION_MAX),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

impl NewItem {
    pub fn validate(&self) -> Result<()> {
        require_length("name", &self.name, 1, NAME_MAX)?;
        validate_description(self.description.as_deref())?;
        require_non_negative("price", self.price)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub is_available: Option<bool>,
}

impl ItemPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_length("name", name, 1, NAME_MAX)?;
        }
        if let Some(description) = &self.description {
            validate_description(description.as_deref())?;
        }
        if let Some(price) = self.price {
            require_non_negative("price", price)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ItemService {
    repo: Arc<dyn ItemRepository>,
    cache: CacheAside<Item>,
}

impl ItemService {
    pub fn new(repo: Arc<dyn ItemRepository>, cache: CacheAside<Item>) -> Self {
        Self { repo, cache }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Item> {
        if let Some(item) = self.cache.get(id).await {
            return Ok(item);
        }

        let item = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(Item::RESOURCE, id))?;

        self.cache.put(&item).await;
        Ok(item)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Item>> {
        self.repo.list(query).await
    }

    pub async fn count(&self, filter: &SearchFilter) -> Result<i64> {
        self.repo.count(filter).await
    }

    /// The owner is always the authenticated caller.
    pub async fn create(&self, new_item: NewItem, owner_id: Uuid) -> Result<Item> {
        new_item.validate()?;

        let item = Item::new(
            new_item.name,
            new_item.description,
            new_item.price,
            new_item.is_available,
            owner_id,
        );

        let item = self.repo.create(&item).await?;
        info!(item_id = %item.id, owner_id = %owner_id, "item created");
        Ok(item)
    }

    pub async fn update(&self, id: Uuid, patch: ItemPatch) -> Result<Item> {
        patch.validate()?;
        let mut item = self.get_by_id(id).await?;

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        if let Some(is_available) = patch.is_available {
            item.is_available = is_available;
        }
        item.touch();

        let updated = self.repo.update(&item).await?;
        self.cache.invalidate(id).await;

        let updated = updated.ok_or_else(|| AppError::not_found(Item::RESOURCE, id))?;
        info!(item_id = %id, "item updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.get_by_id(id).await?;

        let deleted = self.repo.delete(id).await?;
        self.cache.invalidate(id).await;

        if !deleted {
            return Err(AppError::not_found(Item::RESOURCE, id));
        }
        info!(item_id = %id, "item deleted");
        Ok(())
    }

    pub async fn ids_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>> {
        self.repo.ids_by_owner(owner_id).await
    }

    /// Drops cached copies of rows the database removed on its own.
    pub async fn evict(&self, ids: &[Uuid]) {
        for id in ids {
            self.cache.invalidate(*id).await;
        }
    }
}
