use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use super::models::{Item, User};
use super::repository::{
    ItemRepository, ListQuery, Record, Repository, SearchFilter, UserRepository,
};
use crate::health::Backend;
use crate::Result;

type DeleteHook = Arc<dyn Fn(Uuid) + Send + Sync>;

/// In-process repository used by tests in place of Postgres.
pub struct MemoryRepository<T> {
    records: RwLock<HashMap<Uuid, T>>,
    on_delete: Option<DeleteHook>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            on_delete: None,
        }
    }
}

impl<T: Record> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `hook` with the id of every deleted row, the way a foreign key
    /// with `ON DELETE CASCADE` reacts to the parent row going away.
    pub fn on_delete(mut self, hook: impl Fn(Uuid) + Send + Sync + 'static) -> Self {
        self.on_delete = Some(Arc::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, filter: &SearchFilter) -> Vec<T> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<T> = records
            .values()
            .filter(|record| filter.matches(*record))
            .cloned()
            .collect();
        found.sort_by_key(|record| std::cmp::Reverse(record.created_at()));
        found
    }
}

#[async_trait]
impl<T: Record> Repository<T> for MemoryRepository<T> {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<T>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(&id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<T>> {
        let skip = usize::try_from(query.skip).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        Ok(self
            .matching(&query.filter)
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn count(&self, filter: &SearchFilter) -> Result<i64> {
        Ok(self.matching(filter).len() as i64)
    }

    async fn create(&self, record: &T) -> Result<T> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.id(), record.clone());
        Ok(record.clone())
    }

    async fn update(&self, record: &T) -> Result<Option<T>> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.get_mut(&record.id()) {
            Some(existing) => {
                *existing = record.clone();
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let removed = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();

        if removed {
            if let Some(hook) = &self.on_delete {
                hook(id);
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl<T: Record> Backend for MemoryRepository<T> {
    async fn ping(&self) -> bool {
        true
    }
}

#[async_trait]
impl UserRepository for MemoryRepository<User> {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.values().find(|user| user.email == email).cloned())
    }
}

impl MemoryRepository<Item> {
    /// Drops every item owned by `owner_id`, returning how many went.
    pub fn remove_owned_by(&self, owner_id: Uuid) -> usize {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|_, item| item.owner_id != owner_id);
        before - records.len()
    }
}

#[async_trait]
impl ItemRepository for MemoryRepository<Item> {
    async fn ids_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .values()
            .filter(|item| item.owner_id == owner_id)
            .map(|item| item.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item_at(name: &str, minutes_ago: i64) -> Item {
        let mut item = Item::new(name.into(), None, 1.0, true, Uuid::new_v4());
        item.created_at = item.created_at - Duration::minutes(minutes_ago);
        item
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paginated() {
        let repo: MemoryRepository<Item> = MemoryRepository::new();
        for (name, age) in [("old", 30), ("newest", 0), ("middle", 10)] {
            repo.create(&item_at(name, age)).await.unwrap();
        }

        let all = repo.list(&ListQuery::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["newest", "middle", "old"]);

        let page = repo
            .list(&ListQuery {
                skip: 1,
                limit: 1,
                filter: SearchFilter::none(),
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "middle");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_record() {
        let repo: MemoryRepository<Item> = MemoryRepository::new();
        let ghost = item_at("ghost", 0);

        assert!(repo.update(&ghost).await.unwrap().is_none());
        assert!(!repo.delete(ghost.id).await.unwrap());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_count_honours_search() {
        let repo: MemoryRepository<Item> = MemoryRepository::new();
        repo.create(&item_at("Red Widget", 0)).await.unwrap();
        repo.create(&item_at("Blue Gadget", 1)).await.unwrap();

        let filter = SearchFilter::new(Some("widget".into()));
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
        assert_eq!(repo.count(&SearchFilter::none()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_deleting_owner_cascades_to_items() {
        let items: Arc<MemoryRepository<Item>> = Arc::new(MemoryRepository::new());
        let cascade = items.clone();
        let users: MemoryRepository<User> =
            MemoryRepository::new().on_delete(move |id| {
                cascade.remove_owned_by(id);
            });

        let owner = User::new("a@x.com".into(), "A".into(), "hash".into(), true);
        let other = User::new("b@x.com".into(), "B".into(), "hash".into(), true);
        users.create(&owner).await.unwrap();
        users.create(&other).await.unwrap();

        let mine = Item::new("Mine".into(), None, 1.0, true, owner.id);
        let theirs = Item::new("Theirs".into(), None, 1.0, true, other.id);
        items.create(&mine).await.unwrap();
        items.create(&theirs).await.unwrap();
        assert_eq!(items.ids_by_owner(owner.id).await.unwrap(), vec![mine.id]);

        assert!(users.delete(owner.id).await.unwrap());

        assert!(items.get_by_id(mine.id).await.unwrap().is_none());
        assert!(items.get_by_id(theirs.id).await.unwrap().is_some());
        assert!(items.ids_by_owner(owner.id).await.unwrap().is_empty());
    }
}
