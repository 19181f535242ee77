use async_trait::async_trait;
use mockall::mock;
use uuid::Uuid;

use super::models::{Item, User};
use super::repository::{ItemRepository, ListQuery, Repository, SearchFilter, UserRepository};
use crate::Result;

mock! {
    pub UserRepo {}

    #[async_trait]
    impl Repository<User> for UserRepo {
        async fn get_by_id(&self, id: Uuid) -> Result<Option<User>>;
        async fn list(&self, query: &ListQuery) -> Result<Vec<User>>;
        async fn count(&self, filter: &SearchFilter) -> Result<i64>;
        async fn create(&self, record: &User) -> Result<User>;
        async fn update(&self, record: &User) -> Result<Option<User>>;
        async fn delete(&self, id: Uuid) -> Result<bool>;
    }

    #[async_trait]
    impl UserRepository for UserRepo {
        async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
    }
}

mock! {
    pub ItemRepo {}

    #[async_trait]
    impl Repository<Item> for ItemRepo {
        async fn get_by_id(&self, id: Uuid) -> Result<Option<Item>>;
        async fn list(&self, query: &ListQuery) -> Result<Vec<Item>>;
        async fn count(&self, filter: &SearchFilter) -> Result<i64>;
        async fn create(&self, record: &Item) -> Result<Item>;
        async fn update(&self, record: &Item) -> Result<Option<Item>>;
        async fn delete(&self, id: Uuid) -> Result<bool>;
    }

    #[async_trait]
    impl ItemRepository for ItemRepo {
        async fn ids_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>>;
    }
}
