use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::repository::{contains_ignore_case, PgQueryAs, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, name: String, hashed_password: String, is_active: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            hashed_password,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Record for User {
    const TABLE: &'static str = "users";
    const RESOURCE: &'static str = "User";
    const CACHE_PREFIX: &'static str = "user";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "email",
        "name",
        "hashed_password",
        "is_active",
        "created_at",
        "updated_at",
    ];
    const MUTABLE_COLUMNS: &'static [&'static str] =
        &["email", "name", "hashed_password", "is_active", "updated_at"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["email", "name"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn bind_insert<'q>(&'q self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.id)
            .bind(&self.email)
            .bind(&self.name)
            .bind(&self.hashed_password)
            .bind(self.is_active)
            .bind(self.created_at)
            .bind(self.updated_at)
    }

    fn bind_update<'q>(&'q self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(&self.email)
            .bind(&self.name)
            .bind(&self.hashed_password)
            .bind(self.is_active)
            .bind(self.updated_at)
    }

    fn matches_search(&self, needle: &str) -> bool {
        contains_ignore_case(&self.email, needle) || contains_ignore_case(&self.name, needle)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub is_available: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(
        name: String,
        description: Option<String>,
        price: f64,
        is_available: bool,
        owner_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            price,
            is_available,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Record for Item {
    const TABLE: &'static str = "items";
    const RESOURCE: &'static str = "Item";
    const CACHE_PREFIX: &'static str = "item";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "price",
        "is_available",
        "owner_id",
        "created_at",
        "updated_at",
    ];
    const MUTABLE_COLUMNS: &'static [&'static str] =
        &["name", "description", "price", "is_available", "updated_at"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "description"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn bind_insert<'q>(&'q self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.id)
            .bind(&self.name)
            .bind(&self.description)
            .bind(self.price)
            .bind(self.is_available)
            .bind(self.owner_id)
            .bind(self.created_at)
            .bind(self.updated_at)
    }

    fn bind_update<'q>(&'q self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(&self.name)
            .bind(&self.description)
            .bind(self.price)
            .bind(self.is_available)
            .bind(self.updated_at)
    }

    fn matches_search(&self, needle: &str) -> bool {
        contains_ignore_case(&self.name, needle)
            || self
                .description
                .as_deref()
                .map_or(false, |d| contains_ignore_case(d, needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new(
            "test@example.com".into(),
            "Test User".into(),
            "hash".into(),
            true,
        );

        assert_eq!(user.email, "test@example.com");
        assert!(user.is_active);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_touch_moves_updated_at_forward() {
        let mut item = Item::new("Widget".into(), None, 1.0, true, Uuid::new_v4());
        let before = item.updated_at;
        item.touch();
        assert!(item.updated_at >= before);
        assert_eq!(item.created_at, before);
    }

    #[test]
    fn test_bound_columns_match_declared_columns() {
        // insert binds every column, update binds id plus the mutable ones
        assert_eq!(User::COLUMNS.len(), 7);
        assert_eq!(User::MUTABLE_COLUMNS.len(), 5);
        assert_eq!(Item::COLUMNS.len(), 8);
        assert_eq!(Item::MUTABLE_COLUMNS.len(), 5);
        assert!(!Item::MUTABLE_COLUMNS.contains(&"owner_id"));
    }

    #[test]
    fn test_search_matches_any_text_field_case_insensitively() {
        let item = Item::new(
            "Blue Widget".into(),
            Some("Made of STEEL".into()),
            3.5,
            true,
            Uuid::new_v4(),
        );
        assert!(item.matches_search("widget"));
        assert!(item.matches_search("steel"));
        assert!(!item.matches_search("copper"));

        let bare = Item::new("Gadget".into(), None, 1.0, true, Uuid::new_v4());
        assert!(!bare.matches_search("steel"));

        let user = User::new("Ada@Example.com".into(), "Ada".into(), "h".into(), true);
        assert!(user.matches_search("example"));
        assert!(user.matches_search("ADA"));
    }

    #[test]
    fn test_user_snapshot_round_trips_through_json() {
        let user = User::new("a@x.com".into(), "A".into(), "$argon2id$...".into(), false);
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}
