//! Generic persistence accessor.
//!
//! [`Repository`] is CRUD over one [`Record`] type. [`PgRepository`] derives
//! its SQL from the record's table and column lists, so adding an entity only
//! needs a `Record` impl and a migration.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::db::models::{Item, User};
use crate::Result;

pub type PgQueryAs<'q, T> = QueryAs<'q, Postgres, T, PgArguments>;

/// A persisted entity with identity and creation time.
pub trait Record:
    Clone + Send + Sync + Unpin + Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + 'static
{
    const TABLE: &'static str;
    /// Human name used in not-found errors.
    const RESOURCE: &'static str;
    const CACHE_PREFIX: &'static str;
    /// Every column, in `bind_insert` order. The first one must be `id`.
    const COLUMNS: &'static [&'static str];
    /// Columns overwritten by `update`, in `bind_update` order.
    const MUTABLE_COLUMNS: &'static [&'static str];
    const SEARCH_COLUMNS: &'static [&'static str];

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    fn bind_insert<'q>(&'q self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self>;

    fn bind_update<'q>(&'q self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self>;

    /// In-process equivalent of `ILIKE` over `SEARCH_COLUMNS`.
    fn matches_search(&self, needle: &str) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter(Option<String>);

impl SearchFilter {
    pub fn new(term: Option<String>) -> Self {
        Self(term.filter(|t| !t.is_empty()))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn term(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// `ILIKE` pattern with the term's own wildcards escaped.
    pub fn pattern(&self) -> Option<String> {
        self.0.as_deref().map(like_pattern)
    }

    pub fn matches<T: Record>(&self, record: &T) -> bool {
        match self.term() {
            Some(term) => record.matches_search(term),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub skip: i64,
    pub limit: i64,
    pub filter: SearchFilter,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
            filter: SearchFilter::none(),
        }
    }
}

#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<T>>;

    /// Newest first, `skip`/`limit` offset pagination.
    async fn list(&self, query: &ListQuery) -> Result<Vec<T>>;

    async fn count(&self, filter: &SearchFilter) -> Result<i64>;

    async fn create(&self, record: &T) -> Result<T>;

    /// Overwrites the mutable columns. `None` if the row no longer exists.
    async fn update(&self, record: &T) -> Result<Option<T>>;

    /// `false` if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Repository<User> {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait ItemRepository: Repository<Item> {
    /// Ids of the rows removed along with their owner's account.
    async fn ids_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>>;
}

pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub struct PgRepository<T> {
    pool: Arc<PgPool>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for PgRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> PgRepository<T> {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    fn columns() -> String {
        T::COLUMNS.join(", ")
    }

    /// `WHERE` clause and its bound pattern, if the filter applies.
    fn search_clause(filter: &SearchFilter, param: usize) -> Option<(String, String)> {
        if T::SEARCH_COLUMNS.is_empty() {
            return None;
        }
        let pattern = filter.pattern()?;
        let predicates: Vec<String> = T::SEARCH_COLUMNS
            .iter()
            .map(|column| format!("{} ILIKE ${}", column, param))
            .collect();
        Some((format!(" WHERE ({})", predicates.join(" OR ")), pattern))
    }

    fn update_sql() -> String {
        let assignments: Vec<String> = T::MUTABLE_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ${}", column, i + 2))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE id = $1 RETURNING {}",
            T::TABLE,
            assignments.join(", "),
            Self::columns()
        )
    }

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (1..=T::COLUMNS.len()).map(|i| format!("${}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            T::TABLE,
            Self::columns(),
            placeholders.join(", "),
            Self::columns()
        )
    }
}

#[async_trait]
impl<T: Record> Repository<T> for PgRepository<T> {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<T>> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", Self::columns(), T::TABLE);
        let record = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(record)
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<T>> {
        let mut sql = format!("SELECT {} FROM {}", Self::columns(), T::TABLE);
        let search = Self::search_clause(&query.filter, 1);
        let mut next_param = 1;
        if let Some((clause, _)) = &search {
            sql.push_str(clause);
            next_param += 1;
        }
        sql.push_str(&format!(
            " ORDER BY created_at DESC OFFSET ${} LIMIT ${}",
            next_param,
            next_param + 1
        ));

        let mut statement = sqlx::query_as::<_, T>(&sql);
        if let Some((_, pattern)) = search {
            statement = statement.bind(pattern);
        }
        let records = statement
            .bind(query.skip)
            .bind(query.limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(records)
    }

    async fn count(&self, filter: &SearchFilter) -> Result<i64> {
        let mut sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let search = Self::search_clause(filter, 1);
        if let Some((clause, _)) = &search {
            sql.push_str(clause);
        }

        let mut statement = sqlx::query_scalar::<_, i64>(&sql);
        if let Some((_, pattern)) = search {
            statement = statement.bind(pattern);
        }
        let total = statement.fetch_one(self.pool.as_ref()).await?;

        Ok(total)
    }

    async fn create(&self, record: &T) -> Result<T> {
        let sql = Self::insert_sql();
        let mut transaction = self.pool.begin().await?;

        let created = record
            .bind_insert(sqlx::query_as::<_, T>(&sql))
            .fetch_one(&mut *transaction)
            .await?;

        transaction.commit().await?;
        Ok(created)
    }

    async fn update(&self, record: &T) -> Result<Option<T>> {
        let sql = Self::update_sql();
        let updated = record
            .bind_update(sqlx::query_as::<_, T>(&sql).bind(record.id()))
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgRepository<User> {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", Self::columns());
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl ItemRepository for PgRepository<Item> {
    async fn ids_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM items WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(ids)
    }
}
