//! Postgres persistence.
//!
//! Owns the connection pool and migrations, and exposes the generic
//! repository the services are written against.

#[cfg(any(test, feature = "test-support"))]
mod memory;
#[cfg(test)]
pub(crate) mod mock;
pub mod models;
pub mod repository;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::health::Backend;
use crate::Result;

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryRepository;
pub use models::{Item, User};
pub use repository::{
    ItemRepository, ListQuery, PgRepository, Record, Repository, SearchFilter, UserRepository,
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Handle on the shared connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Build the pool without opening a connection. The first query
    /// establishes one, so the process can start while Postgres is down.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy(&config.url)?;

        info!(max_connections = config.max_connections, "database pool created");
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(self.pool.as_ref()).await?;
        info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Backend for Database {
    async fn ping(&self) -> bool {
        match sqlx::query("SELECT 1").execute(self.pool.as_ref()).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "database ping failed");
                false
            }
        }
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}
