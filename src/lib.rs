pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod health;
pub mod items;
pub mod pagination;
pub mod telemetry;
pub mod users;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use tracing::{error, info};

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

use auth::{AuthService, TokenManager};
use cache::{CacheAside, CacheStore};
use db::{Database, Item, ItemRepository, PgRepository, User, UserRepository};
use health::Backend;
use items::ItemService;
use users::UserService;

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub tokens: Arc<TokenManager>,
    pub auth_service: Arc<AuthService>,
    pub user_service: UserService,
    pub item_service: ItemService,
    pub database: Arc<dyn Backend>,
    pub cache: Option<Arc<dyn CacheStore>>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let database = Database::connect_lazy(&config.database)?;
        if config.database.run_migrations {
            // The pool is lazy, so an unreachable database surfaces here.
            if let Err(e) = database.migrate().await {
                error!(error = %e, "database migrations failed");
            }
        }

        let cache = cache::connect(&config.cache).await;

        let users: Arc<dyn UserRepository> = Arc::new(PgRepository::<User>::new(database.pool()));
        let items: Arc<dyn ItemRepository> = Arc::new(PgRepository::<Item>::new(database.pool()));

        Self::from_parts(config, users, items, Arc::new(database), cache)
    }

    /// Wire services over already-built persistence and cache handles.
    pub fn from_parts(
        config: Settings,
        users: Arc<dyn UserRepository>,
        items: Arc<dyn ItemRepository>,
        database: Arc<dyn Backend>,
        cache: Option<Arc<dyn CacheStore>>,
    ) -> Result<Self> {
        let tokens = Arc::new(TokenManager::from_config(&config.auth)?);
        let ttl = Duration::from_secs(config.cache.default_ttl_secs);

        let auth_service = Arc::new(AuthService::new(users.clone(), tokens.clone()));
        let item_service = ItemService::new(items, CacheAside::new(cache.clone(), ttl));
        let user_service = UserService::new(users, CacheAside::new(cache.clone(), ttl))
            .with_owned_items(item_service.clone());

        Ok(Self {
            config: Arc::new(config),
            tokens,
            auth_service,
            user_service,
            item_service,
            database,
            cache,
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        if let Some(cache) = &self.cache {
            cache.close().await;
        }
        self.database.close().await;
        info!("application state shut down");
        Ok(())
    }
}

/// Register every route plus the extractor configs that turn malformed
/// input into validation errors.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::validation("body", err.to_string()).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| {
        AppError::validation("form", err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::validation("query", err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::validation("path", err.to_string()).into()
    }))
    .route("/health", web::get().to(health::health_check))
    .route("/health/live", web::get().to(health::liveness_check))
    .route("/health/ready", web::get().to(health::readiness_check))
    .service(
        web::scope("/api/v1")
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth::handlers::login))
                    .route("/token", web::post().to(auth::handlers::token)),
            )
            .service(
                web::scope("/users")
                    .route("", web::get().to(users::handlers::list_users))
                    .route("", web::post().to(users::handlers::create_user))
                    // must precede "/{id}"
                    .route("/me", web::get().to(users::handlers::read_current_user))
                    .route("/{id}", web::get().to(users::handlers::get_user))
                    .route("/{id}", web::put().to(users::handlers::update_user))
                    .route("/{id}", web::delete().to(users::handlers::delete_user)),
            )
            .service(
                web::scope("/items")
                    .route("", web::get().to(items::handlers::list_items))
                    .route("", web::post().to(items::handlers::create_item))
                    .route("/{id}", web::get().to(items::handlers::get_item))
                    .route("/{id}", web::put().to(items::handlers::update_item))
                    .route("/{id}", web::delete().to(items::handlers::delete_item)),
            ),
    );
}
