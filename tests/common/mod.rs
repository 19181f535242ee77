#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{http::header, test::TestRequest, web};
use serde_json::json;

use crud_server::cache::{CacheStore, MemoryCache};
use crud_server::db::{Item, MemoryRepository, User};
use crud_server::{AppState, Settings};

pub const PASSWORD: &str = "password123";

/// Application state over in-memory persistence and cache.
pub fn memory_state() -> web::Data<AppState> {
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    state_with_cache(Some(cache))
}

pub fn state_with_cache(cache: Option<Arc<dyn CacheStore>>) -> web::Data<AppState> {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let items = Arc::new(MemoryRepository::<Item>::new());
    let cascade = items.clone();
    let users = Arc::new(MemoryRepository::<User>::new().on_delete(move |id| {
        cascade.remove_owned_by(id);
    }));

    let state = AppState::from_parts(config, users.clone(), items, users, cache)
        .expect("Failed to build test state");
    web::Data::new(state)
}

pub fn signup(email: &str) -> TestRequest {
    TestRequest::post().uri("/api/v1/users").set_json(json!({
        "email": email,
        "name": "Test User",
        "password": PASSWORD,
    }))
}

pub fn token_request(email: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/v1/auth/token")
        .set_json(json!({ "email": email, "password": password }))
}

pub fn with_bearer(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
}
