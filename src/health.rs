use actix_web::{web, HttpResponse};
use async_trait::async_trait;
use serde_json::json;

use crate::AppState;

/// A pooled external resource held for the life of the process.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Cheap round trip used by readiness probes.
    async fn ping(&self) -> bool;

    async fn close(&self) {}
}

/// Static health endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": state.config.app_name,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "alive" }))
}

pub async fn readiness_check(state: web::Data<AppState>) -> HttpResponse {
    let database = state.database.ping().await;
    let cache = match &state.cache {
        Some(cache) => cache.ping().await,
        None => false,
    };

    let status = if database && cache { "ready" } else { "not_ready" };

    HttpResponse::Ok().json(json!({
        "status": status,
        "checks": {
            "database": database,
            "cache": cache,
        }
    }))
}
