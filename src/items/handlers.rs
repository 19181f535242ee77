use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::service::{ItemPatch, NewItem};
use crate::auth::CurrentUser;
use crate::db::Item;
use crate::error::AppError;
use crate::pagination::{Page, PageParams};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub is_available: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            price: item.price,
            is_available: item.is_available,
            owner_id: item.owner_id,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

pub async fn list_items(
    _current: CurrentUser,
    params: web::Query<PageParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let query = params.into_inner().into_query()?;
    let (items, total) = futures::try_join!(
        state.item_service.list(&query),
        state.item_service.count(&query.filter)
    )?;

    let items = items.into_iter().map(ItemResponse::from).collect();
    Ok(HttpResponse::Ok().json(Page::new(items, total, &query)))
}

pub async fn create_item(
    current: CurrentUser,
    payload: web::Json<NewItem>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("User {} creating item {}", current.id, payload.name);
    let item = state
        .item_service
        .create(payload.into_inner(), current.id)
        .await?;
    Ok(HttpResponse::Created().json(ItemResponse::from(item)))
}

pub async fn get_item(
    _current: CurrentUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let item = state.item_service.get_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ItemResponse::from(item)))
}

pub async fn update_item(
    current: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<ItemPatch>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    info!("User {} updating item {}", current.id, id);
    let item = state.item_service.update(id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ItemResponse::from(item)))
}

pub async fn delete_item(
    current: CurrentUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    info!("User {} deleting item {}", current.id, id);
    state.item_service.delete(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
