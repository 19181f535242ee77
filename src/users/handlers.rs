use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::service::{NewUser, UserPatch};
use crate::auth::CurrentUser;
use crate::db::User;
use crate::error::AppError;
use crate::pagination::{Page, PageParams};
use crate::AppState;

/// Public view of a user. The password hash never leaves the service.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

pub async fn list_users(
    _current: CurrentUser,
    params: web::Query<PageParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let query = params.into_inner().into_query()?;
    let (users, total) = futures::try_join!(
        state.user_service.list(&query),
        state.user_service.count(&query.filter)
    )?;

    let users = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(Page::new(users, total, &query)))
}

pub async fn create_user(
    payload: web::Json<NewUser>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received signup request for email: {}", payload.email);
    let user = state.user_service.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

pub async fn read_current_user(current: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(current.into_inner()))
}

pub async fn get_user(
    _current: CurrentUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state.user_service.get_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub async fn update_user(
    current: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<UserPatch>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    info!("User {} updating user {}", current.id, id);
    let user = state.user_service.update(id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub async fn delete_user(
    current: CurrentUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    info!("User {} deleting user {}", current.id, id);
    state.user_service.delete(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
