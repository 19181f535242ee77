use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::AppError;
use crate::AppState;

/// OAuth2 password-grant style form. `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

async fn issue_token(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<HttpResponse, AppError> {
    match state.auth_service.authenticate(email, password).await {
        Ok(token) => {
            info!("Login successful for email: {}", email);
            Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
        }
        Err(e) => {
            error!("Login failed for email: {}: {}", email, e);
            Err(e)
        }
    }
}

pub async fn login(
    form: web::Form<LoginForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", form.username);
    issue_token(&state, &form.username, &form.password).await
}

pub async fn token(
    req: web::Json<TokenRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received token request for email: {}", req.email);
    issue_token(&state, &req.email, &req.password).await
}
