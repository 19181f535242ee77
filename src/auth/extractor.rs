use std::ops::Deref;

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use tracing::warn;

use crate::db::User;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// The active user named by the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(User);

impl CurrentUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::InternalError("application state not configured".into()))?;
            let token = token.ok_or(AuthError::MissingToken)?;
            let claims = state.tokens.decode(&token).ok_or(AuthError::InvalidToken)?;

            let Some(user) = state.user_service.find_by_email(&claims.sub).await? else {
                warn!(subject = %claims.sub, "token subject no longer exists");
                return Err(AuthError::InvalidToken.into());
            };

            if !user.is_active {
                warn!(user_id = %user.id, "inactive user presented a token");
                return Err(AppError::Forbidden("Account is disabled".into()));
            }

            Ok(CurrentUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def.ghi"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer xyz"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("xyz"));

        for value in ["Basic dXNlcjpwYXNz", "Bearer ", "Bearer", "token"] {
            let req = TestRequest::default()
                .insert_header((header::AUTHORIZATION, value))
                .to_http_request();
            assert!(bearer_token(&req).is_none(), "{value}");
        }

        assert!(bearer_token(&TestRequest::default().to_http_request()).is_none());
    }
}
