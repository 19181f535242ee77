//! Authentication: password hashing, bearer tokens and the credential
//! exchange endpoints.

mod extractor;
pub mod handlers;
pub mod security;
mod service;

pub use extractor::CurrentUser;
pub use security::{Claims, TokenManager};
pub use service::AuthService;
