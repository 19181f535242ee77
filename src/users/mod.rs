//! User accounts: signup, lookup and profile management.

pub mod handlers;
mod service;

pub use handlers::UserResponse;
pub use service::{NewUser, UserPatch, UserService};
