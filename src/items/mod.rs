pub mod handlers;
mod service;

pub use handlers::ItemResponse;
pub use service::{ItemPatch, ItemService, NewItem};
