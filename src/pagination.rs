use serde::{Deserialize, Serialize};

use crate::db::{ListQuery, SearchFilter};
use crate::error::AppError;
use crate::Result;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// `?skip=&limit=&search=` query string of the list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub search: Option<String>,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
            search: None,
        }
    }
}

impl PageParams {
    pub fn into_query(self) -> Result<ListQuery> {
        if self.skip < 0 {
            return Err(AppError::validation("skip", "skip must be greater than or equal to 0"));
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(AppError::validation(
                "limit",
                format!("limit must be between 1 and {}", MAX_LIMIT),
            ));
        }
        if matches!(self.search.as_deref(), Some("")) {
            return Err(AppError::validation("search", "search must not be empty"));
        }

        Ok(ListQuery {
            skip: self.skip,
            limit: self.limit,
            filter: SearchFilter::new(self.search),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, query: &ListQuery) -> Self {
        Self {
            items,
            total,
            skip: query.skip,
            limit: query.limit,
        }
    }
}
