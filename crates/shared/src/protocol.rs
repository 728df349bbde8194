use serde::{Deserialize, Serialize};

use crate::domain::Record;

/// Pagination metadata returned next to a list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub last_page: i64,
    #[serde(default)]
    pub current_page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
    #[serde(default)]
    pub total: Option<i64>,
}

impl PageMeta {
    /// Total page count, never below 1 so an empty collection still has one page.
    pub fn total_pages(&self) -> u32 {
        self.last_page.clamp(1, i64::from(u32::MAX)) as u32
    }
}

/// `GET /api/<collection>?page=&limit=` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub data: Vec<Record>,
    pub meta: PageMeta,
}

/// `GET /api/<collection>/<id>` success body: either wrapped in `data` or the bare record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemResponse {
    Wrapped { data: Record },
    Bare(Record),
}

impl ItemResponse {
    pub fn into_record(self) -> Record {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(record) => record,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
