//! Row store collaborator — table-scoped select/insert/update/delete.
//!
//! DESIGN
//! ======
//! The backend is an external relational store reached through a row API.
//! [`DataStore`] is the seam: [`rest::RestStore`] speaks the PostgREST
//! dialect over HTTP, [`memory::MemoryStore`] keeps rows in process for tests
//! and local runs. Rows cross the seam as JSON objects; typed decoding lives
//! in `services::catalog`.

pub mod memory;
pub mod rest;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{ErrorCode, Severity};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request never produced a response.
    #[error("store request failed: {0}")]
    Request(String),

    /// The store answered with a non-success status.
    #[error("store rejected request (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A row could not be decoded into the expected shape.
    #[error("store response parse failed: {0}")]
    Parse(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_STORE_REQUEST",
            Self::Api { .. } => "E_STORE_API",
            Self::Parse(_) => "E_STORE_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }
}

// =============================================================================
// TABLES + QUERIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Restaurants,
    Categories,
    Products,
}

impl Table {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restaurants => "restaurants",
            Self::Categories => "categories",
            Self::Products => "products",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// A select over one table: equality filters and at most one ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<(String, Value)>,
    pub order: Option<Order>,
}

impl Query {
    #[must_use]
    pub fn from(table: Table) -> Self {
        Self { table, filters: Vec::new(), order: None }
    }

    /// Equality filter. `Value::Null` renders as `is.null`; ids go in as
    /// their string form, the way rows carry them.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_owned(), value.into()));
        self
    }

    #[must_use]
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order = Some(Order { column: column.to_owned(), direction });
        self
    }
}

// =============================================================================
// DATA STORE TRAIT
// =============================================================================

/// Row-oriented access to the backend. Callers must check the `Result`
/// before trusting any rows.
#[async_trait::async_trait]
pub trait DataStore: Send + Sync {
    /// Select rows matching every filter, in the requested order.
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Insert rows and return them as stored (ids and timestamps filled in).
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError>;

    /// Apply a partial update to the row with `id`; returns the updated rows.
    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Vec<Value>, StoreError>;

    /// Delete the row with `id`.
    async fn delete(&self, table: Table, id: Uuid) -> Result<(), StoreError>;
}
