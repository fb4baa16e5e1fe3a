//! Backend abstraction for the hosted catalog.
//!
//! The catalog is owned by a hosted backend-as-a-service. The client only
//! issues filtered/sorted row queries, single-row inserts, RPC calls, and
//! resolves public URLs for stored files. `CatalogBackend` is that surface;
//! it is constructed once per process and shared as `Arc<dyn CatalogBackend>`.
//!
//! - `RestBackend`: PostgREST/Storage over HTTP
//! - `MemoryBackend`: in-process rows, for tests and offline fixtures

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// Re-export for convenience
pub use memory::MemoryBackend;
pub use rest::RestBackend;

/// RPC bumping a resource's `download_count`, called with `{"resource_id": id}`.
pub const INCREMENT_DOWNLOAD_COUNT: &str = "increment_download_count";

/// Sort direction for a query's order clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-column ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Equality predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

/// Case-insensitive substring match OR'd across several columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub columns: Vec<String>,
    pub term: String,
}

/// A read query against one relation.
///
/// All `eq` filters and the optional text match are AND'd together.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub text_match: Option<TextMatch>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query selecting every column of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            text_match: None,
            order: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Match rows where any of `columns` contains `term`, ignoring case.
    pub fn contains_any(mut self, columns: &[&str], term: impl Into<String>) -> Self {
        self.text_match = Some(TextMatch {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            term: term.into(),
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Value of the `eq` filter on `column`, if any.
    pub fn filter_value(&self, column: &str) -> Option<&Value> {
        self.filters
            .iter()
            .find(|f| f.column == column)
            .map(|f| &f.value)
    }
}

/// Operations the catalog needs from the hosted backend.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Run a read query and return the matching rows as JSON objects.
    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Insert a single row. Server-side defaults fill omitted columns.
    async fn insert(&self, table: &str, row: Value) -> Result<()>;

    /// Call a stored procedure, discarding its result.
    async fn rpc(&self, function: &str, args: Value) -> Result<()>;

    /// Public URL of a file stored under `path` in `bucket`.
    fn public_url(&self, bucket: &str, path: &str) -> Result<String>;
}
