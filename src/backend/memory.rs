//! In-process backend.
//!
//! Holds rows as JSON objects keyed by table name and evaluates `Query`
//! the way the hosted backend would: `eq` filters, case-insensitive
//! substring OR-group, single-column order (nulls last ascending, first
//! descending) and limit. Used by tests and by the CLI's offline mode.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::backend::{CatalogBackend, Direction, INCREMENT_DOWNLOAD_COUNT, Query};
use crate::error::{AppError, Result};
use crate::utils::url::is_absolute;

pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    inserts: Mutex<Vec<(String, Value)>>,
    rpc_calls: Mutex<Vec<(String, Value)>>,
    select_calls: AtomicU64,
    failing: AtomicBool,
    storage_base: String,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            inserts: Mutex::new(Vec::new()),
            rpc_calls: Mutex::new(Vec::new()),
            select_calls: AtomicU64::new(0),
            failing: AtomicBool::new(false),
            storage_base: "memory://storage".to_string(),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tables from a JSON object of `{ "table": [rows...] }`.
    pub fn from_fixture(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let tables: HashMap<String, Vec<Value>> = serde_json::from_str(&content)?;
        Ok(Self {
            tables: Mutex::new(tables),
            ..Self::default()
        })
    }

    /// Replace the rows of `table`.
    pub fn with_table(mut self, table: &str, rows: Vec<Value>) -> Self {
        self.tables.get_mut().insert(table.to_string(), rows);
        self
    }

    /// Base used when resolving relative storage paths.
    pub fn with_storage_base(mut self, base: impl Into<String>) -> Self {
        self.storage_base = base.into();
        self
    }

    /// Make every subsequent call fail, or recover.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, AtomicOrdering::SeqCst);
    }

    pub fn select_calls(&self) -> u64 {
        self.select_calls.load(AtomicOrdering::SeqCst)
    }

    /// Rows inserted so far, with their table names.
    pub async fn inserts(&self) -> Vec<(String, Value)> {
        self.inserts.lock().await.clone()
    }

    /// RPC calls issued so far, with their arguments.
    pub async fn rpc_calls(&self) -> Vec<(String, Value)> {
        self.rpc_calls.lock().await.clone()
    }

    /// Current rows of `table`.
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(AppError::backend(503, "simulated backend outage"));
        }
        Ok(())
    }
}

/// Evaluate `query` over `rows`.
fn evaluate(query: &Query, rows: &[Value]) -> Vec<Value> {
    let mut matched: Vec<Value> = rows
        .iter()
        .filter(|row| {
            query.filters.iter().all(|filter| match &filter.value {
                Value::Null => row.get(&filter.column).is_none_or(Value::is_null),
                value => row.get(&filter.column) == Some(value),
            })
        })
        .filter(|row| match &query.text_match {
            None => true,
            Some(text) => {
                let needle = text.term.to_lowercase();
                text.columns.iter().any(|column| {
                    row.get(column)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
        })
        .cloned()
        .collect();

    if let Some(order) = &query.order {
        matched.sort_by(|a, b| {
            let ordering = compare_values(
                a.get(&order.column).unwrap_or(&Value::Null),
                b.get(&order.column).unwrap_or(&Value::Null),
            );
            match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }

    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }
    matched
}

/// Total order over scalar JSON values; nulls sort after everything else.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl CatalogBackend for MemoryBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        self.select_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.check_available()?;

        let tables = self.tables.lock().await;
        let rows = tables.get(&query.table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(evaluate(query, rows))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<()> {
        self.check_available()?;
        if !row.is_object() {
            return Err(AppError::backend(400, "row must be a JSON object"));
        }

        self.inserts
            .lock()
            .await
            .push((table.to_string(), row.clone()));
        self.tables
            .lock()
            .await
            .entry(table.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<()> {
        self.rpc_calls
            .lock()
            .await
            .push((function.to_string(), args.clone()));
        self.check_available()?;

        if function != INCREMENT_DOWNLOAD_COUNT {
            return Err(AppError::backend(404, format!("unknown function {function}")));
        }
        let Some(id) = args.get("resource_id") else {
            return Err(AppError::backend(400, "missing resource_id"));
        };

        let mut tables = self.tables.lock().await;
        for row in tables.values_mut().flatten() {
            if row.get("id") == Some(id) && row.get("download_count").is_some() {
                let count = row["download_count"].as_i64().unwrap_or(0);
                row["download_count"] = Value::from(count + 1);
            }
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        if is_absolute(path) {
            return Ok(path.to_string());
        }
        Ok(format!(
            "{}/{}/{}",
            self.storage_base.trim_end_matches('/'),
            bucket,
            path.trim_start_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn resources() -> Vec<Value> {
        vec![
            json!({"id": 1, "title": "Calculus II Finals", "course": "MATH", "download_count": 3, "created_at": "2024-01-02T00:00:00Z"}),
            json!({"id": 2, "title": "Physics Midterm", "course": null, "download_count": 0, "created_at": "2024-01-03T00:00:00Z"}),
            json!({"id": 3, "title": null, "course": "calculus lab", "download_count": null, "created_at": null}),
        ]
    }

    #[tokio::test]
    async fn test_text_match_is_case_insensitive_or() {
        let backend = MemoryBackend::new().with_table("res", resources());
        let query = Query::table("res").contains_any(&["title", "course"], "CALCULUS");
        let rows = backend.select(&query).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_descending_order_puts_nulls_first() {
        let backend = MemoryBackend::new().with_table("res", resources());
        let query = Query::table("res").order_by("created_at", Direction::Descending);
        let rows = backend.select(&query).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_increment_counts_up() {
        let backend = MemoryBackend::new().with_table("res", resources());
        backend
            .rpc(INCREMENT_DOWNLOAD_COUNT, json!({"resource_id": 1}))
            .await
            .unwrap();
        backend
            .rpc(INCREMENT_DOWNLOAD_COUNT, json!({"resource_id": 3}))
            .await
            .unwrap();
        let rows = backend.rows("res").await;
        assert_eq!(rows[0]["download_count"], 4);
        assert_eq!(rows[2]["download_count"], 1);
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let backend = MemoryBackend::new().with_table("res", resources());
        backend.set_failing(true);
        assert!(backend.select(&Query::table("res")).await.is_err());
        backend.set_failing(false);
        assert_eq!(backend.select(&Query::table("res")).await.unwrap().len(), 3);
        assert_eq!(backend.select_calls(), 2);
    }

    #[test]
    fn test_fixture_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, r#"{"universities": [{"id": "u1"}]}"#).unwrap();
        let backend = MemoryBackend::from_fixture(&path).unwrap();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        assert_eq!(rt.block_on(backend.rows("universities")).len(), 1);
    }
}
