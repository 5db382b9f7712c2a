//! In-process row store.
//!
//! Behaves like the remote store for the operations the app uses: inserts
//! fill in `id` and `created_at`, updates merge fields into the matching
//! row, selects apply equality filters and one ordering. Timestamps are
//! strictly increasing so "newest first" is deterministic.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{DataStore, Direction, Query, StoreError, Table};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<Table, Vec<Value>>,
    last_created: Option<DateTime<Utc>>,
}

impl Inner {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(ts);
        ts
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Request("memory store lock poisoned".into()))
    }

    /// Number of rows currently held for `table`.
    #[must_use]
    pub fn len(&self, table: Table) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.tables.get(&table).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        let inner = self.lock()?;
        let mut rows: Vec<Value> = inner
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|(col, v)| row.get(col).unwrap_or(&Value::Null) == v))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_column(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let mut inner = self.lock()?;
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut fields) = row else {
                return Err(StoreError::Api { status: 400, message: "row must be a JSON object".into() });
            };
            if fields.get("id").is_none_or(Value::is_null) {
                fields.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
            }
            if fields.get("created_at").is_none_or(Value::is_null) {
                let ts = inner.next_timestamp();
                fields.insert("created_at".into(), Value::String(ts.to_rfc3339()));
            }
            inserted.push(Value::Object(fields));
        }
        inner
            .tables
            .entry(table)
            .or_default()
            .extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Vec<Value>, StoreError> {
        let Value::Object(patch) = patch else {
            return Err(StoreError::Api { status: 400, message: "patch must be a JSON object".into() });
        };
        let mut inner = self.lock()?;
        let id = Value::String(id.to_string());
        let mut updated = Vec::new();
        for row in inner.tables.entry(table).or_default() {
            if row.get("id") != Some(&id) {
                continue;
            }
            if let Some(fields) = row.as_object_mut() {
                for (k, v) in &patch {
                    fields.insert(k.clone(), v.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let id = Value::String(id.to_string());
        if let Some(rows) = inner.tables.get_mut(&table) {
            rows.retain(|row| row.get("id") != Some(&id));
        }
        Ok(())
    }
}

/// Order two column values: nulls last, timestamps chronologically, then
/// numbers, then plain strings.
fn compare_column(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
