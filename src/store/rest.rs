//! PostgREST row store client.
//!
//! Thin HTTP wrapper for `/rest/v1/{table}`. URL building and response
//! parsing are pure functions so they can be tested without a server.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use super::{DataStore, Direction, Query, StoreError, Table};
use crate::auth::TokenSource;
use crate::config::HttpTimeouts;

// =============================================================================
// CLIENT
// =============================================================================

pub struct RestStore {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenSource,
}

impl RestStore {
    /// Build a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, tokens: TokenSource, timeouts: HttpTimeouts) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, tokens })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(self.tokens.anon_key()) {
            headers.insert("apikey", v);
        }
        if let Ok(v) = HeaderValue::from_str(&format!("Bearer {}", self.tokens.bearer())) {
            headers.insert(reqwest::header::AUTHORIZATION, v);
        }
        headers
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, StoreError> {
        let response = request
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(parse_error(status, &text));
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl DataStore for RestStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        let url = select_url(&self.base_url, query)?;
        let body = self.send(self.http.get(url)).await?;
        parse_rows(&body)
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let url = table_url(&self.base_url, table)?;
        let request = self
            .http
            .post(url)
            .header("Prefer", "return=representation")
            .json(&rows);
        let body = self.send(request).await?;
        parse_rows(&body)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Vec<Value>, StoreError> {
        let url = row_url(&self.base_url, table, id)?;
        let request = self
            .http
            .patch(url)
            .header("Prefer", "return=representation")
            .json(&patch);
        let body = self.send(request).await?;
        parse_rows(&body)
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), StoreError> {
        let url = row_url(&self.base_url, table, id)?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

// =============================================================================
// URL BUILDING
// =============================================================================

fn table_url(base: &Url, table: Table) -> Result<Url, StoreError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| StoreError::Request(format!("invalid base url: {base}")))?
        .pop_if_empty()
        .extend(["rest", "v1", table.as_str()]);
    Ok(url)
}

fn row_url(base: &Url, table: Table, id: Uuid) -> Result<Url, StoreError> {
    let mut url = table_url(base, table)?;
    url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
    Ok(url)
}

fn select_url(base: &Url, query: &Query) -> Result<Url, StoreError> {
    let mut url = table_url(base, query.table)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("select", "*");
        for (column, value) in &query.filters {
            pairs.append_pair(column, &filter_expr(value));
        }
        if let Some(order) = &query.order {
            let dir = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            pairs.append_pair("order", &format!("{}.{dir}", order.column));
        }
    }
    Ok(url)
}

/// Render an equality filter in PostgREST operator syntax.
fn filter_expr(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_owned(),
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_rows(body: &str) -> Result<Vec<Value>, StoreError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body).map_err(|e| StoreError::Parse(e.to_string()))? {
        Value::Array(rows) => Ok(rows),
        row @ Value::Object(_) => Ok(vec![row]),
        other => Err(StoreError::Parse(format!("expected rows, got {other}"))),
    }
}

#[derive(serde::Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

fn parse_error(status: u16, body: &str) -> StoreError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => {
            let mut message = err.message.unwrap_or_else(|| "unknown error".to_owned());
            if let Some(details) = err.details.filter(|d| !d.is_empty()) {
                message = format!("{message} ({details})");
            }
            if let Some(hint) = err.hint.filter(|h| !h.is_empty()) {
                message = format!("{message}; hint: {hint}");
            }
            message
        }
        Err(_) => body.to_owned(),
    };
    StoreError::Api { status, message }
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
