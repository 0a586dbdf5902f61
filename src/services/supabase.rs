use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::{GeotaggedRecord, ProductMessage, TaskRequest, TaskStatus};

/// Errors that can occur when talking to the hosted datastore
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the hosted datastore
#[derive(Debug, Clone)]
pub struct SupabaseTables {
    pub messages: String,
    pub product_chats: String,
    pub requests: String,
    pub donations: String,
}

impl Default for SupabaseTables {
    fn default() -> Self {
        Self {
            messages: "messages".to_string(),
            product_chats: "product_chats".to_string(),
            requests: "requests".to_string(),
            donations: "donations".to_string(),
        }
    }
}

/// Most recent rows fetched for a feed
pub const DEFAULT_FEED_LIMIT: usize = 500;

/// PostgREST client for the hosted datastore
///
/// Handles:
/// - Fetching and inserting zone messages
/// - Fetching and inserting product chat messages
/// - Fetching and inserting task requests
/// - Reading externally written boolean flags
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: SupabaseTables,
    feed_limit: usize,
}

impl SupabaseClient {
    pub fn new(
        base_url: String,
        api_key: String,
        tables: SupabaseTables,
        timeout_secs: u64,
    ) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            tables,
            feed_limit: DEFAULT_FEED_LIMIT,
        })
    }

    /// Cap how many of the newest rows a feed query returns
    pub fn with_feed_limit(mut self, limit: usize) -> Self {
        self.feed_limit = limit.max(1);
        self
    }

    pub fn tables(&self) -> &SupabaseTables {
        &self.tables
    }

    pub fn feed_limit(&self) -> usize {
        self.feed_limit
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// The newest zone messages up to the feed limit, oldest first
    pub async fn list_messages(&self) -> Result<Vec<GeotaggedRecord>, SupabaseError> {
        let url = format!(
            "{}?select=*&order=created_at.desc&limit={}",
            self.table_url(&self.tables.messages),
            self.feed_limit
        );
        self.fetch_feed(&url).await
    }

    pub async fn insert_message(
        &self,
        record: &GeotaggedRecord,
    ) -> Result<GeotaggedRecord, SupabaseError> {
        self.insert_row(&self.tables.messages, record).await
    }

    /// The newest messages posted against one barcode, oldest first
    pub async fn list_product_messages(
        &self,
        barcode: &str,
    ) -> Result<Vec<ProductMessage>, SupabaseError> {
        let url = format!(
            "{}?select=*&barcode=eq.{}&order=created_at.desc&limit={}",
            self.table_url(&self.tables.product_chats),
            urlencoding::encode(barcode),
            self.feed_limit
        );
        self.fetch_feed(&url).await
    }

    pub async fn insert_product_message(
        &self,
        message: &ProductMessage,
    ) -> Result<ProductMessage, SupabaseError> {
        self.insert_row(&self.tables.product_chats, message).await
    }

    pub async fn list_task_requests(
        &self,
        status: Option<TaskStatus>,
    ) -> Result<Vec<TaskRequest>, SupabaseError> {
        let mut url = format!(
            "{}?select=*&order=created_at.asc",
            self.table_url(&self.tables.requests)
        );
        if let Some(status) = status {
            let status = serde_json::to_value(status)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            url.push_str(&format!("&status=eq.{}", status));
        }
        self.fetch_rows(&url).await
    }

    pub async fn insert_task_request(
        &self,
        task: &TaskRequest,
    ) -> Result<TaskRequest, SupabaseError> {
        self.insert_row(&self.tables.requests, task).await
    }

    /// Read a boolean column of one row; null counts as false
    pub async fn fetch_flag(
        &self,
        table: &str,
        id: &str,
        column: &str,
    ) -> Result<bool, SupabaseError> {
        let url = format!(
            "{}?select={}&id=eq.{}",
            self.table_url(table),
            column,
            urlencoding::encode(id)
        );

        let rows: Vec<Value> = self.fetch_json_array(&url).await?;
        let row = rows
            .first()
            .ok_or_else(|| SupabaseError::NotFound(format!("{} row {}", table, id)))?;

        match row.get(column) {
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(Value::Null) | None => Ok(false),
            Some(other) => Err(SupabaseError::InvalidResponse(format!(
                "column {} is not a boolean: {}",
                column, other
            ))),
        }
    }

    async fn fetch_json_array(&self, url: &str) -> Result<Vec<Value>, SupabaseError> {
        tracing::debug!("Fetching rows from: {}", url);

        let response = self.authorized(self.client.get(url)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Datastore query failed: {} - {}", status, body);
            return Err(SupabaseError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let json: Value = response.json().await?;

        match json {
            Value::Array(rows) => Ok(rows),
            _ => Err(SupabaseError::InvalidResponse(
                "Expected an array of rows".into(),
            )),
        }
    }

    /// Fetch a newest-first window and hand it back in posting order
    async fn fetch_feed<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, SupabaseError> {
        let mut rows = self.fetch_rows(url).await?;
        rows.reverse();
        Ok(rows)
    }

    /// Fetch rows, skipping any that do not deserialize
    async fn fetch_rows<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, SupabaseError> {
        let rows = self.fetch_json_array(url).await?;
        let total = rows.len();

        let parsed: Vec<T> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!("Skipping malformed row: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Parsed {} of {} rows", parsed.len(), total);

        Ok(parsed)
    }

    async fn insert_row<B, T>(&self, table: &str, body: &B) -> Result<T, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Insert into {} failed: {} - {}", table, status, body);
            return Err(SupabaseError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let json: Value = response.json().await?;

        // PostgREST answers inserts with an array of the created rows
        let row = match json {
            Value::Array(rows) => rows.into_iter().next(),
            Value::Object(map) => Some(Value::Object(map)),
            _ => None,
        }
        .ok_or_else(|| {
            SupabaseError::InvalidResponse(format!("Insert into {} returned no rows", table))
        })?;

        tracing::debug!("Inserted row into {}", table);

        serde_json::from_value(row).map_err(|e| {
            SupabaseError::InvalidResponse(format!("Failed to parse inserted row: {}", e))
        })
    }
}
