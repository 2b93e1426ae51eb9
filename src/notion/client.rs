//! Blocking HTTP client for the Notion REST API
//!
//! Every request is a JSON `POST` carrying the bearer token and the pinned
//! `Notion-Version` header. Non-success statuses are mapped onto [`ApiError`].

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::error::ApiError;
use super::types::{
    DataSourceId, DataSourceObject, ErrorBody, KeyFilter, ListResponse, PageObject, RemoteId,
};
use super::Workspace;

pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2025-09-03";

/// Two results are enough to tell "unique" from "ambiguous"
const KEY_QUERY_PAGE_SIZE: u32 = 2;
const SEARCH_PAGE_SIZE: u32 = 100;

/// Authenticated Notion API client
pub struct NotionClient {
    base_url: String,
    token: String,
    version: String,
    http: Client,
}

impl NotionClient {
    /// Create a client against the public API
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("notion-bootstrap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            version: DEFAULT_NOTION_VERSION.to_string(),
            http,
        })
    }

    /// Set a custom base URL for the API
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Pin a different `Notion-Version`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "POST");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
            .json(body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        tracing::debug!(%url, status = status.as_u16(), "response");

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(err) if !err.code.is_empty() => format!("{}: {}", err.code, err.message),
                Ok(err) if !err.message.is_empty() => err.message,
                _ => text,
            };
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            message: e.to_string(),
        })
    }
}

impl Workspace for NotionClient {
    fn find_data_source(&self, title: &str) -> Result<Option<DataSourceId>, ApiError> {
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({
                "query": title,
                "filter": { "property": "object", "value": "data_source" },
                "page_size": SEARCH_PAGE_SIZE,
            });
            if let Some(ref c) = cursor {
                body["start_cursor"] = json!(c);
            }

            let page: ListResponse<DataSourceObject> = self.post("/search", &body)?;
            if let Some(hit) = page.results.iter().find(|r| r.plain_title() == title) {
                return Ok(Some(DataSourceId::new(hit.id.clone())));
            }

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => return Ok(None),
            }
        }
    }

    fn query(&self, source: &DataSourceId, filter: &KeyFilter) -> Result<Vec<RemoteId>, ApiError> {
        let body = json!({
            "filter": filter.to_json(),
            "page_size": KEY_QUERY_PAGE_SIZE,
        });
        let path = format!("/data_sources/{}/query", source);
        let page: ListResponse<PageObject> = self.post(&path, &body)?;
        Ok(page.results.into_iter().map(|p| RemoteId::new(p.id)).collect())
    }

    fn insert(
        &self,
        source: &DataSourceId,
        properties: &Map<String, Value>,
    ) -> Result<RemoteId, ApiError> {
        let body = json!({
            "parent": { "type": "data_source_id", "data_source_id": source.as_str() },
            "properties": properties,
        });
        let page: PageObject = self.post("/pages", &body)?;
        Ok(RemoteId::new(page.id))
    }
}
