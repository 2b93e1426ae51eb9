//! Notion API access
//!
//! [`Workspace`] is the seam between import orchestration and the remote
//! service. [`NotionClient`] implements it over HTTP.

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

use serde_json::{Map, Value};

pub use client::{NotionClient, DEFAULT_API_BASE, DEFAULT_NOTION_VERSION};
pub use error::ApiError;
pub use types::{DataSourceId, KeyFilter, RemoteId};

/// Operations the importer needs from the remote workspace
pub trait Workspace {
    /// Find a data source by its exact title
    fn find_data_source(&self, title: &str) -> Result<Option<DataSourceId>, ApiError>;

    /// Pages in a data source matching the filter (at most a couple are returned)
    fn query(&self, source: &DataSourceId, filter: &KeyFilter) -> Result<Vec<RemoteId>, ApiError>;

    /// Create a page and return its id
    fn insert(
        &self,
        source: &DataSourceId,
        properties: &Map<String, Value>,
    ) -> Result<RemoteId, ApiError>;
}
