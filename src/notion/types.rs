//! Request and response types for the Notion REST API

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Opaque page identifier returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a data source (database table) in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSourceId(String);

impl DataSourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exact-match filter on a title property, optionally scoped by a relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyFilter {
    pub property: String,
    pub equals: String,
    pub relation: Option<(String, RemoteId)>,
}

impl KeyFilter {
    pub fn title(property: impl Into<String>, equals: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            equals: equals.into(),
            relation: None,
        }
    }

    /// Also require the relation property to contain the given page
    pub fn with_relation(mut self, property: impl Into<String>, id: RemoteId) -> Self {
        self.relation = Some((property.into(), id));
        self
    }

    /// Filter object for the data source query endpoint
    pub fn to_json(&self) -> Value {
        let title = json!({
            "property": self.property,
            "title": { "equals": self.equals },
        });

        match &self.relation {
            None => title,
            Some((property, id)) => json!({
                "and": [
                    title,
                    {
                        "property": property,
                        "relation": { "contains": id.as_str() },
                    },
                ]
            }),
        }
    }
}

/// Paginated list envelope shared by search and query
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Search hit for a data source
#[derive(Debug, Deserialize)]
pub struct DataSourceObject {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RichTextObject>,
}

impl DataSourceObject {
    pub fn plain_title(&self) -> String {
        self.title.iter().map(|t| t.plain_text.as_str()).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct RichTextObject {
    #[serde(default)]
    pub plain_text: String,
}

/// A page, reduced to the fields the importer needs
#[derive(Debug, Deserialize)]
pub struct PageObject {
    pub id: String,
}

/// Error body returned with non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
