//! In-memory workspace for tests

use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use super::{ApiError, DataSourceId, KeyFilter, RemoteId, Workspace};
use crate::core::collection::Collection;
use crate::core::property::{relation_value, title_value};

struct MockPage {
    source: DataSourceId,
    id: RemoteId,
    properties: Map<String, Value>,
}

/// Workspace holding the four template data sources and counting calls
pub(crate) struct MockWorkspace {
    shared: Vec<Collection>,
    pages: RefCell<Vec<MockPage>>,
    next_id: Cell<usize>,
    queries: Cell<usize>,
    inserts: Cell<usize>,
    rejected_titles: RefCell<HashSet<String>>,
    denied_inserts: Cell<bool>,
    unavailable: Cell<bool>,
}

pub(crate) fn source_id(collection: Collection) -> DataSourceId {
    DataSourceId::new(format!(
        "ds-{}",
        collection.title().to_lowercase().replace(' ', "-")
    ))
}

impl MockWorkspace {
    pub fn new() -> Self {
        Self::with_shared(&Collection::IMPORT_ORDER)
    }

    /// Only the given data sources are visible to the integration
    pub fn with_shared(shared: &[Collection]) -> Self {
        Self {
            shared: shared.to_vec(),
            pages: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            queries: Cell::new(0),
            inserts: Cell::new(0),
            rejected_titles: RefCell::new(HashSet::new()),
            denied_inserts: Cell::new(false),
            unavailable: Cell::new(false),
        }
    }

    /// Add an existing page with the given natural-key title
    pub fn seed(&self, collection: Collection, title: &str) -> RemoteId {
        self.seed_with(collection, title, None)
    }

    /// Add an existing page that also links to another page
    pub fn seed_with(
        &self,
        collection: Collection,
        title: &str,
        relation: Option<(&str, &RemoteId)>,
    ) -> RemoteId {
        let mut properties = Map::new();
        properties.insert(collection.key_property().to_string(), title_value(title));
        if let Some((property, id)) = relation {
            properties.insert(property.to_string(), relation_value(id));
        }
        self.store(source_id(collection), properties)
    }

    /// Fail inserts of pages with this title as a validation error
    pub fn reject_insert(&self, title: &str) {
        self.rejected_titles.borrow_mut().insert(title.to_string());
    }

    /// Make every subsequent insert fail as if the integration lost access
    pub fn deny_inserts(&self) {
        self.denied_inserts.set(true);
    }

    /// Make every subsequent call fail as if the network were down
    pub fn go_offline(&self) {
        self.unavailable.set(true);
    }

    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.get()
    }

    /// Properties of every page in a collection, in creation order
    pub fn pages(&self, collection: Collection) -> Vec<Map<String, Value>> {
        let source = source_id(collection);
        self.pages
            .borrow()
            .iter()
            .filter(|p| p.source == source)
            .map(|p| p.properties.clone())
            .collect()
    }

    fn store(&self, source: DataSourceId, properties: Map<String, Value>) -> RemoteId {
        let id = RemoteId::new(format!("page-{}", self.next_id.get()));
        self.next_id.set(self.next_id.get() + 1);
        self.pages.borrow_mut().push(MockPage {
            source,
            id: id.clone(),
            properties,
        });
        id
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if self.unavailable.get() {
            return Err(ApiError::Unavailable {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

/// Concatenated plain text of a title property
pub(crate) fn title_text(properties: &Map<String, Value>, property: &str) -> String {
    properties
        .get(property)
        .and_then(|v| v["title"].as_array())
        .map(|segments| {
            segments
                .iter()
                .filter_map(|s| s["text"]["content"].as_str())
                .collect()
        })
        .unwrap_or_default()
}

fn has_relation(properties: &Map<String, Value>, property: &str, id: &RemoteId) -> bool {
    properties
        .get(property)
        .and_then(|v| v["relation"].as_array())
        .map(|links| links.iter().any(|l| l["id"] == json!(id.as_str())))
        .unwrap_or(false)
}

impl Workspace for MockWorkspace {
    fn find_data_source(&self, title: &str) -> Result<Option<DataSourceId>, ApiError> {
        self.check_online()?;
        Ok(self
            .shared
            .iter()
            .find(|c| c.title() == title)
            .map(|c| source_id(*c)))
    }

    fn query(&self, source: &DataSourceId, filter: &KeyFilter) -> Result<Vec<RemoteId>, ApiError> {
        self.check_online()?;
        self.queries.set(self.queries.get() + 1);

        Ok(self
            .pages
            .borrow()
            .iter()
            .filter(|p| &p.source == source)
            .filter(|p| title_text(&p.properties, &filter.property) == filter.equals)
            .filter(|p| match &filter.relation {
                Some((property, id)) => has_relation(&p.properties, property, id),
                None => true,
            })
            .map(|p| p.id.clone())
            .take(2)
            .collect())
    }

    fn insert(
        &self,
        source: &DataSourceId,
        properties: &Map<String, Value>,
    ) -> Result<RemoteId, ApiError> {
        self.check_online()?;
        self.inserts.set(self.inserts.get() + 1);

        if self.denied_inserts.get() {
            return Err(ApiError::PermissionDenied {
                status: 403,
                message: "restricted_resource".to_string(),
            });
        }

        let rejected = self.rejected_titles.borrow();
        if properties
            .keys()
            .any(|k| rejected.contains(&title_text(properties, k)))
        {
            return Err(ApiError::Rejected {
                status: 400,
                message: "validation_error".to_string(),
            });
        }

        Ok(self.store(source.clone(), properties.clone()))
    }
}
