//! Remote lookup of records by natural key

use std::collections::HashMap;
use thiserror::Error;

use crate::core::collection::Collection;
use crate::core::error::ImportError;
use crate::notion::{ApiError, DataSourceId, KeyFilter, RemoteId, Workspace};

/// Data source ids of the four template databases
#[derive(Debug, Clone)]
pub struct DataSources {
    questions: DataSourceId,
    vendors: DataSourceId,
    assessments: DataSourceId,
    assessment_items: DataSourceId,
}

impl DataSources {
    /// Locate every template data source by title.
    ///
    /// Fails with `DataSourceNotFound` for the first one the integration
    /// cannot see.
    pub fn discover<W: Workspace>(workspace: &W) -> Result<Self, ImportError> {
        let find = |collection: Collection| -> Result<DataSourceId, ImportError> {
            let title = collection.title();
            let id = workspace
                .find_data_source(title)?
                .ok_or_else(|| ImportError::DataSourceNotFound {
                    title: title.to_string(),
                })?;
            tracing::debug!(%title, %id, "found data source");
            Ok(id)
        };

        Ok(Self {
            questions: find(Collection::Questions)?,
            vendors: find(Collection::Vendors)?,
            assessments: find(Collection::Assessments)?,
            assessment_items: find(Collection::AssessmentItems)?,
        })
    }

    pub fn get(&self, collection: Collection) -> &DataSourceId {
        match collection {
            Collection::Questions => &self.questions,
            Collection::Vendors => &self.vendors,
            Collection::Assessments => &self.assessments,
            Collection::AssessmentItems => &self.assessment_items,
        }
    }
}

/// Natural key value, optionally scoped by a parent record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub value: String,
    pub scope: Option<RemoteId>,
}

impl NaturalKey {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            scope: None,
        }
    }

    pub fn scoped(value: impl Into<String>, scope: RemoteId) -> Self {
        Self {
            value: value.into(),
            scope: Some(scope),
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{count} records match")]
    Ambiguous { count: usize },
}

/// Cached natural-key lookups for one run
pub struct RemoteLookup<'a, W: Workspace> {
    workspace: &'a W,
    sources: &'a DataSources,
    cache: HashMap<(Collection, NaturalKey), Option<RemoteId>>,
}

impl<'a, W: Workspace> RemoteLookup<'a, W> {
    pub fn new(workspace: &'a W, sources: &'a DataSources) -> Self {
        Self {
            workspace,
            sources,
            cache: HashMap::new(),
        }
    }

    /// Find the record in `collection` whose key title equals `key` exactly.
    ///
    /// More than one match is an error rather than a guess.
    pub fn find_by_natural_key(
        &mut self,
        collection: Collection,
        key: &NaturalKey,
    ) -> Result<Option<RemoteId>, LookupError> {
        let cache_key = (collection, key.clone());
        if let Some(hit) = self.cache.get(&cache_key) {
            tracing::debug!(collection = %collection, key = %key.value, "lookup cache hit");
            return Ok(hit.clone());
        }

        let mut filter = KeyFilter::title(collection.key_property(), key.value.as_str());
        if let (Some(scope), Some((property, _))) = (&key.scope, collection.key_scope()) {
            filter = filter.with_relation(property, scope.clone());
        }

        let mut matches = self
            .workspace
            .query(self.sources.get(collection), &filter)?;

        let found = match matches.len() {
            0 => None,
            1 => matches.pop(),
            count => return Err(LookupError::Ambiguous { count }),
        };

        self.cache.insert(cache_key, found.clone());
        Ok(found)
    }
}
