//! Resolution of natural-key references between sheets

use std::collections::HashMap;

use crate::core::collection::Collection;
use crate::core::error::{RowError, UnresolvedRef};
use crate::core::lookup::{LookupError, NaturalKey, RemoteLookup};
use crate::core::plan::{Reference, RelationRef};
use crate::core::sheet::SheetRow;
use crate::notion::{ApiError, Workspace};

/// Run-scoped map from a referenced title to its targets.
///
/// Holds rows already confirmed remotely and rows planned for creation, so
/// later sheets can point at records that do not exist yet. A title can map
/// to several targets (assessments of different vendors).
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: HashMap<(Collection, String), Vec<Reference>>,
}

impl KeyIndex {
    pub fn get(&self, collection: Collection, title: &str) -> &[Reference] {
        self.entries
            .get(&(collection, title.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn insert(&mut self, collection: Collection, title: impl Into<String>, target: Reference) {
        let targets = self.entries.entry((collection, title.into())).or_default();
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
}

/// Why a row's references could not be resolved
#[derive(Debug)]
pub enum ResolveError {
    /// Only this row fails
    Row(RowError),
    /// The API call failed; the run cannot continue
    Api(ApiError),
}

impl From<RowError> for ResolveError {
    fn from(err: RowError) -> Self {
        ResolveError::Row(err)
    }
}

/// Resolves reference cells against this run's index, then the workspace
pub struct Resolver<'a, W: Workspace> {
    lookup: RemoteLookup<'a, W>,
    index: KeyIndex,
}

impl<'a, W: Workspace> Resolver<'a, W> {
    pub fn new(lookup: RemoteLookup<'a, W>) -> Self {
        Self {
            lookup,
            index: KeyIndex::default(),
        }
    }

    pub fn lookup(&mut self) -> &mut RemoteLookup<'a, W> {
        &mut self.lookup
    }

    pub fn index_mut(&mut self) -> &mut KeyIndex {
        &mut self.index
    }

    /// Resolve every listed reference column of a row.
    ///
    /// All unresolved cells are reported together in one
    /// `UnresolvedReference`.
    pub fn resolve(
        &mut self,
        row: &SheetRow,
        columns: &[(&'static str, Collection)],
    ) -> Result<Vec<RelationRef>, ResolveError> {
        let mut relations = Vec::with_capacity(columns.len());
        let mut unresolved = Vec::new();

        for &(column, target) in columns {
            let value = row.get(column).trim();
            match self.resolve_one(target, value)? {
                Some(reference) => relations.push(RelationRef {
                    property: column.to_string(),
                    target: reference,
                }),
                None => unresolved.push(UnresolvedRef {
                    column: column.to_string(),
                    key: value.to_string(),
                }),
            }
        }

        if !unresolved.is_empty() {
            return Err(RowError::UnresolvedReference {
                references: unresolved,
            }
            .into());
        }

        Ok(relations)
    }

    /// Resolve one title in the target collection; `None` if it matches nothing
    pub fn resolve_one(
        &mut self,
        target: Collection,
        key: &str,
    ) -> Result<Option<Reference>, ResolveError> {
        if key.is_empty() {
            return Ok(None);
        }

        match self.index.get(target, key) {
            [] => {}
            [reference] => return Ok(Some(reference.clone())),
            many => {
                return Err(RowError::AmbiguousMatch {
                    collection: target,
                    key: key.to_string(),
                    count: many.len(),
                }
                .into())
            }
        }

        match self
            .lookup
            .find_by_natural_key(target, &NaturalKey::plain(key))
        {
            Ok(Some(id)) => {
                let reference = Reference::Existing(id);
                self.index.insert(target, key, reference.clone());
                Ok(Some(reference))
            }
            Ok(None) => Ok(None),
            Err(LookupError::Ambiguous { count }) => Err(RowError::AmbiguousMatch {
                collection: target,
                key: key.to_string(),
                count,
            }
            .into()),
            Err(LookupError::Api(err)) => Err(ResolveError::Api(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lookup::DataSources;
    use crate::notion::mock::MockWorkspace;
    use std::collections::HashMap;

    fn item_row(assessment: &str, question: &str) -> SheetRow {
        let mut values = HashMap::new();
        values.insert("Assessment".to_string(), assessment.to_string());
        values.insert("Question".to_string(), question.to_string());
        SheetRow::new(2, values)
    }

    fn item_refs() -> Vec<(&'static str, Collection)> {
        Collection::AssessmentItems.reference_columns().collect()
    }

    #[test]
    fn test_resolves_remote_and_pending() {
        let ws = MockWorkspace::new();
        let question = ws.seed(Collection::Questions, "Q-1");
        let sources = DataSources::discover(&ws).unwrap();
        let mut resolver = Resolver::new(RemoteLookup::new(&ws, &sources));

        let pending = Reference::Pending {
            collection: Collection::Assessments,
            key: "Acme Review".to_string(),
        };
        resolver
            .index_mut()
            .insert(Collection::Assessments, "Acme Review", pending.clone());

        let relations = resolver
            .resolve(&item_row("Acme Review", "Q-1"), &item_refs())
            .unwrap();

        assert_eq!(
            relations,
            vec![
                RelationRef {
                    property: "Assessment".to_string(),
                    target: pending,
                },
                RelationRef {
                    property: "Question".to_string(),
                    target: Reference::Existing(question),
                },
            ]
        );
        // The pending assessment never hit the API
        assert_eq!(ws.query_count(), 1);
    }

    #[test]
    fn test_collects_every_unresolved_reference() {
        let ws = MockWorkspace::new();
        let sources = DataSources::discover(&ws).unwrap();
        let mut resolver = Resolver::new(RemoteLookup::new(&ws, &sources));

        let err = resolver
            .resolve(&item_row("", "Q-999"), &item_refs())
            .unwrap_err();

        match err {
            ResolveError::Row(RowError::UnresolvedReference { references }) => {
                assert_eq!(references.len(), 2);
                assert_eq!(references[1].key, "Q-999");
            }
            other => panic!("expected UnresolvedReference, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_reference() {
        let ws = MockWorkspace::new();
        ws.seed(Collection::Questions, "Q-1");
        ws.seed(Collection::Questions, "Q-1");
        let sources = DataSources::discover(&ws).unwrap();
        let mut resolver = Resolver::new(RemoteLookup::new(&ws, &sources));

        let err = resolver.resolve_one(Collection::Questions, "Q-1").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Row(RowError::AmbiguousMatch { count: 2, .. })
        ));
    }

    #[test]
    fn test_remote_hits_are_indexed() {
        let ws = MockWorkspace::new();
        ws.seed(Collection::Vendors, "Acme");
        let sources = DataSources::discover(&ws).unwrap();
        let mut resolver = Resolver::new(RemoteLookup::new(&ws, &sources));

        resolver.resolve_one(Collection::Vendors, "Acme").unwrap();
        assert_eq!(resolver.index_mut().get(Collection::Vendors, "Acme").len(), 1);
    }

    #[test]
    fn test_title_shared_by_two_planned_rows_is_ambiguous() {
        let ws = MockWorkspace::new();
        let sources = DataSources::discover(&ws).unwrap();
        let mut resolver = Resolver::new(RemoteLookup::new(&ws, &sources));

        for key in ["Review (Acme)", "Review (Globex)"] {
            resolver.index_mut().insert(
                Collection::Assessments,
                "Review",
                Reference::Pending {
                    collection: Collection::Assessments,
                    key: key.to_string(),
                },
            );
        }

        let err = resolver
            .resolve_one(Collection::Assessments, "Review")
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Row(RowError::AmbiguousMatch { count: 2, .. })
        ));
        assert_eq!(ws.query_count(), 0);
    }
}
