//! Import planning: decide create, skip or error for every source row

use std::collections::HashMap;

use crate::core::collection::Collection;
use crate::core::error::{ImportError, RowError};
use crate::core::lookup::{DataSources, LookupError, NaturalKey, RemoteLookup};
use crate::core::plan::{Action, Payload, Plan, PlanEntry, Reference};
use crate::core::property::{build_property_value, title_value};
use crate::core::resolver::{ResolveError, Resolver};
use crate::core::sheet::{SheetRow, SheetSet};
use crate::notion::{RemoteId, Workspace};

/// Builds a [`Plan`] from loaded sheets and the current remote state
pub struct Planner<'a, W: Workspace> {
    resolver: Resolver<'a, W>,
}

impl<'a, W: Workspace> Planner<'a, W> {
    pub fn new(workspace: &'a W, sources: &'a DataSources) -> Self {
        Self {
            resolver: Resolver::new(RemoteLookup::new(workspace, sources)),
        }
    }

    /// Plan every row, collection by collection in import order.
    ///
    /// Row-level problems become `Action::Error` entries; API failures abort.
    pub fn plan(mut self, sheets: &SheetSet) -> Result<Plan, ImportError> {
        let mut plan = Plan::new();

        for collection in Collection::IMPORT_ORDER {
            let mut seen: HashMap<String, u64> = HashMap::new();

            for row in sheets.rows(collection) {
                let key = collection.natural_key(row).unwrap_or_default();
                let action = match self.plan_row(collection, row, &mut seen) {
                    Ok(action) => action,
                    Err(ResolveError::Row(err)) => Action::Error(err),
                    Err(ResolveError::Api(err)) => return Err(err.into()),
                };

                tracing::debug!(
                    collection = %collection,
                    line = row.line(),
                    key = %key,
                    action = action_name(&action),
                    "planned row"
                );

                plan.push(PlanEntry {
                    collection,
                    line: row.line(),
                    key,
                    action,
                });
            }
        }

        debug_assert!(plan.is_dependency_ordered());
        Ok(plan)
    }

    fn plan_row(
        &mut self,
        collection: Collection,
        row: &SheetRow,
        seen: &mut HashMap<String, u64>,
    ) -> Result<Action, ResolveError> {
        let key = match collection.natural_key(row) {
            Some(key) => key,
            None => {
                let column = collection
                    .key_columns()
                    .iter()
                    .find(|c| row.get(c).trim().is_empty())
                    .copied()
                    .unwrap_or(collection.key_property());
                return Err(RowError::MissingKey {
                    column: column.to_string(),
                }
                .into());
            }
        };

        if let Some(&first_line) = seen.get(&key) {
            return Err(RowError::DuplicateKey { key, first_line }.into());
        }
        seen.insert(key.clone(), row.line());

        // Other sheets refer to this row by its title alone
        let title = collection.key_title(row).unwrap_or_else(|| key.clone());

        if let Some(id) = self.find_existing(collection, row, &title)? {
            self.resolver
                .index_mut()
                .insert(collection, title, Reference::Existing(id.clone()));
            return Ok(Action::Skip(id));
        }

        let references: Vec<_> = collection.reference_columns().collect();
        let relations = self.resolver.resolve(row, &references)?;

        let mut payload = Payload {
            relations,
            ..Payload::default()
        };
        for column in collection.columns() {
            let value = build_property_value(column.kind, row.get(column.name)).map_err(|e| {
                RowError::InvalidField {
                    column: column.name.to_string(),
                    message: e.to_string(),
                }
            })?;
            if let Some(value) = value {
                payload.properties.insert(column.name.to_string(), value);
            }
        }
        if collection == Collection::AssessmentItems {
            payload
                .properties
                .insert(collection.key_property().to_string(), title_value(&title));
        }

        self.resolver
            .index_mut()
            .insert(collection, title, Reference::Pending { collection, key });
        Ok(Action::Create(payload))
    }

    /// Look the row's own title up remotely, within its scope if it has one.
    ///
    /// A scope that is pending or unresolved means the row cannot exist yet;
    /// reference resolution reports the unresolved case.
    fn find_existing(
        &mut self,
        collection: Collection,
        row: &SheetRow,
        title: &str,
    ) -> Result<Option<RemoteId>, ResolveError> {
        let natural_key = match collection.key_scope() {
            None => NaturalKey::plain(title),
            Some((column, target)) => {
                match self.resolver.resolve_one(target, row.get(column).trim())? {
                    Some(Reference::Existing(id)) => NaturalKey::scoped(title, id),
                    Some(Reference::Pending { .. }) | None => return Ok(None),
                }
            }
        };

        match self
            .resolver
            .lookup()
            .find_by_natural_key(collection, &natural_key)
        {
            Ok(found) => Ok(found),
            Err(LookupError::Ambiguous { count }) => Err(RowError::AmbiguousMatch {
                collection,
                key: title.to_string(),
                count,
            }
            .into()),
            Err(LookupError::Api(err)) => Err(ResolveError::Api(err)),
        }
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::Skip(_) => "skip",
        Action::Create(_) => "create",
        Action::Error(_) => "error",
    }
}
