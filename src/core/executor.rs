//! Plan execution
//!
//! The executor runs in exactly one [`Mode`] for its whole lifetime. In
//! `DryRun` it only reports; in `Apply` it inserts `Create` entries in plan
//! order and remembers every id it creates, so rows planned against records
//! that did not exist yet can be linked once their parent is in place.

use console::style;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::time::Duration;
use tabled::{builder::Builder, settings::Style};

use crate::core::collection::Collection;
use crate::core::error::{ImportError, RowError};
use crate::core::lookup::DataSources;
use crate::core::plan::{Action, Payload, Plan, PlanEntry, Reference};
use crate::core::property::relation_value;
use crate::notion::{ApiError, RemoteId, Workspace};

/// Execution mode, fixed at start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    DryRun,
    Apply,
}

/// Per-collection results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Records inserted (apply) or that would be inserted (dry run)
    pub created: usize,
    pub skipped: usize,
    /// Plan errors plus rows whose dependency was never created
    pub errors: usize,
    /// Inserts the API refused
    pub failed: usize,
}

/// Summary of an execution
#[derive(Debug, Clone)]
pub struct RunReport {
    mode: Mode,
    outcomes: BTreeMap<Collection, Outcome>,
}

impl RunReport {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            outcomes: Collection::IMPORT_ORDER
                .iter()
                .map(|c| (*c, Outcome::default()))
                .collect(),
        }
    }

    fn outcome_mut(&mut self, collection: Collection) -> &mut Outcome {
        self.outcomes.entry(collection).or_default()
    }

    pub fn outcome(&self, collection: Collection) -> Outcome {
        self.outcomes.get(&collection).copied().unwrap_or_default()
    }

    pub fn totals(&self) -> Outcome {
        self.outcomes
            .values()
            .fold(Outcome::default(), |acc, o| Outcome {
                created: acc.created + o.created,
                skipped: acc.skipped + o.skipped,
                errors: acc.errors + o.errors,
                failed: acc.failed + o.failed,
            })
    }

    pub fn is_success(&self) -> bool {
        let totals = self.totals();
        totals.errors == 0 && totals.failed == 0
    }

    /// Turn an unsuccessful run into the error that sets the exit status
    pub fn into_result(self) -> Result<Self, ImportError> {
        if self.is_success() {
            Ok(self)
        } else {
            let totals = self.totals();
            Err(ImportError::Incomplete {
                errors: totals.errors,
                failed: totals.failed,
            })
        }
    }

    /// Markdown table of per-collection counts
    pub fn render_table(&self) -> String {
        let created_label = match self.mode {
            Mode::DryRun => "Would create",
            Mode::Apply => "Created",
        };

        let mut builder = Builder::default();
        builder.push_record(["Collection", created_label, "Skipped", "Errors", "Failed"]);
        for (collection, o) in &self.outcomes {
            builder.push_record([
                collection.title().to_string(),
                o.created.to_string(),
                o.skipped.to_string(),
                o.errors.to_string(),
                o.failed.to_string(),
            ]);
        }
        let t = self.totals();
        builder.push_record([
            "Total".to_string(),
            t.created.to_string(),
            t.skipped.to_string(),
            t.errors.to_string(),
            t.failed.to_string(),
        ]);

        builder.build().with(Style::markdown()).to_string()
    }
}

/// Walks a plan against a workspace
pub struct Executor<'a, W: Workspace> {
    mode: Mode,
    workspace: &'a W,
    sources: &'a DataSources,
    delay: Duration,
    quiet: bool,
    created: HashMap<(Collection, String), RemoteId>,
}

impl<'a, W: Workspace> Executor<'a, W> {
    pub fn new(mode: Mode, workspace: &'a W, sources: &'a DataSources) -> Self {
        Self {
            mode,
            workspace,
            sources,
            delay: Duration::ZERO,
            quiet: false,
            created: HashMap::new(),
        }
    }

    /// Pause between consecutive inserts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Only print failed rows; no progress lines and no summary table
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Execute the plan, writing one line per entry to `out`.
    ///
    /// Only `ApiUnavailable`/`PermissionDenied` style failures and output
    /// errors are returned; everything row-level ends up in the report.
    pub fn execute<O: Write + ?Sized>(
        mut self,
        plan: &Plan,
        out: &mut O,
    ) -> Result<RunReport, ImportError> {
        let mut report = RunReport::new(self.mode);
        let mut inserted_any = false;

        for entry in plan.entries() {
            match &entry.action {
                Action::Skip(id) => {
                    report.outcome_mut(entry.collection).skipped += 1;
                    if !self.quiet {
                        writeln!(
                            out,
                            "{} {} Exists {} ({})",
                            style("=").dim(),
                            location(entry),
                            describe(entry),
                            style(id).dim()
                        )?;
                    }
                }
                Action::Error(err) => {
                    report.outcome_mut(entry.collection).errors += 1;
                    write_error(out, entry, err)?;
                }
                Action::Create(payload) if self.mode == Mode::DryRun => {
                    report.outcome_mut(entry.collection).created += 1;
                    if !self.quiet {
                        writeln!(
                            out,
                            "{} {} Would create {}",
                            style("○").dim(),
                            location(entry),
                            describe(entry)
                        )?;
                    }
                    tracing::debug!(properties = payload.properties.len(), "dry run payload");
                }
                Action::Create(payload) => {
                    let properties = match self.finalize(payload) {
                        Ok(properties) => properties,
                        Err(err) => {
                            report.outcome_mut(entry.collection).errors += 1;
                            write_error(out, entry, &err)?;
                            continue;
                        }
                    };

                    if inserted_any && !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    inserted_any = true;

                    match self
                        .workspace
                        .insert(self.sources.get(entry.collection), &properties)
                    {
                        Ok(id) => {
                            report.outcome_mut(entry.collection).created += 1;
                            if !self.quiet {
                                writeln!(
                                    out,
                                    "{} {} Created {} ({})",
                                    style("✓").green(),
                                    location(entry),
                                    describe(entry),
                                    style(&id).cyan()
                                )?;
                            }
                            self.created
                                .insert((entry.collection, entry.key.clone()), id);
                        }
                        Err(ApiError::Rejected { status, message }) => {
                            report.outcome_mut(entry.collection).failed += 1;
                            write_error(out, entry, &RowError::Rejected { status, message })?;
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }

        if !self.quiet {
            writeln!(out)?;
            writeln!(out, "{}", report.render_table())?;
            if self.mode == Mode::DryRun {
                writeln!(out)?;
                writeln!(
                    out,
                    "{}",
                    style("Dry run complete. No records were created.").yellow()
                )?;
            }
        }

        Ok(report)
    }

    /// Fill relation properties, mapping pending references to ids created
    /// earlier in this run
    fn finalize(&self, payload: &Payload) -> Result<Map<String, Value>, RowError> {
        let mut properties = payload.properties.clone();
        for relation in &payload.relations {
            let id = match &relation.target {
                Reference::Existing(id) => id,
                Reference::Pending { collection, key } => self
                    .created
                    .get(&(*collection, key.clone()))
                    .ok_or_else(|| RowError::DependencyFailed {
                        collection: *collection,
                        key: key.clone(),
                    })?,
            };
            properties.insert(relation.property.clone(), relation_value(id));
        }
        Ok(properties)
    }
}

fn location(entry: &PlanEntry) -> String {
    format!("{}:{}", entry.collection.file_name(), entry.line)
}

fn describe(entry: &PlanEntry) -> String {
    if entry.key.is_empty() {
        entry.collection.label().to_string()
    } else {
        format!(
            "{} {}",
            entry.collection.label(),
            style(format!("'{}'", entry.key)).cyan()
        )
    }
}

fn write_error<O: Write + ?Sized>(
    out: &mut O,
    entry: &PlanEntry,
    err: &RowError,
) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {} {}: {}",
        style("✗").red(),
        location(entry),
        describe(entry),
        err
    )
}
