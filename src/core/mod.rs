//! Core module - CSV loading, planning and execution

pub mod collection;
pub mod config;
pub mod error;
pub mod executor;
pub mod lookup;
pub mod plan;
pub mod planner;
pub mod property;
pub mod resolver;
pub mod sheet;

pub use collection::Collection;
pub use config::{Config, TokenSource};
pub use error::{ImportError, RowError};
pub use executor::{Executor, Mode, RunReport};
pub use lookup::DataSources;
pub use plan::{Action, Plan, PlanEntry};
pub use planner::Planner;
pub use sheet::{InputPaths, SheetSet};
