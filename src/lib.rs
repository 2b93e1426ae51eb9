//! notion-bootstrap: seed a Notion vendor-risk workspace from CSV files
//!
//! Rows are matched against existing records by natural key, so running the
//! import twice creates nothing new.

pub mod cli;
pub mod core;
pub mod notion;
