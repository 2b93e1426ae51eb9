//! Error taxonomy for an import run
//!
//! [`ImportError`] aborts the run. [`RowError`] is attached to a single plan
//! entry and reported at the end without stopping other rows.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::collection::Collection;
use crate::notion::ApiError;

/// Fatal errors that stop the run
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("CSV file not found: {}", .path.display())]
    #[diagnostic(
        code(notion_bootstrap::file_not_found),
        help("Check --sample-data-dir and --questions-csv")
    )]
    FileNotFound { path: PathBuf },

    #[error("Malformed CSV {}{}: {message}", .path.display(), format_line(.line))]
    #[diagnostic(
        code(notion_bootstrap::malformed_csv),
        help("Headers must match the template exactly; run `notion-bootstrap template <collection>`")
    )]
    MalformedCsv {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    #[diagnostic(code(notion_bootstrap::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    #[diagnostic(code(notion_bootstrap::output))]
    Output(#[from] std::io::Error),

    #[error("No Notion token available")]
    #[diagnostic(
        code(notion_bootstrap::auth),
        help("Pass --token or set NOTION_TOKEN")
    )]
    AuthError,

    #[error("Notion API unavailable: {message}")]
    #[diagnostic(code(notion_bootstrap::api_unavailable))]
    ApiUnavailable { message: String },

    #[error("Permission denied by Notion API (status {status}): {message}")]
    #[diagnostic(
        code(notion_bootstrap::permission_denied),
        help("Open each template database in Notion and add your integration under Connections")
    )]
    PermissionDenied { status: u16, message: String },

    #[error("Data source not found: {title}")]
    #[diagnostic(
        code(notion_bootstrap::data_source_not_found),
        help("Install the workspace template first, then share its databases with your integration")
    )]
    DataSourceNotFound { title: String },

    #[error("Notion API rejected the request (status {status}): {message}")]
    #[diagnostic(
        code(notion_bootstrap::api_rejected),
        help("The database schema may not match the template")
    )]
    ApiRejected { status: u16, message: String },

    #[error("Import finished with {errors} error(s) and {failed} failed create(s)")]
    #[diagnostic(code(notion_bootstrap::incomplete))]
    Incomplete { errors: usize, failed: usize },
}

impl From<ApiError> for ImportError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unavailable { message } => ImportError::ApiUnavailable { message },
            ApiError::PermissionDenied { status, message } => {
                ImportError::PermissionDenied { status, message }
            }
            ApiError::Rejected { status, message } => ImportError::ApiRejected { status, message },
            ApiError::Decode { message } => ImportError::ApiUnavailable {
                message: format!("unexpected response: {}", message),
            },
        }
    }
}

/// Per-row failures, deferred to the final report
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing value for key column '{column}'")]
    MissingKey { column: String },

    #[error("duplicate key '{key}' (first seen on line {first_line})")]
    DuplicateKey { key: String, first_line: u64 },

    #[error("unresolved reference(s): {}", format_unresolved(.references))]
    UnresolvedReference { references: Vec<UnresolvedRef> },

    #[error("{count} {collection} records match '{key}'")]
    AmbiguousMatch {
        collection: Collection,
        key: String,
        count: usize,
    },

    #[error("column '{column}': {message}")]
    InvalidField { column: String, message: String },

    #[error("{} '{key}' was not created in this run", .collection.label())]
    DependencyFailed { collection: Collection, key: String },

    #[error("rejected by Notion API (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// A reference cell that did not match any record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRef {
    pub column: String,
    pub key: String,
}

fn format_line(line: &Option<u64>) -> String {
    line.map(|l| format!(" (line {})", l)).unwrap_or_default()
}

fn format_unresolved(refs: &[UnresolvedRef]) -> String {
    refs.iter()
        .map(|r| {
            if r.key.is_empty() {
                format!("{} (blank)", r.column)
            } else {
                format!("{} '{}'", r.column, r.key)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_message_lists_all_references() {
        let err = RowError::UnresolvedReference {
            references: vec![
                UnresolvedRef {
                    column: "Assessment".to_string(),
                    key: String::new(),
                },
                UnresolvedRef {
                    column: "Question".to_string(),
                    key: "Q-999".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "unresolved reference(s): Assessment (blank), Question 'Q-999'"
        );
    }

    #[test]
    fn test_api_error_conversion() {
        let err: ImportError = ApiError::PermissionDenied {
            status: 403,
            message: "restricted".to_string(),
        }
        .into();
        assert!(matches!(err, ImportError::PermissionDenied { status: 403, .. }));

        let err: ImportError = ApiError::Unavailable {
            message: "timed out".to_string(),
        }
        .into();
        assert!(matches!(err, ImportError::ApiUnavailable { .. }));
    }

    #[test]
    fn test_malformed_message_includes_line() {
        let err = ImportError::MalformedCsv {
            path: PathBuf::from("vendors.csv"),
            line: Some(4),
            message: "expected 8 fields, found 7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed CSV vendors.csv (line 4): expected 8 fields, found 7"
        );
    }
}
