//! CSV loading
//!
//! Reads each input file into ordered rows keyed by the verbatim header text.

use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::core::collection::Collection;
use crate::core::error::ImportError;

/// One data row of a CSV file
#[derive(Debug, Clone)]
pub struct SheetRow {
    line: u64,
    values: HashMap<String, String>,
}

impl SheetRow {
    pub fn new(line: u64, values: HashMap<String, String>) -> Self {
        Self { line, values }
    }

    /// 1-based line number in the source file
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Cell value for a column, empty if the column is absent
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }
}

/// A loaded CSV file
#[derive(Debug, Clone)]
pub struct Sheet {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<SheetRow>,
}

impl Sheet {
    /// Read a CSV file with a header row.
    ///
    /// A zero-byte file is an empty sheet. Blank or duplicate headers and rows
    /// whose field count differs from the header are rejected.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        if !path.is_file() {
            return Err(ImportError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(BufReader::new(file));

        let malformed = |line: Option<u64>, message: String| ImportError::MalformedCsv {
            path: path.to_path_buf(),
            line,
            message,
        };

        let header_record = rdr
            .headers()
            .map_err(|e| malformed(e.position().map(|p| p.line()), e.to_string()))?
            .clone();
        let headers: Vec<String> = header_record.iter().map(str::to_string).collect();

        let mut seen = HashSet::new();
        for header in &headers {
            if header.trim().is_empty() {
                return Err(malformed(Some(1), "blank column header".to_string()));
            }
            if !seen.insert(header.as_str()) {
                return Err(malformed(
                    Some(1),
                    format!("duplicate column header '{}'", header),
                ));
            }
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| malformed(e.position().map(|p| p.line()), e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let values = headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();
            rows.push(SheetRow::new(line, values));
        }

        tracing::debug!(path = %path.display(), rows = rows.len(), "loaded CSV");

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    /// Check that every column of the collection schema is present.
    ///
    /// A sheet with no header at all (zero-byte file) passes.
    pub fn require_columns(&self, collection: Collection) -> Result<(), ImportError> {
        if self.headers.is_empty() {
            return Ok(());
        }

        let missing: Vec<&str> = collection
            .columns()
            .iter()
            .map(|c| c.name)
            .filter(|name| !self.headers.iter().any(|h| h == name))
            .collect();

        if !missing.is_empty() {
            return Err(ImportError::MalformedCsv {
                path: self.path.clone(),
                line: Some(1),
                message: format!("missing column(s): {}", missing.join(", ")),
            });
        }

        for header in &self.headers {
            if !collection.columns().iter().any(|c| c.name == header) {
                tracing::warn!(
                    path = %self.path.display(),
                    column = %header,
                    "ignoring column not in the {} schema",
                    collection.title()
                );
            }
        }

        Ok(())
    }
}

/// Locations of the four input files
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub questions: PathBuf,
    pub vendors: PathBuf,
    pub assessments: PathBuf,
    pub assessment_items: PathBuf,
}

impl InputPaths {
    /// Sample data directory layout with a separate question pack file
    pub fn new(sample_data_dir: &Path, questions_csv: &Path) -> Self {
        Self {
            questions: questions_csv.to_path_buf(),
            vendors: sample_data_dir.join(Collection::Vendors.file_name()),
            assessments: sample_data_dir.join(Collection::Assessments.file_name()),
            assessment_items: sample_data_dir.join(Collection::AssessmentItems.file_name()),
        }
    }

    pub fn path(&self, collection: Collection) -> &Path {
        match collection {
            Collection::Questions => &self.questions,
            Collection::Vendors => &self.vendors,
            Collection::Assessments => &self.assessments,
            Collection::AssessmentItems => &self.assessment_items,
        }
    }
}

/// All four sheets of one import run
#[derive(Debug, Clone)]
pub struct SheetSet {
    sheets: HashMap<Collection, Sheet>,
}

impl SheetSet {
    /// Load and schema-check every input file, in import order
    pub fn load(paths: &InputPaths) -> Result<Self, ImportError> {
        let mut sheets = HashMap::new();
        for collection in Collection::IMPORT_ORDER {
            let sheet = Sheet::load(paths.path(collection))?;
            sheet.require_columns(collection)?;
            sheets.insert(collection, sheet);
        }
        Ok(Self { sheets })
    }

    /// Build from already-loaded sheets; missing collections count as empty
    pub fn from_sheets(sheets: impl IntoIterator<Item = (Collection, Sheet)>) -> Self {
        Self {
            sheets: sheets.into_iter().collect(),
        }
    }

    /// Rows for a collection
    pub fn rows(&self, collection: Collection) -> &[SheetRow] {
        self.sheets
            .get(&collection)
            .map(Sheet::rows)
            .unwrap_or(&[])
    }
}
