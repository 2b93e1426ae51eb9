//! Target collections and their CSV column schema

use clap::ValueEnum;
use std::fmt;

use crate::core::property::PropertyKind;
use crate::core::sheet::SheetRow;

/// A remote Notion data source the importer writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Collection {
    /// Question Library
    Questions,
    /// Vendors
    Vendors,
    /// Assessments (one vendor each)
    Assessments,
    /// Assessment Items (one assessment + one question each)
    AssessmentItems,
}

/// A column of an input CSV and the property it maps to
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: PropertyKind,
}

const fn col(name: &'static str, kind: PropertyKind) -> Column {
    Column { name, kind }
}

const QUESTION_COLUMNS: &[Column] = &[
    col("Question", PropertyKind::Title),
    col("Question Code", PropertyKind::RichText),
    col("Domain", PropertyKind::Select),
    col("Question Type", PropertyKind::Select),
    col("Weight", PropertyKind::Number),
    col("Critical", PropertyKind::Checkbox),
    col("Evidence Required", PropertyKind::Checkbox),
    col("Suggested Evidence", PropertyKind::RichText),
    col("Reference Tags", PropertyKind::RichText),
    col("Pack", PropertyKind::MultiSelect),
];

const VENDOR_COLUMNS: &[Column] = &[
    col("Vendor", PropertyKind::Title),
    col("Category", PropertyKind::Select),
    col("Criticality", PropertyKind::Select),
    col("Data Access", PropertyKind::MultiSelect),
    col("Vendor Contact Email", PropertyKind::Email),
    col("Status", PropertyKind::Select),
    col("Renewal Date", PropertyKind::Date),
    col("Notes", PropertyKind::RichText),
];

const ASSESSMENT_COLUMNS: &[Column] = &[
    col("Assessment", PropertyKind::Title),
    col("Vendor", PropertyKind::Relation(Collection::Vendors)),
    col("Type", PropertyKind::Select),
    col("Scope Pack", PropertyKind::Select),
    col("Status", PropertyKind::Select),
    col("Start Date", PropertyKind::Date),
    col("Due Date", PropertyKind::Date),
    col("End Date", PropertyKind::Date),
    col("Decision", PropertyKind::Select),
    col("Conditions", PropertyKind::RichText),
    col("Decision Date", PropertyKind::Date),
];

const ASSESSMENT_ITEM_COLUMNS: &[Column] = &[
    col("Assessment", PropertyKind::Relation(Collection::Assessments)),
    col("Question", PropertyKind::Relation(Collection::Questions)),
    col("Response Score Raw", PropertyKind::Number),
    col("Response Text", PropertyKind::RichText),
    col("Evidence Status", PropertyKind::Select),
    col("Finding Severity", PropertyKind::Select),
    col("Notes", PropertyKind::RichText),
];

impl Collection {
    /// Import order. Every collection comes after the collections it references.
    pub const IMPORT_ORDER: [Collection; 4] = [
        Collection::Questions,
        Collection::Vendors,
        Collection::Assessments,
        Collection::AssessmentItems,
    ];

    /// Title of the data source in the workspace template
    pub fn title(&self) -> &'static str {
        match self {
            Collection::Questions => "Question Library",
            Collection::Vendors => "Vendors",
            Collection::Assessments => "Assessments",
            Collection::AssessmentItems => "Assessment Items",
        }
    }

    /// Singular label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Questions => "question",
            Collection::Vendors => "vendor",
            Collection::Assessments => "assessment",
            Collection::AssessmentItems => "assessment item",
        }
    }

    /// Default CSV file name
    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::Questions => "questions.csv",
            Collection::Vendors => "vendors.csv",
            Collection::Assessments => "assessments.csv",
            Collection::AssessmentItems => "assessment_items.csv",
        }
    }

    /// CSV columns, in template order
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Collection::Questions => QUESTION_COLUMNS,
            Collection::Vendors => VENDOR_COLUMNS,
            Collection::Assessments => ASSESSMENT_COLUMNS,
            Collection::AssessmentItems => ASSESSMENT_ITEM_COLUMNS,
        }
    }

    /// Columns that point at rows of another collection
    pub fn reference_columns(&self) -> impl Iterator<Item = (&'static str, Collection)> {
        self.columns().iter().filter_map(|c| match c.kind {
            PropertyKind::Relation(target) => Some((c.name, target)),
            _ => None,
        })
    }

    /// Title property holding the natural key remotely
    pub fn key_property(&self) -> &'static str {
        match self {
            Collection::Questions => "Question",
            Collection::Vendors => "Vendor",
            Collection::Assessments => "Assessment",
            Collection::AssessmentItems => "Item",
        }
    }

    /// Relation column that scopes the natural key, if any.
    ///
    /// Assessment titles are only unique per vendor, and an item title only
    /// identifies an item within its assessment.
    pub fn key_scope(&self) -> Option<(&'static str, Collection)> {
        match self {
            Collection::Assessments => Some(("Vendor", Collection::Vendors)),
            Collection::AssessmentItems => Some(("Assessment", Collection::Assessments)),
            _ => None,
        }
    }

    /// Value of the key title property for a row, or `None` when a key cell
    /// is blank. Other sheets refer to rows by this value.
    pub fn key_title(&self, row: &SheetRow) -> Option<String> {
        match self {
            Collection::AssessmentItems => {
                let assessment = non_empty(row.get("Assessment"))?;
                let question = non_empty(row.get("Question"))?;
                Some(format!("{} | {}", assessment, question))
            }
            _ => non_empty(row.get(self.key_property())).map(str::to_string),
        }
    }

    /// Identity of a row within one run.
    ///
    /// Same as [`key_title`](Self::key_title) except for assessments, whose
    /// vendor is part of the identity: `Review (Acme)`.
    pub fn natural_key(&self, row: &SheetRow) -> Option<String> {
        let title = self.key_title(row)?;
        match self {
            Collection::Assessments => match non_empty(row.get("Vendor")) {
                Some(vendor) => Some(format!("{} ({})", title, vendor)),
                None => Some(title),
            },
            _ => Some(title),
        }
    }

    /// Columns whose blank value makes the natural key unusable
    pub fn key_columns(&self) -> &'static [&'static str] {
        match self {
            Collection::Questions => &["Question"],
            Collection::Vendors => &["Vendor"],
            Collection::Assessments => &["Assessment"],
            Collection::AssessmentItems => &["Assessment", "Question"],
        }
    }

    /// Example row for `template`, aligned with `columns()`
    pub fn example_row(&self) -> &'static [&'static str] {
        match self {
            Collection::Questions => &[
                "Is customer data encrypted at rest?",
                "SEC-001",
                "Security",
                "Yes/No",
                "3",
                "TRUE",
                "TRUE",
                "Encryption policy",
                "SOC2 CC6.1",
                "SaaS Core",
            ],
            Collection::Vendors => &[
                "Acme",
                "SaaS",
                "High",
                "Customer PII,Financial",
                "security@acme.example.com",
                "Active",
                "2026-12-31",
                "Primary CRM vendor",
            ],
            Collection::Assessments => &[
                "Acme 2026 Annual Review",
                "Acme",
                "Annual",
                "SaaS Core",
                "In Progress",
                "2026-01-15",
                "2026-02-15",
                "",
                "",
                "",
                "",
            ],
            Collection::AssessmentItems => &[
                "Acme 2026 Annual Review",
                "Is customer data encrypted at rest?",
                "3",
                "AES-256 on all volumes",
                "Received",
                "None",
                "",
            ],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(pairs: &[(&str, &str)]) -> SheetRow {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SheetRow::new(2, values)
    }

    #[test]
    fn test_import_order_respects_references() {
        for (pos, collection) in Collection::IMPORT_ORDER.iter().enumerate() {
            for (_, target) in collection.reference_columns() {
                let target_pos = Collection::IMPORT_ORDER
                    .iter()
                    .position(|c| *c == target)
                    .unwrap();
                assert!(target_pos < pos, "{} must precede {}", target, collection);
            }
        }
    }

    #[test]
    fn test_example_rows_match_columns() {
        for collection in Collection::IMPORT_ORDER {
            assert_eq!(collection.columns().len(), collection.example_row().len());
        }
    }

    #[test]
    fn test_natural_key_for_items_combines_parents() {
        let r = row(&[("Assessment", " Acme Review "), ("Question", "Q-1")]);
        assert_eq!(
            Collection::AssessmentItems.natural_key(&r),
            Some("Acme Review | Q-1".to_string())
        );
    }

    #[test]
    fn test_assessment_identity_includes_vendor() {
        let acme = row(&[("Assessment", "Review"), ("Vendor", "Acme")]);
        let globex = row(&[("Assessment", "Review"), ("Vendor", "Globex")]);

        assert_eq!(
            Collection::Assessments.key_title(&acme),
            Collection::Assessments.key_title(&globex)
        );
        assert_eq!(
            Collection::Assessments.natural_key(&acme),
            Some("Review (Acme)".to_string())
        );
        assert_ne!(
            Collection::Assessments.natural_key(&acme),
            Collection::Assessments.natural_key(&globex)
        );
    }

    #[test]
    fn test_item_key_is_scoped_by_assessment() {
        assert_eq!(
            Collection::AssessmentItems.key_scope(),
            Some(("Assessment", Collection::Assessments))
        );
        assert_eq!(Collection::Questions.key_scope(), None);
    }

    #[test]
    fn test_natural_key_blank_is_none() {
        let r = row(&[("Vendor", "   ")]);
        assert_eq!(Collection::Vendors.natural_key(&r), None);

        let r = row(&[("Assessment", "Acme Review")]);
        assert_eq!(Collection::AssessmentItems.natural_key(&r), None);
    }

    #[test]
    fn test_reference_columns() {
        let refs: Vec<_> = Collection::AssessmentItems.reference_columns().collect();
        assert_eq!(
            refs,
            vec![
                ("Assessment", Collection::Assessments),
                ("Question", Collection::Questions)
            ]
        );
        assert_eq!(Collection::Vendors.reference_columns().count(), 0);
    }
}
