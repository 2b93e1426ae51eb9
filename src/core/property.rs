//! Conversion of CSV cell values into Notion property values

use chrono::{DateTime, NaiveDate};
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::collection::Collection;
use crate::notion::RemoteId;

/// Maximum length of a single rich text segment accepted by the API
pub const TEXT_CHUNK_LEN: usize = 2000;

/// Notion property type a column is written as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Select,
    MultiSelect,
    Number,
    Checkbox,
    Email,
    Date,
    Url,
    /// Relation to a page in another collection, written once the id is known
    Relation(Collection),
}

/// A cell value that cannot be written as its property type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("'{0}' is not a date (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDate(String),
}

/// Build the property value for a cell.
///
/// Blank cells yield `Ok(None)` so the property is left out of the payload.
/// Relation columns also yield `None`; they are filled in from resolved
/// references instead.
pub fn build_property_value(kind: PropertyKind, raw: &str) -> Result<Option<Value>, FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let value = match kind {
        PropertyKind::Title => json!({ "title": text_value(raw) }),
        PropertyKind::RichText => json!({ "rich_text": text_value(raw) }),
        PropertyKind::Select => json!({ "select": { "name": raw } }),
        PropertyKind::MultiSelect => {
            let options: Vec<Value> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|name| json!({ "name": name }))
                .collect();
            json!({ "multi_select": options })
        }
        PropertyKind::Number => {
            let number: f64 = raw
                .parse()
                .map_err(|_| FieldError::InvalidNumber(raw.to_string()))?;
            if !number.is_finite() {
                return Err(FieldError::InvalidNumber(raw.to_string()));
            }
            json!({ "number": number })
        }
        PropertyKind::Checkbox => json!({ "checkbox": raw.eq_ignore_ascii_case("true") }),
        PropertyKind::Email => json!({ "email": raw }),
        PropertyKind::Date => {
            validate_date(raw)?;
            json!({ "date": { "start": raw } })
        }
        PropertyKind::Url => json!({ "url": raw }),
        PropertyKind::Relation(_) => return Ok(None),
    };

    Ok(Some(value))
}

/// Relation property value pointing at a single page
pub fn relation_value(id: &RemoteId) -> Value {
    json!({ "relation": [{ "id": id.as_str() }] })
}

/// Title property value, used for derived titles
pub fn title_value(text: &str) -> Value {
    json!({ "title": text_value(text) })
}

/// Rich text array, split into API-sized segments
fn text_value(content: &str) -> Vec<Value> {
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(TEXT_CHUNK_LEN)
        .map(|chunk| {
            let segment: String = chunk.iter().collect();
            json!({ "text": { "content": segment } })
        })
        .collect()
}

fn validate_date(raw: &str) -> Result<(), FieldError> {
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(raw).is_ok()
    {
        Ok(())
    } else {
        Err(FieldError::InvalidDate(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cells_are_omitted() {
        assert_eq!(build_property_value(PropertyKind::Select, "   "), Ok(None));
        assert_eq!(build_property_value(PropertyKind::Number, ""), Ok(None));
    }

    #[test]
    fn test_title_and_select() {
        let title = build_property_value(PropertyKind::Title, " Acme ").unwrap().unwrap();
        assert_eq!(title, json!({ "title": [{ "text": { "content": "Acme" } }] }));

        let select = build_property_value(PropertyKind::Select, "High").unwrap().unwrap();
        assert_eq!(select, json!({ "select": { "name": "High" } }));
    }

    #[test]
    fn test_multi_select_splits_on_commas() {
        let value = build_property_value(PropertyKind::MultiSelect, "PII, Financial,,")
            .unwrap()
            .unwrap();
        assert_eq!(
            value,
            json!({ "multi_select": [{ "name": "PII" }, { "name": "Financial" }] })
        );
    }

    #[test]
    fn test_number() {
        let value = build_property_value(PropertyKind::Number, "2.5").unwrap().unwrap();
        assert_eq!(value, json!({ "number": 2.5 }));

        assert_eq!(
            build_property_value(PropertyKind::Number, "high"),
            Err(FieldError::InvalidNumber("high".to_string()))
        );
        assert!(build_property_value(PropertyKind::Number, "NaN").is_err());
    }

    #[test]
    fn test_checkbox() {
        let yes = build_property_value(PropertyKind::Checkbox, "true").unwrap().unwrap();
        assert_eq!(yes, json!({ "checkbox": true }));

        let no = build_property_value(PropertyKind::Checkbox, "no").unwrap().unwrap();
        assert_eq!(no, json!({ "checkbox": false }));
    }

    #[test]
    fn test_date_validation() {
        assert!(build_property_value(PropertyKind::Date, "2026-03-01").is_ok());
        assert!(build_property_value(PropertyKind::Date, "2026-03-01T10:00:00Z").is_ok());
        assert_eq!(
            build_property_value(PropertyKind::Date, "03/01/2026"),
            Err(FieldError::InvalidDate("03/01/2026".to_string()))
        );
    }

    #[test]
    fn test_relation_columns_are_deferred() {
        let kind = PropertyKind::Relation(Collection::Vendors);
        assert_eq!(build_property_value(kind, "Acme"), Ok(None));
    }

    #[test]
    fn test_long_text_is_chunked() {
        let long = "x".repeat(TEXT_CHUNK_LEN + 5);
        let value = build_property_value(PropertyKind::RichText, &long)
            .unwrap()
            .unwrap();
        let segments = value["rich_text"].as_array().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1]["text"]["content"], "xxxxx");
    }

    #[test]
    fn test_relation_value() {
        let id = RemoteId::new("page-1");
        assert_eq!(relation_value(&id), json!({ "relation": [{ "id": "page-1" }] }));
    }
}
