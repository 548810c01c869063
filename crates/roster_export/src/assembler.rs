use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::catalog;
use crate::record::Record;
use crate::selection::ExportFields;

/// How column keys become header text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    /// `first_name` -> `First Name`.
    #[default]
    Humanized,
    /// Catalog label when the key is catalogued, humanized otherwise.
    CatalogLabels,
}

impl FromStr for HeaderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "humanized" => Ok(Self::Humanized),
            "catalog_labels" | "catalog" => Ok(Self::CatalogLabels),
            other => Err(format!("unknown header style: {other}")),
        }
    }
}

/// Header row plus projected data rows, ready for any writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTable {
    pub keys: Vec<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// No columns at all; nothing worth writing.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Underscores to spaces, first letter of each word upper-cased.
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Ordered keys an export will carry.
pub fn resolve_keys(records: &[Record], fields: &ExportFields) -> Vec<String> {
    match fields {
        ExportFields::Selected(selection) => selection.keys().to_vec(),
        ExportFields::All => records
            .first()
            .map(|first| first.keys().map(str::to_string).collect())
            .unwrap_or_default(),
    }
}

/// Project `records` through `fields` into a table.
///
/// The title is not part of the table; writers take it from the document
/// metadata. An empty explicit selection yields an empty table.
pub fn assemble(records: &[Record], fields: &ExportFields, style: HeaderStyle) -> ExportTable {
    let keys = resolve_keys(records, fields);
    if keys.is_empty() {
        debug!("No columns resolved; returning empty table");
        return ExportTable::default();
    }

    let headers = keys
        .iter()
        .map(|key| match style {
            HeaderStyle::Humanized => humanize_key(key),
            HeaderStyle::CatalogLabels => catalog::label_for(key)
                .map(str::to_string)
                .unwrap_or_else(|| humanize_key(key)),
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| keys.iter().map(|key| record.display_value(key)).collect())
        .collect();

    debug!(
        columns = keys.len(),
        rows = records.len(),
        wildcard = fields.is_all(),
        "Assembled export table"
    );

    ExportTable {
        keys,
        headers,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use serde_json::json;

    fn jane() -> Record {
        Record::from_pairs([("first_name", "Jane"), ("last_name", "Doe")])
    }

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("first_name"), "First Name");
        assert_eq!(humanize_key("congressional_district"), "Congressional District");
        assert_eq!(humanize_key("zip"), "Zip");
        assert_eq!(humanize_key("voterID"), "VoterID");
        assert_eq!(humanize_key(""), "");
    }

    #[test]
    fn test_jane_doe_example() {
        let fields = ExportFields::from(Selection::from_keys(["first_name", "last_name"]));
        let table = assemble(&[jane()], &fields, HeaderStyle::Humanized);
        assert_eq!(table.headers, vec!["First Name", "Last Name"]);
        assert_eq!(table.rows, vec![vec!["Jane", "Doe"]]);
    }

    #[test]
    fn test_missing_fields_are_empty_cells() {
        let records = vec![
            jane(),
            Record::from_pairs([("first_name", json!("Sam")), ("last_name", json!(null))]),
        ];
        let fields = ExportFields::from(Selection::from_keys(["last_name", "party", "first_name"]));
        let table = assemble(&records, &fields, HeaderStyle::Humanized);

        assert_eq!(table.column_count(), 3);
        for row in &table.rows {
            assert_eq!(row.len(), 3);
        }
        assert_eq!(table.rows[0], vec!["Doe", "", "Jane"]);
        assert_eq!(table.rows[1], vec!["", "", "Sam"]);
    }

    #[test]
    fn test_wildcard_uses_first_record_keys() {
        let records = vec![
            Record::from_pairs([("voter_id", "1"), ("county", "Travis"), ("party", "D")]),
            Record::from_pairs([("party", "R"), ("voter_id", "2"), ("extra", "x")]),
        ];
        let table = assemble(&records, &ExportFields::All, HeaderStyle::Humanized);
        assert_eq!(table.keys, vec!["voter_id", "county", "party"]);
        assert_eq!(table.headers, vec!["Voter Id", "County", "Party"]);
        assert_eq!(table.rows[1], vec!["2", "", "R"]);
    }

    #[test]
    fn test_zero_records_is_header_only() {
        let fields = ExportFields::from(Selection::from_keys(["first_name"]));
        let table = assemble(&[], &fields, HeaderStyle::Humanized);
        assert_eq!(table.headers, vec!["First Name"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_empty_selection_is_empty_output() {
        let table = assemble(&[jane()], &Selection::new().into(), HeaderStyle::Humanized);
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_wildcard_without_records_is_empty() {
        let table = assemble(&[], &ExportFields::All, HeaderStyle::Humanized);
        assert!(table.is_empty());
    }

    #[test]
    fn test_catalog_label_headers() {
        let fields = ExportFields::from(Selection::from_keys(["residence_zip", "tag_color"]));
        let table = assemble(&[], &fields, HeaderStyle::CatalogLabels);
        assert_eq!(table.headers, vec!["Residence ZIP", "Tag Color"]);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let records = vec![jane(), jane()];
        let fields = ExportFields::from(Selection::from_keys(["last_name", "first_name"]));
        let a = assemble(&records, &fields, HeaderStyle::Humanized);
        let b = assemble(&records, &fields, HeaderStyle::Humanized);
        assert_eq!(a, b);
    }

    #[test]
    fn test_header_style_from_str() {
        assert_eq!("humanized".parse::<HeaderStyle>(), Ok(HeaderStyle::Humanized));
        assert_eq!(
            " Catalog_Labels ".parse::<HeaderStyle>(),
            Ok(HeaderStyle::CatalogLabels)
        );
        assert!("fancy".parse::<HeaderStyle>().is_err());
    }
}
