use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::assembler::ExportTable;
use crate::writer::{DocumentMeta, DocumentWriter, ExportFormat};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// When values get wrapped in double quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvQuoting {
    /// Only values containing a delimiter, quote or line break.
    Necessary,
    /// Never quote; a plain comma join. Values with commas or quotes are
    /// written as-is, so a comma inside a value shifts the columns after it.
    #[default]
    Never,
}

impl FromStr for CsvQuoting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "necessary" => Ok(Self::Necessary),
            "never" => Ok(Self::Never),
            other => Err(format!("unknown csv quote style: {other}")),
        }
    }
}

impl From<CsvQuoting> for csv::QuoteStyle {
    fn from(quoting: CsvQuoting) -> Self {
        match quoting {
            CsvQuoting::Necessary => csv::QuoteStyle::Necessary,
            CsvQuoting::Never => csv::QuoteStyle::Never,
        }
    }
}

/// Comma-separated writer: header line first, one line per record, `\n`
/// terminated.
#[derive(Debug, Clone, Default)]
pub struct CsvWriter {
    quoting: CsvQuoting,
    byte_order_mark: bool,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quoting(mut self, quoting: CsvQuoting) -> Self {
        self.quoting = quoting;
        self
    }

    /// Prefix output with a UTF-8 BOM (helps spreadsheet apps detect UTF-8).
    pub fn byte_order_mark(mut self, enabled: bool) -> Self {
        self.byte_order_mark = enabled;
        self
    }

    pub fn write_table(&self, table: &ExportTable) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        if self.byte_order_mark {
            out.extend_from_slice(UTF8_BOM);
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b',')
            .quote_style(self.quoting.into())
            .terminator(csv::Terminator::Any(b'\n'))
            .flexible(false)
            .from_writer(out);

        // The csv crate rejects a zero-field record; an empty table is an
        // empty file (plus BOM).
        if !table.headers.is_empty() {
            writer
                .write_record(&table.headers)
                .context("Failed to write header record")?;

            for (idx, row) in table.rows.iter().enumerate() {
                writer
                    .write_record(row)
                    .with_context(|| format!("Failed to write data record {idx}"))?;
            }
        }

        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
    }
}

impl DocumentWriter for CsvWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn render(&self, table: &ExportTable, _meta: &DocumentMeta) -> Result<Vec<u8>> {
        self.write_table(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> ExportTable {
        ExportTable {
            keys: headers.iter().map(|h| h.to_lowercase()).collect(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_write_basic() {
        let t = table(
            &["First Name", "Last Name"],
            &[&["Jane", "Doe"], &["John", "Smith"]],
        );
        let out = text(CsvWriter::new().write_table(&t).unwrap());
        assert_eq!(out, "First Name,Last Name\nJane,Doe\nJohn,Smith\n");
    }

    #[test]
    fn test_header_only() {
        let t = table(&["Precinct"], &[]);
        let out = text(CsvWriter::new().write_table(&t).unwrap());
        assert_eq!(out, "Precinct\n");
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_empty_cells_keep_alignment() {
        let t = table(&["A", "B", "C"], &[&["", "x", ""]]);
        let out = text(CsvWriter::new().write_table(&t).unwrap());
        assert_eq!(out.lines().nth(1), Some(",x,"));
    }

    #[test]
    fn test_default_is_raw_join() {
        let t = table(
            &["Address", "Note"],
            &[&["12 Main St, Apt 4", "say \"hi\""]],
        );
        let out = text(CsvWriter::new().write_table(&t).unwrap());
        assert_eq!(out, "Address,Note\n12 Main St, Apt 4,say \"hi\"\n");
        assert_eq!(CsvQuoting::default(), CsvQuoting::Never);
    }

    #[test]
    fn test_necessary_quoting_is_opt_in() {
        let t = table(
            &["Address", "Note", "City"],
            &[&["12 Main St, Apt 4", "say \"hi\"", "Austin"]],
        );
        let out = text(
            CsvWriter::new()
                .quoting(CsvQuoting::Necessary)
                .write_table(&t)
                .unwrap(),
        );
        assert_eq!(
            out.lines().nth(1),
            Some("\"12 Main St, Apt 4\",\"say \"\"hi\"\"\",Austin")
        );
    }

    #[test]
    fn test_byte_order_mark() {
        let t = table(&["Name"], &[&["Zoë"]]);
        let bytes = CsvWriter::new().byte_order_mark(true).write_table(&t).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert!(text(bytes[3..].to_vec()).contains("Zoë"));
    }

    #[test]
    fn test_empty_table_is_empty_file() {
        let bytes = CsvWriter::new().write_table(&ExportTable::default()).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_quoting_from_str() {
        assert_eq!("never".parse::<CsvQuoting>(), Ok(CsvQuoting::Never));
        assert_eq!("Necessary".parse::<CsvQuoting>(), Ok(CsvQuoting::Necessary));
        assert!("always".parse::<CsvQuoting>().is_err());
    }
}
