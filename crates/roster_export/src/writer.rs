use anyhow::Result;
use chrono::{DateTime, Local};
use roster_core::RosterConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::assembler::{ExportTable, HeaderStyle};
use crate::csv::{CsvQuoting, CsvWriter};
use crate::pdf::{PdfLayout, PdfWriter};

/// Output file kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Document-level facts writers may print alongside the table.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub title: String,
    pub branding: String,
    pub generated_at: DateTime<Local>,
    pub record_count: usize,
}

impl DocumentMeta {
    pub fn new(title: impl Into<String>, branding: impl Into<String>, record_count: usize) -> Self {
        Self {
            title: title.into(),
            branding: branding.into(),
            generated_at: Local::now(),
            record_count,
        }
    }

    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = at;
        self
    }
}

/// Renders an assembled table into file bytes.
pub trait DocumentWriter {
    fn format(&self) -> ExportFormat;

    fn render(&self, table: &ExportTable, meta: &DocumentMeta) -> Result<Vec<u8>>;
}

/// Everything an export needs from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub branding: String,
    pub header_style: HeaderStyle,
    pub csv_quoting: CsvQuoting,
    pub csv_byte_order_mark: bool,
    pub pdf: PdfLayout,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from_config(&RosterConfig::default())
    }
}

impl ExportSettings {
    /// Derive settings from the user config. Unrecognised values fall back to
    /// defaults with a warning rather than failing the export.
    pub fn from_config(config: &RosterConfig) -> Self {
        Self {
            branding: config.branding.clone(),
            header_style: parse_or_default(&config.header_style, "header_style"),
            csv_quoting: parse_or_default(&config.csv_quote_style, "csv_quote_style"),
            csv_byte_order_mark: config.csv_byte_order_mark,
            pdf: PdfLayout {
                margin: config.pdf_margin,
                font_size: config.pdf_font_size,
                first_column_width: config.pdf_first_column_width,
                ..PdfLayout::default()
            },
        }
    }

    /// Writer for `format` configured from these settings.
    pub fn writer(&self, format: ExportFormat) -> Box<dyn DocumentWriter> {
        match format {
            ExportFormat::Csv => Box::new(
                CsvWriter::new()
                    .quoting(self.csv_quoting)
                    .byte_order_mark(self.csv_byte_order_mark),
            ),
            ExportFormat::Pdf => Box::new(PdfWriter::new(self.pdf.clone())),
        }
    }
}

/// Parse the configured `format` name, defaulting to CSV.
pub fn default_format(config: &RosterConfig) -> ExportFormat {
    parse_or_default(&config.default_format, "default_format")
}

fn parse_or_default<T>(raw: &str, setting: &str) -> T
where
    T: FromStr<Err = String> + Default,
{
    raw.parse().unwrap_or_else(|e| {
        warn!("Ignoring config {setting}: {e}");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_properties() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Pdf.extension(), "pdf");
        assert_eq!(ExportFormat::Pdf.mime_type(), "application/pdf");
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_settings_from_config() {
        let config = RosterConfig {
            branding: "Precinct Captains".into(),
            header_style: "catalog_labels".into(),
            csv_quote_style: "necessary".into(),
            pdf_margin: 24.0,
            ..RosterConfig::default()
        };
        let settings = ExportSettings::from_config(&config);
        assert_eq!(settings.branding, "Precinct Captains");
        assert_eq!(settings.header_style, HeaderStyle::CatalogLabels);
        assert_eq!(settings.csv_quoting, CsvQuoting::Necessary);
        assert_eq!(settings.pdf.margin, 24.0);
    }

    #[test]
    fn test_bad_config_values_fall_back() {
        let config = RosterConfig {
            header_style: "shouty".into(),
            csv_quote_style: "sometimes".into(),
            default_format: "docx".into(),
            ..RosterConfig::default()
        };
        let settings = ExportSettings::from_config(&config);
        assert_eq!(settings.header_style, HeaderStyle::Humanized);
        assert_eq!(settings.csv_quoting, CsvQuoting::Never);
        assert_eq!(default_format(&config), ExportFormat::Csv);
    }

    #[test]
    fn test_writer_matches_format() {
        let settings = ExportSettings::default();
        assert_eq!(settings.writer(ExportFormat::Csv).format(), ExportFormat::Csv);
        assert_eq!(settings.writer(ExportFormat::Pdf).format(), ExportFormat::Pdf);
    }
}
