use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::assembler::assemble;
use crate::record::Record;
use crate::selection::ExportFields;
use crate::writer::{DocumentMeta, ExportFormat, ExportSettings};

/// A generated file held in memory until it is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into `dir` as `file_name`, replacing any existing
    /// file. Data goes to a temp file in the same directory first and is
    /// renamed into place, so readers never see a half-written file.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;
        let target = dir.join(&self.file_name);

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(&self.bytes)
            .with_context(|| format!("Failed to write {}", self.file_name))?;
        tmp.persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to save {}", target.display()))?;

        info!(
            path = %target.display(),
            bytes = self.bytes.len(),
            "Saved export"
        );
        Ok(target)
    }
}

/// `<title>_voters.<ext>`, with characters that are unsafe in file names
/// replaced by `_`.
pub fn export_file_name(title: &str, format: ExportFormat) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = match cleaned.trim_matches('.') {
        "" => "export",
        s => s,
    };
    format!("{stem}_voters.{}", format.extension())
}

/// One export request: what to export, under which title, in which format.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub title: String,
    pub fields: ExportFields,
    pub format: ExportFormat,
    generated_at: Option<DateTime<Local>>,
}

impl ExportJob {
    pub fn new(title: impl Into<String>, fields: ExportFields, format: ExportFormat) -> Self {
        Self {
            title: title.into(),
            fields,
            format,
            generated_at: None,
        }
    }

    /// Pin the timestamp printed in the document (defaults to now).
    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn file_name(&self) -> String {
        export_file_name(&self.title, self.format)
    }

    /// Assemble and render. Returns `Ok(None)` when there is nothing to
    /// export (no columns resolved); rendering failures are logged and
    /// returned.
    pub fn run(&self, records: &[Record], settings: &ExportSettings) -> Result<Option<ExportArtifact>> {
        let table = assemble(records, &self.fields, settings.header_style);
        if table.is_empty() {
            warn!(title = %self.title, "Export has no columns; skipping");
            return Ok(None);
        }

        let mut meta = DocumentMeta::new(&self.title, &settings.branding, records.len());
        if let Some(at) = self.generated_at {
            meta = meta.generated_at(at);
        }

        let writer = settings.writer(self.format);
        let bytes = writer
            .render(&table, &meta)
            .inspect_err(|e| {
                error!(
                    title = %self.title,
                    format = ?self.format,
                    "Export rendering failed: {e:#}"
                )
            })
            .with_context(|| format!("Failed to export '{}'", self.title))?;

        info!(
            title = %self.title,
            format = ?self.format,
            records = records.len(),
            columns = table.column_count(),
            "Export generated"
        );

        Ok(Some(ExportArtifact {
            file_name: self.file_name(),
            mime_type: self.format.mime_type(),
            bytes,
        }))
    }

    /// [`run`](Self::run) and save the result into `dir`.
    pub fn run_and_save(
        &self,
        records: &[Record],
        settings: &ExportSettings,
        dir: &Path,
    ) -> Result<Option<PathBuf>> {
        match self.run(records, settings)? {
            Some(artifact) => artifact.save_in(dir).map(Some),
            None => Ok(None),
        }
    }
}
