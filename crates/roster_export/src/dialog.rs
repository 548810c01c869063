use anyhow::Result;
use roster_core::{AppNotification, NotificationStore, RosterError};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

use crate::catalog::FieldCategory;
use crate::job::ExportJob;
use crate::record::Record;
use crate::selection::{ExportFields, Selection};
use crate::writer::{ExportFormat, ExportSettings};

/// State behind the "Export list" dialog: visibility, chosen format, the
/// all-fields switch and the field selection.
#[derive(Debug, Clone, Default)]
pub struct ExportDialog {
    open: bool,
    format: ExportFormat,
    include_all: bool,
    selection: Selection,
}

impl ExportDialog {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn set_format(&mut self, format: ExportFormat) {
        self.format = format;
    }

    pub fn include_all(&self) -> bool {
        self.include_all
    }

    pub fn set_include_all(&mut self, include_all: bool) {
        self.include_all = include_all;
    }

    pub fn toggle_field(&mut self, key: &str) {
        self.selection.toggle(key);
    }

    pub fn toggle_category(&mut self, category: FieldCategory) {
        self.selection.toggle_category(category);
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Clears the selection and the all-fields switch; keeps the format.
    pub fn reset(&mut self) {
        self.selection.reset();
        self.include_all = false;
    }

    pub fn fields(&self) -> ExportFields {
        if self.include_all {
            ExportFields::All
        } else {
            ExportFields::Selected(self.selection.clone())
        }
    }

    /// Whether the export button should do anything.
    pub fn can_export(&self) -> bool {
        self.include_all || !self.selection.is_empty()
    }

    /// Export `records` into `out_dir` and report the outcome through
    /// `notifications`.
    ///
    /// Returns `Ok(None)` without exporting when no field is selected.
    /// Failures are reported and then returned to the caller.
    pub fn export(
        &mut self,
        records: &[Record],
        title: &str,
        out_dir: &Path,
        settings: &ExportSettings,
        notifications: &mut NotificationStore,
    ) -> Result<Option<PathBuf>> {
        if !self.can_export() {
            warn!(title, "Export requested with no fields selected");
            notifications.push(AppNotification::warning(
                "Select at least one field to export.",
            ));
            return Ok(None);
        }

        let job = ExportJob::new(title, self.fields(), self.format);
        match job.run_and_save(records, settings, out_dir) {
            Ok(Some(path)) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| job.file_name());
                notifications.push(
                    AppNotification::success(format!(
                        "Exported {} voters to {name}",
                        records.len()
                    ))
                    .with_title("Export complete"),
                );
                self.close();
                Ok(Some(path))
            }
            Ok(None) => {
                notifications.push(AppNotification::warning(
                    "There is nothing to export for this list.",
                ));
                Ok(None)
            }
            Err(e) => {
                notifications.push(AppNotification::from_error(&e).with_title("Export failed"));
                Err(e)
            }
        }
    }

    /// Like [`export`](Self::export) but takes the backend fetch result, so
    /// a failed fetch is reported instead of silently producing nothing.
    pub fn export_fetched(
        &mut self,
        fetched: Result<Vec<Record>>,
        title: &str,
        out_dir: &Path,
        settings: &ExportSettings,
        notifications: &mut NotificationStore,
    ) -> Result<Option<PathBuf>> {
        match fetched {
            Ok(records) => self.export(&records, title, out_dir, settings, notifications),
            Err(e) => {
                error!(title, "Fetching voters for export failed: {e:#}");
                let e = e.context(RosterError::Backend(format!(
                    "could not load voters for '{title}'"
                )));
                notifications.push(AppNotification::from_error(&e).with_title("Export failed"));
                Err(e)
            }
        }
    }
}
