//! Voter list export: field catalog, selection state, table assembly and the
//! delimited-text and paginated PDF writers.

pub mod assembler;
pub mod catalog;
pub mod csv;
pub mod dialog;
pub mod font_metrics;
pub mod job;
pub mod pdf;
pub mod record;
pub mod selection;
pub mod writer;

pub use assembler::{ExportTable, HeaderStyle, assemble, humanize_key};
pub use catalog::{FieldCategory, FieldDescriptor};
pub use crate::csv::{CsvQuoting, CsvWriter};
pub use dialog::ExportDialog;
pub use job::{ExportArtifact, ExportJob, export_file_name};
pub use pdf::{PdfLayout, PdfWriter};
pub use record::{Record, records_from_json};
pub use selection::{ExportFields, Selection};
pub use writer::{DocumentMeta, DocumentWriter, ExportFormat, ExportSettings, default_format};
