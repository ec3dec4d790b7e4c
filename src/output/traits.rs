//! Record writer trait
//!
//! Each export format implements [`RecordWriter`]; the
//! [`Exporter`](crate::output::Exporter) picks one by format and derives the
//! output path from the base name and the writer's extension.

use crate::state::ExtractionRecord;
use std::path::Path;

/// Writes a job's records to a file
pub trait RecordWriter {
    /// File extension including the leading dot
    fn extension(&self) -> &'static str;

    /// Writes every record to `path`, replacing previous content
    fn write(&self, records: &[ExtractionRecord], path: &Path) -> crate::Result<()>;
}
