//! Tabular export: one header row, one row per record

use crate::output::traits::RecordWriter;
use crate::state::{ExtractionRecord, RECORD_COLUMNS};
use std::path::Path;

/// Writes records as comma-separated values
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

impl RecordWriter for CsvWriter {
    fn extension(&self) -> &'static str {
        ".csv"
    }

    fn write(&self, records: &[ExtractionRecord], path: &Path) -> crate::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(RECORD_COLUMNS)?;
        for record in records {
            writer.write_record(record.to_row())?;
        }
        writer.flush()?;
        Ok(())
    }
}
