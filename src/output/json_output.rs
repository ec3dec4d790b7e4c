//! Structured-document export: a JSON array with one object per record

use crate::output::traits::RecordWriter;
use crate::state::ExtractionRecord;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes records as a JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl RecordWriter for JsonWriter {
    fn extension(&self) -> &'static str {
        ".json"
    }

    fn write(&self, records: &[ExtractionRecord], path: &Path) -> crate::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    }
}

/// Reads records back from a JSON export
pub fn load_json_records(path: &Path) -> crate::Result<Vec<ExtractionRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let records = serde_json::from_reader(reader)?;
    Ok(records)
}
