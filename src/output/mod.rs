//! Output module for exporting harvested records
//!
//! This module handles:
//! - Tabular export (`.csv`)
//! - Structured-document export (`.json`), also read back by the control surface
//! - Embedded-table export (`.db`, table `companies`)

mod csv_output;
mod json_output;
mod sqlite_output;
mod traits;

pub use csv_output::CsvWriter;
pub use json_output::{load_json_records, JsonWriter};
pub use sqlite_output::{SqliteWriter, TABLE_NAME};
pub use traits::RecordWriter;

use crate::state::ExtractionRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Supported export formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Sqlite,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }

    /// The writer for this format
    pub fn writer(&self) -> Box<dyn RecordWriter> {
        match self {
            Self::Csv => Box::new(CsvWriter),
            Self::Json => Box::new(JsonWriter),
            Self::Sqlite => Box::new(SqliteWriter),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("Unsupported format: {}", other)),
        }
    }
}

/// Writes a job's records to disk
pub struct Exporter;

impl Exporter {
    /// Exports records in `format` to `<base_name><extension>`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(path))` - Records were written
    /// * `Ok(None)` - There was nothing to write
    /// * `Err(HarvestError)` - The file could not be written
    pub fn export(
        records: &[ExtractionRecord],
        format: OutputFormat,
        base_name: &str,
    ) -> crate::Result<Option<PathBuf>> {
        if records.is_empty() {
            tracing::warn!("No data to export");
            return Ok(None);
        }

        let writer = format.writer();
        let path = PathBuf::from(format!("{}{}", base_name, writer.extension()));
        writer.write(records, &path)?;

        tracing::info!(path = %path.display(), count = records.len(), %format, "Data exported");
        Ok(Some(path))
    }

    /// Like [`export`](Self::export) but takes the format by name
    ///
    /// An unknown format name is logged and nothing is written.
    pub fn export_named(
        records: &[ExtractionRecord],
        format: &str,
        base_name: &str,
    ) -> crate::Result<Option<PathBuf>> {
        match format.parse::<OutputFormat>() {
            Ok(format) => Self::export(records, format, base_name),
            Err(e) => {
                tracing::error!("{}", e);
                Ok(None)
            }
        }
    }
}
