//! Embedded-table export into a SQLite file
//!
//! Records land in a `companies` table that is dropped and recreated on every
//! export.

use crate::output::traits::RecordWriter;
use crate::state::ExtractionRecord;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

/// Table name used by the embedded export
pub const TABLE_NAME: &str = "companies";

/// SQL schema for the export table
const COMPANIES_SQL: &str = r#"
DROP TABLE IF EXISTS companies;
CREATE TABLE companies (
    url TEXT NOT NULL,
    name TEXT,
    website TEXT,
    email TEXT,
    phone TEXT,
    linkedin TEXT,
    twitter TEXT,
    facebook TEXT,
    description TEXT,
    address TEXT,
    tech_stack TEXT,
    scrape_time TEXT,
    status TEXT
);
"#;

const INSERT_SQL: &str = "INSERT INTO companies (url, name, website, email, phone, linkedin, \
     twitter, facebook, description, address, tech_stack, scrape_time, status) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

/// Writes records into the `companies` table
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteWriter;

impl RecordWriter for SqliteWriter {
    fn extension(&self) -> &'static str {
        ".db"
    }

    fn write(&self, records: &[ExtractionRecord], path: &Path) -> crate::Result<()> {
        let mut conn = Connection::open(path)?;
        conn.execute_batch(COMPANIES_SQL)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_SQL)?;
            for record in records {
                stmt.execute(params_from_iter(record.to_row()))?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
