//! Per-job bookkeeping: visited URLs, accumulated records and error count

use crate::state::ExtractionRecord;
use std::collections::HashSet;

/// URLs already processed in the current job
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the URL visited; returns false if it already was
    pub fn insert(&mut self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Everything a job accumulates while it runs
///
/// Records are append-only and kept in visit order.
#[derive(Debug, Default)]
pub struct CrawlLedger {
    visited: VisitedSet,
    records: Vec<ExtractionRecord>,
    errors: usize,
}

impl CrawlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a URL for processing; false means it was already processed
    pub fn claim(&mut self, url: &str) -> bool {
        self.visited.insert(url)
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn push(&mut self, record: ExtractionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ExtractionRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ExtractionRecord> {
        self.records
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }
}
