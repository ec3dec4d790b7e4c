//! State module for tracking job progress
//!
//! # Components
//!
//! - `JobState`: Lifecycle of the harvesting job (idle, running, completed, failed)
//! - `JobStatus`: Progress counters and outcome shared with status readers
//! - `ExtractionRecord`: One harvested page
//! - `CrawlLedger`: Visited URLs, records and error count of the running job

mod job_state;
mod job_status;
mod ledger;
mod record;

// Re-export main types
pub use job_state::JobState;
pub use job_status::JobStatus;
pub use ledger::{CrawlLedger, VisitedSet};
pub use record::{ExtractionRecord, RecordStatus, SocialLinks, RECORD_COLUMNS};
