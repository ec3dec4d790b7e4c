//! Company Harvester: a resilient company-profile harvesting pipeline
//!
//! This crate collects structured company data (name, contacts, social links,
//! tech stack) from the public web, starting either from a search query or from
//! explicit seed URLs. It rotates browsing identities, retries search pages
//! with backoff, extracts fields with configurable rules, crawls same-domain
//! links and tracks the progress of a single job at a time.

pub mod config;
pub mod crawler;
pub mod identity;
pub mod job;
pub mod output;
pub mod server;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for harvesting operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser session error: {0}")]
    Session(#[from] SessionError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No input provided")]
    NoInput,

    #[error("No search results found")]
    NoSearchResults,

    #[error("Job already running")]
    JobAlreadyRunning,

    #[error("Invalid selector overrides: {0}")]
    InvalidSelectors(String),

    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidTransition {
        from: state::JobState,
        to: state::JobState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by a browsing session
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Failed to launch session: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {seconds:.1}s waiting for '{selector}'")]
    Timeout { selector: String, seconds: f64 },

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("No active session")]
    Closed,
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ExtractionLevel, PageExtractor, RuleBook, SearchAcquirer};
pub use identity::{IdentityManager, IdentityProfile};
pub use job::{JobContext, JobInput, JobOrchestrator, JobRunner, JobSpec};
pub use output::{Exporter, OutputFormat};
pub use state::{CrawlLedger, ExtractionRecord, JobState, JobStatus, RecordStatus, VisitedSet};
pub use url::{registrable_domain, UrlValidator};
