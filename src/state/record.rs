//! Extraction record definitions
//!
//! One record is produced per visited URL, success or failure, and is never
//! modified after it has been appended to the job's ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column order shared by the tabular and embedded-table exports
pub const RECORD_COLUMNS: [&str; 13] = [
    "url",
    "name",
    "website",
    "email",
    "phone",
    "linkedin",
    "twitter",
    "facebook",
    "description",
    "address",
    "tech_stack",
    "scrape_time",
    "status",
];

/// Outcome of a single page visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RecordStatus {
    Success,
    Error(String),
}

impl RecordStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

impl From<RecordStatus> for String {
    fn from(status: RecordStatus) -> Self {
        status.to_string()
    }
}

impl From<String> for RecordStatus {
    fn from(value: String) -> Self {
        if value == "success" {
            return Self::Success;
        }
        match value.strip_prefix("error:") {
            Some(reason) => Self::Error(reason.trim_start().to_string()),
            None => Self::Error(value),
        }
    }
}

/// Links to the company's social profiles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub facebook: String,
}

/// Fields harvested from one company page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub url: String,
    pub name: String,

    /// Registrable domain of `url`
    pub website: String,

    /// Sorted, deduplicated, comma-joined addresses
    pub email: String,

    /// Deduplicated, comma-joined numbers
    pub phone: String,

    #[serde(flatten)]
    pub social: SocialLinks,

    pub description: String,
    pub address: String,
    pub tech_stack: String,
    pub scrape_time: DateTime<Utc>,
    pub status: RecordStatus,
}

impl ExtractionRecord {
    /// An empty successful record for `url`, stamped now
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            name: String::new(),
            website: String::new(),
            email: String::new(),
            phone: String::new(),
            social: SocialLinks::default(),
            description: String::new(),
            address: String::new(),
            tech_stack: String::new(),
            scrape_time: Utc::now(),
            status: RecordStatus::Success,
        }
    }

    /// A record for a visit that failed with `reason`
    pub fn failed(url: &str, reason: impl Into<String>) -> Self {
        Self {
            status: RecordStatus::Error(reason.into()),
            ..Self::new(url)
        }
    }

    /// Field values in [`RECORD_COLUMNS`] order
    pub fn to_row(&self) -> [String; 13] {
        [
            self.url.clone(),
            self.name.clone(),
            self.website.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.social.linkedin.clone(),
            self.social.twitter.clone(),
            self.social.facebook.clone(),
            self.description.clone(),
            self.address.clone(),
            self.tech_stack.clone(),
            self.scrape_time.to_rfc3339(),
            self.status.to_string(),
        ]
    }
}
