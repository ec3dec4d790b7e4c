//! Job orchestration
//!
//! A job turns one [`JobSpec`] into exported records. Exactly one job runs at
//! a time; its [`JobStatus`](crate::state::JobStatus) is published through a
//! [`JobContext`] so the control surface can read it while the worker runs.
//!
//! # Components
//!
//! - `JobSpec` / `JobInput`: What to harvest and how to export it
//! - `JobContext`: Shared, snapshot-readable job status
//! - `JobOrchestrator`: Runs a job to completion or failure
//! - `JobRunner`: Starts jobs on a background task, one at a time
//! - `SelfTestReport`: Fixture checks for `--test`

mod context;
mod orchestrator;
mod runner;
mod selftest;

pub use context::JobContext;
pub use orchestrator::JobOrchestrator;
pub use runner::JobRunner;
pub use selftest::{run_self_tests, SelfTestReport};

use crate::crawler::ExtractionLevel;
use crate::output::OutputFormat;
use std::collections::BTreeMap;

/// Default base name of the export file
pub const DEFAULT_OUTPUT_NAME: &str = "output";

/// Default number of search result pages
pub const DEFAULT_SEARCH_PAGES: u32 = 3;

/// Where a job's URLs come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    /// Candidates from a search engine query
    Query { query: String, pages: u32 },

    /// Explicit seed URLs
    Seeds { urls: Vec<String> },
}

impl JobInput {
    /// Returns true if the input names nothing to harvest
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Query { query, .. } => query.trim().is_empty(),
            Self::Seeds { urls } => urls.iter().all(|u| u.trim().is_empty()),
        }
    }
}

/// Everything needed to run one job
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub input: Option<JobInput>,
    pub level: ExtractionLevel,
    pub discovery_depth: u32,
    pub selector_overrides: BTreeMap<String, Vec<String>>,
    pub output_format: OutputFormat,
    pub output_name: String,
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            input: None,
            level: ExtractionLevel::Basic,
            discovery_depth: 0,
            selector_overrides: BTreeMap::new(),
            output_format: OutputFormat::Csv,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
        }
    }
}

impl JobSpec {
    /// A job that harvests the results of `query`
    pub fn query(query: impl Into<String>, pages: u32) -> Self {
        Self {
            input: Some(JobInput::Query {
                query: query.into(),
                pages,
            }),
            ..Self::default()
        }
    }

    /// A job that harvests explicit seed URLs
    pub fn seeds<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: Some(JobInput::Seeds {
                urls: urls.into_iter().map(Into::into).collect(),
            }),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: ExtractionLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.discovery_depth = depth;
        self
    }

    pub fn with_selector_overrides(mut self, overrides: BTreeMap<String, Vec<String>>) -> Self {
        self.selector_overrides = overrides;
        self
    }

    pub fn with_output(mut self, format: OutputFormat, name: impl Into<String>) -> Self {
        self.output_format = format;
        self.output_name = name.into();
        self
    }
}
