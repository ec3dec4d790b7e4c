//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use company_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Search retries: {}", config.search.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_selectors, seconds, Config, CrawlConfig, EnrichmentConfig, IdentityConfig,
    PacingConfig, SearchConfig, SelfTestConfig, SessionEngine, MAX_PACING_SECONDS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
