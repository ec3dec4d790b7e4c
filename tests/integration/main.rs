//! Integration tests for the harvester
//!
//! Mock servers stand in for the search engine, the company sites and the
//! enrichment API, so every test runs offline.

mod common;
mod crawl_tests;
mod job_tests;
mod server_tests;
