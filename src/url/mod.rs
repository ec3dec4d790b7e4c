//! URL handling module
//!
//! This module provides scheme normalization, registrable-domain resolution
//! and the reachability probe used to validate candidate URLs.

mod domain;
mod normalize;
mod validator;

// Re-export main functions
pub use domain::{registrable_domain, same_site};
pub use normalize::ensure_scheme;
pub use validator::{UrlValidator, DEFAULT_PROBE_TIMEOUT};
