//! Core domain for doibot: configuration and DOI identifier handling.
//!
//! This crate has no network or Discord dependencies. It provides:
//! - **Configuration** (`config`) - layered `AppConfig` resolved once at startup
//! - **Identifier normalization** (`doi`) - bare DOIs and doi.org links

pub mod config;
pub mod doi;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use doi::{normalize, Doi, NormalizeError};
