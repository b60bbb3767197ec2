//! Gleaner: an incremental listing harvester core
//!
//! This crate implements the reusable core of a listing crawler: bounded
//! admission over outbound requests, a completion-driven scheduler that keeps
//! a fixed window of operations in flight, streaming asset downloads, and a
//! durable file-backed record store that merges each crawl into the previous
//! one without ever duplicating a record.
//!
//! Site-specific extraction plugs in through the [`crawler::Extractor`]
//! trait; the core never inspects page content.

pub mod config;
pub mod crawler;
pub mod store;

use thiserror::Error;

/// Main error type for Gleaner operations
#[derive(Debug, Error)]
pub enum GleanerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch of {url} exhausted after {attempts} attempts: {last_error}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Extraction failed for {url}: {message}")]
    Extract { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// Result type alias for Gleaner operations
pub type Result<T> = std::result::Result<T, GleanerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{download, run_crawl, schedule, CrawlDriver, CrawlStats, Extractor, Fetcher};
pub use store::{CsvStore, FieldType, Record, RecordStore, Schema, Status, Value};
