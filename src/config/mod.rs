//! Configuration loading and validation
//!
//! Gleaner is configured with a TOML file naming the crawl limits, the
//! output directory, and the categories to harvest. The file is validated
//! on load and hashed so runs can detect configuration drift.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{CategoryEntry, Config, CrawlConfig, OutputConfig};
pub use validation::validate;
