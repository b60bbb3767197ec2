use serde::Deserialize;

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub category: Vec<CategoryEntry>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of simultaneously in-flight HTTP requests,
    /// shared by every fetch and download in the run
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: u32,

    /// Scheduler window: how many logical operations (page parses,
    /// asset downloads) are kept in flight per crawl stage
    pub window: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that holds one subdirectory per category
    #[serde(rename = "data-dir")]
    pub data_dir: String,
}

/// A logical collection to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    /// Category name, used as the directory and store file name
    pub name: String,

    /// Site-side category identifier
    pub id: u32,
}
