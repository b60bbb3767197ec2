//! Crawl engine: fetching, scheduling, downloading, orchestration
//!
//! The engine is content-agnostic. It fetches pages and assets under a
//! global admission bound, keeps a fixed window of operations in flight,
//! and hands payloads to a site-specific [`Extractor`].

mod downloader;
mod driver;
mod fetcher;
mod scheduler;

pub use downloader::download;
pub use driver::{AssetRef, CrawlDriver, CrawlStats, Extracted, Extraction, Extractor};
pub use fetcher::{build_http_client, Fetcher, MAX_ATTEMPTS};
pub use scheduler::schedule;

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl over the configured categories
///
/// This is the library's main entry point: site adapters supply an
/// [`Extractor`], everything else (admission, retries, windowing, store
/// sessions) is handled here.
pub async fn run_crawl<E: Extractor>(config: Config, extractor: E) -> Result<CrawlStats> {
    let driver = CrawlDriver::new(config, extractor)?;
    driver.run().await
}
