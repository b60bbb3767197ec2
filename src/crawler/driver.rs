//! Crawl driver - orchestration of fetcher, scheduler and store
//!
//! The driver owns no extraction logic. A site adapter implements
//! [`Extractor`] to turn fetched pages into records and asset references;
//! the driver pumps page fetches through the completion scheduler,
//! classifies each record against the category's store (new vs. updated),
//! and drives the asset downloads the same windowed way.

use crate::config::{CategoryEntry, Config};
use crate::crawler::{download, schedule, Fetcher};
use crate::store::{CsvStore, Record, RecordStore, Schema, Status};
use crate::Result;
use std::path::Path;

/// An asset referenced by a record
///
/// `file_name` is the asset identifier extracted from the source URL, used
/// as the file name inside the record's asset directory.
#[derive(Debug, Clone)]
pub struct AssetRef {
    pub url: String,
    pub file_name: String,
}

/// One extracted record together with its assets
#[derive(Debug, Clone)]
pub struct Extracted {
    pub record: Record,
    pub assets: Vec<AssetRef>,
}

/// Everything extracted from a single fetched page
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<Extracted>,

    /// Further page URLs discovered on this page (pagination); the driver
    /// fetches them in the next windowed round.
    pub next_pages: Vec<String>,
}

/// Site-specific extraction, the external collaborator interface
///
/// Implementations own everything the core deliberately does not: URL
/// construction, payload formats, field meanings. The driver only sets the
/// status flag field; every other field comes from `extract`.
pub trait Extractor: Send + Sync + 'static {
    /// Record schema for this site's stores
    fn schema(&self) -> Schema;

    /// Name of the status flag field within the schema
    fn status_field(&self) -> &str;

    /// Initial page URLs to fetch for a category
    fn page_urls(&self, category: &CategoryEntry) -> Vec<String>;

    /// Extracts records and follow-up pages from a fetched page
    fn extract(
        &self,
        category: &CategoryEntry,
        url: &str,
        body: &[u8],
    ) -> std::result::Result<Extraction, String>;
}

/// Counters accumulated over a crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub records_new: u64,
    pub records_updated: u64,
    pub assets_downloaded: u64,
    pub assets_skipped: u64,
    pub assets_failed: u64,
    pub categories_failed: u64,
}

/// Orchestrates a crawl run across the configured categories
///
/// Owns the run-scoped HTTP client (via the fetcher); each category gets
/// exactly one store open/close pair. Individual fetch failures are logged
/// and skipped; a store failure aborts that category and is counted, the
/// remaining categories still run.
pub struct CrawlDriver<E> {
    config: Config,
    fetcher: Fetcher,
    extractor: E,
}

impl<E: Extractor> CrawlDriver<E> {
    pub fn new(config: Config, extractor: E) -> Result<Self> {
        let fetcher = Fetcher::new(config.crawl.max_concurrency)?;
        Ok(Self {
            config,
            fetcher,
            extractor,
        })
    }

    /// Runs the crawl over every configured category, sequentially
    ///
    /// Pages and assets within a category run under the scheduler window;
    /// all of them share the fetcher's network admission limit.
    pub async fn run(&self) -> Result<CrawlStats> {
        let mut stats = CrawlStats::default();
        let started = std::time::Instant::now();

        for category in &self.config.category {
            tracing::info!("Crawling category {} (id {})", category.name, category.id);

            if let Err(e) = self.crawl_category(category, &mut stats).await {
                stats.categories_failed += 1;
                tracing::error!("Category {} aborted: {}", category.name, e);
            }
        }

        tracing::info!(
            "Crawl finished in {:?}: {} pages ({} failed), {} new / {} updated records, \
             {} assets downloaded ({} skipped, {} failed)",
            started.elapsed(),
            stats.pages_fetched,
            stats.pages_failed,
            stats.records_new,
            stats.records_updated,
            stats.assets_downloaded,
            stats.assets_skipped,
            stats.assets_failed
        );

        Ok(stats)
    }

    /// Crawls one category through a full store session
    async fn crawl_category(
        &self,
        category: &CategoryEntry,
        stats: &mut CrawlStats,
    ) -> Result<()> {
        let category_dir = Path::new(&self.config.output.data_dir).join(&category.name);
        tokio::fs::create_dir_all(&category_dir).await?;

        let store_path = category_dir.join(format!("{}.csv", category.name));
        let mut store = CsvStore::open(&store_path, self.extractor.schema())?;

        let window = self.config.crawl.window as usize;
        let mut pending = self.extractor.page_urls(category);

        // Windowed rounds: each round fetches the pending pages, extraction
        // may discover more (pagination) for the next round.
        while !pending.is_empty() {
            let ops: Vec<_> = pending
                .drain(..)
                .map(|url| {
                    let fetcher = self.fetcher.clone();
                    async move { fetcher.fetch_tagged(url).await }
                })
                .collect();

            let mut results = schedule(ops, window);
            while let Some((url, result)) = results.recv().await {
                let body = match result {
                    Ok(body) => {
                        stats.pages_fetched += 1;
                        body
                    }
                    Err(e) => {
                        // Non-fatal: the item is simply absent from this run.
                        stats.pages_failed += 1;
                        tracing::warn!("Skipping page {}: {}", url, e);
                        continue;
                    }
                };

                match self.extractor.extract(category, &url, &body) {
                    Ok(extraction) => {
                        pending.extend(extraction.next_pages);
                        for item in extraction.records {
                            self.ingest(&category_dir, item, &mut store, stats).await?;
                        }
                    }
                    Err(message) => {
                        stats.pages_failed += 1;
                        tracing::warn!("Extraction failed for {}: {}", url, message);
                    }
                }
            }
        }

        store.close()?;

        tracing::info!(
            "Category {} done: store {}",
            category.name,
            store_path.display()
        );
        Ok(())
    }

    /// Classifies and stores one record, then downloads its missing assets
    async fn ingest(
        &self,
        category_dir: &Path,
        item: Extracted,
        store: &mut CsvStore,
        stats: &mut CrawlStats,
    ) -> Result<()> {
        let Extracted { mut record, assets } = item;

        let status = if store.exists(&record)? {
            Status::Updated
        } else {
            Status::New
        };
        record.set_status(self.extractor.status_field(), status);

        let key = record.identity(store.schema())?;
        store.write(record)?;

        match status {
            Status::New => stats.records_new += 1,
            Status::Updated => stats.records_updated += 1,
            Status::Terminated => {}
        }

        if assets.is_empty() {
            return Ok(());
        }

        let asset_dir = category_dir.join(&key);
        tokio::fs::create_dir_all(&asset_dir).await?;

        let mut ops = Vec::new();
        for asset in assets {
            let dest = asset_dir.join(&asset.file_name);

            // Idempotent re-crawl: assets already on disk are not re-fetched.
            if dest.is_file() {
                stats.assets_skipped += 1;
                continue;
            }

            let fetcher = self.fetcher.clone();
            ops.push(async move {
                let result = download(&fetcher, &asset.url, &dest).await;
                (asset.url, result)
            });
        }

        let window = self.config.crawl.window as usize;
        let mut results = schedule(ops, window);
        while let Some((url, result)) = results.recv().await {
            match result {
                Ok(()) => stats.assets_downloaded += 1,
                Err(e) => {
                    stats.assets_failed += 1;
                    tracing::warn!("Asset download failed for {}: {}", url, e);
                }
            }
        }

        Ok(())
    }
}
