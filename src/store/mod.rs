//! Durable record storage
//!
//! A store maps identity keys to records and is backed by a single delimited
//! text file. Each crawl opens the store once, interleaves existence checks
//! and writes, and closes it once; the close performs the durable rewrite.
//! Re-crawling never duplicates a record: a write for an already-known key
//! supersedes the stale row, and untouched rows are carried over as-is.

mod csv;
mod record;

pub use self::csv::CsvStore;
pub use record::{FieldType, Record, Schema, Status, Value};

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record file error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Failed to replace store file: {0}")]
    Persist(String),

    #[error("Field '{field}' has unparseable value '{value}'")]
    FieldParse { field: String, value: String },

    #[error("Identity field '{0}' is not part of the schema")]
    IdentityNotInSchema(String),

    #[error("Record is missing a value for identity field '{0}'")]
    MissingIdentity(String),

    #[error("Store is closed")]
    Closed,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for durable record store backends
///
/// A store session runs open -> (exists | write)* -> close. Only one session
/// per backing file may be open at a time; callers must not share a store
/// across concurrent crawls of the same collection.
pub trait RecordStore {
    /// Returns true iff a record with the same identity-key value was present
    /// in the backing file when the store was opened.
    ///
    /// This is a read-only query: checking a key never affects what survives
    /// the session, only [`RecordStore::write`] supersedes a stale row.
    fn exists(&self, record: &Record) -> StoreResult<bool>;

    /// Queues a record for output, replacing any record written earlier this
    /// session under the same identity key (last write wins) and suppressing
    /// the replay of the stale row loaded from the original file.
    fn write(&mut self, record: Record) -> StoreResult<()>;

    /// Flushes the session to disk.
    ///
    /// When the store was opened against an existing file, every original
    /// record whose key was never written this session is carried over, and
    /// the staged output atomically replaces the original file. Closing an
    /// already-closed store is a no-op.
    fn close(&mut self) -> StoreResult<()>;
}
