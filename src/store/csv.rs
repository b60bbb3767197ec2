//! File-backed record store over delimited text
//!
//! The backing file holds one record per line with a header line naming the
//! fields. All values are quoted except unambiguously numeric ones. Opening
//! against an existing file loads it fully into memory and stages the rewrite
//! in a temporary file beside it; the close atomically renames the staged
//! file over the original, so no other process ever observes a half-written
//! store and an interrupted run leaves the previous file intact.

use crate::store::record::{Record, Schema, Value};
use crate::store::{RecordStore, StoreError, StoreResult};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Output mode of an open store
enum Mode {
    /// No prior file: the close writes directly to the final path
    Fresh,
    /// Rewriting an existing file: output is staged here until the close
    Staged { temp: NamedTempFile },
    Closed,
}

/// A durable record store backed by a single delimited text file
///
/// See [`RecordStore`] for the session contract. A `CsvStore` buffers the
/// session's writes in memory and performs all file output at close time,
/// which is what makes last-write-wins within a session possible.
pub struct CsvStore {
    path: PathBuf,
    schema: Schema,
    /// Rows loaded from the original file, in file order
    original: Vec<(String, Record)>,
    /// Identity keys present in the original file
    index: HashMap<String, usize>,
    /// Keys written this session; their stale original rows are not replayed
    superseded: HashSet<String>,
    /// Session writes in arrival order, deduplicated by key
    pending: Vec<(String, Record)>,
    pending_index: HashMap<String, usize>,
    mode: Mode,
}

impl CsvStore {
    /// Opens a store session against `path`
    ///
    /// If the file exists it is loaded fully into memory, typed per the
    /// schema, and a temporary staging file is created in the same directory
    /// (same filesystem, so the final rename is atomic). If it does not
    /// exist the session starts empty and the close writes the file fresh.
    pub fn open(path: impl Into<PathBuf>, schema: Schema) -> StoreResult<Self> {
        let path = path.into();

        let (original, index, mode) = if path.is_file() {
            let (original, index) = load_existing(&path, &schema)?;
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let temp = match dir {
                Some(dir) => NamedTempFile::new_in(dir)?,
                None => NamedTempFile::new_in(".")?,
            };
            tracing::debug!(
                "Opened store {} with {} existing records",
                path.display(),
                original.len()
            );
            (original, index, Mode::Staged { temp })
        } else {
            tracing::debug!("Opened fresh store {}", path.display());
            (Vec::new(), HashMap::new(), Mode::Fresh)
        };

        Ok(Self {
            path,
            schema,
            original,
            index,
            superseded: HashSet::new(),
            pending: Vec::new(),
            pending_index: HashMap::new(),
            mode,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of records loaded from the original file
    pub fn original_len(&self) -> usize {
        self.original.len()
    }

    /// Iterates over the records loaded from the original file
    pub fn original_records(&self) -> impl Iterator<Item = &Record> {
        self.original.iter().map(|(_, record)| record)
    }

    /// Drops fields the schema does not know about, with a warning
    ///
    /// Unknown fields are reported rather than silently written; dropping is
    /// this store's documented schema-mismatch policy.
    fn conform(&self, record: &mut Record) {
        let unknown: Vec<String> = record
            .field_names()
            .filter(|name| self.schema.field_type(name).is_none())
            .map(str::to_string)
            .collect();

        for field in unknown {
            tracing::warn!(
                "Dropping field '{}' not present in schema of {}",
                field,
                self.path.display()
            );
            record.remove(&field);
        }
    }

    fn write_row<W: Write>(&self, writer: &mut csv::Writer<W>, record: &Record) -> StoreResult<()> {
        let cells: Vec<String> = self
            .schema
            .field_names()
            .map(|name| record.get(name).unwrap_or(&Value::Absent).render())
            .collect();
        writer.write_record(&cells)?;
        Ok(())
    }

    fn write_session<W: Write>(&self, writer: &mut csv::Writer<W>) -> StoreResult<()> {
        writer.write_record(self.schema.field_names())?;

        for (_, record) in &self.pending {
            self.write_row(writer, record)?;
        }

        // Carry over original rows whose key was never written this session
        for (key, record) in &self.original {
            if !self.superseded.contains(key) {
                self.write_row(writer, record)?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

impl RecordStore for CsvStore {
    fn exists(&self, record: &Record) -> StoreResult<bool> {
        if matches!(self.mode, Mode::Closed) {
            return Err(StoreError::Closed);
        }

        let key = record.identity(&self.schema)?;
        Ok(self.index.contains_key(&key))
    }

    fn write(&mut self, mut record: Record) -> StoreResult<()> {
        if matches!(self.mode, Mode::Closed) {
            return Err(StoreError::Closed);
        }

        self.conform(&mut record);
        let key = record.identity(&self.schema)?;

        match self.pending_index.get(&key) {
            // Last write for a key within a session wins
            Some(&pos) => self.pending[pos] = (key.clone(), record),
            None => {
                self.pending_index.insert(key.clone(), self.pending.len());
                self.pending.push((key.clone(), record));
            }
        }

        self.superseded.insert(key);
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        match std::mem::replace(&mut self.mode, Mode::Closed) {
            Mode::Closed => Ok(()),

            Mode::Fresh => {
                let mut writer = WriterBuilder::new()
                    .quote_style(QuoteStyle::NonNumeric)
                    .from_path(&self.path)?;
                self.write_session(&mut writer)?;
                tracing::debug!(
                    "Wrote {} records to fresh store {}",
                    self.pending.len(),
                    self.path.display()
                );
                Ok(())
            }

            Mode::Staged { temp } => {
                {
                    let file = temp.as_file().try_clone()?;
                    let mut writer = WriterBuilder::new()
                        .quote_style(QuoteStyle::NonNumeric)
                        .from_writer(file);
                    self.write_session(&mut writer)?;
                }

                // The rename is the commit point: everything before it leaves
                // the original file untouched.
                temp.persist(&self.path)
                    .map_err(|e| StoreError::Persist(e.to_string()))?;

                tracing::debug!(
                    "Rewrote store {}: {} written, {} carried over",
                    self.path.display(),
                    self.pending.len(),
                    self.original
                        .iter()
                        .filter(|(key, _)| !self.superseded.contains(key))
                        .count()
                );
                Ok(())
            }
        }
    }
}

impl Drop for CsvStore {
    fn drop(&mut self) {
        if !matches!(self.mode, Mode::Closed) {
            tracing::warn!(
                "Store {} dropped without close; session writes discarded",
                self.path.display()
            );
        }
    }
}

/// Loads an existing store file, typing every cell per the schema
fn load_existing(
    path: &Path,
    schema: &Schema,
) -> StoreResult<(Vec<(String, Record)>, HashMap<String, usize>)> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    for name in headers.iter() {
        if schema.field_type(name).is_none() {
            tracing::warn!(
                "Store {} has column '{}' unknown to the schema; its values are ignored",
                path.display(),
                name
            );
        }
    }

    let mut original = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();

        for (i, cell) in row.iter().enumerate() {
            let Some(name) = headers.get(i) else { continue };
            if schema.field_type(name).is_some() {
                record.set(name, schema.parse_value(name, cell)?);
            }
        }

        let key = record.identity(schema)?;
        match index.get(&key) {
            Some(&pos) => {
                // A well-formed file has one row per key; keep the later row
                tracing::warn!(
                    "Store {} has duplicate rows for key '{}'; keeping the last",
                    path.display(),
                    key
                );
                original[pos] = (key, record);
            }
            None => {
                index.insert(key.clone(), original.len());
                original.push((key, record));
            }
        }
    }

    Ok((original, index))
}
