//! History file storage

use crate::error::StoreError;
use crate::models::{Metric, Record, Series};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One pretty-printed JSON array per (metric, coin) under `data_dir`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    data_dir: PathBuf,
}

impl HistoryStore {
    /// Create new store
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `<data_dir>/<metric>-<coin>.json`
    pub fn path(&self, metric: Metric, coin: &str) -> PathBuf {
        self.data_dir.join(format!("{}-{}.json", metric, coin))
    }

    /// Load a series.
    ///
    /// A missing file is an empty history. A file that exists but does not
    /// parse is reported as [`StoreError::Corrupt`] so the caller can decide
    /// what to do with it.
    pub fn load(&self, metric: Metric, coin: &str) -> Result<Series, StoreError> {
        let path = self.path(metric, coin);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        // Bad encoding counts as corruption, not an I/O failure
        serde_json::from_slice(&contents).map_err(|source| StoreError::Corrupt { path, source })
    }

    pub fn exists(&self, metric: Metric, coin: &str) -> bool {
        self.path(metric, coin).exists()
    }

    /// Overwrite a series.
    ///
    /// The JSON goes to a sibling temp file first and is renamed into place,
    /// so an interrupted save leaves the previous history intact.
    pub fn save(&self, metric: Metric, coin: &str, series: &[Record]) -> Result<(), StoreError> {
        let path = self.path(metric, coin);
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(series).map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    /// Move an unreadable series aside to `<file>.corrupt`.
    pub fn quarantine(&self, metric: Metric, coin: &str) -> Result<PathBuf, StoreError> {
        let path = self.path(metric, coin);
        let target = path.with_extension("json.corrupt");
        fs::rename(&path, &target).map_err(|source| StoreError::Io { path, source })?;
        Ok(target)
    }
}
