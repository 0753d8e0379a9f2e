//! JSON file persistence for acquisition batches.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::batch::{AcquisitionBatch, SnapshotSink};

/// File name used by [`JsonFileSink::default`].
pub const DEFAULT_FILE_NAME: &str = "signals.json";

/// Errors raised while writing a snapshot.
#[derive(Debug)]
pub enum SinkError {
    /// The file could not be written.
    Io(io::Error),
    /// The batch could not be encoded.
    Json(serde_json::Error),
}

impl core::fmt::Display for SinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "snapshot write failed: {}", err),
            Self::Json(err) => write!(f, "snapshot encoding failed: {}", err),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Writes every snapshot to one file, truncating whatever was there before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Creates a sink targeting `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileSink {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_NAME)
    }
}

impl SnapshotSink for JsonFileSink {
    type Error = SinkError;

    fn persist<const CHANNELS: usize, const CAPACITY: usize>(
        &mut self,
        batch: &AcquisitionBatch<CHANNELS, CAPACITY>,
    ) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(batch)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
