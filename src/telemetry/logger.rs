//! JSONL writer for weather records with size-based rotation

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;

/// File name prefix of record files
const FILE_PREFIX: &str = "readings_";

/// File name extension of record files
const FILE_EXTENSION: &str = "jsonl";

/// Appends one JSON object per line, starting a new file every
/// `max_records_per_file` records and keeping the newest
/// `max_files_to_keep` files.
pub struct TelemetryLogger {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    file_sequence: u32,
}

impl std::fmt::Debug for TelemetryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryLogger")
            .field("log_dir", &self.log_dir)
            .field("current_path", &self.current_path)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl TelemetryLogger {
    /// Create the log directory if needed; the first file is opened lazily
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let log_dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&log_dir)?;
        info!("Telemetry records go to {}", log_dir.display());

        Ok(Self {
            log_dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            file_sequence: 0,
        })
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Append one record as a JSON line and flush it
    pub fn log<T: Serialize>(&mut self, record: &T) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = serde_json::to_string(record)?;
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }
        self.records_in_file += 1;

        Ok(())
    }

    /// Close the current file, open a fresh one and prune old files
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            self.file_sequence,
            FILE_EXTENSION
        );
        self.file_sequence = self.file_sequence.wrapping_add(1);

        let path = self.log_dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened telemetry file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Delete the oldest record files beyond `max_files_to_keep`
    fn prune(&self) -> Result<()> {
        let mut files = self.record_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        // Names start with a timestamp, so lexical order is chronological
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove old telemetry file {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    /// All record files in the log directory
    pub fn record_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.log_dir)? {
            let path = entry?.path();
            let is_record = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION));
            if is_record {
                files.push(path);
            }
        }
        Ok(files)
    }
}
