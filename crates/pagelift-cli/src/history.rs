use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use pagelift_core::error::AppError;
use pagelift_core::models::HistoryEntry;
use pagelift_core::traits::HistoryStore;

/// History kept as one JSON object per line, appended on every success.
pub struct JsonLinesHistory {
    path: PathBuf,
}

impl JsonLinesHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonLinesHistory {
    fn record(&self, entry: &HistoryEntry) -> Result<(), AppError> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AppError::Generic(format!(
                    "Failed to open history file {}: {e}",
                    self.path.display()
                ))
            })?;
        writeln!(file, "{line}").map_err(|e| {
            AppError::Generic(format!(
                "Failed to write history file {}: {e}",
                self.path.display()
            ))
        })
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, AppError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(AppError::Generic(format!(
                    "Failed to read history file {}: {e}",
                    self.path.display()
                )));
            }
        };

        let entries: Vec<HistoryEntry> = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(line = n + 1, error = %e, "Skipping malformed history line");
                    None
                }
            })
            .collect();

        Ok(entries.into_iter().rev().take(limit).collect())
    }
}
