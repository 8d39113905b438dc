//! Append-only summary log.
//!
//! One JSON object per line, written synchronously at flush time so a
//! crash never loses an already-flushed summary.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use vcap_models::SummaryLogEntry;

use crate::error::{SessionError, SessionResult};

/// Writer for the newline-delimited summary log.
#[derive(Debug, Clone)]
pub struct SummaryLog {
    path: PathBuf,
}

impl SummaryLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one entry, creating the file and parent directory on first
    /// use.
    pub async fn append(&self, entry: &SummaryLogEntry) -> SessionResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(entry)
            .map_err(|e| SessionError::summary_log(format!("serialize failed: {}", e)))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), time = %entry.time, "Summary appended");
        Ok(())
    }

    /// Log file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_append_is_newline_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let log = SummaryLog::new(dir.path().join("summaries/live.jsonl"));

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        log.append(&SummaryLogEntry::new(start, "first")).await.unwrap();
        log.append(&SummaryLogEntry::new(start, "second")).await.unwrap();

        let content = tokio::fs::read_to_string(log.path()).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: SummaryLogEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.summary, "first");
        assert_eq!(first.time, "2024-05-01 10:30");
    }
}
