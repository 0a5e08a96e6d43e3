use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::ledger::{LedgerEntry, LedgerError, LedgerSnapshot, LedgerStore};

#[derive(Deserialize)]
struct UrlOnly {
    url: String,
}

/// Ledger kept as one JSON object per line, appended in place.
///
/// Appends from one process are serialized through an internal lock.
/// Two processes sharing a file are not coordinated.
#[derive(Debug)]
pub struct JsonlLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// Rows are decoded one at a time: a line with bad bytes or bad JSON is
// skipped without losing the rest of the file.
fn parse_snapshot(raw: &[u8]) -> (LedgerSnapshot, usize) {
    let mut snapshot = LedgerSnapshot::empty();
    let mut skipped = 0;
    for line in raw.split(|&b| b == b'\n') {
        let Ok(line) = std::str::from_utf8(line) else {
            skipped += 1;
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<UrlOnly>(line) {
            Ok(row) if !row.url.is_empty() => {
                snapshot.insert(row.url);
            }
            _ => skipped += 1,
        }
    }
    (snapshot, skipped)
}

#[async_trait]
impl LedgerStore for JsonlLedger {
    async fn load_snapshot(&self) -> LedgerSnapshot {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no ledger yet, every link is new");
                return LedgerSnapshot::empty();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ledger unreadable, treating as empty");
                return LedgerSnapshot::empty();
            }
        };

        let (snapshot, skipped) = parse_snapshot(&raw);
        if skipped > 0 {
            warn!(path = %self.path.display(), skipped, "skipped malformed ledger rows");
        }
        info!(path = %self.path.display(), urls = snapshot.len(), "loaded ledger");
        snapshot
    }

    async fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
