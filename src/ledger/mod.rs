//! Cross-run deduplication.
//!
//! The ledger is the set of every URL the digest has already attempted.
//! A run loads it once into a [`LedgerSnapshot`], filters candidate links
//! against it and appends each URL after its single processing attempt.

pub mod jsonl;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extractor::{ArticleRecord, ArticleStatus};
use crate::links::ExtractedLink;

pub use jsonl::JsonlLedger;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One processed URL. Only `url` is needed to rebuild a snapshot, the
/// rest keeps the file useful to humans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub shared_by: Option<String>,
    #[serde(default)]
    pub shared_at: Option<DateTime<Utc>>,
    pub processed_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn from_outcome(link: &ExtractedLink, record: &ArticleRecord) -> Self {
        Self {
            url: link.url.clone(),
            title: Some(record.title.clone()),
            domain: Some(record.domain.clone()),
            status: Some(record.status),
            word_count: record.word_count,
            shared_by: link.author_id.clone(),
            shared_at: link.shared_at,
            processed_at: Utc::now(),
        }
    }
}

/// In-memory view of the ledger taken at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    urls: HashSet<String>,
}

impl LedgerSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Candidates whose exact URL string is absent from the snapshot, in
/// input order. No canonicalization: `https://x.test/a` and
/// `https://x.test/a/` are different entries.
pub fn filter_new(candidates: Vec<ExtractedLink>, snapshot: &LedgerSnapshot) -> Vec<ExtractedLink> {
    candidates
        .into_iter()
        .filter(|link| !snapshot.contains(&link.url))
        .collect()
}

/// Persistent store behind the ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Never fails: an unreadable or missing store is an empty snapshot.
    async fn load_snapshot(&self) -> LedgerSnapshot;

    async fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError>;
}
