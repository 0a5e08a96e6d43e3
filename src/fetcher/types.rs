use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use url::Url;

use crate::fetcher::errors::FetchError;

#[derive(Debug, Clone)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub content_type: String,
    pub body_raw: Bytes,
    pub body_utf8: String,
    /// WHATWG name of the encoding the body was decoded from.
    pub encoding: &'static str,
    pub fetched_at: DateTime<Utc>,
}

/// Outcome of fetching one URL with retries. Failure is a value so the
/// caller can keep going with the rest of its batch.
#[derive(Debug)]
pub enum FetchResult {
    Success(PageResponse),
    Failed { error: FetchError, attempts: u32 },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
