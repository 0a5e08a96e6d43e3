use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::warn;

use crate::chat::types::{Message, UserInfo};

/// Read side of the chat platform. Implementations own authentication
/// and paging; the digest only consumes well-formed messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatSource: Send + Sync {
    /// Messages of `channel` posted in `[since, until]`, oldest first.
    async fn get_messages(
        &self,
        channel: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<Message>>;

    /// Replies of the thread rooted at `thread_id`. May include the root.
    async fn get_thread_replies(&self, thread_id: &str) -> anyhow::Result<Vec<Message>>;

    async fn user_info(&self, user_id: &str) -> anyhow::Result<UserInfo>;
}

/// Memoizes user lookups for the lifetime of one run.
///
/// Failed lookups are cached as id-only entries so a broken user never
/// costs more than one request.
#[derive(Debug, Default)]
pub struct UserCache {
    entries: DashMap<String, UserInfo>,
}

impl UserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve(&self, source: &dyn ChatSource, user_id: &str) -> UserInfo {
        if let Some(hit) = self.entries.get(user_id) {
            return hit.value().clone();
        }

        let info = match source.user_info(user_id).await {
            Ok(info) => info,
            Err(e) => {
                warn!(user_id, error = %e, "user lookup failed");
                UserInfo::unknown(user_id)
            }
        };
        self.entries.insert(user_id.to_string(), info.clone());
        info
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
