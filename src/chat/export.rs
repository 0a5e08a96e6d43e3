use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::chat::source::ChatSource;
use crate::chat::types::{Message, UserInfo};

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("failed to read chat export {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed chat export: {0}")]
    Format(#[from] serde_json::Error),

    #[error("unknown user: {0}")]
    UnknownUser(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExportFile {
    Channel {
        messages: Vec<Message>,
        #[serde(default)]
        users: Vec<UserInfo>,
    },
    Bare(Vec<Message>),
}

/// [`ChatSource`] backed by a channel export on disk.
///
/// The file is either a bare JSON array of messages or an object with
/// `messages` and optional `users`. Thread replies live in the same list
/// and are told apart by `thread_ts`.
#[derive(Debug, Clone)]
pub struct JsonExportSource {
    messages: Vec<Message>,
    users: HashMap<String, UserInfo>,
}

impl JsonExportSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ChatError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let source = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            messages = source.messages.len(),
            users = source.users.len(),
            "loaded chat export"
        );
        Ok(source)
    }

    pub fn from_json(raw: &str) -> Result<Self, ChatError> {
        let (messages, users) = match serde_json::from_str(raw)? {
            ExportFile::Channel { messages, users } => (messages, users),
            ExportFile::Bare(messages) => (messages, Vec::new()),
        };
        Ok(Self::new(messages, users))
    }

    pub fn new(mut messages: Vec<Message>, users: Vec<UserInfo>) -> Self {
        messages.sort_by_key(|m| m.timestamp());
        Self {
            messages,
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
        }
    }
}

fn is_reply(message: &Message) -> bool {
    message
        .thread_root
        .as_deref()
        .is_some_and(|root| root != message.id)
}

#[async_trait]
impl ChatSource for JsonExportSource {
    async fn get_messages(
        &self,
        _channel: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<Message>> {
        let in_window = |m: &Message| match m.timestamp() {
            Some(ts) => since.is_none_or(|s| ts >= s) && until.is_none_or(|u| ts <= u),
            None => since.is_none() && until.is_none(),
        };

        Ok(self
            .messages
            .iter()
            .filter(|m| !is_reply(m) && in_window(m))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get_thread_replies(&self, thread_id: &str) -> anyhow::Result<Vec<Message>> {
        Ok(self
            .messages
            .iter()
            .filter(|m| m.thread_root.as_deref() == Some(thread_id))
            .cloned()
            .collect())
    }

    async fn user_info(&self, user_id: &str) -> anyhow::Result<UserInfo> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ChatError::UnknownUser(user_id.to_string()).into())
    }
}
