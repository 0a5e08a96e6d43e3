use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat post as returned by the chat platform.
///
/// Field names follow the platform's JSON so exports and API payloads
/// deserialize directly. Everything except the id is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Channel-unique, monotonically orderable id (`"1700000000.000100"`).
    #[serde(rename = "ts")]
    pub id: String,
    #[serde(rename = "user", default)]
    pub author_id: Option<String>,
    /// Set when the post was made by a bot integration.
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(rename = "thread_ts", default)]
    pub thread_root: Option<String>,
    #[serde(default)]
    pub reply_count: u32,
}

impl Message {
    /// Wall-clock time encoded in the message id.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let (secs, frac) = match self.id.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (self.id.as_str(), ""),
        };
        let secs: i64 = secs.parse().ok()?;
        let micros: u32 = if frac.is_empty() {
            0
        } else {
            // Pad/truncate to microseconds
            let digits: String = frac.chars().chain("000000".chars()).take(6).collect();
            digits.parse().ok()?
        };
        DateTime::from_timestamp(secs, micros * 1_000)
    }

    pub fn has_replies(&self) -> bool {
        self.reply_count > 0
    }
}

/// Layout block. Only the parts that carry text are modelled; unknown
/// block types deserialize with empty content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextObject>,
    #[serde(default)]
    pub fields: Vec<TextObject>,
    #[serde(default)]
    pub elements: Vec<RichTextElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

/// Node of a rich-text tree. Containers (`rich_text_section`,
/// `rich_text_list`, `rich_text_quote`, ...) hold child `elements`;
/// leaves are `text` or `link`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextElement {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub elements: Vec<RichTextElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub pretext: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fallback: Option<String>,
    #[serde(default)]
    pub fields: Vec<AttachmentField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentField {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
}

impl UserInfo {
    /// Placeholder used when a lookup fails.
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            display_name: None,
            real_name: None,
        }
    }

    /// Best human-readable name: display name, then real name, then handle.
    pub fn preferred_name(&self) -> &str {
        [self.display_name.as_deref(), self.real_name.as_deref()]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .unwrap_or(self.name.as_str())
    }
}
