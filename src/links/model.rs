use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::types::{Attachment, Block, RichTextElement};

/// A URL discovered in a chat message, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLink {
    pub url: String,
    pub message_id: String,
    pub author_id: Option<String>,
    pub shared_at: Option<DateTime<Utc>>,
    pub is_thread_reply: bool,
    pub parent_thread_id: Option<String>,
}

/// One place inside a message that can carry URLs.
#[derive(Debug, Clone, Copy)]
pub enum ContentSource<'a> {
    PlainText(&'a str),
    Block(&'a Block),
    Attachment(&'a Attachment),
}

impl ContentSource<'_> {
    /// Text to scan for URLs. Pieces are separated by newlines so tokens
    /// from different fields never run together.
    pub fn extract_text(&self) -> String {
        match self {
            Self::PlainText(text) => text.to_string(),
            Self::Block(block) => block_text(block),
            Self::Attachment(attachment) => attachment_text(attachment),
        }
    }
}

fn block_text(block: &Block) -> String {
    let mut parts: Vec<&str> = Vec::new();
    match block.kind.as_str() {
        "section" => {
            if let Some(text) = &block.text {
                parts.push(&text.text);
            }
            parts.extend(block.fields.iter().map(|f| f.text.as_str()));
        }
        "rich_text" => {
            for element in &block.elements {
                collect_rich_text(element, &mut parts);
            }
        }
        _ => {}
    }
    parts.join("\n")
}

fn collect_rich_text<'a>(element: &'a RichTextElement, out: &mut Vec<&'a str>) {
    match element.kind.as_str() {
        "text" => out.extend(element.text.as_deref()),
        // The visible text of a link may differ from its target
        "link" => {
            out.extend(element.url.as_deref());
            out.extend(element.text.as_deref());
        }
        _ => {
            for child in &element.elements {
                collect_rich_text(child, out);
            }
        }
    }
}

fn attachment_text(attachment: &Attachment) -> String {
    let text_fields = [
        &attachment.text,
        &attachment.pretext,
        &attachment.title,
        &attachment.fallback,
    ];
    text_fields
        .into_iter()
        .filter_map(|f| f.as_deref())
        .chain(attachment.fields.iter().filter_map(|f| f.value.as_deref()))
        .collect::<Vec<_>>()
        .join("\n")
}
