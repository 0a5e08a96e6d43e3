use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::extractor::ArticleRecord;
use crate::links::ExtractedLink;
use crate::pipeline::tags::{content_preview, lightweight_tags};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub tags: Vec<String>,
}

/// Downstream consumer of successful articles, typically a model call.
/// Only `Success` records are handed over.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, record: &ArticleRecord, link: &ExtractedLink) -> anyhow::Result<Summary>;
}

/// Offline summarizer: content preview plus lightweight tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewSummarizer;

#[async_trait]
impl Summarizer for PreviewSummarizer {
    async fn summarize(&self, record: &ArticleRecord, _link: &ExtractedLink) -> anyhow::Result<Summary> {
        let content = record
            .content
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("record for {} has no content", record.url))?;
        Ok(Summary {
            summary: content_preview(content),
            tags: lightweight_tags(record),
        })
    }
}
