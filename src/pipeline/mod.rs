//! Run orchestration: links → ledger filter → fetch → extract → ledger
//! append → summarizer handoff.

pub mod summarize;
pub mod tags;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, error, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::chat::{ChatSource, Message, UserCache};
use crate::config::PipelineConfig;
use crate::extractor::{self, ArticleRecord, ArticleStatus};
use crate::fetcher::{FetchResult, PageFetcher};
use crate::ledger::{LedgerEntry, LedgerStore, filter_new};
use crate::links::{Denylist, ExtractedLink, LinkExtractor};

pub use summarize::{PreviewSummarizer, Summarizer, Summary};
pub use tags::{content_preview, lightweight_tags};

/// One link taken through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedLink {
    pub link: ExtractedLink,
    pub record: ArticleRecord,
    /// Display name of the author, filled in after processing.
    pub shared_by: Option<String>,
    pub summary: Option<Summary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub discovered: usize,
    pub skipped_seen: usize,
    pub skipped_duplicate: usize,
    pub skipped_over_cap: usize,
    pub success: usize,
    pub js_required: usize,
    pub error: usize,
    pub summarized: usize,
    pub ledger_write_failures: usize,
}

impl RunStats {
    fn count(&mut self, status: ArticleStatus) {
        match status {
            ArticleStatus::Success => self.success += 1,
            ArticleStatus::JsRequired => self.js_required += 1,
            ArticleStatus::Error => self.error += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.success + self.js_required + self.error
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub processed: Vec<ProcessedLink>,
    pub stats: RunStats,
    /// True when the run stopped early on cancellation.
    pub cancelled: bool,
}

impl RunReport {
    pub fn records(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.processed.iter().map(|p| &p.record)
    }
}

struct ItemOutcome {
    processed: ProcessedLink,
    ledger_written: bool,
}

#[derive(Clone)]
pub struct Pipeline {
    links: LinkExtractor,
    fetcher: Arc<dyn PageFetcher>,
    ledger: Arc<dyn LedgerStore>,
    summarizer: Option<Arc<dyn Summarizer>>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        ledger: Arc<dyn LedgerStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            links: LinkExtractor::new(Denylist::default(), config.bot_user_id.clone()),
            fetcher,
            ledger,
            summarizer: None,
            config,
        }
    }

    pub fn with_link_extractor(mut self, links: LinkExtractor) -> Self {
        self.links = links;
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, messages: &[Message], chat: &dyn ChatSource) -> RunReport {
        self.run_until_cancelled(messages, chat, &CancellationToken::new())
            .await
    }

    /// Like [`Pipeline::run`], but stops between items once `cancel`
    /// fires. Items already processed are in the ledger and the report.
    pub async fn run_until_cancelled(
        &self,
        messages: &[Message],
        chat: &dyn ChatSource,
        cancel: &CancellationToken,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        self.execute(run_id, messages, chat, cancel)
            .instrument(info_span!("run", run_id = %run_id))
            .await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        messages: &[Message],
        chat: &dyn ChatSource,
        cancel: &CancellationToken,
    ) -> RunReport {
        let mut stats = RunStats::default();

        let candidates = self.links.extract(messages, chat).await;
        stats.discovered = candidates.len();

        let snapshot = self.ledger.load_snapshot().await;
        let unseen = filter_new(candidates, &snapshot);
        stats.skipped_seen = stats.discovered - unseen.len();

        let (mut queue, duplicates) = first_occurrences(unseen);
        stats.skipped_duplicate = duplicates;

        if let Some(max) = self.config.max_links
            && queue.len() > max
        {
            stats.skipped_over_cap = queue.len() - max;
            queue.truncate(max);
        }

        info!(
            discovered = stats.discovered,
            ledger_size = snapshot.len(),
            queued = queue.len(),
            "starting run"
        );

        let (outcomes, cancelled) = if self.config.concurrency <= 1 {
            self.process_sequential(queue, cancel).await
        } else {
            self.process_concurrent(queue, cancel).await
        };

        let users = UserCache::new();
        let mut processed = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let mut item = outcome.processed;
            stats.count(item.record.status);
            if item.summary.is_some() {
                stats.summarized += 1;
            }
            if !outcome.ledger_written {
                stats.ledger_write_failures += 1;
            }
            if let Some(author) = item.link.author_id.as_deref() {
                item.shared_by = Some(users.resolve(chat, author).await.preferred_name().to_string());
            }
            processed.push(item);
        }

        info!(
            success = stats.success,
            js_required = stats.js_required,
            error = stats.error,
            skipped_seen = stats.skipped_seen,
            cancelled,
            "run finished"
        );

        RunReport {
            run_id,
            processed,
            stats,
            cancelled,
        }
    }

    async fn process_sequential(
        &self,
        queue: Vec<ExtractedLink>,
        cancel: &CancellationToken,
    ) -> (Vec<ItemOutcome>, bool) {
        let total = queue.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, link) in queue.into_iter().enumerate() {
            if index > 0 && !self.config.politeness_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = sleep(self.config.politeness_delay) => {}
                }
            }
            if cancel.is_cancelled() {
                info!(remaining = total - index, "run cancelled");
                return (outcomes, true);
            }
            outcomes.push(self.process_item(link).await);
        }
        (outcomes, false)
    }

    /// Up to `concurrency` items in flight. Each worker keeps its permit
    /// through the politeness delay. Results come back in queue order.
    async fn process_concurrent(
        &self,
        queue: Vec<ExtractedLink>,
        cancel: &CancellationToken,
    ) -> (Vec<ItemOutcome>, bool) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();
        let mut cancelled = false;
        // Links still owed a result, so a panicked task is reported rather than lost.
        let mut pending = HashMap::new();

        for (index, link) in queue.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            pending.insert(index, link.clone());
            let pipeline = self.clone();
            let delay = self.config.politeness_delay;
            tasks.spawn(
                async move {
                    let outcome = pipeline.process_item(link).await;
                    sleep(delay).await;
                    drop(permit);
                    (index, outcome)
                }
                .instrument(Span::current()),
            );
        }
        if cancelled {
            info!(in_flight = tasks.len(), "run cancelled, draining in-flight items");
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    pending.remove(&index);
                    results.push((index, outcome));
                }
                Err(e) => error!(error = %e, "link task failed"),
            }
        }
        for (index, link) in pending {
            let outcome = self.lost_item(link).await;
            results.push((index, outcome));
        }
        results.sort_by_key(|(index, _)| *index);
        (results.into_iter().map(|(_, outcome)| outcome).collect(), cancelled)
    }

    #[instrument(skip_all, fields(url = %link.url))]
    async fn process_item(&self, link: ExtractedLink) -> ItemOutcome {
        let record = self.fetch_and_extract(&link).await;

        match record.status {
            ArticleStatus::Success => info!(words = record.word_count, "article extracted"),
            ArticleStatus::JsRequired => info!("page requires javascript"),
            ArticleStatus::Error => warn!(
                reason = record.error.as_deref().unwrap_or("unknown"),
                "link failed"
            ),
        }

        // Appended whatever the outcome: one attempt per URL.
        let ledger_written = match self.ledger.append(&LedgerEntry::from_outcome(&link, &record)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to append to ledger");
                false
            }
        };

        let summary = match &self.summarizer {
            Some(summarizer) if record.is_success() => match summarizer.summarize(&record, &link).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(error = %e, "summarizer failed");
                    None
                }
            },
            _ => None,
        };

        ItemOutcome {
            processed: ProcessedLink {
                link,
                record,
                shared_by: None,
                summary,
            },
            ledger_written,
        }
    }

    /// Error outcome for a link whose worker died before reporting back.
    async fn lost_item(&self, link: ExtractedLink) -> ItemOutcome {
        let record = ArticleRecord::error(&link.url, None, "processing task panicked");
        let ledger_written = match self.ledger.append(&LedgerEntry::from_outcome(&link, &record)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(url = %link.url, error = %e, "failed to append to ledger");
                false
            }
        };
        ItemOutcome {
            processed: ProcessedLink {
                link,
                record,
                shared_by: None,
                summary: None,
            },
            ledger_written,
        }
    }

    /// Fetch with retries, then extract off the async runtime. Every
    /// failure becomes an `Error` record.
    pub async fn fetch_and_extract(&self, link: &ExtractedLink) -> ArticleRecord {
        let page = match self.fetcher.fetch(&link.url).await {
            FetchResult::Success(page) => page,
            FetchResult::Failed { error, attempts } => {
                return ArticleRecord::error(
                    &link.url,
                    None,
                    format!("fetch failed after {attempts} attempt(s): {error}"),
                );
            }
        };

        let url = link.url.clone();
        match tokio::task::spawn_blocking(move || extractor::extract(&page.body_utf8, &url)).await {
            Ok(record) => record,
            Err(e) => ArticleRecord::error(&link.url, None, format!("extraction task failed: {e}")),
        }
    }
}

/// Drop repeats of a URL across messages, keeping the first. Returns the
/// survivors and how many were dropped.
fn first_occurrences(links: Vec<ExtractedLink>) -> (Vec<ExtractedLink>, usize) {
    let before = links.len();
    let mut seen = HashSet::new();
    let kept: Vec<_> = links
        .into_iter()
        .filter(|link| seen.insert(link.url.clone()))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
