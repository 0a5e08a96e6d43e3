use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use crate::chat::{ChatSource, Message};
use crate::links::denylist::Denylist;
use crate::links::model::{ContentSource, ExtractedLink};
use crate::links::scan::scan_urls;

/// Turns chat messages (and their thread replies) into [`ExtractedLink`]s.
#[derive(Debug, Clone, Default)]
pub struct LinkExtractor {
    denylist: Denylist,
    bot_user_id: Option<String>,
}

impl LinkExtractor {
    pub fn new(denylist: Denylist, bot_user_id: Option<String>) -> Self {
        Self {
            denylist,
            bot_user_id,
        }
    }

    /// Posts made by a bot integration, or by our own bot user, are
    /// skipped so the digest never feeds on its own output.
    pub fn is_from_bot(&self, message: &Message) -> bool {
        message.bot_id.is_some()
            || self
                .bot_user_id
                .as_deref()
                .is_some_and(|bot| message.author_id.as_deref() == Some(bot))
    }

    /// Links of a batch of messages, in message order, including thread
    /// replies right after their root.
    #[instrument(skip_all, fields(messages = messages.len()))]
    pub async fn extract(&self, messages: &[Message], chat: &dyn ChatSource) -> Vec<ExtractedLink> {
        let mut links = Vec::new();

        for message in messages {
            if self.is_from_bot(message) {
                continue;
            }
            links.extend(self.links_in_message(message));

            if message.has_replies() {
                links.extend(self.thread_links(message, chat).await);
            }
        }

        info!(
            links = links.len(),
            messages = messages.len(),
            "extracted links (including threads)"
        );
        links
    }

    async fn thread_links(&self, root: &Message, chat: &dyn ChatSource) -> Vec<ExtractedLink> {
        let replies = match chat.get_thread_replies(&root.id).await {
            Ok(replies) => replies,
            Err(e) => {
                warn!(thread = %root.id, error = %e, "failed to fetch thread replies");
                return Vec::new();
            }
        };

        let links: Vec<_> = replies
            .iter()
            .filter(|reply| reply.id != root.id && !self.is_from_bot(reply))
            .flat_map(|reply| self.links_in_message(reply))
            .map(|link| ExtractedLink {
                is_thread_reply: true,
                parent_thread_id: Some(root.id.clone()),
                ..link
            })
            .collect();

        if !links.is_empty() {
            debug!(thread = %root.id, links = links.len(), "found links in thread replies");
        }
        links
    }

    /// Unique, allowed links of one message in first-occurrence order.
    pub fn links_in_message(&self, message: &Message) -> Vec<ExtractedLink> {
        let mut seen = HashSet::new();

        message_sources(message)
            .iter()
            .flat_map(|source| scan_urls(&source.extract_text()))
            .filter(|url| seen.insert(url.clone()))
            .filter(|url| !self.denylist.is_denied(url))
            .map(|url| ExtractedLink {
                url,
                message_id: message.id.clone(),
                author_id: message.author_id.clone(),
                shared_at: message.timestamp(),
                is_thread_reply: false,
                parent_thread_id: None,
            })
            .collect()
    }
}

fn message_sources(message: &Message) -> Vec<ContentSource<'_>> {
    let mut sources = Vec::with_capacity(1 + message.blocks.len() + message.attachments.len());
    if !message.text.is_empty() {
        sources.push(ContentSource::PlainText(&message.text));
    }
    sources.extend(message.blocks.iter().map(ContentSource::Block));
    sources.extend(message.attachments.iter().map(ContentSource::Attachment));
    sources
}
