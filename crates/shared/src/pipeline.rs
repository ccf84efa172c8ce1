//! One syndication run: fetch, pick the oldest unseen item, describe it,
//! compose the post and mark the item as processed.
//!
//! Every external call is awaited before the next stage starts. The item is
//! recorded before the post is returned, so a publisher failure downstream
//! skips it for good (at most once, never twice).

use std::fmt;
use std::sync::Arc;

use crate::arena::{FeedClient, DEFAULT_PAGE_SIZE};
use crate::caption::CaptionGenerator;
use crate::classifier::Classifier;
use crate::composer::PostComposer;
use crate::models::ComposedPost;
use crate::screenshot::ScreenshotCapture;
use crate::selector::select_oldest_unseen;
use crate::store::ProcessedSetStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Selecting,
    Classifying,
    Composing,
    Recording,
    Done,
    NoWork,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Selecting => "selecting",
            Stage::Classifying => "classifying",
            Stage::Composing => "composing",
            Stage::Recording => "recording",
            Stage::Done => "done",
            Stage::NoWork => "no-work",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub channel: String,
    pub page_size: usize,
    /// Compose without recording the item.
    pub dry_run: bool,
    pub default_title: Option<String>,
}

impl PipelineOptions {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            page_size: DEFAULT_PAGE_SIZE,
            dry_run: false,
            default_title: None,
        }
    }
}

pub struct Pipeline {
    feed: Arc<dyn FeedClient>,
    captions: Arc<dyn CaptionGenerator>,
    screenshots: Arc<dyn ScreenshotCapture>,
    composer: PostComposer,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        feed: Arc<dyn FeedClient>,
        captions: Arc<dyn CaptionGenerator>,
        screenshots: Arc<dyn ScreenshotCapture>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            feed,
            captions,
            screenshots,
            composer: PostComposer::with_default_title(options.default_title.clone()),
            options,
        }
    }

    fn enter(&self, stage: Stage) {
        tracing::debug!(stage = %stage, channel = %self.options.channel, "Pipeline stage");
    }

    /// Run once. `None` means there was nothing to post: the feed was empty
    /// or unavailable, every item was already processed, or the item could
    /// not be recorded.
    pub async fn run(&self, processed: &mut dyn ProcessedSetStore) -> Option<ComposedPost> {
        self.enter(Stage::Fetching);
        let items = self
            .feed
            .fetch(&self.options.channel, self.options.page_size)
            .await;

        self.enter(Stage::Selecting);
        let Some(item) = select_oldest_unseen(&items, &*processed) else {
            self.enter(Stage::NoWork);
            tracing::info!(fetched = items.len(), "No new Are.na blocks to process in this run");
            return None;
        };
        tracing::info!(
            id = %item.id,
            title = item.title.as_deref().unwrap_or("Untitled"),
            "Processing new block"
        );

        self.enter(Stage::Classifying);
        let classified = Classifier::new(self.captions.as_ref(), self.screenshots.as_ref())
            .classify(item)
            .await;

        self.enter(Stage::Composing);
        let post = self.composer.compose(
            item.title.as_deref(),
            &classified.description,
            &classified.link,
            classified.media_url,
        );

        if self.options.dry_run {
            tracing::info!(id = %item.id, "Dry run, not recording block");
        } else {
            self.enter(Stage::Recording);
            if let Err(e) = processed.add(&item.id) {
                tracing::error!(id = %item.id, error = %e, "Could not record block, dropping post");
                self.enter(Stage::NoWork);
                return None;
            }
        }

        self.enter(Stage::Done);
        Some(post)
    }
}
