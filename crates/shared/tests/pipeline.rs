use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shared::error::{Result, SyndicationError};
use shared::{
    CaptionGenerator, ContentItem, ContentKind, FeedClient, MemoryStore, PersistentProcessedSet,
    Pipeline, PipelineOptions, ProcessedSetStore, ScreenshotCapture,
};

struct StaticFeed {
    items: Vec<ContentItem>,
}

#[async_trait]
impl FeedClient for StaticFeed {
    async fn fetch(&self, _channel: &str, per: usize) -> Vec<ContentItem> {
        self.items.iter().take(per).cloned().collect()
    }
}

#[derive(Default)]
struct CountingCaptioner {
    calls: AtomicUsize,
}

#[async_trait]
impl CaptionGenerator for CountingCaptioner {
    async fn generate(&self, media_ref: &str, _prompt: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        format!("A vintage roadster ({})", media_ref)
    }
}

struct NoScreenshots;

#[async_trait]
impl ScreenshotCapture for NoScreenshots {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn capture(&self, _page_url: &str) -> Option<String> {
        None
    }
}

/// Store whose writes always fail.
struct ReadOnlyStore;

impl ProcessedSetStore for ReadOnlyStore {
    fn contains(&self, _id: &str) -> bool {
        false
    }

    fn add(&mut self, _id: &str) -> Result<()> {
        Err(SyndicationError::Storage("disk full".into()))
    }
}

fn feed() -> Vec<ContentItem> {
    vec![
        ContentItem::new(
            "3",
            None,
            ContentKind::Link {
                url: "http://x".into(),
                generated_title: None,
            },
        ),
        ContentItem::new(
            "2",
            Some("Roadster".into()),
            ContentKind::Image {
                url: "https://images.are.na/2.jpg".into(),
            },
        ),
        ContentItem::new("1", None, ContentKind::Text { body: "hi".into() }),
    ]
}

fn pipeline(items: Vec<ContentItem>, captions: Arc<CountingCaptioner>) -> Pipeline {
    Pipeline::new(
        Arc::new(StaticFeed { items }),
        captions,
        Arc::new(NoScreenshots),
        PipelineOptions::new("cool-cars"),
    )
}

fn store_with(ids: &[&str]) -> PersistentProcessedSet<MemoryStore> {
    let mut store = PersistentProcessedSet::load(MemoryStore::new(), "cool-cars", 200).unwrap();
    for id in ids {
        store.add(id).unwrap();
    }
    store
}

#[tokio::test]
async fn test_selects_oldest_unseen_image_and_records_it() {
    let captions = Arc::new(CountingCaptioner::default());
    let mut store = store_with(&["1"]);

    let post = pipeline(feed(), captions.clone())
        .run(&mut store)
        .await
        .expect("a post");

    assert_eq!(post.media_url.as_deref(), Some("https://images.are.na/2.jpg"));
    assert!(post.text.starts_with("Roadster: A vintage roadster"));
    assert!(post.text.ends_with(" https://www.are.na/block/2"));
    assert!(post.text.chars().count() <= 280);
    assert_eq!(captions.calls.load(Ordering::SeqCst), 1);
    assert!(store.contains("2"));
    assert!(!store.contains("3"));
}

#[tokio::test]
async fn test_one_item_per_run() {
    let captions = Arc::new(CountingCaptioner::default());
    let mut store = store_with(&[]);
    let pipeline = pipeline(feed(), captions);

    let first = pipeline.run(&mut store).await.unwrap();
    assert_eq!(first.text, "hi https://www.are.na/block/1");

    let second = pipeline.run(&mut store).await.unwrap();
    assert!(second.text.starts_with("Roadster: "));

    let third = pipeline.run(&mut store).await.unwrap();
    assert_eq!(third.text, "Web Link http://x");
    assert_eq!(third.media_url, None);

    assert!(pipeline.run(&mut store).await.is_none());
    assert_eq!(
        store.ids().iter().collect::<Vec<_>>(),
        vec!["1", "2", "3"]
    );
}

#[tokio::test]
async fn test_all_processed_yields_nothing() {
    let captions = Arc::new(CountingCaptioner::default());
    let mut store = store_with(&["1", "2", "3"]);

    assert!(pipeline(feed(), captions.clone()).run(&mut store).await.is_none());
    assert_eq!(captions.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.ids().len(), 3);
}

#[tokio::test]
async fn test_empty_feed_yields_nothing() {
    let captions = Arc::new(CountingCaptioner::default());
    let mut store = store_with(&[]);

    assert!(pipeline(Vec::new(), captions).run(&mut store).await.is_none());
    assert!(store.ids().is_empty());
}

#[tokio::test]
async fn test_dry_run_does_not_record() {
    let captions = Arc::new(CountingCaptioner::default());
    let mut store = store_with(&["1"]);
    let mut options = PipelineOptions::new("cool-cars");
    options.dry_run = true;
    let pipeline = Pipeline::new(
        Arc::new(StaticFeed { items: feed() }),
        captions,
        Arc::new(NoScreenshots),
        options,
    );

    assert!(pipeline.run(&mut store).await.is_some());
    assert!(!store.contains("2"));
}

#[tokio::test]
async fn test_unrecordable_item_is_not_handed_out() {
    let captions = Arc::new(CountingCaptioner::default());
    let mut store = ReadOnlyStore;

    assert!(pipeline(feed(), captions).run(&mut store).await.is_none());
}

#[tokio::test]
async fn test_default_title_prefixes_untitled_items() {
    let captions = Arc::new(CountingCaptioner::default());
    let mut store = store_with(&[]);
    let mut options = PipelineOptions::new("cool-cars");
    options.default_title = Some("Are.na Discovery".into());
    let pipeline = Pipeline::new(
        Arc::new(StaticFeed { items: feed() }),
        captions,
        Arc::new(NoScreenshots),
        options,
    );

    let post = pipeline.run(&mut store).await.unwrap();
    assert_eq!(post.text, "Are.na Discovery: hi https://www.are.na/block/1");
}

#[tokio::test]
async fn test_untitled_link_names_page_once() {
    let captions = Arc::new(CountingCaptioner::default());
    let mut store = store_with(&[]);
    let items = vec![ContentItem::new(
        "7",
        None,
        ContentKind::Link {
            url: "http://x".into(),
            generated_title: Some("Example Domain".into()),
        },
    )];

    let post = pipeline(items, captions).run(&mut store).await.unwrap();
    assert_eq!(post.text, "Example Domain http://x");
}

#[tokio::test]
async fn test_long_text_post_is_bounded() {
    let captions = Arc::new(CountingCaptioner::default());
    let mut store = store_with(&[]);
    let title = "T".repeat(200);
    let items = vec![ContentItem::new(
        "9",
        Some(title),
        ContentKind::Text {
            body: "b".repeat(400),
        },
    )];

    let post = pipeline(items, captions).run(&mut store).await.unwrap();
    assert_eq!(post.text.chars().count(), 280);
    assert!(post.text.ends_with("..."));
}
