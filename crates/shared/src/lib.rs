// Public modules
pub mod arena;
pub mod caption;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod screenshot;
pub mod selector;
pub mod store;

// Re-export commonly used types
pub use arena::{ArenaClient, FeedClient};
pub use caption::{CaptionGenerator, OpenAiCaptioner};
pub use classifier::{Classified, Classifier};
pub use composer::PostComposer;
pub use config::Config;
pub use error::SyndicationError;
pub use models::{ComposedPost, ContentItem, ContentKind};
pub use pipeline::{Pipeline, PipelineOptions, Stage};
pub use screenshot::{ScreenshotApiClient, ScreenshotCapture};
pub use selector::select_oldest_unseen;
pub use store::{
    KeyValueStore, MemoryStore, PersistentProcessedSet, ProcessedIdSet, ProcessedSetStore,
    SqliteStore,
};
