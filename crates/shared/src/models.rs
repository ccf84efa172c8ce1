use serde::{Deserialize, Serialize};

/// Base URL for Are.na block permalinks.
pub const BLOCK_PERMALINK_BASE: &str = "https://www.are.na/block";

/// What kind of block an item is, with only the fields valid for that kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Image { url: String },
    Link {
        url: String,
        /// Page title Are.na derived from the link target.
        generated_title: Option<String>,
    },
    Text { body: String },
    /// Any block class we don't compose specially (Media, Attachment, Channel, ...).
    Other { class: String },
}

/// One unit of content fetched from the feed. Immutable after fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    pub title: Option<String>,
    pub kind: ContentKind,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, title: Option<String>, kind: ContentKind) -> Self {
        Self {
            id: id.into(),
            title,
            kind,
        }
    }

    /// Link to the block itself on Are.na.
    pub fn permalink(&self) -> String {
        format!("{}/{}", BLOCK_PERMALINK_BASE, self.id)
    }
}

/// The bounded post handed to the downstream publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedPost {
    pub text: String,
    pub media_url: Option<String>,
}
