use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Result, SyndicationError};
use crate::models::{ContentItem, ContentKind};

pub const ARENA_API_BASE: &str = "https://api.are.na";
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Source of recent items, newest first.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch up to `per` items. Failures yield an empty list.
    async fn fetch(&self, channel: &str, per: usize) -> Vec<ContentItem>;
}

#[derive(Debug, Deserialize)]
struct ChannelContents {
    #[serde(default)]
    contents: Vec<Block>,
}

#[derive(Debug, Deserialize)]
struct Block {
    id: u64,
    #[serde(default)]
    class: String,
    title: Option<String>,
    generated_title: Option<String>,
    content: Option<String>,
    content_html: Option<String>,
    image: Option<BlockImage>,
    source: Option<BlockSource>,
}

#[derive(Debug, Deserialize)]
struct BlockImage {
    original: Option<ImageVersion>,
}

#[derive(Debug, Deserialize)]
struct ImageVersion {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlockSource {
    url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

const HTML_RENDER_WIDTH: usize = 10_000;

/// Plain text of `content_html` on one line; block and wrap breaks become spaces.
fn html_to_text(html: &str) -> Option<String> {
    html2text::config::plain()
        .string_from_read(html.as_bytes(), HTML_RENDER_WIDTH)
        .ok()
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

impl From<Block> for ContentItem {
    fn from(block: Block) -> Self {
        let title = non_blank(block.title);

        let image_url = block
            .image
            .and_then(|image| image.original)
            .and_then(|original| non_blank(original.url));
        let source_url = block.source.and_then(|source| non_blank(source.url));

        let kind = match (block.class.as_str(), image_url, source_url) {
            ("Image", Some(url), _) => ContentKind::Image { url },
            ("Link", _, Some(url)) => ContentKind::Link {
                url,
                generated_title: non_blank(block.generated_title),
            },
            ("Text", _, _) => {
                let body = non_blank(block.content)
                    .or_else(|| block.content_html.as_deref().and_then(html_to_text))
                    .unwrap_or_default();
                ContentKind::Text { body }
            }
            (class, _, _) => ContentKind::Other {
                class: class.to_string(),
            },
        };

        ContentItem::new(block.id.to_string(), title, kind)
    }
}

pub struct ArenaClient {
    client: Client,
    api_token: String,
    base_url: String,
}

impl ArenaClient {
    pub fn new(api_token: String) -> anyhow::Result<Self> {
        Self::with_base_url(api_token, ARENA_API_BASE)
    }

    pub fn with_base_url(api_token: String, base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn try_fetch(&self, channel: &str, per: usize) -> Result<Vec<ContentItem>> {
        let url = format!(
            "{}/v2/channels/{}/contents?per={}&sort=position&direction=desc",
            self.base_url,
            urlencoding::encode(channel),
            per
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .send()
            .await
            .map_err(|e| SyndicationError::FeedUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(SyndicationError::FeedUnavailable(format!(
                "Are.na API returned error: {} - {}",
                status, error_text
            )));
        }

        let contents = response
            .json::<ChannelContents>()
            .await
            .map_err(|e| {
                SyndicationError::FeedUnavailable(format!("Failed to parse Are.na response: {}", e))
            })?;

        Ok(contents.contents.into_iter().map(ContentItem::from).collect())
    }
}

#[async_trait]
impl FeedClient for ArenaClient {
    async fn fetch(&self, channel: &str, per: usize) -> Vec<ContentItem> {
        match self.try_fetch(channel, per).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(channel, error = %e, "Error fetching Are.na blocks");
                Vec::new()
            }
        }
    }
}
