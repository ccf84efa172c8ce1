//! Per-class handling of a selected item: which link goes in the post, which
//! media gets attached, and where the description comes from.

use crate::caption::{CaptionGenerator, IMAGE_PROMPT, WEBPAGE_PROMPT};
use crate::composer::{truncate_with_ellipsis, MAX_DESCRIPTION_CHARS};
use crate::models::{ContentItem, ContentKind};
use crate::screenshot::ScreenshotCapture;

pub const SCREENSHOT_FAILED_FALLBACK: &str = "Interesting Link";
pub const NO_SCREENSHOTS_FALLBACK: &str = "Web Link";
pub const EMPTY_TEXT_FALLBACK: &str = "Text content.";
pub const OTHER_FALLBACK: &str = "New content from Are.na.";

/// Everything the composer needs besides the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub description: String,
    pub media_url: Option<String>,
    pub link: String,
}

pub struct Classifier<'a> {
    captions: &'a dyn CaptionGenerator,
    screenshots: &'a dyn ScreenshotCapture,
}

impl<'a> Classifier<'a> {
    pub fn new(captions: &'a dyn CaptionGenerator, screenshots: &'a dyn ScreenshotCapture) -> Self {
        Self {
            captions,
            screenshots,
        }
    }

    pub async fn classify(&self, item: &ContentItem) -> Classified {
        let mut link = item.permalink();
        let mut media_url = None;

        let description = match &item.kind {
            ContentKind::Image { url } => {
                media_url = Some(url.clone());
                self.captions.generate(url, IMAGE_PROMPT).await
            }
            ContentKind::Link {
                url,
                generated_title,
            } => {
                link = url.clone();
                if self.screenshots.is_enabled() {
                    match self.screenshots.capture(url).await {
                        Some(shot) => {
                            let caption = self.captions.generate(&shot, WEBPAGE_PROMPT).await;
                            media_url = Some(shot);
                            caption
                        }
                        None => link_text(item, generated_title, SCREENSHOT_FAILED_FALLBACK),
                    }
                } else {
                    link_text(item, generated_title, NO_SCREENSHOTS_FALLBACK)
                }
            }
            ContentKind::Text { body } if body.is_empty() => EMPTY_TEXT_FALLBACK.to_string(),
            ContentKind::Text { body } => truncate_with_ellipsis(body, MAX_DESCRIPTION_CHARS),
            ContentKind::Other { class } => {
                tracing::debug!(class = %class, "No special handling for block class");
                OTHER_FALLBACK.to_string()
            }
        };

        Classified {
            description,
            media_url,
            link,
        }
    }
}

/// Title, else Are.na's generated page title, else `fallback`.
fn link_text(item: &ContentItem, generated_title: &Option<String>, fallback: &str) -> String {
    item.title
        .as_ref()
        .or(generated_title.as_ref())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}
