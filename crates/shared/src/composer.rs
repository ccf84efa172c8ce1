use crate::models::ComposedPost;

pub const MAX_POST_CHARS: usize = 280;
pub const MAX_DESCRIPTION_CHARS: usize = 150;
pub const ELLIPSIS: &str = "...";

/// Cut `text` to `max` characters, the last three being `...`, when it is
/// longer than `max`. Counts chars, not bytes or graphemes, and ignores word
/// boundaries.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Assembles the final bounded post text.
#[derive(Debug, Clone, Default)]
pub struct PostComposer {
    default_title: Option<String>,
}

impl PostComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `title` as the prefix for items that have none.
    pub fn with_default_title(title: Option<String>) -> Self {
        Self {
            default_title: title.filter(|t| !t.is_empty()),
        }
    }

    pub fn compose_text(&self, title: Option<&str>, description: &str, link: &str) -> String {
        let title = title
            .filter(|t| !t.is_empty())
            .or(self.default_title.as_deref());
        let text = match title {
            Some(title) => format!("{}: {} {}", title, description, link),
            None => format!("{} {}", description, link),
        };
        truncate_with_ellipsis(&text, MAX_POST_CHARS)
    }

    pub fn compose(
        &self,
        title: Option<&str>,
        description: &str,
        link: &str,
        media_url: Option<String>,
    ) -> ComposedPost {
        ComposedPost {
            text: self.compose_text(title, description, link),
            media_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_prefix_and_link() {
        let composer = PostComposer::new();
        assert_eq!(
            composer.compose_text(Some("Cars"), "A red one", "https://x"),
            "Cars: A red one https://x"
        );
        assert_eq!(
            composer.compose_text(None, "A red one", "https://x"),
            "A red one https://x"
        );
    }

    #[test]
    fn test_empty_title_has_no_prefix() {
        let composer = PostComposer::new();
        assert_eq!(composer.compose_text(Some(""), "d", "l"), "d l");
    }

    #[test]
    fn test_default_title_fills_missing_title() {
        let composer = PostComposer::with_default_title(Some("Are.na Discovery".into()));
        assert_eq!(
            composer.compose_text(None, "d", "l"),
            "Are.na Discovery: d l"
        );
        assert_eq!(composer.compose_text(Some("Own"), "d", "l"), "Own: d l");
    }

    #[test]
    fn test_long_post_is_cut_to_limit() {
        let composer = PostComposer::new();
        let description = "x".repeat(400);
        let text = composer.compose_text(Some("T"), &description, "https://x");
        assert_eq!(text.chars().count(), MAX_POST_CHARS);
        assert!(text.ends_with("..."));
        assert!(text.starts_with("T: xxx"));
    }

    #[test]
    fn test_post_at_limit_is_untouched() {
        let composer = PostComposer::new();
        // "d" * 278 + " " + "l" == 280 chars
        let description = "d".repeat(278);
        let text = composer.compose_text(None, &description, "l");
        assert_eq!(text.chars().count(), 280);
        assert!(text.ends_with(" l"));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let text = "é".repeat(200);
        let cut = truncate_with_ellipsis(&text, MAX_DESCRIPTION_CHARS);
        assert_eq!(cut.chars().count(), 150);
        assert!(cut.starts_with("ééé"));
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_compose_bundles_media() {
        let post = PostComposer::new().compose(None, "d", "l", Some("https://img".into()));
        assert_eq!(post.media_url.as_deref(), Some("https://img"));
        assert_eq!(post.text, "d l");
    }
}
