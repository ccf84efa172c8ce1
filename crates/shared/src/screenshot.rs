use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{Result, SyndicationError};

pub const SCREENSHOT_API_BASE: &str = "https://api.screenshotapi.net";

/// Renders a web page to an image URL.
#[async_trait]
pub trait ScreenshotCapture: Send + Sync {
    /// Whether captures can be attempted at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Capture `page_url`. `None` when disabled or on any failure.
    async fn capture(&self, page_url: &str) -> Option<String>;
}

#[derive(Deserialize)]
struct CaptureResponse {
    screenshot: Option<String>,
}

pub struct ScreenshotApiClient {
    client: Client,
    token: Option<String>,
    base_url: String,
}

impl ScreenshotApiClient {
    pub fn new(token: Option<String>) -> anyhow::Result<Self> {
        Self::with_base_url(token, SCREENSHOT_API_BASE)
    }

    pub fn with_base_url(token: Option<String>, base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn capture_url(&self, token: &str, page_url: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/capture", self.base_url),
            &[
                ("token", token),
                ("url", page_url),
                ("width", "1200"),
                ("height", "800"),
                ("output", "json"),
                ("file_type", "png"),
                ("ttl", "86400"),
            ],
        )
        .map_err(|e| SyndicationError::ScreenshotUnavailable(format!("bad capture URL: {}", e)))
    }

    async fn try_capture(&self, page_url: &str) -> Result<Option<String>> {
        let token = self
            .token
            .as_deref()
            .ok_or(SyndicationError::ConfigurationGap {
                capability: "screenshot capture",
                credential: "SCREENSHOT_API_KEY",
            })?;

        let response = self
            .client
            .get(self.capture_url(token, page_url)?)
            .send()
            .await
            .map_err(|e| SyndicationError::ScreenshotUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyndicationError::ScreenshotUnavailable(format!(
                "screenshot API returned {}",
                status
            )));
        }

        let body = response
            .json::<CaptureResponse>()
            .await
            .map_err(|e| SyndicationError::ScreenshotUnavailable(e.to_string()))?;

        Ok(body.screenshot.filter(|url| !url.trim().is_empty()))
    }
}

#[async_trait]
impl ScreenshotCapture for ScreenshotApiClient {
    fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    async fn capture(&self, page_url: &str) -> Option<String> {
        match self.try_capture(page_url).await {
            Ok(shot) => shot,
            Err(e @ SyndicationError::ConfigurationGap { .. }) => {
                tracing::info!(error = %e, "Skipping screenshot");
                None
            }
            Err(e) => {
                tracing::warn!(page_url, error = %e, "Screenshot failed");
                None
            }
        }
    }
}
