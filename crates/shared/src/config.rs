use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::arena::DEFAULT_PAGE_SIZE;
use crate::caption::DEFAULT_CAPTION_MODEL;
use crate::store::DEFAULT_MAX_PROCESSED;

const APP_DIR: &str = "arena-syndicate";

#[derive(Debug, Clone)]
pub struct Config {
    pub arena_token: String,
    pub channel_slug: String,
    pub openai_api_key: Option<String>,
    pub screenshot_api_key: Option<String>,
    pub openai_model: String,
    pub page_size: usize,
    pub max_processed: usize,
    pub state_db: Option<PathBuf>,
    pub default_title: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let arena_token = get("ARENA_TOKEN").context(
            "ARENA_TOKEN not found.\n\n\
            To fix this, create ~/.config/arena-syndicate/.env with:\n  \
            ARENA_TOKEN=your_token_here\n  \
            ARENA_CHANNEL_SLUG=your-channel\n\n\
            Get your Are.na personal access token from: https://dev.are.na/oauth/applications",
        )?;

        let channel_slug = get("ARENA_CHANNEL_SLUG").context(
            "ARENA_CHANNEL_SLUG not found. Set it to the slug at the end of the channel URL, \
            e.g. https://www.are.na/someone/my-channel -> my-channel",
        )?;

        let page_size = parse_count(get("ARENA_PAGE_SIZE"), "ARENA_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let max_processed = parse_count(
            get("MAX_PROCESSED_IDS"),
            "MAX_PROCESSED_IDS",
            DEFAULT_MAX_PROCESSED,
        )?;

        Ok(Self {
            arena_token,
            channel_slug,
            openai_api_key: get("OPENAI_API_KEY"),
            screenshot_api_key: get("SCREENSHOT_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_CAPTION_MODEL.to_string()),
            page_size,
            max_processed,
            state_db: get("ARENA_SYNDICATE_DB").map(PathBuf::from),
            default_title: get("DEFAULT_POST_TITLE"),
        })
    }

    /// Configured database path, or the default one under the local data dir.
    pub fn state_db_path(&self) -> Result<PathBuf> {
        match &self.state_db {
            Some(path) => Ok(path.clone()),
            None => get_default_state_db(),
        }
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/arena-syndicate/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join(APP_DIR).join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

fn parse_count(raw: Option<String>, key: &str, default: usize) -> Result<usize> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a positive integer, got {:?}", key, raw))?;
    if value == 0 {
        anyhow::bail!("{} must be at least 1", key);
    }
    Ok(value)
}

/// `<data_local_dir>/arena-syndicate/state.db`, creating the directory.
pub fn get_default_state_db() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join(APP_DIR);

    fs::create_dir_all(&data_dir).context("Failed to create state directory")?;

    Ok(data_dir.join("state.db"))
}
