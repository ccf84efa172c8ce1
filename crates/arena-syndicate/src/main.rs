use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    ArenaClient, Config, KeyValueStore, OpenAiCaptioner, PersistentProcessedSet,
    Pipeline, PipelineOptions, ProcessedSetStore, ScreenshotApiClient, SqliteStore,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "arena-syndicate")]
#[command(about = "Turn the oldest unposted Are.na block into a bounded social post")]
struct Args {
    /// Are.na channel slug (overrides ARENA_CHANNEL_SLUG)
    #[arg(short, long, global = true)]
    channel: Option<String>,

    /// State database path (overrides ARENA_SYNDICATE_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// How many processed ids to remember (overrides MAX_PROCESSED_IDS)
    #[arg(long, global = true)]
    max_processed: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Process at most one new block and print the post as JSON
    Run {
        /// Number of recent blocks to fetch (overrides ARENA_PAGE_SIZE)
        #[arg(short, long)]
        per: Option<usize>,

        /// Compose the post without marking the block as processed
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect or edit the processed-id record
    Processed {
        #[command(subcommand)]
        action: ProcessedAction,
    },
}

#[derive(Subcommand)]
enum ProcessedAction {
    /// Print stored ids, oldest first
    List,
    /// Record ids as processed without posting them
    Mark {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Forget every stored id for the channel
    Clear,
}

fn open_processed_set<S: KeyValueStore>(
    backend: S,
    channel: &str,
    capacity: usize,
) -> Result<PersistentProcessedSet<S>> {
    PersistentProcessedSet::load(backend, channel, capacity)
        .with_context(|| format!("Failed to load processed ids for channel {}", channel))
}

async fn run(config: &Config, per: Option<usize>, dry_run: bool) -> Result<()> {
    let feed = ArenaClient::new(config.arena_token.clone())?;
    let captions = OpenAiCaptioner::new(config.openai_api_key.clone(), &config.openai_model)?;
    let screenshots = ScreenshotApiClient::new(config.screenshot_api_key.clone())?;

    if !captions.is_enabled() {
        tracing::warn!("OPENAI_API_KEY not set, captions will use fallback text");
    }

    let options = PipelineOptions {
        channel: config.channel_slug.clone(),
        page_size: per.unwrap_or(config.page_size).max(1),
        dry_run,
        default_title: config.default_title.clone(),
    };
    let pipeline = Pipeline::new(
        Arc::new(feed),
        Arc::new(captions),
        Arc::new(screenshots),
        options,
    );

    let db_path = config.state_db_path()?;
    let backend = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open state database {}", db_path.display()))?;
    let mut processed =
        open_processed_set(backend, &config.channel_slug, config.max_processed)?;
    tracing::info!(
        channel = %config.channel_slug,
        already_processed = processed.ids().len(),
        "Checking Are.na channel for new blocks"
    );

    let output = pipeline.run(&mut processed).await;
    let records: Vec<_> = output.into_iter().collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&records).context("Failed to serialize post")?
    );

    Ok(())
}

fn processed(config: &Config, action: ProcessedAction) -> Result<()> {
    let db_path = config.state_db_path()?;
    let backend = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open state database {}", db_path.display()))?;
    let mut set = open_processed_set(backend, &config.channel_slug, config.max_processed)?;

    match action {
        ProcessedAction::List => {
            let ids = set.ids();
            for id in ids.iter() {
                println!("{}", id);
            }
            eprintln!("{} of {} remembered block(s)", ids.len(), ids.capacity());
        }
        ProcessedAction::Mark { ids } => {
            for id in &ids {
                set.add(id)
                    .with_context(|| format!("Failed to record block {}", id))?;
            }
            eprintln!("✓ Marked {} block(s) as processed", ids.len());
        }
        ProcessedAction::Clear => {
            let count = set.ids().len();
            set.clear().context("Failed to clear processed ids")?;
            eprintln!("✓ Forgot {} processed block(s)", count);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;

    if let Some(channel) = args.channel {
        config.channel_slug = channel;
    }
    if let Some(db) = args.db {
        config.state_db = Some(db);
    }
    if let Some(max) = args.max_processed {
        config.max_processed = max.max(1);
    }

    match args.command.unwrap_or(Command::Run {
        per: None,
        dry_run: false,
    }) {
        Command::Run { per, dry_run } => run(&config, per, dry_run).await,
        Command::Processed { action } => processed(&config, action),
    }
}
