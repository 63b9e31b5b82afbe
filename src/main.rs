use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use habomai_scraper::config::Config;
use habomai_scraper::pipeline;

#[derive(Parser)]
#[command(
    name = "habomai-scraper",
    about = "Collect shop posts from a timeline snapshot and the timeline API into JSON"
)]
struct Cli {
    /// Look up address and coordinates for each post's shop
    #[arg(short = 'p', long = "place")]
    place: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate(cli.place)
        .context("Invalid configuration")?;

    info!(
        snapshot = %config.snapshot_path.display(),
        screen_name = %config.screen_name,
        places = cli.place,
        "Configuration loaded"
    );

    let summary = pipeline::run(&config, cli.place).await?;

    info!(
        snapshot_posts = summary.snapshot_posts,
        timeline_posts = summary.timeline_posts,
        total = summary.total_posts(),
        output = %summary.output_path.display(),
        "Done"
    );

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,habomai_scraper=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
