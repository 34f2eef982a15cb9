// src/main.rs
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod browser;
mod config;
mod database;
mod dedup;
mod extract;
mod gis;
mod models;
mod navigator;
mod phones;

use browser::HttpDocumentProvider;
use config::Config;
use database::{create_db_pool, PersistenceSink, SqliteSink};
use dedup::DuplicateGate;
use dialoguer::{theme::ColorfulTheme, Input};
use models::{CrawlCheckpoint, Result};
use navigator::Navigator;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let default_level = if config.debug {
        "directory_scraper=debug"
    } else {
        "directory_scraper=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.parse()?))
        .init();

    // Resume prompts: a previous run reports how far it got; feeding those
    // numbers back skips the already-completed prefix.
    let theme = ColorfulTheme::default();
    let start_url: String = Input::with_theme(&theme)
        .with_prompt("Start URL")
        .default(config.start_url.clone())
        .interact_text()?;
    let category_skip: usize = Input::with_theme(&theme)
        .with_prompt("How many categories skipped?")
        .default(0)
        .interact_text()?;
    let subsidiary_skip: usize = Input::with_theme(&theme)
        .with_prompt("How many subsidiary links skipped?")
        .default(0)
        .interact_text()?;

    info!("Initializing database...");
    let db_pool = create_db_pool(&config.db_path).await?;
    let sink = SqliteSink::new(db_pool);

    let seen = sink.load_existing_phones().await?;
    let gate = DuplicateGate::new(seen, config.duplicate_threshold);

    let provider = HttpDocumentProvider::new(&config.browser)?;
    let checkpoint = CrawlCheckpoint {
        category_floor: category_skip,
        subsidiary_floor: subsidiary_skip,
    };

    let mut nav = Navigator::new(
        provider,
        sink,
        gate,
        start_url,
        checkpoint,
        Duration::from_secs(config.wait_timeout_secs),
    );

    // Teardown is scoped here, at true process exit: inner failures only
    // affect control flow, never the session or the pool.
    tokio::select! {
        result = nav.run() => {
            if let Err(e) = result {
                error!("❌ Crawl failed: {}", e);
                return Err(e);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
