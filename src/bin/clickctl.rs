//! Command-line front end for the click tracker.
//!
//! Runs lookups and click recording against the configured PostgreSQL
//! database through the same cache and aggregator a service would embed.
//!
//! # Usage
//!
//! ```bash
//! # Show a record
//! cargo run --bin clickctl -- lookup abc123
//! cargo run --bin clickctl -- lookup abc123 --json
//!
//! # Record 5 clicks, 2 of them unique, then drain and print the counters
//! cargo run --bin clickctl -- record abc123 --count 5 --unique 2
//!
//! # Check database connection
//! cargo run --bin clickctl -- db check
//! ```
//!
//! # Environment Variables
//!
//! See [`click_cache::config`]. `DATABASE_URL` (or the `DB_*` components) is
//! required.

use click_cache::config::{self, Config};
use click_cache::domain::entities::UrlRecord;
use click_cache::domain::repositories::ClickStore;
use click_cache::infrastructure::cache::LruTtlCache;
use click_cache::infrastructure::persistence::PgClickStore;
use click_cache::telemetry;
use click_cache::ClickTracker;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for the click tracker.
#[derive(Parser)]
#[command(name = "clickctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Show a URL record and its counters
    Lookup {
        /// Short id of the record
        short_id: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record clicks for a short id and flush them
    Record {
        /// Short id of the record
        short_id: String,

        /// Number of clicks to record
        #[arg(short, long, default_value_t = 1)]
        count: u32,

        /// How many of the recorded clicks are unique visitors
        #[arg(short, long, default_value_t = 0)]
        unique: u32,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;
    telemetry::init_tracing(&config.log_level, &config.log_format)?;
    config.print_summary();

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Lookup { short_id, json } => {
            handle_lookup(&config, &pool, &short_id, json).await?
        }
        Commands::Record {
            short_id,
            count,
            unique,
        } => handle_record(&config, &pool, &short_id, count, unique).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn build_tracker(config: &Config, pool: &PgPool) -> ClickTracker<PgClickStore> {
    let store = Arc::new(PgClickStore::new(Arc::new(pool.clone())));
    let cache = Arc::new(LruTtlCache::<UrlRecord>::new(
        config.tracker.cache_capacity,
        config.tracker.cache_ttl,
    ));

    ClickTracker::new(store, cache, config.tracker.flush_settings())
}

async fn handle_lookup(config: &Config, pool: &PgPool, short_id: &str, json: bool) -> Result<()> {
    let tracker = build_tracker(config, pool);

    let Some(record) = tracker.lookup(short_id).await? else {
        anyhow::bail!("No record for short id '{}'", short_id);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }

    Ok(())
}

async fn handle_record(
    config: &Config,
    pool: &PgPool,
    short_id: &str,
    count: u32,
    unique: u32,
) -> Result<()> {
    if unique > count {
        anyhow::bail!("--unique ({}) cannot exceed --count ({})", unique, count);
    }

    let tracker = build_tracker(config, pool);

    if tracker.lookup(short_id).await?.is_none() {
        anyhow::bail!("No record for short id '{}'", short_id);
    }

    let mut rejected = 0;
    let mut accepted_unique = 0;
    for i in 0..count {
        let is_unique = i < unique;
        if !tracker.record_click(short_id, is_unique) {
            rejected += 1;
        } else if is_unique {
            accepted_unique += 1;
        }
    }

    tracker
        .shutdown()
        .await
        .context("Failed to flush recorded clicks")?;

    println!(
        "{} {} click(s), {} unique",
        "Recorded".green().bold(),
        count - rejected,
        accepted_unique
    );
    if rejected > 0 {
        println!(
            "{}",
            format!("{} click(s) rejected by buffer limit", rejected).yellow()
        );
    }

    let record = tracker
        .lookup(short_id)
        .await?
        .context("Record disappeared after flush")?;
    print_record(&record);

    Ok(())
}

/// Dispatches database commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            let store = PgClickStore::new(Arc::new(pool.clone()));
            store.ping().await?;

            println!("{}", "Database connection OK".green().bold());
        }
    }

    Ok(())
}

fn print_record(record: &UrlRecord) {
    println!();
    println!("  Short id:      {}", record.short_id.bright_white().bold());
    println!("  URL:           {}", record.original_url);
    println!(
        "  Total clicks:  {}",
        record.total_clicks.to_string().bright_green().bold()
    );
    println!(
        "  Unique clicks: {}",
        record.unique_clicks.to_string().bright_green().bold()
    );
    println!("  Unique ratio:  {:.2}", record.unique_ratio());
    println!("  Updated:       {}", record.updated_at);
    println!();
}
