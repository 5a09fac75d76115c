use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use kirikou::config::Config;
use kirikou::feed::{known_sources, FeedFetcher};
use kirikou::ingest::Orchestrator;
use kirikou::jobs::{spawn_scheduler, DispatchError, JobDispatcher, LocalQueue};
use kirikou::storage::{Database, DatabaseError, NewSource, PoliticalLeaning};

#[derive(Parser, Debug)]
#[command(
    name = "kirikou",
    about = "News feed ingestion: fetch, normalize, and store RSS/Atom articles"
)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, value_name = "FILE", default_value = "kirikou.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape all sources (or one) and wait for the job to finish
    Scrape {
        /// Only scrape the source with this id
        #[arg(long, value_name = "ID")]
        source: Option<i64>,
    },
    /// Dispatch a scrape of all sources every `fetch_interval_secs` until Ctrl-C
    Serve,
    /// Manage configured sources
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
    /// Per-source article counts
    Stats(StatsArgs),
}

#[derive(clap::Args, Debug)]
struct StatsArgs {
    /// Also list the N most recently published articles
    #[arg(long, value_name = "N")]
    recent: Option<i64>,

    /// Also list articles of the source with this name
    #[arg(long, value_name = "NAME")]
    source: Option<String>,

    /// Window for --source, in days
    #[arg(long, value_name = "DAYS", default_value_t = 7)]
    days: u32,

    /// Also list sources with no article in the last HOURS hours
    #[arg(long, value_name = "HOURS")]
    inactive: Option<u32>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum SourcesAction {
    /// Register a new source
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        country: Option<String>,
        /// One of: left, center-left, center, center-right, right, tech-focus
        #[arg(long)]
        leaning: Option<PoliticalLeaning>,
    },
    /// List configured sources
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Insert the built-in catalog of known feeds (existing names are kept)
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load_with_env(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log_level in config")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = match Database::open(&config.database_path).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: database {} is locked by another process. Try again shortly.",
                config.database_path
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    match args.command {
        Command::Scrape { source } => scrape(&config, db, source).await,
        Command::Serve => serve(&config, db).await,
        Command::Sources { action } => sources(&db, action).await,
        Command::Stats(args) => stats(&db, args).await,
    }
}

fn build_dispatcher(
    config: &Config,
    db: Database,
) -> Result<JobDispatcher<Arc<LocalQueue>>> {
    let fetcher = FeedFetcher::new(config.request_timeout(), &config.user_agent)
        .context("Failed to build HTTP client")?;
    let orchestrator =
        Orchestrator::new(db.clone(), fetcher).with_concurrency(config.scrape_concurrency);
    let queue = Arc::new(LocalQueue::new(Arc::new(orchestrator), config.worker_count));
    Ok(JobDispatcher::new(db, queue))
}

async fn scrape(config: &Config, db: Database, source: Option<i64>) -> Result<()> {
    let before = db
        .count_articles()
        .await
        .context("Failed to count articles")?;
    let dispatcher = build_dispatcher(config, db.clone())?;

    let job_id = match source {
        None => dispatcher.submit_scrape_all(),
        Some(id) => match dispatcher.submit_scrape_source(id).await {
            Ok(job_id) => job_id,
            Err(DispatchError::NotFound(id)) => {
                eprintln!("Error: no source with id {}", id);
                std::process::exit(1);
            }
            Err(e) => return Err(e).context("Failed to dispatch scrape"),
        },
    };
    println!("Dispatched job {}", job_id);

    dispatcher.queue().drain().await;

    // The total also moves with writers from other processes; the job's own
    // counts are in its "Job finished" log line
    let after = db
        .count_articles()
        .await
        .context("Failed to count articles")?;
    println!(
        "Job {} finished: stored articles {} -> {}",
        job_id, before, after
    );
    Ok(())
}

async fn serve(config: &Config, db: Database) -> Result<()> {
    let dispatcher = Arc::new(build_dispatcher(config, db)?);
    let interval = config.fetch_interval();

    tracing::info!(interval_secs = interval.as_secs(), "Scheduler started");
    let scheduler = spawn_scheduler(Arc::clone(&dispatcher), interval);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::info!("Shutdown requested, waiting for running jobs");
    scheduler.abort();
    dispatcher.queue().drain().await;
    Ok(())
}

async fn sources(db: &Database, action: SourcesAction) -> Result<()> {
    match action {
        SourcesAction::Add {
            name,
            url,
            country,
            leaning,
        } => {
            let id = db
                .create_source(&NewSource {
                    name,
                    url,
                    country,
                    political_leaning: leaning,
                })
                .await
                .context("Failed to add source")?;
            println!("Added source {}", id);
        }
        SourcesAction::List { json } => {
            let sources = db
                .get_sources()
                .await
                .context("Failed to list sources")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sources)?);
                return Ok(());
            }
            if sources.is_empty() {
                println!(
                    "No sources configured. Run `kirikou sources seed` or `kirikou sources add`."
                );
            }
            for source in sources {
                println!(
                    "{:>4}  {:<28} {:<14} {:<13} {}",
                    source.id,
                    source.name,
                    source.country.as_deref().unwrap_or("-"),
                    source.political_leaning.map(|l| l.as_str()).unwrap_or("-"),
                    source.url
                );
            }
        }
        SourcesAction::Seed => {
            let added = db
                .seed_sources(&known_sources())
                .await
                .context("Failed to seed sources")?;
            println!("Seeded {} new sources", added);
        }
    }
    Ok(())
}

async fn stats(db: &Database, args: StatsArgs) -> Result<()> {
    let stats = db
        .get_source_stats()
        .await
        .context("Failed to load source statistics")?;
    let recent = match args.recent {
        Some(limit) => db
            .get_recent_articles(limit)
            .await
            .context("Failed to load recent articles")?,
        None => Vec::new(),
    };
    let by_source = match &args.source {
        Some(name) => db
            .get_articles_by_source(name, args.days)
            .await
            .context("Failed to load articles for source")?,
        None => Vec::new(),
    };
    let inactive = match args.inactive {
        Some(hours) => db
            .get_inactive_sources(hours)
            .await
            .context("Failed to load inactive sources")?,
        None => Vec::new(),
    };

    if args.json {
        let report = serde_json::json!({
            "sources": stats,
            "recent": recent,
            "source_articles": by_source,
            "inactive": inactive,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:<28} {:>8} {:>8}", "source", "total", "7 days");
    for row in &stats {
        println!(
            "{:<28} {:>8} {:>8}",
            row.source_name, row.total_articles, row.articles_last_7d
        );
    }

    if !recent.is_empty() || !by_source.is_empty() {
        println!();
    }
    for article in recent.iter().chain(&by_source) {
        println!(
            "{}  [{}] {}\n    {}",
            article.published_at.format("%Y-%m-%d %H:%M"),
            article.source_name,
            article.title,
            article.url
        );
    }

    if let Some(hours) = args.inactive {
        println!();
        println!("No articles in the last {} hours:", hours);
        for source in &inactive {
            let last = source
                .last_article_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string());
            println!("  {:<28} {:<17} {}", source.source_name, last, source.url);
        }
    }
    Ok(())
}
