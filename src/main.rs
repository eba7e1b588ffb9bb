//! `pkgsync` command-line entry point.

mod config;
mod error;

use crate::config::Config;
use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use pkgsync_engine::{RunOutcome, Syncer};
use pkgsync_feed::HttpFeed;
use pkgsync_graph::GraphBuilder;
use pkgsync_store::{Database, RetryPolicy, RunLedger, RunRecord};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pkgsync", about = "Synchronize package metadata from a remote feed", version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, env = "PKGSYNC_CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one synchronization pass against the feed
    Run,
    /// Print the dependency graph around a package as JSON
    Graph {
        /// Package identifier at the centre of the graph
        id: String,
        /// Also compute force-directed node positions
        #[arg(long)]
        layout: bool,
    },
    /// List recent synchronization runs
    History {
        /// Maximum number of runs to show, newest first
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();
    let args = Args::parse();
    match execute(args).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn execute(args: Args) -> Result<ExitCode> {
    let config = Config::load(args.config.as_deref())?;
    if let Some(parent) = config.database.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
    }
    let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Database)?;
    let result = match args.command {
        Command::Run => run(&db, &config).await,
        Command::Graph { id, layout } => graph(&db, &config, &id, layout).await,
        Command::History { limit } => history(&db, limit).await,
    };
    db.close().await;
    result
}

async fn run(db: &Database, config: &Config) -> Result<ExitCode> {
    let syncer = Syncer::new(db, HttpFeed::new(&config.feed_url))
        .with_batch_size(config.batch_size)
        .with_retry(RetryPolicy::from(&config.retry));
    match syncer.run().await.or_raise(|| ErrorKind::Sync)? {
        RunOutcome::Completed(summary) => {
            info!(
                total = summary.total,
                processed = summary.processed,
                cursor = %summary.cursor,
                "synchronization complete"
            );
            Ok(ExitCode::SUCCESS)
        },
        // Not this invocation's failure: the earlier run either still
        // holds the window or crashed and needs an operator. Scheduled
        // invocations should not page on it.
        RunOutcome::AlreadyRunning => {
            warn!("previous run is still open; nothing synchronized");
            Ok(ExitCode::SUCCESS)
        },
    }
}

async fn graph(db: &Database, config: &Config, id: &str, with_layout: bool) -> Result<ExitCode> {
    let builder = GraphBuilder::new(db.clone()).with_chunk_size(config.chunk_size);
    let graph = builder.build(id).await.or_raise(|| ErrorKind::Graph)?;
    let document = if with_layout {
        let positions = pkgsync_graph::layout(&graph);
        serde_json::json!({ "graph": graph, "layout": positions })
    } else {
        serde_json::json!({ "graph": graph })
    };
    let rendered = serde_json::to_string_pretty(&document).or_raise(|| ErrorKind::Graph)?;
    println!("{rendered}");
    Ok(ExitCode::SUCCESS)
}

async fn history(db: &Database, limit: u32) -> Result<ExitCode> {
    let runs = RunLedger::from(db).recent(limit).await.or_raise(|| ErrorKind::Database)?;
    if runs.is_empty() {
        println!("no synchronization runs recorded");
        return Ok(ExitCode::SUCCESS);
    }
    for run in &runs {
        println!("{}", describe(run));
    }
    Ok(ExitCode::SUCCESS)
}

fn describe(run: &RunRecord) -> String {
    let status = match (&run.finished_at, &run.error) {
        (_, Some(error)) => format!("failed: {error}"),
        (Some(finished_at), None) => format!("completed {finished_at}"),
        (None, None) => "open".to_string(),
    };
    format!(
        "run {:>5}  started {}  {:>7}/{:<7}  {}",
        run.id, run.started_at, run.processed_count, run.total_count, status
    )
}
