use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use streamdrop::{logging, JobManager, JobState, LocalFileFetcher, ManagerConfig, OutboxNotifier};

/// Fetch one source and deliver it to an outbox directory, splitting it
/// into parts when it is larger than the part limit.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Local path or file:// URL to fetch
    #[arg(short, long)]
    source: String,

    /// Requester the job runs for
    #[arg(short, long, default_value = "cli")]
    requester: String,

    /// Directory that receives delivered documents
    #[arg(short, long)]
    outbox: PathBuf,

    /// TOML config file (missing file means defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the maximum part size in bytes
    #[arg(long)]
    max_part_bytes: Option<u64>,

    /// Override the scratch directory
    #[arg(long)]
    temp_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = logging::init_logging() {
        eprintln!("streamdrop: {err:#}");
    }

    match run(Args::parse()).await {
        Ok(state) if state == JobState::Completed => {}
        Ok(_) => std::process::exit(2),
        Err(err) => {
            eprintln!("streamdrop error: {err:#}");
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<JobState> {
    let mut config = match &args.config {
        Some(path) => ManagerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ManagerConfig::default(),
    };
    if let Some(dir) = args.temp_dir {
        config.temp_dir = dir;
    }

    let mut options = config.defaults.clone();
    if let Some(max) = args.max_part_bytes {
        options.max_part_bytes = max;
    }

    let manager = JobManager::new(
        Arc::new(LocalFileFetcher::new()),
        Arc::new(OutboxNotifier::new(&args.outbox)),
        config,
    );

    let handle = manager
        .submit(args.requester.as_str(), args.source, options)
        .context("submitting job")?;

    let state = tokio::select! {
        state = handle.wait() => state,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, cancelling");
            manager.request_cancel(args.requester.as_str());
            handle.wait().await
        }
    };

    let report = manager
        .last_report(args.requester.as_str())
        .context("job finished without a report")?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(state)
}
