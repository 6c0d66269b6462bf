use billtracker::config::load_file_config;
use billtracker::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Track legislative activity and post significant updates
#[derive(Parser, Debug)]
#[command(name = "billtracker")]
#[command(about = "Post bill and committee-meeting updates from legislative data")]
#[command(version)]
struct Args {
    /// Print posts instead of publishing them
    #[arg(long)]
    dry_run: bool,

    /// Probe API, publisher, and summary connectivity, then exit
    #[arg(long)]
    check: bool,

    /// Override the bill post cap for this run
    #[arg(long)]
    max_posts: Option<usize>,

    /// Path to a billtracker.yml config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the tracking JSON files (default: .billtracker)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Activity window in days
    #[arg(long)]
    days_back: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("billtracker=info")),
        )
        .init();

    let args = Args::parse();

    let mut builder = ConfigBuilder::new(".billtracker");
    if let Some(path) = &args.config {
        builder = builder.file_config(load_file_config(path)?);
    }
    builder = builder.env_credentials();
    if let Some(dir) = args.state_dir {
        builder = builder.state_dir(dir);
    }
    if let Some(max) = args.max_posts {
        builder = builder.max_bill_posts(max);
    }
    if let Some(days) = args.days_back {
        builder = builder.days_back(days);
    }
    let config = builder.build()?;

    let publisher: Box<dyn Publisher> = if args.dry_run {
        info!("Dry run: posts will be printed, not published");
        Box::new(DryRunPublisher)
    } else {
        Box::new(HttpPublisher::new(&config))
    };
    let tracker = Tracker::new(config, publisher);

    if args.check {
        tracker.check().await?;
        return Ok(());
    }

    let report = tracker.run().await?;
    info!(
        bill_posts = report.bill_posts,
        meeting_posts = report.meeting_posts,
        "Finished"
    );
    Ok(())
}
