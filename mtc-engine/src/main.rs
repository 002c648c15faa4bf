//! Command-line interface for build operations
//!
//! Drives the orchestrator against a live service: check status, start or
//! resume a draft build and watch its progress, cancel, list history, and
//! print engine statistics.

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use mtc_common::config::TomlConfig;
use mtc_common::models::{BuildConfig, BuildJob, TranslationRange};
use mtc_engine::services::{BuildOrchestrator, BuildPoller, InteractiveTranslator};
use mtc_engine::{AlwaysOnline, HttpTransport, LogNotifier, MachineApi};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mtc-engine", about = "Machine-translation build operations")]
struct Cli {
    /// Project identifier on the remote service
    #[arg(long)]
    project: String,

    /// Base URL override (otherwise MTC_BASE_URL or the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Interval between status fetches, in milliseconds
    #[arg(long)]
    poll_rate_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current build status
    Status,
    /// Start a draft build (or resume the active one) and watch progress
    Start {
        /// Ranges to draft, as PROJECT=RANGE (e.g. -t src01=GEN;EXO)
        #[arg(short = 't', long = "translate", value_parser = parse_range)]
        translation_ranges: Vec<TranslationRange>,
        /// Ranges to train on, as PROJECT=RANGE
        #[arg(short = 'r', long = "train", value_parser = parse_range)]
        training_ranges: Vec<TranslationRange>,
    },
    /// Cancel the running build (succeeds when there is none)
    Cancel,
    /// List the project's build history
    History,
    /// Print engine confidence and trained-segment count
    Stats,
}

fn parse_range(value: &str) -> Result<TranslationRange, String> {
    let (project_id, scripture_range) = value
        .split_once('=')
        .ok_or_else(|| format!("expected PROJECT=RANGE, got '{}'", value))?;
    Ok(TranslationRange {
        project_id: project_id.to_string(),
        scripture_range: scripture_range.to_string(),
    })
}

fn print_job(job: &BuildJob) {
    println!(
        "{} {:?} {:.0}% (queue depth {}) {}",
        job.id,
        job.state,
        job.percent_completed * 100.0,
        job.queue_depth,
        job.message
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mtc_engine=info,mtc_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = TomlConfig::resolve().context("configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(poll_rate_ms) = cli.poll_rate_ms {
        config.poll_rate_ms = poll_rate_ms;
    }

    let transport = Arc::new(
        HttpTransport::new(&config.base_url, config.request_timeout_secs)
            .context("HTTP transport")?,
    );
    let api = Arc::new(MachineApi::new(transport));
    let notifier = Arc::new(LogNotifier);
    let connectivity = Arc::new(AlwaysOnline);

    let poller = BuildPoller::new(
        Arc::clone(&api),
        connectivity.clone(),
        Duration::from_millis(config.poll_rate_ms),
        config.event_capacity,
    );
    let orchestrator = BuildOrchestrator::new(
        Arc::clone(&api),
        poller,
        notifier.clone(),
        connectivity,
        &cli.project,
    );

    match cli.command {
        Command::Status => match orchestrator.current_build().await {
            Some(job) => print_job(&job),
            None => println!("no build"),
        },
        Command::Start {
            translation_ranges,
            training_ranges,
        } => {
            let build_config = BuildConfig {
                project_id: cli.project.clone(),
                translation_ranges,
                training_ranges,
                fast_training: false,
            };
            let mut progress = orchestrator
                .start_build_or_get_active_build(&build_config)
                .await
                .context("start build")?;
            while let Some(item) = progress.next().await {
                print_job(&item.context("build progress")?);
            }
        }
        Command::Cancel => {
            orchestrator.cancel_build().await.context("cancel build")?;
            println!("canceled");
        }
        Command::History => {
            for job in orchestrator.build_history().await {
                print_job(&job);
            }
        }
        Command::Stats => {
            let translator = InteractiveTranslator::new(api, notifier, &cli.project);
            let stats = translator.stats().await.context("engine stats")?;
            println!(
                "confidence {:.3}, trained segments {}",
                stats.confidence, stats.trained_segment_count
            );
        }
    }

    Ok(())
}
