//! CLI entry point for the river watch engine.
//!
//! Provides subcommands for running the live engine over a stream of sensor
//! messages, checking a recorded file, and classifying status labels.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use river_watch::advisory::{Advisor, GeminiAdvisor};
use river_watch::config::AdvisoryConfig;
use river_watch::engine::{Engine, Observer};
use river_watch::model::SeverityTier;
use river_watch::source::{LinesSource, ReadingSource};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "river_watch")]
#[command(about = "Live river-level monitoring with alert escalation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine over newline-delimited JSON messages and stream events to stdout
    Monitor {
        /// File to read messages from, or "-" for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        source: String,

        /// Track alert episodes without calling the advisory service
        #[arg(long, default_value_t = false)]
        no_advisory: bool,

        /// Advisory request timeout in seconds (overrides ADVISORY_TIMEOUT_SECS)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Advisory model name (overrides GEMINI_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
    /// Validate a recorded file of messages and report the resulting summary
    Check {
        /// File to read messages from, or "-" for stdin
        #[arg(value_name = "FILE")]
        source: String,
    },
    /// Print the severity tier of a status label
    Classify {
        #[arg(value_name = "LABEL")]
        label: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/river_watch.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("river_watch.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            source,
            no_advisory,
            timeout_secs,
            model,
        } => {
            let advisor = if no_advisory {
                info!("Advisory requests disabled");
                None
            } else {
                Some(build_advisor(timeout_secs, model)?)
            };
            let mut source = open_source(&source).await?;
            monitor(source.as_mut(), advisor).await?;
        }
        Commands::Check { source } => {
            let mut source = open_source(&source).await?;
            let mut engine = Engine::new(None);
            let stats = engine.run(source.as_mut()).await;
            let handle = engine.handle();
            let summary = handle.summary();

            info!(
                accepted = stats.accepted,
                rejected = stats.rejected,
                transport_errors = stats.transport_errors,
                "Check complete"
            );
            info!(
                total_sensors = summary.total_sensors,
                safe = summary.safe,
                watch = summary.watch,
                critical = summary.critical,
                highest = %summary.highest,
                transitions = handle.logs().len(),
                "Final summary"
            );
        }
        Commands::Classify { label } => match SeverityTier::classify(&label) {
            Some(tier) => info!(label = %label, tier = %tier, rank = tier.rank(), "Classified"),
            None => anyhow::bail!("Unrecognized status label: {label:?}"),
        },
    }

    Ok(())
}

fn build_advisor(timeout_secs: Option<u64>, model: Option<String>) -> Result<Arc<dyn Advisor>> {
    let mut config = AdvisoryConfig::from_env()
        .context("Advisory service is not configured (use --no-advisory to run without it)")?;
    if let Some(secs) = timeout_secs {
        config.timeout = Duration::from_secs(secs.max(1));
    }
    if let Some(model) = model {
        config.model = model;
    }
    info!(
        model = %config.model,
        timeout_secs = config.timeout.as_secs(),
        "Advisory service configured"
    );
    let advisor: Arc<dyn Advisor> = Arc::new(GeminiAdvisor::from_config(&config)?);
    Ok(advisor)
}

async fn open_source(source: &str) -> Result<Box<dyn ReadingSource>> {
    if source == "-" {
        info!("Reading messages from stdin");
        Ok(Box::new(LinesSource::stdin()))
    } else {
        info!(path = %source, "Reading messages from file");
        Ok(Box::new(LinesSource::open(source).await?))
    }
}

/// Runs the engine over `source`, printing every observer event as a JSON line.
#[tracing::instrument(skip_all)]
async fn monitor(source: &mut dyn ReadingSource, advisor: Option<Arc<dyn Advisor>>) -> Result<()> {
    let mut engine = Engine::new(advisor);
    let printer = tokio::spawn(print_events(engine.handle().attach()));

    let stats = engine.run(source).await;
    engine.drain().await;
    drop(engine);

    printer.await??;
    info!(
        accepted = stats.accepted,
        rejected = stats.rejected,
        transport_errors = stats.transport_errors,
        "Monitor finished"
    );
    Ok(())
}

async fn print_events(mut observer: Observer) -> Result<()> {
    println!("{}", serde_json::to_string(&observer.replay())?);
    loop {
        match observer.events.recv().await {
            Ok(event) => println!("{}", serde_json::to_string(&event)?),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Observer lagged, events dropped"),
            Err(RecvError::Closed) => return Ok(()),
        }
    }
}
