use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use shelver::db::{self, Database};
use shelver::error::ConfigError;
use shelver::worker::{process_backlog, RunSummary};
use shelver::{load_config, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "shelver",
    version,
    about = "Relocates archived document files into the year/month share layout"
)]
struct Cli {
    /// Path to the configuration file. Defaults to ~/.shelver/config.json.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured worker count.
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();

    info!("Starting shelver v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(summary) => {
            let stopped_early = if summary.cutoff_hit {
                " (stopped by time-box cutoff)"
            } else if summary.interrupted {
                " (stopped by operator interrupt)"
            } else {
                ""
            };
            info!(
                "Run complete{}: {} succeeded, {} failed, {} total",
                stopped_early,
                summary.succeeded,
                summary.failed,
                summary.total()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Run aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // The subscriber's log bridge also routes `log` records from the db
    // layer through tracing.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run(cli: Cli) -> shelver::Result<RunSummary> {
    let config_path = cli
        .config
        .or_else(default_config_path)
        .ok_or_else(|| ConfigError::Validation {
            message: "No config path given and no home directory found".to_string(),
        })?;
    let mut config = load_config(&config_path)?;
    info!("Loaded configuration from {}", config_path.display());

    if let Some(workers) = cli.workers {
        if workers == 0 {
            return Err(ConfigError::Validation {
                message: "worker override must be at least 1".to_string(),
            }
            .into());
        }
        config.worker_count = workers;
    }

    let database_path = config
        .database_path
        .as_ref()
        .map(PathBuf::from)
        .or_else(db::default_database_path)
        .ok_or_else(|| ConfigError::Validation {
            message: "No database_path configured and no home directory found".to_string(),
        })?;
    let database = Database::open(&database_path)?;

    let pipeline_config = Arc::new(PipelineConfig::from_config(&config)?);

    // Operator interrupt stops the run at the next batch boundary, same
    // cooperative granularity as the time-box guard.
    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    }) {
        warn!("Could not install interrupt handler: {}", e);
    }

    process_backlog(&database, pipeline_config, shutdown)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".shelver").join("config.json"))
}
