use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use logmedic::clock::SystemClock;
use logmedic::commands::ShellCommandRunner;
use logmedic::config::{Config, DEFAULT_SELF_LOG_PATH};
use logmedic::error::ConfigError;
use logmedic::monitor::MonitorLoop;
use logmedic::search::{ElasticsearchBackend, SearchClient};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Command-line arguments for the log remediation monitor
#[derive(Parser)]
#[command(
    name = "logmedic",
    about = "Log remediation monitor - searches recent errors and runs recovery actions",
    long_about = "Periodically searches an Elasticsearch index for recent error messages, \
                  matches them against configured keywords, and runs remediation commands \
                  until a health check confirms recovery."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML, or JSON with a .json extension)"
    )]
    config: Option<PathBuf>,

    /// Write log output to a file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging output (debug level)")]
    verbose: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to defaults in load_config
            if config_path.exists() && !config_path.is_file() {
                return Err(format!(
                    "Configuration path is not a file: {}",
                    config_path.display()
                ));
            }
        }

        if let Some(ref log_path) = self.log_file {
            if log_path.is_dir() {
                return Err(format!("Log file path is a directory: {}", log_path.display()));
            }
        }

        Ok(())
    }
}

/// Initialize env_logger, optionally writing to a file
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }

    if let Some(ref path) = cli.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

/// Load configuration from file or use defaults
///
/// A missing or unreadable file falls back to defaults with a warning; an
/// invalid file is an error so a typo never silently disables remediation.
fn load_config(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(config) => Ok(config),
                Err(ConfigError::ReadError(e)) => {
                    warn!("Configuration file not found or unreadable ({}), using defaults", e);
                    Ok(Config::default())
                }
                Err(e) => Err(e),
            }
        }
        None => {
            info!("Using default configuration");
            Ok(Config::default())
        }
    }
}

/// Point the self-exclusion filter at the file this process logs to
///
/// A `--log-file` replaces the default `self_log_path`; an explicitly
/// configured path that differs is kept, with a warning.
fn align_self_log_path(config: &mut Config, log_file: Option<&Path>) {
    let Some(log_file) = log_file else {
        return;
    };

    let configured = &config.monitor.self_log_path;
    if configured == Path::new(DEFAULT_SELF_LOG_PATH) {
        info!("Excluding own log file {} from searches", log_file.display());
        config.monitor.self_log_path = log_file.to_path_buf();
    } else if configured != log_file {
        warn!(
            "Logging to {} but self_log_path is {}; own log lines may be picked up by searches",
            log_file.display(),
            configured.display()
        );
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let backend = ElasticsearchBackend::new(
        config.search.endpoint.clone(),
        Duration::from_secs(config.search.request_timeout_seconds),
    )
    .context("Failed to create search backend client")?;

    let mut monitor = MonitorLoop::new(
        &config,
        SearchClient::new(Arc::new(backend)),
        Arc::new(ShellCommandRunner::default()),
        Arc::new(SystemClock),
    );

    if cli.once {
        let report = monitor.run_cycle().await;
        info!(
            "Single cycle complete: {} entries, {} remediation(s)",
            report.entries_seen,
            report.remediations.len()
        );
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received interrupt signal (SIGINT), stopping after the current cycle...");
        flag.store(false, Ordering::SeqCst);
    })
    .context("Error setting SIGINT handler for graceful shutdown")?;

    info!("Log remediation monitor is running. Press Ctrl+C to stop.");
    monitor.run(running).await;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {:#}", e);
        std::process::exit(1);
    }

    info!("Starting log remediation monitor");

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    align_self_log_path(&mut config, cli.log_file.as_deref());

    if config.keywords.is_empty() {
        warn!("No keyword rules configured; errors will be reported but never remediated");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli, config)) {
        error!("{:#}", e);
        std::process::exit(1);
    }

    info!("Log remediation monitor stopped");
}
