//! Cadence CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use cadence::config::RunnerConfig;
use cadence::context::ALL_CLUSTERS;
use cadence::plan::{Registry, RunOutcome, CANCEL_EXIT_CODE};
use cadence::plugins::PluginLoader;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Weighted task orchestration.
#[derive(Debug, Parser)]
#[command(name = "cadence", version, about)]
struct Cli {
    /// Path to the runner configuration file.
    #[arg(long, default_value = "cadence.yml")]
    config: PathBuf,

    /// Database alias, overriding the configuration file.
    #[arg(long, env = "CADENCE_DATABASE")]
    database: Option<String>,

    /// Cluster to restrict the run to (-1 runs everything).
    #[arg(long, default_value_t = ALL_CLUSTERS)]
    cluster: i64,

    /// Log the resolved plan instead of running it.
    #[arg(long)]
    plan: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("cadence=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cadence=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = match RunnerConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(database) = cli.database {
        config.database = database;
    }

    tracing::info!("Cadence using database '{}'", config.database);

    // Registration hooks are contributed by plugin crates at link time;
    // the stock binary ships an empty catalog.
    let loader = PluginLoader::new();
    let mut registry = Registry::new();
    if let Err(e) = registry.populate(&loader, &config.modules) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let ctx = config.context(cli.cluster);
    if cli.plan {
        registry.display(&ctx);
        return ExitCode::SUCCESS;
    }

    // Status persistence is deployment-specific; the stock binary runs
    // without a sink attached.
    match registry.run(&ctx, None) {
        Ok(RunOutcome::Completed) => ExitCode::SUCCESS,
        Ok(RunOutcome::Cancelled) => ExitCode::from(CANCEL_EXIT_CODE),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
