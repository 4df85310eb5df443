use std::path::PathBuf;

use clap::Parser;
use commands::{Command, Commands, Context};
use config::{Config, OutputFormat};

mod commands;
mod config;

/// Command-line interface for vidrank.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file.
    #[arg(long, short, env = "VIDRANK_CONFIG", global = true)]
    config: Option<String>,
    /// Output format, overrides the config.
    #[arg(long, global = true)]
    output: Option<OutputFormat>,
    /// Enable debug logs.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config_path(&self) -> eyre::Result<PathBuf> {
        match self.config.as_deref() {
            Some(path) => Ok(PathBuf::from(shellexpand::full(path)?.into_owned())),
            None => default_config_path(),
        }
    }
}

fn default_config_path() -> eyre::Result<PathBuf> {
    use etcetera::BaseStrategy;

    let strategy = etcetera::choose_base_strategy()?;
    Ok(strategy.config_dir().join("vidrank").join("config.toml"))
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = if verbose {
        "info,vidrank=debug,vidrank_sdk=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config_path = cli.config_path()?;
    let mut config = Config::load(&config_path)?;
    if let Some(output) = cli.output {
        config.output = output;
    }
    tracing::debug!(path = %config_path.display(), "loaded config");

    cli.command
        .execute(Context::new(&config_path, &config, cli.verbose))
        .await
}
