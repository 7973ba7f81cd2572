use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mwrover::config::DriveConfig;

/// Drive the MWRover mecanum base by dragging on the terminal
#[derive(Debug, Parser)]
#[command(name = "mwrover")]
struct Cli {
    /// Rover controller base url; commands go to <url>/command/
    #[arg(long)]
    controller_url: Option<String>,

    /// JSON file with drive settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum gap between move commands, in ms
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Neutral servo pulse width (us)
    #[arg(long)]
    centre: Option<u16>,

    /// Pulse width swing either side of centre (us)
    #[arg(long)]
    range: Option<u16>,

    /// HTTP request timeout, in ms
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Cli {
    fn drive_config(&self) -> Result<DriveConfig, mwrover::config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => DriveConfig::from_file(path)?,
            None => DriveConfig::default(),
        };
        if let Some(url) = &self.controller_url {
            config.controller_url = url.clone();
        }
        if let Some(ms) = self.interval_ms {
            config.min_interval = Duration::from_millis(ms);
        }
        if let Some(centre) = self.centre {
            config.centre = centre;
        }
        if let Some(range) = self.range {
            config.range = range;
        }
        if let Some(ms) = self.timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging (set RUST_LOG=info or debug); stderr keeps the drag pad clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.drive_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = mwrover::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
