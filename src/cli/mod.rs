// CLI module - User-facing command-line interface

pub mod output;

use crate::config::Config;
use crate::delivery::{DeviceId, SocketDelivery};
use crate::logging;
use crate::logs::LineRenderer;
use crate::session::{ForcedExit, Session};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

const LONG_ABOUT: &str = "\
Show logs for a specific device.

By default, the command prints all stored log messages and exits.

To continuously stream output and see new logs in real time, use the --tail
option.

The whole device identifier is required; short prefixes are not resolved.

Examples:

    devlogs 23c73a1
    devlogs 23c73a1 --tail";

/// devlogs - show device logs
#[derive(Parser, Debug)]
#[command(name = "devlogs")]
#[command(version, about = "Show device logs", long_about = LONG_ABOUT)]
pub struct Cli {
    /// Device identifier
    device: DeviceId,

    /// Continuously stream output
    #[arg(short, long)]
    tail: bool,

    /// Socket of the log delivery service
    #[arg(long, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// Configuration file (.toml or .json)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Diagnostic log level written to stderr
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    /// Execute the parsed command
    async fn execute(&self) -> Result<()> {
        let config = self.resolve_config()?;
        logging::init(&config.log_level)?;

        let delivery = SocketDelivery::from_config(&config);
        info!(
            "Fetching logs for {} from {}",
            self.device,
            delivery.socket_path().display()
        );

        let mut session = Session::new(
            self.device.clone(),
            self.tail,
            delivery,
            LineRenderer::stdout(),
            ForcedExit,
        );

        if !self.tail {
            session.run().await?;
            return Ok(());
        }

        // Live tailing only ends on failure or interrupt; dropping the
        // session future releases the subscription.
        tokio::select! {
            result = session.run() => {
                result?;
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for interrupt")?;
                output::print_notice("Interrupted, closing live log subscription");
            }
        }

        Ok(())
    }

    /// Build the effective configuration: file, then environment, then flags
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref()).with_context(|| match &self.config {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Failed to load config".to_string(),
        })?;

        if let Some(ref socket) = self.socket {
            config.socket_path = socket.clone();
        }
        if let Some(ref level) = self.log_level {
            config.log_level = level.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_history_only() {
        let cli = Cli::try_parse_from(["devlogs", "23c73a1"]).unwrap();
        assert_eq!(cli.device.as_str(), "23c73a1");
        assert!(!cli.tail);
        assert!(cli.socket.is_none());
    }

    #[test]
    fn test_parse_tail_short_flag() {
        let cli = Cli::try_parse_from(["devlogs", "-t", "23c73a1"]).unwrap();
        assert!(cli.tail);
    }

    #[test]
    fn test_parse_rejects_blank_device() {
        assert!(Cli::try_parse_from(["devlogs", "  "]).is_err());
        assert!(Cli::try_parse_from(["devlogs"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "devlogs",
            "23c73a1",
            "--socket",
            "/tmp/flag.sock",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/flag.sock"));
        assert_eq!(config.log_level, "debug");
    }
}
