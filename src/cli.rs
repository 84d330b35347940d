//! Command-Line Arguments

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::{validate_url, ClientConfig, ReconcilePolicy};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "todo-sync", version, about = "Todo list client")]
pub struct Cli {
    #[arg(long, global = true, help = "Todo service base URL (overrides BACKEND_URL)")]
    pub backend_url: Option<String>,
    #[arg(long, global = true, help = "Per-request timeout in milliseconds")]
    pub timeout_ms: Option<u64>,
    #[arg(long, global = true, help = "Show toggles immediately and roll back on failure")]
    pub optimistic: bool,
    #[arg(long, global = true, default_value = "logs", help = "Directory for log files")]
    pub log_dir: PathBuf,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(short, long, global = true, help = "Also write log output to stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the todo list
    List,
    /// Toggle completion of the given todos, then print the list
    Toggle {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the environment config
    pub fn apply(&self, mut config: ClientConfig) -> Result<ClientConfig, ConfigError> {
        if let Some(url) = &self.backend_url {
            validate_url("--backend-url", url)?;
            config.backend_url = url.clone();
        }
        if let Some(ms) = self.timeout_ms {
            if ms == 0 {
                return Err(ConfigError::invalid("--timeout-ms", "must be greater than zero"));
            }
            config.request_timeout = Duration::from_millis(ms);
        }
        if self.optimistic {
            config.policy = ReconcilePolicy::Optimistic;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggle_with_overrides() {
        let cli = Cli::try_parse_from([
            "todo-sync",
            "toggle",
            "a1",
            "b2",
            "--backend-url",
            "http://127.0.0.1:8080",
            "--timeout-ms",
            "1500",
            "--optimistic",
        ])
        .unwrap();

        match &cli.command {
            Commands::Toggle { ids } => assert_eq!(ids, &vec!["a1".to_string(), "b2".to_string()]),
            other => panic!("unexpected command {:?}", other),
        }

        let config = cli.apply(ClientConfig::default()).unwrap();
        assert_eq!(config.backend_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.policy, ReconcilePolicy::Optimistic);
    }

    #[test]
    fn test_toggle_requires_ids() {
        assert!(Cli::try_parse_from(["todo-sync", "toggle"]).is_err());
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let cli = Cli::try_parse_from(["todo-sync", "list"]).unwrap();
        assert!(!cli.verbose);
        let config = cli.apply(ClientConfig::default()).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_verbose_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["todo-sync", "list", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_apply_rejects_zero_timeout() {
        let cli = Cli::try_parse_from(["todo-sync", "--timeout-ms", "0", "list"]).unwrap();
        assert!(cli.apply(ClientConfig::default()).is_err());
    }
}
