// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kogoto - relays complaints between two LINE users on a schedule.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kogoto_config::KogotoConfig;

/// Kogoto - relays complaints between two LINE users on a schedule.
#[derive(Parser, Debug)]
#[command(name = "kogoto", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG lookup.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server and the delivery scheduler (default).
    Serve,
    /// Run one delivery batch, print the report as JSON, and exit.
    RunBatch,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Load and validate configuration, then exit.
    Validate,
    /// Print the effective configuration with credentials masked.
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => kogoto_config::load_and_validate_path(path),
        None => kogoto_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            kogoto_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::RunBatch => serve::run_batch_once(config).await,
        Commands::Config { action } => {
            run_config(action, &config);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("kogoto: {e}");
        std::process::exit(1);
    }
}

fn run_config(action: ConfigAction, config: &KogotoConfig) {
    match action {
        ConfigAction::Validate => println!("kogoto: configuration is valid"),
        ConfigAction::Show => match toml::to_string_pretty(&config.redacted()) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("kogoto: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report allocated bytes");
    }

    #[test]
    fn no_subcommand_parses_to_none() {
        let cli = Cli::try_parse_from(["kogoto"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn global_config_flag_follows_subcommand() {
        let cli = Cli::try_parse_from(["kogoto", "run-batch", "--config", "/etc/kogoto.toml"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::RunBatch)));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/kogoto.toml")));
    }

    #[test]
    fn config_requires_an_action() {
        assert!(Cli::try_parse_from(["kogoto", "config"]).is_err());
        let cli = Cli::try_parse_from(["kogoto", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn redacted_config_renders_as_toml() {
        let mut config = KogotoConfig::default();
        config.dify.api_key = Some("app-secret".into());
        let rendered = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("app-secret"));
        assert!(rendered.contains("[scheduler]"));
    }
}
