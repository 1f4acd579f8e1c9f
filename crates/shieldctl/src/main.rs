//! Command-line driver for the shield action engine.
//!
//! `press` simulates a shield button press against a JSON file store and
//! prints the response; `check` validates the stored configuration.
use std::{path::PathBuf, process, sync::Arc};

use clap::{Parser, Subcommand};
use shield_config::{Settings, load_settings};
use shield_engine::{Collaborators, Engine};
use shield_store::{JsonFileStore, SelectionStore};
use shield_types::{Button, ShieldEvent, TokenKind};
use tracing::{debug, error};

mod check;
mod error;
mod host;

pub use error::{Error, Result};

use crate::host::{FixedName, LogPolicy, MonitorList, PrintNotifier, PrintOpener};

#[derive(Parser, Debug)]
#[command(name = "shieldctl", about = "Drive the shield action engine from a terminal", version)]
/// Command-line interface for the `shieldctl` binary.
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// Optional settings file (.json or .ron) overriding store keys and defaults
    #[arg(long, value_name = "PATH", global = true)]
    settings: Option<PathBuf>,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,
}

#[derive(Subcommand, Debug)]
/// Supported subcommands.
enum Command {
    /// Simulate a shield button press and print the response
    Press {
        /// JSON store file
        #[arg(long, value_name = "FILE")]
        store: PathBuf,
        /// Button pressed (primary|secondary)
        #[arg(long, default_value = "primary")]
        button: Button,
        /// Token kind (application|web-domain|category)
        #[arg(long, default_value = "application")]
        kind: TokenKind,
        /// Opaque blocked token
        #[arg(long)]
        token: String,
        /// Selection ids with an active monitor; all selections when omitted
        #[arg(long = "monitor", value_name = "ID")]
        monitors: Vec<String>,
        /// Display name or domain substituted for the pressed token
        #[arg(long)]
        name: Option<String>,
        /// Print the response without waiting out its delay
        #[arg(long)]
        no_wait: bool,
    },
    /// Validate every configuration held in the store
    Check {
        /// JSON store file
        #[arg(long, value_name = "FILE")]
        store: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(&cli.log) {
        eprintln!("logging already initialised: {e}");
    }
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("{e}");
        process::exit(1);
    }
}

/// Execute the parsed command.
async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    debug!(?settings, "settings_loaded");
    match cli.command {
        Command::Press {
            store,
            button,
            kind,
            token,
            monitors,
            name,
            no_wait,
        } => {
            let kv = Arc::new(JsonFileStore::open(store)?);
            let engine = Engine::new(
                kv,
                settings,
                Collaborators {
                    opener: Arc::new(PrintOpener),
                    notifier: Arc::new(PrintNotifier),
                    monitors: Arc::new(MonitorList(monitors.into_iter().collect())),
                    policy: Arc::new(LogPolicy),
                    names: Arc::new(FixedName(name)),
                },
            );
            let event = ShieldEvent::new(button, token, kind);
            let response = if no_wait {
                engine.process(&event)
            } else {
                engine.respond(&event).await
            };
            if let Err(e) = engine.settle().await {
                error!("ui queue closed before settling: {}", e);
            }
            println!("{}", serde_json::to_string(&response)?);
            Ok(())
        }
        Command::Check { store } => {
            let kv = Arc::new(JsonFileStore::open(store)?);
            let store = SelectionStore::new(kv, Arc::new(settings));
            let (inspected, problems) = check::check_store(&store)?;
            for key in &inspected {
                debug!(key = %key, "inspected");
            }
            for p in &problems {
                println!("{p}");
            }
            println!(
                "{} configuration(s) checked, {} problem(s)",
                inspected.len(),
                problems.len()
            );
            if problems.is_empty() {
                Ok(())
            } else {
                Err(Error::CheckFailed(problems.len()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_parses_typed_arguments() {
        let cli = Cli::try_parse_from([
            "shieldctl", "--debug", "press", "--store", "s.json", "--button", "secondary",
            "--kind", "web-domain", "--token", "T", "--monitor", "a", "--monitor", "b",
        ])
        .unwrap();
        assert!(cli.log.debug);
        let Command::Press {
            button,
            kind,
            monitors,
            ..
        } = cli.command
        else {
            panic!("expected press");
        };
        assert_eq!(button, Button::Secondary);
        assert_eq!(kind, TokenKind::WebDomain);
        assert_eq!(monitors, ["a", "b"]);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(
            Cli::try_parse_from(["shieldctl", "press", "--store", "s", "--kind", "x", "--token", "T"])
                .is_err()
        );
    }

    #[tokio::test]
    async fn press_against_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{
                "shieldActions": { "primary": { "actions": [{ "type": "addCurrentToWhitelist" }] } }
            }"#,
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "shieldctl",
            "press",
            "--store",
            path.to_str().unwrap(),
            "--token",
            "A",
        ])
        .unwrap();
        run(cli).await.unwrap();

        let kv = Arc::new(JsonFileStore::open(&path).unwrap());
        let store = SelectionStore::new(kv, Arc::new(Settings::default()));
        assert_eq!(store.whitelist().unwrap().total_len(), 1);
    }
}
