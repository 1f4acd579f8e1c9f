#![warn(missing_docs)]

//! Shared logging helpers, CLI argument definitions, and tracing setup for the shield workspace.
//!
//! - [`LogArgs`]: flags for choosing a log level or filter
//! - [`compute_spec`]: resolve those flags and `RUST_LOG` into one filter directive
//! - [`init`]: install the process-wide subscriber

use std::{env, io};

use clap::Args;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

/// Logging controls for CLI apps.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Set global log level to trace (our crates only)
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Set global log level to debug (our crates only)
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Set a single global log level for our crates (error|warn|info|debug|trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Set an explicit tracing filter directive (overrides other flags)
    /// e.g. "shield_engine=trace,shield_store=debug"
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// Filter directive these flags select.
    pub fn spec(&self) -> String {
        compute_spec(
            self.trace,
            self.debug,
            self.log_level.as_deref(),
            self.log_filter.as_deref(),
        )
    }
}

/// List of crate targets that constitute "our" logs.
pub fn our_crates() -> &'static [&'static str] {
    &[
        "shieldctl",
        "shield_engine",
        "shield_store",
        "shield_config",
        "shield_types",
        "logging",
    ]
}

/// Build a filter directive string that sets the same `level` for all of our crates.
pub fn level_spec_for(level: &str) -> String {
    let lvl = level.to_ascii_lowercase();
    our_crates()
        .iter()
        .map(|t| format!("{}={}", t, lvl))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compute the final filter spec string with precedence:
/// - `log_filter`
/// - `trace`/`debug`/`log_level` (crate-scoped)
/// - `RUST_LOG` env
/// - default to crate-scoped `info`
pub fn compute_spec(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
) -> String {
    if let Some(spec) = log_filter {
        return spec.to_string();
    }
    if trace {
        return level_spec_for("trace");
    }
    if debug {
        return level_spec_for("debug");
    }
    if let Some(lvl) = log_level {
        return level_spec_for(lvl);
    }
    env::var("RUST_LOG").unwrap_or_else(|_| level_spec_for("info"))
}

/// Create an `EnvFilter` from a spec string.
pub fn env_filter_from_spec(spec: &str) -> EnvFilter {
    EnvFilter::new(spec)
}

/// Install a stderr subscriber filtered by `args`.
///
/// Fails if a global subscriber is already set.
pub fn init(args: &LogArgs) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter_from_spec(&args.spec()))
        .with(fmt::layer().with_writer(io::stderr).without_time())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        assert_eq!(
            compute_spec(false, false, Some("warn"), Some("shield_engine=trace")),
            "shield_engine=trace"
        );
    }

    #[test]
    fn level_flags_scope_to_our_crates() {
        let spec = compute_spec(false, true, None, None);
        for krate in our_crates() {
            assert!(spec.contains(&format!("{krate}=debug")), "{spec}");
        }
        assert_eq!(
            compute_spec(false, false, Some("WARN"), None),
            level_spec_for("warn")
        );
        assert!(compute_spec(true, false, None, None).contains("shield_store=trace"));
    }

    #[test]
    fn args_spec_matches_compute_spec() {
        let args = LogArgs {
            log_level: Some("error".into()),
            ..LogArgs::default()
        };
        assert_eq!(args.spec(), level_spec_for("error"));
    }

    #[test]
    fn filter_parses() {
        let f = env_filter_from_spec(&level_spec_for("info"));
        assert!(f.to_string().contains("shield_engine=info"));
    }
}
