//! Run a button's action list, in order, best effort.
//!
//! Each entry is decoded and executed on its own. A failing entry is logged
//! and skipped; side effects of earlier entries are kept.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use shield_config::{Action, ButtonConfig, Error as ConfigError};
use shield_types::{Selection, ShieldEvent};
use tracing::{debug, info, warn};

use crate::{
    Error, Result,
    matcher::SelectionMatcher,
    mutator::{BlockMutator, BlockOp},
    placeholders::Placeholders,
    ui_queue::UiQueue,
};

/// Scheme followed by a colon and no whitespace.
static URI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:\S*$").expect("valid uri regex"));

/// Per-event inputs threaded into every action.
pub struct ActionContext<'a> {
    /// The triggering event.
    pub event: &'a ShieldEvent,
    /// Values for template substitution.
    pub placeholders: &'a Placeholders,
    /// Monitored-only default for selection-targeted actions.
    pub only_monitored: bool,
}

/// Outcome counts for one run of an action list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Entries looked at.
    pub attempted: usize,
    /// Entries that ran to completion.
    pub completed: usize,
    /// Entries of an unknown kind.
    pub skipped: usize,
    /// Entries that failed.
    pub failed: usize,
}

impl ExecutionReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.attempted += other.attempted;
        self.completed += other.completed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Log and count one outcome.
    fn record(&mut self, index: usize, kind: &str, outcome: Result<()>) {
        self.attempted += 1;
        match outcome {
            Ok(()) => {
                self.completed += 1;
                debug!(index, kind, "action_completed");
            }
            Err(Error::UnknownActionKind(k)) => {
                self.skipped += 1;
                info!(index, kind = %k, "action_skipped: unknown kind");
            }
            Err(e) => {
                self.failed += 1;
                warn!(index, kind, error = %e, "action_failed");
            }
        }
    }
}

/// Dispatches decoded actions to their handlers.
#[derive(Clone)]
pub struct ActionExecutor {
    /// UI-affine side effects.
    ui: UiQueue,
    /// Used by selection-targeted actions.
    matcher: SelectionMatcher,
    /// Whitelist and blocklist changes.
    mutator: BlockMutator,
    /// URI opened when an open action has no target.
    fallback_uri: String,
}

impl ActionExecutor {
    /// Create an executor.
    pub fn new(
        ui: UiQueue,
        matcher: SelectionMatcher,
        mutator: BlockMutator,
        fallback_uri: String,
    ) -> Self {
        Self {
            ui,
            matcher,
            mutator,
            fallback_uri,
        }
    }

    /// Execute raw action entries strictly in order.
    pub fn execute(&self, entries: &[Value], ctx: &ActionContext<'_>) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for (index, entry) in entries.iter().enumerate() {
            let kind = Action::entry_kind(entry).unwrap_or("?");
            debug!(index, total = entries.len(), kind, "action_start");
            let outcome = self.run_decoded(Action::decode(entry), kind, ctx);
            report.record(index, kind, outcome);
        }
        report
    }

    /// Execute the legacy single-`type` action, if the config has one.
    pub fn execute_legacy(&self, cfg: &ButtonConfig, ctx: &ActionContext<'_>) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        if let (Some(kind), Some(decoded)) = (cfg.legacy_type.as_deref(), cfg.legacy_action()) {
            debug!(kind, "legacy_action_start");
            let outcome = self.run_decoded(decoded, kind, ctx);
            report.record(cfg.actions.len(), kind, outcome);
        }
        report
    }

    /// Run an action if it decoded.
    fn run_decoded(
        &self,
        decoded: std::result::Result<Action, ConfigError>,
        kind: &str,
        ctx: &ActionContext<'_>,
    ) -> Result<()> {
        let action = decoded?;
        self.run(&action, kind, ctx)
    }

    /// Execute one decoded action. `raw_kind` is the persisted type name.
    pub fn run(&self, action: &Action, raw_kind: &str, ctx: &ActionContext<'_>) -> Result<()> {
        match action {
            Action::OpenUrl { url } => self.open(url.as_deref(), ctx),
            Action::OpenApp {
                deeplink_url,
                bundle_id,
            } => {
                if let Some(b) = bundle_id {
                    debug!(bundle_id = %b, "open_app");
                }
                self.open(deeplink_url.as_deref(), ctx)
            }
            Action::SendNotification { payload, delay_ms } => {
                let payload = ctx.placeholders.apply_map(payload);
                let delay = Duration::from_millis(delay_ms.unwrap_or(0));
                self.ui.schedule_notification(payload, delay)
            }
            Action::AddCurrentToWhitelist => {
                let current =
                    Selection::default().with(ctx.event.kind, ctx.event.token.clone());
                self.mutator.mutate(BlockOp::Add(current)).map(drop)
            }
            Action::DisableBlockAllMode => self.mutator.mutate(BlockOp::Disable).map(drop),
            Action::ResetBlocks => self.mutator.mutate(BlockOp::Reset).map(drop),
            Action::UnblockSelection { only_monitored } => {
                self.for_matches(ctx, *only_monitored, false, BlockOp::Remove)
            }
            Action::UnblockAllMatchingSelections { only_monitored } => {
                self.for_matches(ctx, *only_monitored, true, BlockOp::Remove)
            }
            Action::WhitelistSelection { only_monitored } => {
                self.for_matches(ctx, *only_monitored, false, BlockOp::Add)
            }
            Action::WhitelistAllMatchingSelections { only_monitored } => {
                self.for_matches(ctx, *only_monitored, true, BlockOp::Add)
            }
            Action::Unknown => Err(Error::UnknownActionKind(raw_kind.to_string())),
        }
    }

    /// Resolve a URI template and queue it for opening.
    fn open(&self, template: Option<&str>, ctx: &ActionContext<'_>) -> Result<()> {
        let template = template.unwrap_or(&self.fallback_uri);
        let uri = ctx.placeholders.apply(template);
        if !URI_RE.is_match(&uri) {
            return Err(Error::InvalidUri(uri));
        }
        self.ui.open_uri(uri)
    }

    /// Apply `op` to the first, or every, selection matching the event.
    fn for_matches(
        &self,
        ctx: &ActionContext<'_>,
        only_monitored: Option<bool>,
        all: bool,
        op: fn(Selection) -> BlockOp,
    ) -> Result<()> {
        let matches = self.matcher.find_matching_selections(
            &ctx.event.token,
            ctx.event.kind,
            only_monitored.unwrap_or(ctx.only_monitored),
            true,
        )?;
        if matches.is_empty() {
            debug!("no matching selection; nothing to change");
            return Ok(());
        }
        let take = if all { matches.len() } else { 1 };
        for selection in matches.into_iter().take(take) {
            debug!(selection = %selection.id, "selection_targeted");
            self.mutator.mutate(op(selection))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_shape() {
        for ok in ["https://x", "device-activity://", "app://resume?x=1", "mailto:a@b"] {
            assert!(URI_RE.is_match(ok), "{ok}");
        }
        for bad in ["", "not a uri", "://x", "1http://x", "app://has space"] {
            assert!(!URI_RE.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn report_merge_adds_counts() {
        let mut a = ExecutionReport {
            attempted: 2,
            completed: 1,
            skipped: 0,
            failed: 1,
        };
        a.merge(ExecutionReport {
            attempted: 1,
            completed: 0,
            skipped: 1,
            failed: 0,
        });
        assert_eq!(a.attempted, 3);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.failed, 1);
    }
}
