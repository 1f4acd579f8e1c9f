//! Terminal stand-ins for the host app's collaborators.

use std::{collections::BTreeSet, time::Duration};

use async_trait::async_trait;
use serde_json::{Map, Value};
use shield_engine::{
    EffectivePolicy, MonitorRegistry, NotificationScheduler, ShieldPolicy, TokenNames, UriOpener,
};
use shield_types::Token;
use tracing::info;

/// Prints URIs instead of opening them.
pub struct PrintOpener;

#[async_trait]
impl UriOpener for PrintOpener {
    async fn open_uri(&self, uri: &str) -> bool {
        println!("open {uri}");
        true
    }
}

/// Prints notifications instead of scheduling them.
pub struct PrintNotifier;

#[async_trait]
impl NotificationScheduler for PrintNotifier {
    async fn schedule(
        &self,
        payload: Map<String, Value>,
        fire_delay: Duration,
    ) -> shield_engine::Result<()> {
        println!(
            "notify +{}ms {}",
            fire_delay.as_millis(),
            Value::Object(payload)
        );
        Ok(())
    }
}

/// Logs the effective policy.
pub struct LogPolicy;

impl ShieldPolicy for LogPolicy {
    fn apply(&self, policy: &EffectivePolicy, triggered_by: &str) {
        info!(
            triggered_by,
            blocked = policy.blocked.total_len(),
            whitelisted = policy.whitelist.total_len(),
            block_all = policy.block_all,
            "policy_applied"
        );
    }
}

/// Monitor registry from `--monitor` flags; empty means everything is monitored.
pub struct MonitorList(pub BTreeSet<String>);

impl MonitorRegistry for MonitorList {
    fn is_selection_monitored(&self, selection_id: &str) -> bool {
        self.0.is_empty() || self.0.contains(selection_id)
    }
}

/// Names from `--name` flags, applied to whichever token was pressed.
pub struct FixedName(pub Option<String>);

impl TokenNames for FixedName {
    fn application_name(&self, _token: &Token) -> Option<String> {
        self.0.clone()
    }

    fn web_domain(&self, _token: &Token) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_monitor_list_monitors_everything() {
        assert!(MonitorList(BTreeSet::new()).is_selection_monitored("x"));
        let only = MonitorList(["a".to_string()].into_iter().collect());
        assert!(only.is_selection_monitored("a"));
        assert!(!only.is_selection_monitored("b"));
    }
}
