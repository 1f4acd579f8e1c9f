//! Collaborators the engine talks to but does not own.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use shield_types::{Selection, Token};

use crate::Result;

/// Opens a URI in the host app. Best effort.
#[async_trait]
pub trait UriOpener: Send + Sync {
    /// Open `uri`; returns whether the host accepted it.
    async fn open_uri(&self, uri: &str) -> bool;
}

/// Schedules local notifications.
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Schedule `payload` to fire after `fire_delay`.
    async fn schedule(&self, payload: Map<String, Value>, fire_delay: Duration) -> Result<()>;
}

/// Answers whether a selection has a live monitoring configuration.
pub trait MonitorRegistry: Send + Sync {
    /// True when `selection_id` is referenced by an active monitor.
    fn is_selection_monitored(&self, selection_id: &str) -> bool;
}

/// Derives and applies the active shield state.
pub trait ShieldPolicy: Send + Sync {
    /// Apply `policy`. `triggered_by` labels the caller for logging.
    fn apply(&self, policy: &EffectivePolicy, triggered_by: &str);
}

/// Resolves human-readable names for opaque tokens.
pub trait TokenNames: Send + Sync {
    /// Display name of an application token.
    fn application_name(&self, _token: &Token) -> Option<String> {
        None
    }

    /// Domain of a web-domain token.
    fn web_domain(&self, _token: &Token) -> Option<String> {
        None
    }
}

/// Name resolver that knows no names.
pub struct NoNames;

impl TokenNames for NoNames {}

/// Monitor registry that treats every selection as monitored.
pub struct AllMonitored;

impl MonitorRegistry for AllMonitored {
    fn is_selection_monitored(&self, _selection_id: &str) -> bool {
        true
    }
}

/// Shield state derived from the store after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePolicy {
    /// Tokens to shield: the blocklist minus the whitelist.
    pub blocked: Selection,
    /// Tokens currently exempted.
    pub whitelist: Selection,
    /// Whether block-all mode is on.
    pub block_all: bool,
}

impl EffectivePolicy {
    /// True when nothing is shielded.
    pub fn is_clear(&self) -> bool {
        self.blocked.is_empty() && !self.block_all
    }
}
