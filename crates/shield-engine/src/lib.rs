//! Shield Engine
//!
//! The Shield Engine crate decides what happens when a user presses a button
//! on a shield covering a blocked app, web domain, or category:
//! - finds the persisted selections containing the blocked token
//! - resolves the selection-specific or global button configuration
//! - runs the configured actions in order, best effort
//! - answers the host with close or defer, optionally after a delay
//!
//! [`Engine`] is the entry point. Host integrations implement the traits in
//! [`deps`]; [`test_support`] has recording doubles for all of them.
#![warn(missing_docs)]

use std::{sync::Arc, time::Instant};

use shield_config::{ButtonConfig, Settings};
use shield_store::{KeyValueStore, SelectionStore};
use shield_types::{Selection, ShieldEvent};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

pub mod deps;
mod error;
mod executor;
mod matcher;
mod mutator;
mod placeholders;
mod resolver;
mod response;
pub mod test_support;
mod ui_queue;

pub use deps::{
    AllMonitored, EffectivePolicy, MonitorRegistry, NoNames, NotificationScheduler, ShieldPolicy,
    TokenNames, UriOpener,
};
pub use error::{Error, Result};
pub use executor::{ActionContext, ActionExecutor, ExecutionReport};
pub use matcher::SelectionMatcher;
pub use mutator::{BlockMutator, BlockOp};
pub use placeholders::Placeholders;
pub use resolver::ConfigResolver;
pub use response::{EngineResponse, PendingResponse};
pub use ui_queue::UiQueue;

/// Host collaborators handed to [`Engine::new`].
#[derive(Clone)]
pub struct Collaborators {
    /// Opens URIs in the host app.
    pub opener: Arc<dyn UriOpener>,
    /// Schedules local notifications.
    pub notifier: Arc<dyn NotificationScheduler>,
    /// Reports which selections are actively monitored.
    pub monitors: Arc<dyn MonitorRegistry>,
    /// Applies the effective shield state.
    pub policy: Arc<dyn ShieldPolicy>,
    /// Resolves display names for placeholders.
    pub names: Arc<dyn TokenNames>,
}

/// Everything needed to run a button's actions.
struct Resolved {
    /// Matching selections, narrowest first.
    matches: Vec<Selection>,
    /// The pressed button's configuration.
    button: ButtonConfig,
}

/// Handles shield button presses.
///
/// Construct via [`Engine::new`] inside a Tokio runtime, then pass each event
/// to [`Engine::handle`] or [`Engine::respond`]. Cloning is cheap; clones
/// share the store and the UI queue.
#[derive(Clone)]
pub struct Engine {
    /// Typed view of the shared store.
    store: SelectionStore,
    /// Selection lookup.
    matcher: SelectionMatcher,
    /// Config lookup.
    resolver: ConfigResolver,
    /// Action dispatch.
    executor: ActionExecutor,
    /// Block state changes.
    mutator: BlockMutator,
    /// UI-affine side effects.
    ui: UiQueue,
    /// Placeholder name source.
    names: Arc<dyn TokenNames>,
    /// Runtime for timers and the UI queue.
    rt: Handle,
}

impl Engine {
    /// Create an engine on the current Tokio runtime.
    ///
    /// Panics when called outside a runtime; use [`Engine::with_runtime`] there.
    pub fn new(kv: Arc<dyn KeyValueStore>, settings: Settings, deps: Collaborators) -> Self {
        Self::with_runtime(Handle::current(), kv, settings, deps)
    }

    /// Create an engine whose timers and UI queue run on `rt`.
    pub fn with_runtime(
        rt: Handle,
        kv: Arc<dyn KeyValueStore>,
        settings: Settings,
        deps: Collaborators,
    ) -> Self {
        let store = SelectionStore::new(kv, Arc::new(settings));
        let ui = UiQueue::spawn(&rt, deps.opener, deps.notifier);
        let matcher = SelectionMatcher::new(store.clone(), deps.monitors);
        let mutator = BlockMutator::new(store.clone(), deps.policy);
        let executor = ActionExecutor::new(
            ui.clone(),
            matcher.clone(),
            mutator.clone(),
            store.settings().fallback_uri.clone(),
        );
        Self {
            resolver: ConfigResolver::new(store.clone()),
            store,
            matcher,
            executor,
            mutator,
            ui,
            names: deps.names,
            rt,
        }
    }

    /// Run the event's actions and deliver the response to `completion`.
    ///
    /// Without a delay, `completion` runs before this returns and the result
    /// is `None`. With a delay, the returned [`PendingResponse`] delivers it
    /// once the timer expires.
    pub fn handle<F>(&self, event: &ShieldEvent, completion: F) -> Option<PendingResponse>
    where
        F: FnOnce(EngineResponse) + Send + 'static,
    {
        let response = self.process(event);
        match response.delay() {
            Some(delay) => Some(PendingResponse::arm(&self.rt, response, delay, completion)),
            None => {
                completion(response);
                None
            }
        }
    }

    /// Run the event's actions and return the response once any delay elapses.
    pub async fn respond(&self, event: &ShieldEvent) -> EngineResponse {
        let response = self.process(event);
        if let Some(delay) = response.delay() {
            tokio::time::sleep(delay).await;
        }
        response
    }

    /// Run the event's actions and compose the response without delivering it.
    ///
    /// Never fails: a missing or unreadable configuration yields close.
    pub fn process(&self, event: &ShieldEvent) -> EngineResponse {
        let started = Instant::now();
        info!(button = %event.button, kind = %event.kind, "shield_action_received");

        let resolved = match self.resolve(event) {
            Ok(r) => r,
            Err(Error::ConfigAbsent) => {
                debug!(button = %event.button, "no configuration; closing");
                return EngineResponse::close();
            }
            Err(e) => {
                warn!(button = %event.button, "configuration lookup failed, closing: {}", e);
                return EngineResponse::close();
            }
        };

        let placeholders = Placeholders::for_event(
            event,
            self.names.as_ref(),
            resolved.matches.first().map(|s| s.id.as_str()),
        );
        let ctx = ActionContext {
            event,
            placeholders: &placeholders,
            only_monitored: resolved
                .button
                .only_monitored()
                .unwrap_or(self.store.settings().only_monitored),
        };
        let mut report = self.executor.execute(&resolved.button.actions, &ctx);
        report.merge(self.executor.execute_legacy(&resolved.button, &ctx));

        if let Err(e) = self.store.sync() {
            warn!("final store sync failed: {}", e);
        }

        let response = EngineResponse::compose(
            resolved.button.behavior,
            resolved.button.effective_delay_ms(),
        );
        info!(
            behavior = response.behavior.as_str(),
            delay_ms = ?response.delay_ms,
            attempted = report.attempted,
            completed = report.completed,
            skipped = report.skipped,
            failed = report.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "shield_action_finished"
        );
        response
    }

    /// Find the matching selections and the pressed button's configuration.
    fn resolve(&self, event: &ShieldEvent) -> Result<Resolved> {
        let only_monitored = self.store.settings().only_monitored;
        let matches =
            self.matcher
                .find_matching_selections(&event.token, event.kind, only_monitored, true)?;
        let config = self
            .resolver
            .resolve_first(matches.iter().map(|s| s.id.as_str()))?
            .ok_or(Error::ConfigAbsent)?;
        let button = match config.button(event.button) {
            Ok(Some(b)) => b,
            Ok(None) => return Err(Error::ConfigAbsent),
            Err(e) => {
                warn!(button = %event.button, "button configuration unreadable: {}", e.pretty());
                return Err(Error::ConfigAbsent);
            }
        };
        Ok(Resolved { matches, button })
    }

    /// Wait until every queued URI open and notification has been handed off.
    pub async fn settle(&self) -> Result<()> {
        self.ui.flush().await
    }

    /// Current effective shield state, read from the store.
    pub fn effective_policy(&self) -> Result<EffectivePolicy> {
        self.mutator.effective_policy()
    }

    /// The selection matcher.
    pub fn matcher(&self) -> &SelectionMatcher {
        &self.matcher
    }

    /// The config resolver.
    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }
}
