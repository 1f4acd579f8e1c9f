//! Recording test doubles for the engine's collaborators.
//! These helpers are public so integration tests and host crates can reuse them.

use std::{
    collections::{BTreeSet, HashMap},
    fmt::{self, Write as _},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use shield_config::Settings;
use shield_store::{MemoryStore, SelectionStore};
use shield_types::{Selection, Token};
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
    subscriber::DefaultGuard,
};
use tracing_subscriber::{layer::Context, prelude::*, Layer};

use crate::{
    Collaborators, Engine, Error, Result,
    deps::{EffectivePolicy, MonitorRegistry, NotificationScheduler, ShieldPolicy, TokenNames, UriOpener},
};

/// Records every URI it is asked to open.
pub struct MockOpener {
    /// Opened URIs, in order.
    opened: Mutex<Vec<String>>,
    /// When set, every open is reported as rejected.
    reject: AtomicBool,
}

impl Default for MockOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOpener {
    /// An opener that accepts everything.
    pub fn new() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            reject: AtomicBool::new(false),
        }
    }

    /// Report subsequent opens as rejected.
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// URIs seen so far.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl UriOpener for MockOpener {
    async fn open_uri(&self, uri: &str) -> bool {
        self.opened.lock().push(uri.to_string());
        !self.reject.load(Ordering::SeqCst)
    }
}

/// Records scheduled notifications.
pub struct MockNotifier {
    /// Payloads and fire delays, in order.
    sent: Mutex<Vec<(Map<String, Value>, Duration)>>,
    /// When set, scheduling fails.
    fail: AtomicBool,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    /// A scheduler that accepts everything.
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make subsequent schedules fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Notifications scheduled so far.
    pub fn sent(&self) -> Vec<(Map<String, Value>, Duration)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationScheduler for MockNotifier {
    async fn schedule(&self, payload: Map<String, Value>, fire_delay: Duration) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Notification("scheduler unavailable".into()));
        }
        self.sent.lock().push((payload, fire_delay));
        Ok(())
    }
}

/// Monitor registry backed by an explicit id set.
#[derive(Default)]
pub struct MockMonitors {
    /// Ids with a live monitor.
    active: Mutex<BTreeSet<String>>,
}

impl MockMonitors {
    /// No selection is monitored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as monitored.
    pub fn monitor(&self, id: &str) {
        self.active.lock().insert(id.to_string());
    }

    /// Mark `id` as not monitored.
    pub fn unmonitor(&self, id: &str) {
        self.active.lock().remove(id);
    }
}

impl MonitorRegistry for MockMonitors {
    fn is_selection_monitored(&self, selection_id: &str) -> bool {
        self.active.lock().contains(selection_id)
    }
}

/// Records every policy application.
#[derive(Default)]
pub struct MockPolicy {
    /// Applied policies with their caller labels.
    applied: Mutex<Vec<(EffectivePolicy, String)>>,
}

impl MockPolicy {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Policies applied so far.
    pub fn applied(&self) -> Vec<EffectivePolicy> {
        self.applied.lock().iter().map(|(p, _)| p.clone()).collect()
    }

    /// `triggered_by` labels seen so far.
    pub fn labels(&self) -> Vec<String> {
        self.applied.lock().iter().map(|(_, l)| l.clone()).collect()
    }

    /// Most recent policy.
    pub fn last(&self) -> Option<EffectivePolicy> {
        self.applied.lock().last().map(|(p, _)| p.clone())
    }
}

impl ShieldPolicy for MockPolicy {
    fn apply(&self, policy: &EffectivePolicy, triggered_by: &str) {
        self.applied
            .lock()
            .push((policy.clone(), triggered_by.to_string()));
    }
}

/// Token name table.
#[derive(Default)]
pub struct MockNames {
    /// Application names by token.
    apps: HashMap<Token, String>,
    /// Domains by token.
    domains: HashMap<Token, String>,
}

impl MockNames {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an application name.
    pub fn app(mut self, token: &str, name: &str) -> Self {
        self.apps.insert(Token::new(token), name.to_string());
        self
    }

    /// Add a web domain.
    pub fn domain(mut self, token: &str, domain: &str) -> Self {
        self.domains.insert(Token::new(token), domain.to_string());
        self
    }
}

impl TokenNames for MockNames {
    fn application_name(&self, token: &Token) -> Option<String> {
        self.apps.get(token).cloned()
    }

    fn web_domain(&self, token: &Token) -> Option<String> {
        self.domains.get(token).cloned()
    }
}

/// An engine wired to an in-memory store and recording doubles.
pub struct TestRig {
    /// Engine under test.
    pub engine: Engine,
    /// Backing store.
    pub kv: Arc<MemoryStore>,
    /// Typed view of the backing store.
    pub store: SelectionStore,
    /// URI recorder.
    pub opener: Arc<MockOpener>,
    /// Notification recorder.
    pub notifier: Arc<MockNotifier>,
    /// Monitor registry.
    pub monitors: Arc<MockMonitors>,
    /// Policy recorder.
    pub policy: Arc<MockPolicy>,
}

impl Default for TestRig {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRig {
    /// Rig with default settings and no token names. Needs a Tokio runtime.
    pub fn new() -> Self {
        Self::with_names(MockNames::new())
    }

    /// Rig with the given token names. Needs a Tokio runtime.
    pub fn with_names(names: MockNames) -> Self {
        let kv = Arc::new(MemoryStore::new());
        let settings = Settings::default();
        let opener = Arc::new(MockOpener::new());
        let notifier = Arc::new(MockNotifier::new());
        let monitors = Arc::new(MockMonitors::new());
        let policy = Arc::new(MockPolicy::new());
        let engine = Engine::new(
            kv.clone(),
            settings.clone(),
            Collaborators {
                opener: opener.clone(),
                notifier: notifier.clone(),
                monitors: monitors.clone(),
                policy: policy.clone(),
                names: Arc::new(names),
            },
        );
        let store = SelectionStore::new(kv.clone(), Arc::new(settings));
        Self {
            engine,
            kv,
            store,
            opener,
            notifier,
            monitors,
            policy,
        }
    }

    /// Persist `selection` and mark it monitored.
    pub fn add_monitored(&self, selection: &Selection) {
        self.store
            .put_selection(selection)
            .expect("store selection");
        self.monitors.monitor(&selection.id);
    }

    /// Persist the global shield configuration.
    pub fn set_global_config(&self, config: Value) {
        let key = self.store.settings().global_config_key.clone();
        self.store.write(&key, &config).expect("store global config");
    }

    /// Persist the configuration for one selection.
    pub fn set_selection_config(&self, id: &str, config: Value) {
        let key = self.store.settings().selection_config_key(id);
        self.store.write(&key, &config).expect("store selection config");
    }
}

/// Captures formatted tracing events for assertions.
#[derive(Clone, Default)]
pub struct LogCapture {
    /// One line per event.
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    /// Empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the thread-default subscriber until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    /// Lines containing every needle.
    pub fn matching(&self, needles: &[&str]) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|l| needles.iter().all(|n| l.contains(n)))
            .cloned()
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut line = LineVisitor(String::new());
        event.record(&mut line);
        self.lines.lock().push(line.0.trim_end().to_string());
    }
}

/// Renders event fields as `message key=value ...`.
struct LineVisitor(String);

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        let _ = write!(self.0, "{}={} ", field.name(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{:?} ", value);
        } else {
            let _ = write!(self.0, "{}={:?} ", field.name(), value);
        }
    }
}
