//! Resolve which button configuration applies to an event.

use shield_config::ShieldConfig;
use shield_store::SelectionStore;
use tracing::{debug, warn};

use crate::Result;

/// Looks up selection-specific configuration, falling back to the global key.
#[derive(Clone)]
pub struct ConfigResolver {
    /// Config source.
    store: SelectionStore,
}

impl ConfigResolver {
    /// Create a resolver.
    pub fn new(store: SelectionStore) -> Self {
        Self { store }
    }

    /// Configuration for `selection_id`, or the global configuration.
    ///
    /// `Ok(None)` means nothing is configured; callers default to close.
    pub fn resolve_config(&self, selection_id: Option<&str>) -> Result<Option<ShieldConfig>> {
        self.resolve_first(selection_id)
    }

    /// Try each selection id in order, then the global key.
    pub fn resolve_first<'a>(
        &self,
        selection_ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<Option<ShieldConfig>> {
        let settings = self.store.settings();
        for id in selection_ids {
            let key = settings.selection_config_key(id);
            if let Some(cfg) = self.load(&key)? {
                debug!(selection = id, key = %key, "config_resolved");
                return Ok(Some(cfg));
            }
        }
        let global = settings.global_config_key.clone();
        let cfg = self.load(&global)?;
        if cfg.is_some() {
            debug!(key = %global, "config_resolved");
        }
        Ok(cfg)
    }

    /// Load one key; a value of the wrong shape counts as absent.
    fn load(&self, key: &str) -> Result<Option<ShieldConfig>> {
        let Some(raw) = self.store.read_raw(key)? else {
            return Ok(None);
        };
        if raw.is_null() {
            return Ok(None);
        }
        match ShieldConfig::from_value(raw) {
            Ok(cfg) => Ok(Some(cfg)),
            Err(e) => {
                warn!(key, "ignoring malformed shield config: {}", e.pretty());
                Ok(None)
            }
        }
    }
}
