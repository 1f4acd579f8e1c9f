//! Engine settings: where things live in the shared store.

use serde::{Deserialize, Serialize};

use crate::defaults;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Store key names and defaults used by the engine.
pub struct Settings {
    /// Prefix prepended to a selection id to find its button configuration.
    #[serde(default = "defaults::default_selection_config_prefix")]
    pub selection_config_prefix: String,

    /// Key holding the global fallback button configuration.
    #[serde(default = "defaults::default_global_config_key")]
    pub global_config_key: String,

    /// Key holding the serialized whitelist selection.
    #[serde(default = "defaults::default_whitelist_key")]
    pub whitelist_key: String,

    /// Key holding the serialized blocklist selection.
    #[serde(default = "defaults::default_blocklist_key")]
    pub blocklist_key: String,

    /// Key holding the block-all-mode flag.
    #[serde(default = "defaults::default_block_all_key")]
    pub block_all_key: String,

    /// Key holding the map of selection id to selection.
    #[serde(default = "defaults::default_selections_key")]
    pub selections_key: String,

    /// URI opened when an open action has no target.
    #[serde(default = "defaults::default_fallback_uri")]
    pub fallback_uri: String,

    /// Label handed to the block policy on every recompute.
    #[serde(default = "defaults::default_triggered_by")]
    pub triggered_by: String,

    /// Default for the monitored-only filter when a config does not say.
    #[serde(default = "defaults::default_only_monitored")]
    pub only_monitored: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selection_config_prefix: defaults::default_selection_config_prefix(),
            global_config_key: defaults::default_global_config_key(),
            whitelist_key: defaults::default_whitelist_key(),
            blocklist_key: defaults::default_blocklist_key(),
            block_all_key: defaults::default_block_all_key(),
            selections_key: defaults::default_selections_key(),
            fallback_uri: defaults::default_fallback_uri(),
            triggered_by: defaults::default_triggered_by(),
            only_monitored: defaults::default_only_monitored(),
        }
    }
}

impl Settings {
    /// Store key for a selection-specific configuration override.
    pub fn selection_config_key(&self, selection_id: &str) -> String {
        format!("{}{}", self.selection_config_prefix, selection_id)
    }
}
