// Defaults for store key names and engine behaviour

/// Prefix of per-selection config keys.
pub(crate) const SELECTION_CONFIG_PREFIX: &str = "shieldActionConfigForSelection_";
/// Key of the global config.
pub(crate) const GLOBAL_CONFIG_KEY: &str = "shieldActions";
/// Key of the whitelist selection.
pub(crate) const WHITELIST_KEY: &str = "currentWhitelist";
/// Key of the blocklist selection.
pub(crate) const BLOCKLIST_KEY: &str = "currentBlocklist";
/// Key of the block-all flag.
pub(crate) const BLOCK_ALL_KEY: &str = "isBlockingAllModeEnabled";
/// Key of the selection map.
pub(crate) const SELECTIONS_KEY: &str = "familyActivitySelectionIds";
/// URI opened when an open action has no target.
pub(crate) const FALLBACK_URI: &str = "device-activity://";
/// Label passed with every policy update.
pub(crate) const TRIGGERED_BY: &str = "shieldAction";

// Serde default functions
/// Default for `selection_config_prefix`.
pub(crate) fn default_selection_config_prefix() -> String {
    SELECTION_CONFIG_PREFIX.to_string()
}
/// Default for `global_config_key`.
pub(crate) fn default_global_config_key() -> String {
    GLOBAL_CONFIG_KEY.to_string()
}
/// Default for `whitelist_key`.
pub(crate) fn default_whitelist_key() -> String {
    WHITELIST_KEY.to_string()
}
/// Default for `blocklist_key`.
pub(crate) fn default_blocklist_key() -> String {
    BLOCKLIST_KEY.to_string()
}
/// Default for `block_all_key`.
pub(crate) fn default_block_all_key() -> String {
    BLOCK_ALL_KEY.to_string()
}
/// Default for `selections_key`.
pub(crate) fn default_selections_key() -> String {
    SELECTIONS_KEY.to_string()
}
/// Default for `fallback_uri`.
pub(crate) fn default_fallback_uri() -> String {
    FALLBACK_URI.to_string()
}
/// Default for `triggered_by`.
pub(crate) fn default_triggered_by() -> String {
    TRIGGERED_BY.to_string()
}
/// Default for `only_monitored`.
pub(crate) const fn default_only_monitored() -> bool {
    true
}
