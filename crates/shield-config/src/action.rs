//! Actions a shield button can trigger.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// One entry in a button's ordered action list.
///
/// Entries are persisted as JSON objects tagged by `"type"`. Unrecognized
/// types decode to [`Action::Unknown`] so newer configs keep working on older
/// engines. Several legacy type names are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Open a URL in the host app.
    #[serde(alias = "openUrlWithDispatch")]
    OpenUrl {
        /// URL template; placeholders are substituted before opening.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// Open the containing app, optionally through a deep link.
    OpenApp {
        /// Deep link template; placeholders are substituted before opening.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deeplink_url: Option<String>,
        /// Bundle id of the target app, informational only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bundle_id: Option<String>,
    },
    /// Schedule a local notification.
    SendNotification {
        /// Notification content; string values are templates.
        payload: Map<String, Value>,
        /// Delay before the notification fires.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    /// Add the triggering token to the whitelist.
    AddCurrentToWhitelist,
    /// Turn off block-all mode.
    DisableBlockAllMode,
    /// Clear every block and the whitelist.
    ResetBlocks,
    /// Remove the most specific matching selection from the blocklist.
    #[serde(alias = "unblockPossibleFamilyActivitySelection")]
    UnblockSelection {
        /// Restrict matches to monitored selections.
        #[serde(
            default,
            alias = "onlyFamilySelectionIdsContainingMonitoredActivityNames",
            skip_serializing_if = "Option::is_none"
        )]
        only_monitored: Option<bool>,
    },
    /// Remove every matching selection from the blocklist.
    #[serde(alias = "unblockAllPossibleFamilyActivitySelections")]
    UnblockAllMatchingSelections {
        /// Restrict matches to monitored selections.
        #[serde(
            default,
            alias = "onlyFamilySelectionIdsContainingMonitoredActivityNames",
            skip_serializing_if = "Option::is_none"
        )]
        only_monitored: Option<bool>,
    },
    /// Whitelist the most specific matching selection.
    #[serde(alias = "whitelistPossibleFamilyActivitySelection")]
    WhitelistSelection {
        /// Restrict matches to monitored selections.
        #[serde(
            default,
            alias = "onlyFamilySelectionIdsContainingMonitoredActivityNames",
            skip_serializing_if = "Option::is_none"
        )]
        only_monitored: Option<bool>,
    },
    /// Whitelist every matching selection.
    #[serde(alias = "whitelistAllPossibleFamilyActivitySelections")]
    WhitelistAllMatchingSelections {
        /// Restrict matches to monitored selections.
        #[serde(
            default,
            alias = "onlyFamilySelectionIdsContainingMonitoredActivityNames",
            skip_serializing_if = "Option::is_none"
        )]
        only_monitored: Option<bool>,
    },
    /// Any type this engine does not recognize.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Decode a single persisted entry.
    ///
    /// Fails when the entry has no string `type`, or when a recognized type is
    /// missing a required field or carries a field of the wrong shape.
    pub fn decode(entry: &Value) -> Result<Self, Error> {
        let Some(kind) = Self::entry_kind(entry) else {
            return Err(Error::decode(None, "action entry has no string `type`"));
        };
        Self::deserialize(entry).map_err(|e| Error::decode(Some(kind), e.to_string()))
    }

    /// The raw `type` of a persisted entry, if any.
    pub fn entry_kind(entry: &Value) -> Option<&str> {
        entry.get("type")?.as_str()
    }

    /// Canonical name of this action's kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OpenUrl { .. } => "openUrl",
            Self::OpenApp { .. } => "openApp",
            Self::SendNotification { .. } => "sendNotification",
            Self::AddCurrentToWhitelist => "addCurrentToWhitelist",
            Self::DisableBlockAllMode => "disableBlockAllMode",
            Self::ResetBlocks => "resetBlocks",
            Self::UnblockSelection { .. } => "unblockSelection",
            Self::UnblockAllMatchingSelections { .. } => "unblockAllMatchingSelections",
            Self::WhitelistSelection { .. } => "whitelistSelection",
            Self::WhitelistAllMatchingSelections { .. } => "whitelistAllMatchingSelections",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_known_kinds() {
        let a = Action::decode(&json!({ "type": "openApp", "deeplinkUrl": "app://x" })).unwrap();
        assert_eq!(
            a,
            Action::OpenApp {
                deeplink_url: Some("app://x".into()),
                bundle_id: None
            }
        );
        let a = Action::decode(&json!({ "type": "resetBlocks" })).unwrap();
        assert_eq!(a, Action::ResetBlocks);
        let a = Action::decode(&json!({ "type": "sendNotification", "payload": { "title": "t" }, "delayMs": 5 }))
            .unwrap();
        assert!(matches!(a, Action::SendNotification { delay_ms: Some(5), .. }));
    }

    #[test]
    fn legacy_names_are_aliases() {
        let a = Action::decode(&json!({ "type": "openUrlWithDispatch", "url": "https://x" })).unwrap();
        assert_eq!(a.kind(), "openUrl");
        let a = Action::decode(&json!({
            "type": "unblockAllPossibleFamilyActivitySelections",
            "onlyFamilySelectionIdsContainingMonitoredActivityNames": false
        }))
        .unwrap();
        assert_eq!(
            a,
            Action::UnblockAllMatchingSelections {
                only_monitored: Some(false)
            }
        );
    }

    #[test]
    fn unknown_kind_is_not_an_error() {
        let a = Action::decode(&json!({ "type": "teleport", "where": "moon" })).unwrap();
        assert_eq!(a, Action::Unknown);
    }

    #[test]
    fn malformed_entries_are_errors() {
        let err = Action::decode(&json!({ "type": "sendNotification" })).unwrap_err();
        assert!(matches!(err, Error::Decode { kind: Some(ref k), .. } if k == "sendNotification"));
        assert!(Action::decode(&json!({ "url": "https://x" })).is_err());
        assert!(Action::decode(&json!("openUrl")).is_err());
        assert!(Action::decode(&json!({ "type": "openUrl", "url": 7 })).is_err());
    }
}
