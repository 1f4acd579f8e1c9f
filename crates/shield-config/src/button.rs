//! Per-button configuration as persisted by the controlling process.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Value};
use shield_types::Button;
use tracing::warn;

use crate::{Action, Error};

/// What the shield should do once a button's actions have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    /// Dismiss the shield.
    #[default]
    Close,
    /// Keep the shield up until the host times out or closes it.
    Defer,
}

impl Behavior {
    /// Persisted spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Defer => "defer",
        }
    }
}

impl Serialize for Behavior {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Behavior {
    /// Anything other than `"defer"` means close.
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(if raw == "defer" {
            Self::Defer
        } else {
            Self::Close
        })
    }
}

/// Configuration for one shield button.
///
/// `actions` holds raw entries so each one can be decoded, and fail, on its
/// own. The legacy single-`type` fields are kept raw for the same reason: a
/// bad value only fails the legacy action. `behavior` and the delays decode
/// leniently; a value of the wrong shape is logged and treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonConfig {
    /// Ordered action entries.
    #[serde(
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub actions: Vec<Value>,
    /// Legacy single action type, run after `actions`.
    #[serde(
        default,
        rename = "type",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_type: Option<String>,
    /// Shield behavior after execution. Absent means close.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub behavior: Option<Behavior>,
    /// Delay before the response is delivered.
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub delay_ms: Option<u64>,
    /// Legacy delay in seconds; `delay_ms` wins when both are set.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub delay: Option<f64>,
    /// Legacy `openUrl` target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    /// Legacy `openApp` target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deeplink_url: Option<Value>,
    /// Legacy `sendNotification` payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Monitored-only filter for selection-targeted actions.
    #[serde(
        default,
        rename = "onlyFamilySelectionIdsContainingMonitoredActivityNames",
        skip_serializing_if = "Option::is_none"
    )]
    pub only_monitored: Option<Value>,
}

impl ButtonConfig {
    /// Effective behavior, defaulting to close.
    pub fn behavior(&self) -> Behavior {
        self.behavior.unwrap_or_default()
    }

    /// Response delay in milliseconds, honouring the legacy seconds field.
    pub fn effective_delay_ms(&self) -> Option<u64> {
        self.delay_ms.or_else(|| {
            self.delay
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(|s| (s * 1000.0).round() as u64)
        })
    }

    /// The monitored-only filter, when set to a boolean.
    pub fn only_monitored(&self) -> Option<bool> {
        self.only_monitored.as_ref().and_then(Value::as_bool)
    }

    /// Decode the legacy single-`type` action, if one is configured.
    ///
    /// Legacy fields are folded into an entry of the modern shape so both
    /// forms go through the same decoder.
    pub fn legacy_action(&self) -> Option<Result<Action, Error>> {
        let kind = self.legacy_type.as_deref()?;
        let mut entry = Map::new();
        entry.insert("type".into(), Value::String(kind.to_string()));
        let fields = [
            ("url", &self.url),
            ("deeplinkUrl", &self.deeplink_url),
            ("payload", &self.payload),
            ("onlyMonitored", &self.only_monitored),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                entry.insert(key.into(), v.clone());
            }
        }
        Some(Action::decode(&Value::Object(entry)))
    }
}

/// Decode an optional field, dropping a value of the wrong shape.
fn lenient<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(raw) = Option::<Value>::deserialize(d)? else {
        return Ok(None);
    };
    match T::deserialize(&raw) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            warn!(value = %raw, "ignoring button field: {}", e);
            Ok(None)
        }
    }
}

/// Decode the action list; anything but an array counts as empty.
fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    Ok(lenient(d)?.unwrap_or_default())
}

/// Decode a millisecond count, accepting whole-number floats.
fn lenient_millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let Some(raw) = Option::<Value>::deserialize(d)? else {
        return Ok(None);
    };
    let ms = raw.as_u64().or_else(|| {
        raw.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    });
    if ms.is_none() {
        warn!(value = %raw, "ignoring delayMs: not a whole non-negative number");
    }
    Ok(ms)
}

/// Button configurations keyed by `"primary"` / `"secondary"`.
///
/// Buttons are kept raw and decoded on demand so a broken secondary config
/// cannot take the primary down with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShieldConfig(BTreeMap<String, Value>);

impl ShieldConfig {
    /// Interpret a raw store value as a shield config.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(Error::decode(
                None,
                format!("shield config must be an object, found {}", type_name(&other)),
            )),
        }
    }

    /// Configuration for `button`, if present.
    pub fn button(&self, button: Button) -> Result<Option<ButtonConfig>, Error> {
        let Some(raw) = self.0.get(button.as_str()) else {
            return Ok(None);
        };
        ButtonConfig::deserialize(raw)
            .map(Some)
            .map_err(|e| Error::decode(Some(button.as_str()), e.to_string()))
    }

    /// Builder used by fixtures and the CLI.
    pub fn with_button(mut self, button: Button, cfg: &ButtonConfig) -> Self {
        let value = serde_json::to_value(cfg).unwrap_or(Value::Null);
        self.0.insert(button.as_str().to_string(), value);
        self
    }
}

/// Short JSON type name for error messages.
fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn behavior_defaults_to_close() {
        let cfg: ButtonConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(cfg.behavior(), Behavior::Close);
        let cfg: ButtonConfig = serde_json::from_value(json!({ "behavior": "defer" })).unwrap();
        assert_eq!(cfg.behavior(), Behavior::Defer);
        let cfg: ButtonConfig = serde_json::from_value(json!({ "behavior": "linger" })).unwrap();
        assert_eq!(cfg.behavior(), Behavior::Close);
    }

    #[test]
    fn delay_prefers_milliseconds() {
        let cfg: ButtonConfig = serde_json::from_value(json!({ "delay": 1.5 })).unwrap();
        assert_eq!(cfg.effective_delay_ms(), Some(1500));
        let cfg: ButtonConfig =
            serde_json::from_value(json!({ "delay": 1.5, "delayMs": 20 })).unwrap();
        assert_eq!(cfg.effective_delay_ms(), Some(20));
        let cfg: ButtonConfig = serde_json::from_value(json!({ "delay": -2.0 })).unwrap();
        assert_eq!(cfg.effective_delay_ms(), None);
    }

    #[test]
    fn legacy_type_folds_into_action() {
        let cfg: ButtonConfig = serde_json::from_value(json!({
            "type": "openApp",
            "deeplinkUrl": "app://resume",
            "url": "https://ignored"
        }))
        .unwrap();
        let action = cfg.legacy_action().unwrap().unwrap();
        assert_eq!(
            action,
            Action::OpenApp {
                deeplink_url: Some("app://resume".into()),
                bundle_id: None
            }
        );

        let cfg: ButtonConfig = serde_json::from_value(json!({
            "type": "whitelistPossibleFamilyActivitySelection",
            "onlyFamilySelectionIdsContainingMonitoredActivityNames": false
        }))
        .unwrap();
        assert_eq!(
            cfg.legacy_action().unwrap().unwrap(),
            Action::WhitelistSelection {
                only_monitored: Some(false)
            }
        );

        assert!(ButtonConfig::default().legacy_action().is_none());
    }

    #[test]
    fn broken_button_does_not_affect_the_other() {
        let cfg = ShieldConfig::from_value(json!({
            "primary": { "behavior": "close" },
            "secondary": "nope"
        }))
        .unwrap();
        assert!(cfg.button(Button::Primary).unwrap().is_some());
        assert!(cfg.button(Button::Secondary).is_err());
        assert!(ShieldConfig::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn wrong_typed_fields_are_dropped_individually() {
        let cfg: ButtonConfig = serde_json::from_value(json!({
            "actions": [{ "type": "resetBlocks" }],
            "behavior": 1,
            "delayMs": 1500.5,
            "delay": "soon",
            "type": "openUrl",
            "url": 5
        }))
        .unwrap();
        assert_eq!(cfg.actions.len(), 1);
        assert_eq!(cfg.behavior, None);
        assert_eq!(cfg.effective_delay_ms(), None);
        assert!(cfg.legacy_action().unwrap().is_err());

        let cfg: ButtonConfig =
            serde_json::from_value(json!({ "actions": "nope", "delayMs": 3000.0 })).unwrap();
        assert!(cfg.actions.is_empty());
        assert_eq!(cfg.effective_delay_ms(), Some(3000));
    }

    #[test]
    fn only_monitored_reads_booleans_only() {
        let cfg: ButtonConfig = serde_json::from_value(json!({
            "onlyFamilySelectionIdsContainingMonitoredActivityNames": "yes"
        }))
        .unwrap();
        assert_eq!(cfg.only_monitored(), None);
        let cfg: ButtonConfig = serde_json::from_value(json!({
            "onlyFamilySelectionIdsContainingMonitoredActivityNames": false
        }))
        .unwrap();
        assert_eq!(cfg.only_monitored(), Some(false));
    }

    #[test]
    fn with_button_round_trips_through_the_map() {
        let button = ButtonConfig {
            behavior: Some(Behavior::Defer),
            delay_ms: Some(3000),
            ..ButtonConfig::default()
        };
        let cfg = ShieldConfig::default().with_button(Button::Secondary, &button);
        assert_eq!(cfg.button(Button::Secondary).unwrap(), Some(button));
        assert_eq!(cfg.button(Button::Primary).unwrap(), None);
    }
}
