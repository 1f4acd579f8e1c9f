//! Placeholder values computed once per event and substituted into templates.
//!
//! Templates reference placeholders as `{name}`. A known placeholder with no
//! value becomes the empty string; unknown names are left as written.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use shield_types::{ShieldEvent, TokenKind};

use crate::deps::TokenNames;

/// Name of the pressed button (`primary` / `secondary`).
pub const ACTION: &str = "action";
/// Display name of the blocked application, if any.
pub const APPLICATION_NAME: &str = "applicationName";
/// Domain of the blocked web domain, if any.
pub const WEB_DOMAIN: &str = "webDomain";
/// Id of the most specific matching selection, if any.
pub const SELECTION_ID: &str = "familyActivitySelectionId";

/// Matches `{identifier}`.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// Symbolic name to optional value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    /// Known placeholders and their values.
    values: BTreeMap<&'static str, Option<String>>,
}

impl Placeholders {
    /// Compute placeholders for `event`.
    pub fn for_event(
        event: &ShieldEvent,
        names: &dyn TokenNames,
        selection_id: Option<&str>,
    ) -> Self {
        let application_name = match event.kind {
            TokenKind::Application => names.application_name(&event.token),
            _ => None,
        };
        let web_domain = match event.kind {
            TokenKind::WebDomain => names.web_domain(&event.token),
            _ => None,
        };
        let mut values = BTreeMap::new();
        values.insert(ACTION, Some(event.button.as_str().to_string()));
        values.insert(APPLICATION_NAME, application_name);
        values.insert(WEB_DOMAIN, web_domain);
        values.insert(SELECTION_ID, selection_id.map(str::to_string));
        Self { values }
    }

    /// Value of a placeholder; `None` when unknown or unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.as_deref()
    }

    /// Substitute placeholders in a template string.
    pub fn apply(&self, template: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures<'_>| {
                let name = &caps[1];
                match self.values.get(name) {
                    Some(v) => v.clone().unwrap_or_default(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Substitute placeholders in every string inside `value`, recursively.
    pub fn apply_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.apply(s)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.apply_value(v)).collect())
            }
            Value::Object(map) => Value::Object(self.apply_map(map)),
            other => other.clone(),
        }
    }

    /// Substitute placeholders in the values of a mapping. Keys are untouched.
    pub fn apply_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        map.iter()
            .map(|(k, v)| (k.clone(), self.apply_value(v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shield_types::{Button, Token};

    use super::*;

    struct Names;

    impl TokenNames for Names {
        fn application_name(&self, token: &Token) -> Option<String> {
            (token.as_str() == "A").then(|| "Game".to_string())
        }
        fn web_domain(&self, _token: &Token) -> Option<String> {
            Some("example.com".to_string())
        }
    }

    #[test]
    fn values_follow_event_kind() {
        let ev = ShieldEvent::new(Button::Primary, "A", TokenKind::Application);
        let p = Placeholders::for_event(&ev, &Names, Some("s1"));
        assert_eq!(p.get(ACTION), Some("primary"));
        assert_eq!(p.get(APPLICATION_NAME), Some("Game"));
        assert_eq!(p.get(WEB_DOMAIN), None);
        assert_eq!(p.get(SELECTION_ID), Some("s1"));

        let ev = ShieldEvent::new(Button::Secondary, "D", TokenKind::WebDomain);
        let p = Placeholders::for_event(&ev, &Names, None);
        assert_eq!(p.get(WEB_DOMAIN), Some("example.com"));
        assert_eq!(p.get(APPLICATION_NAME), None);
    }

    #[test]
    fn apply_substitutes_known_and_blanks_unset() {
        let ev = ShieldEvent::new(Button::Secondary, "D", TokenKind::WebDomain);
        let p = Placeholders::for_event(&ev, &Names, None);
        assert_eq!(
            p.apply("app://{action}/{webDomain}?sel={familyActivitySelectionId}&x={other}"),
            "app://secondary/example.com?sel=&x={other}"
        );
    }

    #[test]
    fn apply_value_recurses() {
        let ev = ShieldEvent::new(Button::Primary, "A", TokenKind::Application);
        let p = Placeholders::for_event(&ev, &Names, None);
        let out = p.apply_value(&json!({
            "title": "{applicationName} blocked",
            "nested": { "list": ["{action}", 3, true] },
            "n": 1
        }));
        assert_eq!(
            out,
            json!({
                "title": "Game blocked",
                "nested": { "list": ["primary", 3, true] },
                "n": 1
            })
        );
    }
}
