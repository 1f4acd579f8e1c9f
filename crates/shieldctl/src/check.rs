//! Offline validation of the configuration held in a store.

use std::fmt;

use serde_json::Value;
use shield_config::{Action, ShieldConfig};
use shield_store::SelectionStore;
use shield_types::Button;

use crate::Result;

/// Something the engine would skip or ignore at press time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// Store key holding the configuration.
    pub key: String,
    /// Button, when the problem is inside one.
    pub button: Option<Button>,
    /// Action index, when the problem is a single entry.
    pub index: Option<usize>,
    /// What is wrong.
    pub message: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(b) = self.button {
            write!(f, ".{b}")?;
        }
        if let Some(i) = self.index {
            write!(f, "[{i}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Validate the global configuration and every selection's configuration.
///
/// Returns the keys inspected and the problems found.
pub fn check_store(store: &SelectionStore) -> Result<(Vec<String>, Vec<Problem>)> {
    let settings = store.settings();
    let mut keys = vec![settings.global_config_key.clone()];
    keys.extend(
        store
            .selections()?
            .iter()
            .map(|s| settings.selection_config_key(&s.id)),
    );

    let mut inspected = Vec::new();
    let mut problems = Vec::new();
    for key in keys {
        let Some(raw) = store.read_raw(&key)? else {
            continue;
        };
        inspected.push(key.clone());
        check_config(&key, raw, &mut problems);
    }
    Ok((inspected, problems))
}

/// Check one stored configuration value.
fn check_config(key: &str, raw: Value, problems: &mut Vec<Problem>) {
    let problem = |button, index, message: String| Problem {
        key: key.to_string(),
        button,
        index,
        message,
    };
    let config = match ShieldConfig::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            problems.push(problem(None, None, e.pretty()));
            return;
        }
    };
    for button in [Button::Primary, Button::Secondary] {
        let cfg = match config.button(button) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                problems.push(problem(Some(button), None, e.pretty()));
                continue;
            }
        };
        for (index, entry) in cfg.actions.iter().enumerate() {
            match Action::decode(entry) {
                Ok(Action::Unknown) => problems.push(problem(
                    Some(button),
                    Some(index),
                    format!(
                        "unknown action kind '{}'",
                        Action::entry_kind(entry).unwrap_or("?")
                    ),
                )),
                Ok(_) => {}
                Err(e) => problems.push(problem(Some(button), Some(index), e.pretty())),
            }
        }
        if let Some(Err(e)) = cfg.legacy_action() {
            problems.push(problem(Some(button), None, format!("legacy type: {}", e.pretty())));
        }
    }
}
