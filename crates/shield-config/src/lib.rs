//! Configuration types for shield actions.
//!
//! Two kinds of configuration live here:
//! - the persisted, JSON-shaped button configuration written by the
//!   controlling process ([`ShieldConfig`], [`ButtonConfig`], [`Action`])
//! - the engine's own [`Settings`] (store key names, fallback URI), loadable
//!   from JSON or RON.
#![warn(missing_docs)]

mod action;
mod button;
mod defaults;
mod error;
mod loader;
mod settings;

pub use action::Action;
pub use button::{Behavior, ButtonConfig, ShieldConfig};
pub use error::Error;
pub use loader::load_settings;
pub use settings::Settings;
