//! Shared identifiers for shielded entities.
//!
//! Tokens are minted by the host's identity system. This crate never decodes
//! them; it only stores and compares them. A [`Selection`] groups tokens of the
//! three kinds under a stable id.
#![warn(missing_docs)]

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing a [`TokenKind`] or [`Button`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {what} '{value}'")]
pub struct ParseError {
    /// Name of the type being parsed.
    what: &'static str,
    /// Offending input.
    value: String,
}

/// Opaque, comparable identifier for a blocked entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap an externally minted identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of entity a token refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    /// An application.
    Application,
    /// A web domain.
    WebDomain,
    /// An activity category.
    Category,
}

impl TokenKind {
    /// All kinds, in canonical order.
    pub const ALL: [Self; 3] = [Self::Application, Self::WebDomain, Self::Category];

    /// Stable lowercase name used in logs and on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::WebDomain => "web-domain",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "application" | "app" => Ok(Self::Application),
            "web-domain" | "webdomain" | "domain" => Ok(Self::WebDomain),
            "category" => Ok(Self::Category),
            _ => Err(ParseError {
                what: "token kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Shield button pressed by the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// The primary (top) button.
    Primary,
    /// The secondary (bottom) button.
    Secondary,
}

impl Button {
    /// Key under which this button's configuration is stored.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Button {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            _ => Err(ParseError {
                what: "button",
                value: s.to_string(),
            }),
        }
    }
}

/// A named group of tokens, created by the controlling process.
///
/// Token sets have set semantics. An empty selection is valid and matches
/// nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Stable selection id. Empty for anonymous selections such as the whitelist.
    #[serde(default)]
    pub id: String,
    /// Application tokens.
    #[serde(default)]
    pub application_tokens: BTreeSet<Token>,
    /// Category tokens.
    #[serde(default)]
    pub category_tokens: BTreeSet<Token>,
    /// Web domain tokens.
    #[serde(default)]
    pub web_domain_tokens: BTreeSet<Token>,
}

impl Selection {
    /// Create an empty selection with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, kind: TokenKind, token: impl Into<Token>) -> Self {
        self.insert(kind, token.into());
        self
    }

    /// Token set for `kind`.
    pub fn tokens(&self, kind: TokenKind) -> &BTreeSet<Token> {
        match kind {
            TokenKind::Application => &self.application_tokens,
            TokenKind::WebDomain => &self.web_domain_tokens,
            TokenKind::Category => &self.category_tokens,
        }
    }

    /// Mutable token set for `kind`.
    fn tokens_mut(&mut self, kind: TokenKind) -> &mut BTreeSet<Token> {
        match kind {
            TokenKind::Application => &mut self.application_tokens,
            TokenKind::WebDomain => &mut self.web_domain_tokens,
            TokenKind::Category => &mut self.category_tokens,
        }
    }

    /// Whether the `kind` set contains `token`.
    pub fn contains(&self, kind: TokenKind, token: &Token) -> bool {
        self.tokens(kind).contains(token)
    }

    /// Insert a token; returns false when it was already present.
    pub fn insert(&mut self, kind: TokenKind, token: Token) -> bool {
        self.tokens_mut(kind).insert(token)
    }

    /// Total number of tokens across all three kinds.
    pub fn total_len(&self) -> usize {
        self.application_tokens.len() + self.category_tokens.len() + self.web_domain_tokens.len()
    }

    /// True when no kind holds any token.
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Add every token of `other` to this selection. The id is left untouched.
    pub fn union_with(&mut self, other: &Self) {
        for kind in TokenKind::ALL {
            let dst = self.tokens_mut(kind);
            dst.extend(other.tokens(kind).iter().cloned());
        }
    }

    /// Remove every token of `other` from this selection.
    pub fn subtract(&mut self, other: &Self) {
        for kind in TokenKind::ALL {
            let remove = other.tokens(kind);
            self.tokens_mut(kind).retain(|t| !remove.contains(t));
        }
    }

    /// A copy of this selection without the tokens in `other`.
    pub fn subtracting(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.subtract(other);
        out
    }
}

/// One button press delivered by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShieldEvent {
    /// Which button was pressed.
    pub button: Button,
    /// The blocked entity's token.
    pub token: Token,
    /// Kind of the blocked entity.
    pub kind: TokenKind,
}

impl ShieldEvent {
    /// Construct an event.
    pub fn new(button: Button, token: impl Into<Token>, kind: TokenKind) -> Self {
        Self {
            button,
            token: token.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_has_set_semantics() {
        let mut s = Selection::new("s");
        assert!(s.insert(TokenKind::Application, "a".into()));
        assert!(!s.insert(TokenKind::Application, "a".into()));
        assert_eq!(s.total_len(), 1);
        assert!(s.contains(TokenKind::Application, &Token::new("a")));
        assert!(!s.contains(TokenKind::Category, &Token::new("a")));
    }

    #[test]
    fn union_and_subtract_respect_kinds() {
        let mut base = Selection::new("base")
            .with(TokenKind::Application, "a")
            .with(TokenKind::WebDomain, "d");
        let other = Selection::new("other")
            .with(TokenKind::WebDomain, "d")
            .with(TokenKind::Category, "c");

        base.union_with(&other);
        assert_eq!(base.id, "base");
        assert_eq!(base.total_len(), 3);

        base.subtract(&other);
        assert_eq!(base.total_len(), 1);
        assert!(base.contains(TokenKind::Application, &Token::new("a")));
    }

    #[test]
    fn parse_kind_and_button() {
        assert_eq!("web-domain".parse::<TokenKind>(), Ok(TokenKind::WebDomain));
        assert_eq!("Application".parse::<TokenKind>(), Ok(TokenKind::Application));
        assert_eq!("secondary".parse::<Button>(), Ok(Button::Secondary));
        assert!("tertiary".parse::<Button>().is_err());
    }

    #[test]
    fn selection_json_uses_camel_case() {
        let s = Selection::new("s1").with(TokenKind::WebDomain, "example");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["webDomainTokens"][0], "example");
        let back: Selection =
            serde_json::from_value(serde_json::json!({ "applicationTokens": ["x", "x"] })).unwrap();
        assert_eq!(back.total_len(), 1);
        assert!(back.id.is_empty());
    }
}
