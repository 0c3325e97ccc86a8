//! Core identifier types for pairlink.
//!
//! This module provides strongly-typed identifiers for destinations, chats,
//! sent messages, and pairing codes. Validation happens at construction, so
//! a value of these types is always well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Suffix the messaging network appends to a number to address a direct chat.
pub const CHAT_ID_SUFFIX: &str = "@c.us";

/// A validated destination number: country code followed by the subscriber
/// number, ASCII digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Destination(String);

impl Destination {
    /// Parse a destination from user input.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MissingField` if the input is empty and
    /// `CoreError::InvalidDestination` if it contains anything but digits.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() {
            return Err(CoreError::MissingField("number"));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidDestination(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Return the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Destination {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Destination {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Destination> for String {
    fn from(d: Destination) -> Self {
        d.0
    }
}

/// A network-specific channel identifier derived from a [`Destination`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Destination> for ChatId {
    fn from(destination: &Destination) -> Self {
        Self(format!("{}{CHAT_ID_SUFFIX}", destination.as_str()))
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier the messaging network assigns to a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a raw message identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A one-time pairing token to be scanned with the companion app.
///
/// The `Debug` output never contains the token itself, so a code can be
/// carried through structured logs safely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairingCode(String);

impl PairingCode {
    /// Wrap a raw pairing token.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Return the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the token in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PairingCode(<{} bytes>)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_accepts_digits() {
        let d = Destination::parse("6281234567890").unwrap();
        assert_eq!(d.as_str(), "6281234567890");
        assert_eq!(d.to_string(), "6281234567890");
    }

    #[test]
    fn destination_rejects_symbols() {
        for input in ["abc123", "+6281234567890", "62 812", "62-812", "６２"] {
            assert_eq!(
                Destination::parse(input),
                Err(CoreError::InvalidDestination(input.to_string())),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn destination_rejects_empty() {
        assert_eq!(
            Destination::parse(""),
            Err(CoreError::MissingField("number"))
        );
    }

    #[test]
    fn chat_id_appends_suffix() {
        let d: Destination = "6281234567890".parse().unwrap();
        assert_eq!(ChatId::from(&d).as_str(), "6281234567890@c.us");
    }

    #[test]
    fn destination_serde_validates() {
        let ok: Destination = serde_json::from_str("\"123\"").unwrap();
        assert_eq!(ok.as_str(), "123");
        assert!(serde_json::from_str::<Destination>("\"12a\"").is_err());
    }

    #[test]
    fn pairing_code_debug_is_redacted() {
        let code = PairingCode::new("2@secret-token");
        let debug = format!("{code:?}");
        assert!(!debug.contains("secret"));
        assert_eq!(debug, "PairingCode(<14 bytes>)");
        assert_eq!(code.as_str(), "2@secret-token");
    }

    #[test]
    fn message_id_serializes_transparently() {
        let id = MessageId::new("true_6281234567890@c.us_ABC");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"true_6281234567890@c.us_ABC\""
        );
    }
}
