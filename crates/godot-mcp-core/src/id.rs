//! Correlation ids for upstream commands.
//!
//! The bridge always sends ids as decimal strings, but the addon is free to
//! echo them back as numbers. Both forms decode to the same [`CommandId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier attached to an upstream command and echoed in its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawId", into = "String")]
pub struct CommandId(String);

impl CommandId {
    /// Wrap an already-formatted id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for CommandId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl FromStr for CommandId {
    type Err = CommandIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(CommandIdError::Empty);
        }
        Ok(Self(s.to_string()))
    }
}

impl From<CommandId> for String {
    fn from(id: CommandId) -> Self {
        id.0
    }
}

/// Wire forms accepted for an id.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl TryFrom<RawId> for CommandId {
    type Error = CommandIdError;

    fn try_from(raw: RawId) -> Result<Self, Self::Error> {
        match raw {
            RawId::Text(s) => s.parse(),
            RawId::Number(n) if n.is_u64() || n.is_i64() => Ok(Self(n.to_string())),
            RawId::Number(n) => Err(CommandIdError::Fractional(n.to_string())),
        }
    }
}

/// Error parsing a command id.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CommandIdError {
    #[error("command id cannot be empty")]
    Empty,
    #[error("command id must be an integer, got: {0}")]
    Fractional(String),
}
