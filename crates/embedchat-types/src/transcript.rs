//! Transcript entry types.
//!
//! The transcript is the append-only sequence of messages shown to the
//! visitor: their own questions, bot answers, and operator (agent) messages
//! delivered through polling.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The website visitor using the widget.
    Visitor,
    /// The AI bot answering through the ask endpoint.
    Bot,
    /// A human operator, delivered only through conversation updates.
    Agent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Visitor => write!(f, "visitor"),
            Role::Bot => write!(f, "bot"),
            Role::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "visitor" => Ok(Role::Visitor),
            "bot" => Ok(Role::Bot),
            "agent" => Ok(Role::Agent),
            other => Err(format!("invalid transcript role: '{other}'")),
        }
    }
}

/// A single displayed message.
///
/// `id` is only present for agent entries; it is the server-assigned
/// message id used to avoid appending the same agent message twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl TranscriptEntry {
    pub fn visitor(text: impl Into<String>) -> Self {
        Self {
            role: Role::Visitor,
            text: text.into(),
            id: None,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            id: None,
        }
    }

    pub fn agent(id: Option<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            id,
        }
    }
}
