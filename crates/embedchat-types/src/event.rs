//! Events emitted by a widget instance.
//!
//! A rendering layer subscribes to these instead of being called back
//! directly. Every transcript append produces exactly one message event
//! (`VisitorMessage`, `BotMessage`, `AgentMessage` or `Error`).

use serde::{Deserialize, Serialize};

use crate::transcript::TranscriptEntry;

/// Submission state of the conversation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    /// Ready to accept a submission.
    Idle,
    /// A question is in flight; further submissions are rejected.
    Sending,
}

/// Events broadcast to the rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetEvent {
    /// The visitor's question was appended (always before the network call).
    VisitorMessage { entry: TranscriptEntry },

    /// A bot answer was appended.
    BotMessage { entry: TranscriptEntry },

    /// An operator message arrived through polling.
    AgentMessage { entry: TranscriptEntry },

    /// A submission failed; `entry` is the `Error: ...` bot entry appended
    /// to the transcript.
    Error {
        entry: TranscriptEntry,
        reason: String,
    },

    /// A handoff to a human operator was accepted by the server.
    HandoffRequested { handoff_id: String, status: String },

    /// The controller moved between `idle` and `sending`.
    StateChanged { state: ControllerState },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_tagging() {
        let event = WidgetEvent::StateChanged {
            state: ControllerState::Sending,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["state"], "sending");
    }

    #[test]
    fn test_message_event_carries_entry() {
        let event = WidgetEvent::BotMessage {
            entry: TranscriptEntry::bot("Hello!"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "bot_message");
        assert_eq!(json["entry"]["text"], "Hello!");
    }
}
