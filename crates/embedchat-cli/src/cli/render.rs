//! Terminal rendering of widget events and transcript entries.

use console::style;
use serde_json::json;

use embedchat_core::chat::{Rejection, SubmitOutcome};
use embedchat_types::event::{ControllerState, WidgetEvent};
use embedchat_types::transcript::{Role, TranscriptEntry};

/// Styled one-line rendering of a transcript entry.
pub fn entry_line(entry: &TranscriptEntry) -> String {
    let label = match entry.role {
        Role::Visitor => style("you").cyan().bold(),
        Role::Bot if entry.text.starts_with("Error: ") => style("bot").red().bold(),
        Role::Bot => style("bot").green().bold(),
        Role::Agent => style("agent").magenta().bold(),
    };
    format!("  {label}  {}", entry.text)
}

/// Render an event for the interactive loop.
///
/// Visitor echoes and state changes are not printed: the prompt already
/// shows what was typed.
pub fn event_line(event: &WidgetEvent) -> Option<String> {
    match event {
        WidgetEvent::VisitorMessage { .. } => None,
        WidgetEvent::BotMessage { entry }
        | WidgetEvent::AgentMessage { entry }
        | WidgetEvent::Error { entry, .. } => Some(entry_line(entry)),
        WidgetEvent::HandoffRequested { handoff_id, status } => Some(format!(
            "  {} handoff {} ({status}); an operator will reply here",
            style("*").yellow().bold(),
            style(handoff_id).dim()
        )),
        WidgetEvent::StateChanged {
            state: ControllerState::Sending,
        } => Some(format!("  {}", style("thinking...").dim())),
        WidgetEvent::StateChanged { .. } => None,
    }
}

/// Explain why a submission was not sent.
pub fn rejection_text(rejection: Rejection) -> &'static str {
    match rejection {
        Rejection::Empty => "nothing to send",
        Rejection::Busy => "still waiting for the previous answer",
        Rejection::TornDown => "widget is closed",
    }
}

/// JSON form of a submission outcome for `--json` output.
pub fn outcome_json(outcome: &SubmitOutcome, conversation_id: Option<&str>) -> serde_json::Value {
    match outcome {
        SubmitOutcome::Answered { text } => json!({
            "status": "answered",
            "answer": text,
            "conversation_id": conversation_id,
        }),
        SubmitOutcome::HandedOff { handoff_id, status } => json!({
            "status": "handed_off",
            "handoff_id": handoff_id,
            "handoff_status": status,
            "conversation_id": conversation_id,
        }),
        SubmitOutcome::Failed(err) => json!({
            "status": "failed",
            "error": err.to_string(),
        }),
        SubmitOutcome::Rejected(rejection) => json!({
            "status": "rejected",
            "reason": rejection_text(*rejection),
        }),
        SubmitOutcome::Discarded => json!({ "status": "discarded" }),
    }
}
