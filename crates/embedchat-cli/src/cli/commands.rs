//! One-shot subcommands: `ask`, `poll`, `handoff`, `forget`.

use console::style;

use embedchat_core::chat::SubmitOutcome;
use embedchat_types::transcript::Role;

use super::render::{entry_line, outcome_json, rejection_text};
use super::setup::CliWidget;

const DEFAULT_HANDOFF_QUESTION: &str = "Please connect me to a human.";

/// Send one question and print the reply.
pub async fn ask(widget: &CliWidget, question: &str, json: bool) -> anyhow::Result<()> {
    let outcome = widget.submit(question).await;
    print_outcome(widget, &outcome, json)?;
    if let SubmitOutcome::Failed(err) = outcome {
        return Err(err.into());
    }
    Ok(())
}

/// Fetch agent messages once and print the new ones.
pub async fn poll(widget: &CliWidget, json: bool) -> anyhow::Result<()> {
    let controller = widget.controller();
    if controller.conversation_id().is_none() {
        if json {
            println!("{}", serde_json::json!({ "messages": [], "conversation_id": null }));
        } else {
            println!("  {}", style("No conversation yet; ask a question first.").dim());
        }
        return Ok(());
    }

    controller.poll_updates().await?;
    let messages: Vec<_> = controller
        .transcript()
        .into_iter()
        .filter(|e| e.role == Role::Agent)
        .collect();

    if json {
        let value = serde_json::json!({
            "conversation_id": controller.conversation_id(),
            "since_iso": controller.cursor(),
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if messages.is_empty() {
        println!("  {}", style("No new agent messages.").dim());
    } else {
        for entry in &messages {
            println!("{}", entry_line(entry));
        }
    }
    Ok(())
}

/// Request a human operator for the current conversation.
pub async fn handoff(
    widget: &CliWidget,
    question: Option<&str>,
    reason: &str,
    destination: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let question = question.unwrap_or(DEFAULT_HANDOFF_QUESTION);
    let outcome = widget
        .controller()
        .request_handoff(Some(question), Some(reason), destination)
        .await;
    print_outcome(widget, &outcome, json)?;
    if let SubmitOutcome::Failed(err) = outcome {
        return Err(err.into());
    }
    Ok(())
}

/// Clear the stored conversation id.
pub async fn forget(widget: &CliWidget, json: bool) -> anyhow::Result<()> {
    let previous = widget.controller().conversation_id();
    widget.controller().forget_conversation().await;

    if json {
        println!("{}", serde_json::json!({ "forgotten": previous }));
    } else {
        match previous {
            Some(id) => println!(
                "  {} Forgot conversation {}",
                style("✓").green().bold(),
                style(id).dim()
            ),
            None => println!("  {}", style("No stored conversation.").dim()),
        }
    }
    Ok(())
}

fn print_outcome(widget: &CliWidget, outcome: &SubmitOutcome, json: bool) -> anyhow::Result<()> {
    let conversation_id = widget.controller().conversation_id();
    if json {
        let value = outcome_json(outcome, conversation_id.as_deref());
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match outcome {
        SubmitOutcome::Answered { .. } | SubmitOutcome::Failed(_) => {
            for entry in widget.controller().transcript() {
                if entry.role != Role::Visitor {
                    println!("{}", entry_line(&entry));
                }
            }
        }
        SubmitOutcome::HandedOff { handoff_id, status } => {
            println!(
                "  {} Handoff {} is {status}",
                style("✓").green().bold(),
                style(handoff_id).dim()
            );
        }
        SubmitOutcome::Rejected(rejection) => {
            println!("  {} {}", style("!").yellow().bold(), rejection_text(*rejection));
        }
        SubmitOutcome::Discarded => {}
    }
    if let Some(id) = conversation_id {
        println!("  {}", style(format!("conversation {id}")).dim());
    }
    Ok(())
}
