//! Interactive chat loop.
//!
//! Reads questions with an async readline prompt while a background task
//! prints widget events (answers, errors, agent messages) through the
//! prompt's shared writer, so agent messages show up between questions.

use std::io::Write;

use console::style;
use rustyline_async::{Readline, ReadlineEvent, SharedWriter};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use embedchat_core::chat::SubmitOutcome;
use embedchat_types::event::WidgetEvent;

use super::render::{entry_line, event_line, rejection_text};
use super::setup::CliWidget;

/// In-chat slash commands.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    Exit,
    /// Print the transcript so far.
    History,
    /// Ask for a human operator, with an optional reason.
    Handoff(Option<String>),
    /// Drop the stored conversation.
    Forget,
    Unknown(String),
}

/// Parse input as a slash command. `None` if it is a question.
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (trimmed, None),
    };

    Some(match cmd.to_lowercase().as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/history" => ChatCommand::History,
        "/handoff" | "/human" => ChatCommand::Handoff(arg.map(str::to_string)),
        "/forget" | "/new" => ChatCommand::Forget,
        other => ChatCommand::Unknown(other.to_string()),
    })
}

fn print_help(out: &mut SharedWriter) {
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", style("Available commands:").bold());
    for (cmd, help) in [
        ("/help", "Show this help message"),
        ("/handoff [reason]", "Ask for a human operator"),
        ("/history", "Show the conversation so far"),
        ("/forget", "Start a new conversation"),
        ("/exit", "Leave the chat"),
    ] {
        let _ = writeln!(out, "  {:<20} {help}", style(cmd).cyan());
    }
    let _ = writeln!(out);
}

fn print_banner(widget: &CliWidget) {
    let session = widget.controller().session();
    println!();
    println!("  {}", style(format!("embedchat · {}", session.bot_id)).cyan().bold());
    println!("  {}  {}", style("Origin:").bold(), style(&session.origin).dim());
    match widget.controller().conversation_id() {
        Some(id) => println!("  {}  {}", style("Resuming:").bold(), style(id).dim()),
        None => println!("  {}  {}", style("Conversation:").bold(), style("new").dim()),
    }
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}

/// Run the interactive loop until the user exits.
pub async fn run_chat(widget: &CliWidget, json: bool) -> anyhow::Result<()> {
    if !json {
        print_banner(widget);
    }

    let (mut rl, mut out) = Readline::new(format!("{} ", style("you ›").cyan().bold()))
        .map_err(|e| anyhow::anyhow!("failed to initialize input: {e}"))?;

    let printer = tokio::spawn({
        let mut events = widget.subscribe();
        let mut out = out.clone();
        async move {
            loop {
                match events.recv().await {
                    Ok(event) => print_event(&mut out, &event, json),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event printer fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    });
    widget.start();

    loop {
        let line = match rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => line,
            Ok(ReadlineEvent::Eof) | Ok(ReadlineEvent::Interrupted) => break,
            Err(err) => {
                debug!("readline error: {err}");
                break;
            }
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line.clone());

        match parse_command(&line) {
            None => {
                if let SubmitOutcome::Rejected(rejection) = widget.submit(&line).await {
                    let _ = writeln!(out, "  {} {}", style("!").yellow(), rejection_text(rejection));
                }
            }
            Some(ChatCommand::Exit) => break,
            Some(ChatCommand::Help) => print_help(&mut out),
            Some(ChatCommand::History) => {
                for entry in widget.controller().transcript() {
                    let _ = writeln!(out, "{}", entry_line(&entry));
                }
            }
            Some(ChatCommand::Handoff(reason)) => {
                let outcome = widget
                    .controller()
                    .request_handoff(None, Some(reason.as_deref().unwrap_or("human_handoff")), None)
                    .await;
                if let SubmitOutcome::Rejected(rejection) = outcome {
                    let _ = writeln!(out, "  {} {}", style("!").yellow(), rejection_text(rejection));
                }
            }
            Some(ChatCommand::Forget) => {
                widget.controller().forget_conversation().await;
                let _ = writeln!(out, "  {}", style("Started a new conversation.").dim());
            }
            Some(ChatCommand::Unknown(cmd)) => {
                let _ = writeln!(
                    out,
                    "  {} Unknown command {}. Type /help.",
                    style("!").yellow(),
                    style(cmd).cyan()
                );
            }
        }
    }

    widget.teardown().await;
    printer.abort();
    let _ = rl.flush();
    Ok(())
}

fn print_event(out: &mut SharedWriter, event: &WidgetEvent, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(out, "{line}");
        }
        return;
    }
    if let Some(line) = event_line(event) {
        let _ = writeln!(out, "{line}");
    }
}
