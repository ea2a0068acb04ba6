//! CLI command definitions for the `embedchat` binary.
//!
//! Global flags describe the widget mount (API base, bot, origin, session);
//! subcommands drive one mounted widget.

pub mod chat;
pub mod commands;
pub mod render;
pub mod setup;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Talk to a knowledge-base bot through its public embed API.
#[derive(Parser, Debug)]
#[command(name = "embedchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Widget config file (TOML). Flags override its values.
    #[arg(long, global = true, env = "EMBEDCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the embed API.
    #[arg(long, global = true, env = "EMBEDCHAT_API_BASE")]
    pub api_base: Option<String>,

    /// Bot identifier.
    #[arg(long, global = true, env = "EMBEDCHAT_BOT_ID")]
    pub bot_id: Option<String>,

    /// Origin presented to the server (e.g. https://acme.com).
    #[arg(long, global = true, env = "EMBEDCHAT_ORIGIN")]
    pub origin: Option<String>,

    /// Session id sent with token requests (3-64 characters).
    #[arg(long, global = true)]
    pub session_id: Option<String>,

    /// Resume this conversation instead of the stored one.
    #[arg(long, global = true)]
    pub conversation_id: Option<String>,

    /// Retrieval depth for answers (1-20).
    #[arg(long, global = true)]
    pub top_k: Option<u32>,

    /// Previous turns the server should remember (0-40).
    #[arg(long, global = true)]
    pub memory_turns: Option<u32>,

    /// Conversation store file. Defaults to the platform data directory.
    #[arg(long, global = true, env = "EMBEDCHAT_STORE")]
    pub store: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true, hide = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat with live agent messages.
    Chat,

    /// Ask a single question and print the reply.
    Ask {
        /// The question to send.
        question: String,
    },

    /// Fetch agent messages once.
    Poll,

    /// Ask for a human operator to take over.
    Handoff {
        /// Question to hand over. Defaults to "Please connect me to a human."
        #[arg(long)]
        question: Option<String>,

        /// Reason recorded with the handoff.
        #[arg(long, default_value = "human_handoff")]
        reason: String,

        /// Destination queue or channel.
        #[arg(long)]
        destination: Option<String>,
    },

    /// Forget the stored conversation for this bot and origin.
    Forget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ask_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "embedchat",
            "ask",
            "What is your refund policy?",
            "--bot-id",
            "b1",
            "--top-k",
            "3",
            "-vv",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Ask { ref question } if question == "What is your refund policy?"));
        assert_eq!(cli.bot_id.as_deref(), Some("b1"));
        assert_eq!(cli.top_k, Some(3));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn handoff_reason_has_a_default() {
        let cli = Cli::try_parse_from(["embedchat", "handoff"]).unwrap();
        match cli.command {
            Commands::Handoff {
                reason, question, ..
            } => {
                assert_eq!(reason, "human_handoff");
                assert_eq!(question, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }
}
