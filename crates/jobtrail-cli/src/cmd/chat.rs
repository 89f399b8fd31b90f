//! `jt chat ...`: per-opportunity conversation threads.

use super::Session;
use crate::output::{fail, pretty_section, render_mode};
use clap::{Args, Subcommand};
use jobtrail_core::{Action, ChatMessage, EntityId, ErrorCode, Sender};
use serde::Serialize;
use std::io::Write;

#[derive(Subcommand, Debug)]
pub enum ChatCommand {
    /// Append a message to an opportunity's thread.
    Send(ChatSendArgs),
    /// Print an opportunity's thread.
    Show(ChatShowArgs),
}

#[derive(Args, Debug)]
pub struct ChatSendArgs {
    /// Opportunity id.
    pub opportunity: String,

    /// Message text.
    pub text: String,

    /// Who wrote it: user or assistant.
    #[arg(long, default_value = "user")]
    pub sender: Sender,
}

#[derive(Args, Debug)]
pub struct ChatShowArgs {
    /// Opportunity id.
    pub opportunity: String,
}

#[derive(Debug, Serialize)]
struct Thread<'a> {
    opportunity_id: &'a EntityId,
    messages: &'a [ChatMessage],
}

pub fn run_chat(command: &ChatCommand, session: &mut Session) -> anyhow::Result<()> {
    match command {
        ChatCommand::Send(args) => run_send(args, session),
        ChatCommand::Show(args) => run_show(args, session),
    }
}

fn run_send(args: &ChatSendArgs, session: &mut Session) -> anyhow::Result<()> {
    let owner = session.require_opportunity(&args.opportunity)?.id.clone();
    let output = session.output;
    if args.text.trim().is_empty() {
        return fail(output, ErrorCode::MalformedAction, "message text is empty");
    }

    let before = session.state().thread(&owner).len();
    let state = session.commit(Action::AddChatMessage {
        opportunity_id: owner.clone(),
        text: args.text.clone(),
        sender: args.sender,
    })?;

    let thread = state.thread(&owner);
    let Some(message) = thread.get(before) else {
        anyhow::bail!("message for {owner} was not recorded");
    };
    render_mode(
        output,
        message,
        |m, w| writeln!(w, "{}\t{}\t{}", m.id, m.sender, m.text),
        |m, w| writeln!(w, "[{}] {}: {}", m.timestamp.format("%Y-%m-%d %H:%M"), m.sender, m.text),
    )
}

fn run_show(args: &ChatShowArgs, session: &Session) -> anyhow::Result<()> {
    let opportunity = session.require_opportunity(&args.opportunity)?;
    let thread = Thread {
        opportunity_id: &opportunity.id,
        messages: session.state().thread(&opportunity.id),
    };
    let heading = format!("{} at {}", opportunity.position, opportunity.company);

    render_mode(
        session.output,
        &thread,
        |t, w| {
            for m in t.messages {
                writeln!(w, "{}\t{}\t{}\t{}", m.id, m.timestamp.to_rfc3339(), m.sender, m.text)?;
            }
            Ok(())
        },
        |t, w| {
            pretty_section(w, &heading)?;
            if t.messages.is_empty() {
                return writeln!(w, "No messages yet.");
            }
            for m in t.messages {
                writeln!(w, "[{}] {}: {}", m.timestamp.format("%Y-%m-%d %H:%M"), m.sender, m.text)?;
            }
            Ok(())
        },
    )
}
