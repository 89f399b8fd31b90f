//! `jt show`: one opportunity with its events and chat thread.

use super::Session;
use super::opportunity::{OpportunityView, render_pretty, render_text};
use crate::output::{pretty_section, render_mode};
use clap::Args;
use jobtrail_core::ChatMessage;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Opportunity id. Numeric and string forms are interchangeable.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    #[serde(flatten)]
    view: OpportunityView<'a>,
    messages: &'a [ChatMessage],
}

pub fn run_show(args: &ShowArgs, session: &Session) -> anyhow::Result<()> {
    let opportunity = session.require_opportunity(&args.id)?;
    let state = session.state();

    let output = ShowOutput {
        view: OpportunityView {
            opportunity,
            events: state.events_for(&opportunity.id),
        },
        messages: state.thread(&opportunity.id),
    };

    render_mode(
        session.output,
        &output,
        |out, w| {
            render_text(&out.view, w)?;
            for message in out.messages {
                writeln!(w, "  {}\t{}\t{}", message.timestamp.to_rfc3339(), message.sender, message.text)?;
            }
            Ok(())
        },
        |out, w| {
            render_pretty(&out.view, w)?;
            if !out.messages.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Chat")?;
                for message in out.messages {
                    writeln!(
                        w,
                        "[{}] {}: {}",
                        message.timestamp.format("%Y-%m-%d %H:%M"),
                        message.sender,
                        message.text
                    )?;
                }
            }
            Ok(())
        },
    )
}
