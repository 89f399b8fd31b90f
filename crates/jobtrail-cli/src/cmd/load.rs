//! `jt load`: hydrate the store from a remote-store export.

use super::{Session, read_input};
use crate::output::{fail, render};
use clap::Args;
use jobtrail_core::{Action, ErrorCode, LoadData};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// JSON document with any of `opportunities`, `events`,
    /// `masterResume`, `userProfile`, `chatMessages` (`-` for stdin).
    pub file: String,
}

#[derive(Debug, Serialize)]
struct LoadSummary {
    opportunities: usize,
    events: usize,
    threads: usize,
}

pub fn run_load(args: &LoadArgs, session: &mut Session) -> anyhow::Result<()> {
    let raw = read_input(&args.file)?;
    let output = session.output;
    let data: LoadData = match serde_json::from_str(&raw) {
        Ok(data) => data,
        Err(err) => {
            return fail(
                output,
                ErrorCode::MalformedAction,
                format!("{} is not a valid data document: {err}", args.file),
            );
        }
    };

    let state = session.commit(Action::LoadData(data))?;
    let summary = LoadSummary {
        opportunities: state.opportunities.len(),
        events: state.events.len(),
        threads: state.chat_messages.len(),
    };
    render(output, &summary, |s, w| {
        writeln!(
            w,
            "loaded {} opportunities, {} events, {} chat threads",
            s.opportunities, s.events, s.threads
        )
    })
}
