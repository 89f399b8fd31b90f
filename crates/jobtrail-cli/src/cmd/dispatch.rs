//! `jt dispatch`: feed a raw action document through the reducer.

use super::{Session, read_input};
use crate::output::{fail, render};
use clap::Args;
use jobtrail_core::Action;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct DispatchArgs {
    /// Inline action JSON, or `-` to read it from stdin.
    pub action: String,

    /// Accept unknown or malformed actions as no-ops instead of failing.
    #[arg(long)]
    pub lenient: bool,
}

#[derive(Debug, Serialize)]
struct DispatchOutput {
    action: &'static str,
    changed: bool,
    opportunities: usize,
    events: usize,
}

pub fn run_dispatch(args: &DispatchArgs, session: &mut Session) -> anyhow::Result<()> {
    let raw = if args.action == "-" {
        read_input("-")?
    } else {
        args.action.clone()
    };

    let output = session.output;
    let action = if args.lenient {
        Action::decode(&raw)
    } else {
        match Action::parse(&raw) {
            Ok(action) => action,
            Err(err) => return fail(output, err.code(), err.to_string()),
        }
    };

    let tag = action.tag();
    let before = session.state().clone();
    let state = session.commit(action)?;
    let result = DispatchOutput {
        action: tag,
        changed: *state != before,
        opportunities: state.opportunities.len(),
        events: state.events.len(),
    };
    render(output, &result, |r, w| {
        let verb = if r.changed { "applied" } else { "no change" };
        writeln!(
            w,
            "{}: {verb} ({} opportunities, {} events)",
            r.action, r.opportunities, r.events
        )
    })
}
