//! `jt list`: filtered opportunity listing.

use super::Session;
use crate::output::{pretty_rule, render_mode};
use clap::Args;
use jobtrail_core::query::OpportunityFilter;
use jobtrail_core::{Opportunity, Phase, Status};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only this status.
    #[arg(long)]
    pub status: Option<Status>,

    /// Only statuses in this phase, e.g. interview or "Follow-up".
    #[arg(long)]
    pub phase: Option<Phase>,

    /// Only opportunities carrying this tag.
    #[arg(long)]
    pub tag: Option<String>,

    /// Case-insensitive search across company, position, notes, location.
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Hide closed opportunities (rejected, withdrawn, accepted, ...).
    #[arg(long)]
    pub open: bool,
}

#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    opportunities: Vec<&'a Opportunity>,
    total: usize,
}

pub fn run_list(args: &ListArgs, session: &Session) -> anyhow::Result<()> {
    let filter = OpportunityFilter {
        status: args.status,
        phase: args.phase,
        tag: args.tag.clone(),
        text: args.search.clone(),
    };

    let mut opportunities = filter.apply(session.state());
    if args.open {
        opportunities.retain(|opp| !opp.status.is_closed());
    }
    let output = ListOutput {
        total: opportunities.len(),
        opportunities,
    };

    render_mode(
        session.output,
        &output,
        |out, w| {
            for opp in &out.opportunities {
                writeln!(w, "{}\t{}\t{}\t{}", opp.id, opp.status, opp.company, opp.position)?;
            }
            Ok(())
        },
        |out, w| {
            if out.opportunities.is_empty() {
                return writeln!(w, "No opportunities match.");
            }
            writeln!(w, "{:<14} {:<22} {:<20} POSITION", "ID", "STATUS", "COMPANY")?;
            pretty_rule(w)?;
            for opp in &out.opportunities {
                writeln!(
                    w,
                    "{:<14} {:<22} {:<20} {}",
                    opp.id.as_str(),
                    opp.status.as_str(),
                    opp.company,
                    opp.position
                )?;
            }
            pretty_rule(w)?;
            writeln!(w, "{} shown", out.total)
        },
    )
}
