//! `jt summary` and `jt upcoming`: read-only pipeline views.

use super::Session;
use crate::output::{fail, pretty_kv, pretty_rule, pretty_section, render_mode};
use clap::Args;
use jobtrail_core::query::{PipelineSummary, upcoming_events};
use jobtrail_core::{CalendarEvent, ErrorCode, dates};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct UpcomingArgs {
    /// Window length in days, starting at `--from`.
    #[arg(long, default_value_t = 14)]
    pub days: u64,

    /// First day of the window (defaults to today).
    #[arg(long)]
    pub from: Option<String>,
}

#[derive(Debug, Serialize)]
struct Upcoming<'a> {
    from: String,
    days: u64,
    events: Vec<&'a CalendarEvent>,
}

pub fn run_summary(session: &Session) -> anyhow::Result<()> {
    let summary = PipelineSummary::of(session.state());
    render_mode(
        session.output,
        &summary,
        |s, w| {
            writeln!(w, "total\t{}", s.total)?;
            writeln!(w, "active\t{}", s.active)?;
            for (phase, count) in &s.by_phase {
                writeln!(w, "phase\t{phase}\t{count}")?;
            }
            writeln!(w, "events\t{}\t{}", s.events, s.derived_events)?;
            writeln!(w, "messages\t{}", s.chat_messages)
        },
        |s, w| {
            pretty_section(w, "Pipeline")?;
            pretty_kv(w, "Total", s.total.to_string())?;
            pretty_kv(w, "Active", s.active.to_string())?;
            writeln!(w)?;
            for (phase, count) in &s.by_phase {
                writeln!(w, "  {:<18} {count}", phase.as_str())?;
            }
            if !s.by_status.is_empty() {
                writeln!(w)?;
                for (status, count) in &s.by_status {
                    writeln!(w, "  {:<22} {count}", status.as_str())?;
                }
            }
            pretty_rule(w)?;
            writeln!(
                w,
                "{} events ({} reminders), {} chat messages",
                s.events, s.derived_events, s.chat_messages
            )
        },
    )
}

pub fn run_upcoming(args: &UpcomingArgs, session: &Session) -> anyhow::Result<()> {
    let from = match &args.from {
        Some(raw) => match dates::parse_date(raw) {
            Some(date) => date,
            None => {
                return fail(
                    session.output,
                    ErrorCode::InvalidEnumValue,
                    format!("invalid date '{raw}'"),
                );
            }
        },
        None => session.now().date_naive(),
    };

    let upcoming = Upcoming {
        from: dates::format_date(from),
        days: args.days,
        events: upcoming_events(session.state(), from, args.days),
    };
    render_mode(
        session.output,
        &upcoming,
        |u, w| {
            for event in &u.events {
                writeln!(w, "{}\t{}\t{}\t{}", event.date, event.kind, event.id, event.title)?;
            }
            Ok(())
        },
        |u, w| {
            pretty_section(w, &format!("Next {} days from {}", u.days, u.from))?;
            if u.events.is_empty() {
                return writeln!(w, "Nothing scheduled.");
            }
            for event in &u.events {
                let when = event
                    .time
                    .as_deref()
                    .map_or_else(|| event.date.clone(), |t| format!("{} {t}", event.date));
                writeln!(w, "{when:<17} {:<10} {}", event.kind, event.title)?;
            }
            Ok(())
        },
    )
}
