//! `jt export`: iCalendar text for one event or the whole calendar.

use super::Session;
use crate::output::OutputMode;
use anyhow::Context;
use clap::Args;
use jobtrail_core::ics::{to_calendar_feed_at, to_calendar_text_at};
use jobtrail_core::CalendarEvent;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export a single event. Without it every event is exported.
    pub event: Option<String>,

    /// Only events attached to this opportunity.
    #[arg(long, conflicts_with = "event")]
    pub opportunity: Option<String>,

    /// Write the calendar to a file instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ExportOutput {
    Inline { events: usize, calendar: String },
    Written { path: PathBuf, events: usize },
}

pub fn run_export(args: &ExportArgs, session: &Session) -> anyhow::Result<()> {
    let state = session.state();
    let now = session.now();

    let (count, calendar) = if let Some(raw) = &args.event {
        let event = session.require_event(raw)?;
        (1, to_calendar_text_at(event, now, &session.export))
    } else {
        let events: Vec<CalendarEvent> = match &args.opportunity {
            Some(raw) => {
                let opportunity = session.require_opportunity(raw)?;
                state.events_for(&opportunity.id).into_iter().cloned().collect()
            }
            None => state.events.clone(),
        };
        (events.len(), to_calendar_feed_at(&events, now, &session.export))
    };

    let result = match &args.output {
        Some(path) => {
            std::fs::write(path, &calendar)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), events = count, "calendar exported");
            ExportOutput::Written {
                path: path.clone(),
                events: count,
            }
        }
        None => ExportOutput::Inline {
            events: count,
            calendar,
        },
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match (session.output, &result) {
        (OutputMode::Json, _) => {
            serde_json::to_writer_pretty(&mut out, &result)?;
            writeln!(out)?;
        }
        (_, ExportOutput::Inline { calendar, .. }) => out.write_all(calendar.as_bytes())?,
        (_, ExportOutput::Written { path, events }) => {
            writeln!(out, "wrote {events} events to {}", path.display())?;
        }
    }
    Ok(())
}
