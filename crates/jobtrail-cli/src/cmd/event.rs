//! `jt event ...`: user-authored calendar events.

use super::Session;
use crate::output::{fail, pretty_kv, pretty_rule, pretty_section, render, render_mode};
use clap::{Args, Subcommand};
use jobtrail_core::model::EventPatch;
use jobtrail_core::{Action, CalendarEvent, EntityId, ErrorCode, EventKind};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Add a calendar event.
    Add(EventAddArgs),
    /// List calendar events.
    List(EventListArgs),
    /// Change fields of an event.
    Update(EventUpdateArgs),
    /// Delete an event.
    Delete(EventDeleteArgs),
}

#[derive(Args, Debug)]
pub struct EventAddArgs {
    #[arg(long)]
    pub title: String,

    /// Date, e.g. 2024-03-01.
    #[arg(long)]
    pub date: String,

    /// Start time as HH:MM. Omit for an all-day event.
    #[arg(long)]
    pub time: Option<String>,

    /// Explicit end timestamp.
    #[arg(long)]
    pub end: Option<String>,

    /// interview, deadline, followup, assessment or general.
    #[arg(long = "type", default_value = "general")]
    pub kind: EventKind,

    /// Attach to this opportunity.
    #[arg(long)]
    pub opportunity: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    /// Explicit id. A taken or empty id is replaced with a fresh one.
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args, Debug)]
pub struct EventListArgs {
    /// Only events attached to this opportunity.
    #[arg(long)]
    pub opportunity: Option<String>,

    /// Only events of this type.
    #[arg(long = "type")]
    pub kind: Option<EventKind>,

    /// Only reminders derived from opportunity status.
    #[arg(long, conflicts_with = "user")]
    pub derived: bool,

    /// Only events created by hand.
    #[arg(long)]
    pub user: bool,
}

#[derive(Args, Debug)]
pub struct EventUpdateArgs {
    /// Event id.
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub date: Option<String>,

    /// Pass an empty string to clear.
    #[arg(long)]
    pub time: Option<String>,

    /// Pass an empty string to clear.
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long = "type")]
    pub kind: Option<EventKind>,

    /// Attach to this opportunity. Pass an empty string to detach.
    #[arg(long)]
    pub opportunity: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Args, Debug)]
pub struct EventDeleteArgs {
    /// Event id.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct EventList<'a> {
    events: Vec<&'a CalendarEvent>,
    total: usize,
}

#[derive(Debug, Serialize)]
struct Deleted {
    deleted: EntityId,
}

pub fn run_event(command: &EventCommand, session: &mut Session) -> anyhow::Result<()> {
    match command {
        EventCommand::Add(args) => run_add(args, session),
        EventCommand::List(args) => run_list(args, session),
        EventCommand::Update(args) => run_update(args, session),
        EventCommand::Delete(args) => run_delete(args, session),
    }
}

fn run_add(args: &EventAddArgs, session: &mut Session) -> anyhow::Result<()> {
    let opportunity = match &args.opportunity {
        Some(raw) => Some(session.require_opportunity(raw)?.id.clone()),
        None => None,
    };

    let mut event = CalendarEvent::new(
        EntityId::new(args.id.as_deref().unwrap_or_default()),
        &args.title,
        &args.date,
        args.kind,
    );
    event.opportunity_id = opportunity;
    event.time.clone_from(&args.time);
    event.end.clone_from(&args.end);
    event.description.clone_from(&args.description);
    event.location.clone_from(&args.location);

    let output = session.output;
    let state = session.commit(Action::AddEvent(event))?;
    let Some(added) = state.events.last() else {
        anyhow::bail!("event was not added");
    };
    render_mode(output, added, render_event_text, render_event_pretty)
}

fn run_list(args: &EventListArgs, session: &Session) -> anyhow::Result<()> {
    let state = session.state();
    let mut events: Vec<&CalendarEvent> = match &args.opportunity {
        Some(raw) => {
            let opportunity = session.require_opportunity(raw)?;
            state.events_for(&opportunity.id)
        }
        None => state.events.iter().collect(),
    };
    events.retain(|event| {
        args.kind.is_none_or(|kind| event.kind == kind)
            && (!args.derived || event.is_derived())
            && (!args.user || !event.is_derived())
    });

    let list = EventList {
        total: events.len(),
        events,
    };
    render_mode(
        session.output,
        &list,
        |list, w| {
            for event in &list.events {
                render_event_text(event, w)?;
            }
            Ok(())
        },
        |list, w| {
            if list.events.is_empty() {
                return writeln!(w, "No events.");
            }
            writeln!(w, "{:<28} {:<11} {:<10} TITLE", "ID", "DATE", "TYPE")?;
            pretty_rule(w)?;
            for event in &list.events {
                writeln!(
                    w,
                    "{:<28} {:<11} {:<10} {}",
                    event.id.as_str(),
                    event.date,
                    event.kind.as_str(),
                    event.title
                )?;
            }
            Ok(())
        },
    )
}

fn run_update(args: &EventUpdateArgs, session: &mut Session) -> anyhow::Result<()> {
    let id = session.require_event(&args.id)?.id.clone();

    let opportunity_id = match args.opportunity.as_deref() {
        Some("") => Some(EntityId::default()),
        Some(raw) => Some(session.require_opportunity(raw)?.id.clone()),
        None => None,
    };
    let patch = EventPatch {
        title: args.title.clone(),
        date: args.date.clone(),
        time: args.time.clone(),
        end: args.end.clone(),
        kind: args.kind,
        opportunity_id,
        description: args.description.clone(),
        location: args.location.clone(),
    };

    let output = session.output;
    let state = session.commit(Action::UpdateEvent {
        id: id.clone(),
        patch,
    })?;
    match state.event(&id) {
        Some(event) => render_mode(output, event, render_event_text, render_event_pretty),
        None => fail(output, ErrorCode::EventNotFound, format!("event '{id}' not found")),
    }
}

fn run_delete(args: &EventDeleteArgs, session: &mut Session) -> anyhow::Result<()> {
    let id = session.require_event(&args.id)?.id.clone();
    session.commit(Action::DeleteEvent(id.clone()))?;
    render(session.output, &Deleted { deleted: id }, |d, w| {
        writeln!(w, "deleted event {}", d.deleted)
    })
}

fn render_event_text(event: &CalendarEvent, w: &mut dyn Write) -> io::Result<()> {
    let owner = event.opportunity_id.as_ref().map_or("-", EntityId::as_str);
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}",
        event.id, event.date, event.kind, owner, event.title
    )
}

fn render_event_pretty(event: &CalendarEvent, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &event.title)?;
    pretty_kv(w, "ID", event.id.as_str())?;
    pretty_kv(w, "Date", &event.date)?;
    if let Some(time) = &event.time {
        pretty_kv(w, "Time", time)?;
    }
    pretty_kv(w, "Type", event.kind.as_str())?;
    if let Some(owner) = &event.opportunity_id {
        pretty_kv(w, "Opportunity", owner.as_str())?;
    }
    if let Some(location) = &event.location {
        pretty_kv(w, "Location", location)?;
    }
    if let Some(description) = &event.description {
        pretty_kv(w, "Details", description)?;
    }
    if event.is_derived() {
        pretty_kv(w, "Origin", "derived from status")?;
    }
    Ok(())
}
