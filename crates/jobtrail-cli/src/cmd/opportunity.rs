//! `jt add`, `jt update`, `jt status`, `jt delete`: opportunity mutations.

use super::Session;
use crate::output::{pretty_kv, pretty_section, render, render_mode};
use clap::Args;
use jobtrail_core::dates;
use jobtrail_core::model::OpportunityPatch;
use jobtrail_core::{Action, CalendarEvent, EntityId, Opportunity, Status};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Company name.
    #[arg(long)]
    pub company: String,

    /// Position or role title.
    #[arg(long)]
    pub position: String,

    /// Pipeline status, e.g. "Applied" or first-interview.
    #[arg(long, default_value = "Bookmarked")]
    pub status: Status,

    /// Reference date for reminders (defaults to today).
    #[arg(long)]
    pub date: Option<String>,

    /// Explicit id. A taken or empty id is replaced with a fresh one.
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Where the listing was found.
    #[arg(long)]
    pub source: Option<String>,

    #[arg(long)]
    pub salary: Option<String>,

    /// Tag to attach (repeatable).
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Opportunity id.
    pub id: String,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub position: Option<String>,

    #[arg(long)]
    pub status: Option<Status>,

    #[arg(long)]
    pub date: Option<String>,

    /// Replace the local id with an authoritative one.
    #[arg(long)]
    pub new_id: Option<String>,

    /// Pass an empty string to clear.
    #[arg(long)]
    pub location: Option<String>,

    /// Pass an empty string to clear.
    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub contact_name: Option<String>,

    #[arg(long)]
    pub contact_email: Option<String>,

    #[arg(long)]
    pub salary: Option<String>,

    /// Replace the tag set (repeatable).
    #[arg(long = "tag")]
    pub tags: Option<Vec<String>>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Opportunity id.
    pub id: String,

    /// New pipeline status.
    pub status: Status,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Opportunity id.
    pub id: String,
}

/// An opportunity together with the events that reference it.
#[derive(Debug, Serialize)]
pub struct OpportunityView<'a> {
    pub opportunity: &'a Opportunity,
    pub events: Vec<&'a CalendarEvent>,
}

impl<'a> OpportunityView<'a> {
    fn of(session: &'a Session, id: &EntityId) -> Option<Self> {
        let state = session.state();
        state.opportunity(id).map(|opportunity| Self {
            opportunity,
            events: state.events_for(&opportunity.id),
        })
    }
}

#[derive(Debug, Serialize)]
struct DeleteResult {
    deleted: EntityId,
    events_removed: usize,
    messages_removed: usize,
}

pub fn run_add(args: &AddArgs, session: &mut Session) -> anyhow::Result<()> {
    let date = args
        .date
        .clone()
        .unwrap_or_else(|| dates::format_date(session.now().date_naive()));

    let mut opportunity = Opportunity::new(
        EntityId::new(args.id.as_deref().unwrap_or_default()),
        &args.company,
        &args.position,
    )
    .with_status(args.status)
    .with_reference_date(&date);
    opportunity.location.clone_from(&args.location);
    opportunity.notes.clone_from(&args.notes);
    opportunity.source.clone_from(&args.source);
    opportunity.salary.clone_from(&args.salary);
    opportunity.tags = args.tags.iter().cloned().collect();

    let state = session.commit(Action::AddOpportunity(opportunity))?;
    let added = state
        .opportunities
        .last()
        .map(|opp| opp.id.clone())
        .unwrap_or_default();
    tracing::info!(id = %added, "opportunity added");

    render_opportunity(session, &added)
}

pub fn run_update(args: &UpdateArgs, session: &mut Session) -> anyhow::Result<()> {
    let id = session.require_opportunity(&args.id)?.id.clone();

    let patch = OpportunityPatch {
        id: args.new_id.as_deref().map(EntityId::new),
        company: args.company.clone(),
        position: args.position.clone(),
        status: args.status,
        reference_date: args.date.clone(),
        location: args.location.clone(),
        notes: args.notes.clone(),
        contact_name: args.contact_name.clone(),
        contact_email: args.contact_email.clone(),
        salary: args.salary.clone(),
        tags: args
            .tags
            .as_ref()
            .map(|tags| tags.iter().cloned().collect::<BTreeSet<_>>()),
        ..OpportunityPatch::default()
    };

    if patch.is_empty() {
        tracing::debug!(%id, "nothing to update");
        return render_opportunity(session, &id);
    }

    let target = match &patch.id {
        Some(new_id) if !session.state().contains_opportunity(new_id) => new_id.clone(),
        _ => id.clone(),
    };
    session.commit(Action::UpdateOpportunity { id, patch })?;
    render_opportunity(session, &target)
}

pub fn run_status(args: &StatusArgs, session: &mut Session) -> anyhow::Result<()> {
    let id = session.require_opportunity(&args.id)?.id.clone();
    session.commit(Action::UpdateOpportunity {
        id: id.clone(),
        patch: OpportunityPatch::status(args.status),
    })?;
    render_opportunity(session, &id)
}

pub fn run_delete(args: &DeleteArgs, session: &mut Session) -> anyhow::Result<()> {
    let (id, events, messages) = {
        let opportunity = session.require_opportunity(&args.id)?;
        let state = session.state();
        (
            opportunity.id.clone(),
            state.events_for(&opportunity.id).len(),
            state.thread(&opportunity.id).len(),
        )
    };

    session.commit(Action::DeleteOpportunity(id.clone()))?;

    let result = DeleteResult {
        deleted: id,
        events_removed: events,
        messages_removed: messages,
    };
    render(session.output, &result, |r, w| {
        writeln!(
            w,
            "deleted {} ({} events, {} messages)",
            r.deleted, r.events_removed, r.messages_removed
        )
    })
}

fn render_opportunity(session: &Session, id: &EntityId) -> anyhow::Result<()> {
    let Some(view) = OpportunityView::of(session, id) else {
        anyhow::bail!("opportunity '{id}' vanished after update");
    };
    render_mode(session.output, &view, render_text, render_pretty)
}

pub fn render_text(view: &OpportunityView<'_>, w: &mut dyn Write) -> io::Result<()> {
    let opp = view.opportunity;
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}",
        opp.id, opp.status, opp.company, opp.position, opp.reference_date
    )?;
    for event in &view.events {
        writeln!(w, "  {}\t{}\t{}\t{}", event.id, event.date, event.kind, event.title)?;
    }
    Ok(())
}

pub fn render_pretty(view: &OpportunityView<'_>, w: &mut dyn Write) -> io::Result<()> {
    let opp = view.opportunity;
    pretty_section(w, &format!("{} at {}", opp.position, opp.company))?;
    pretty_kv(w, "ID", opp.id.as_str())?;
    pretty_kv(w, "Status", format!("{} ({})", opp.status, opp.status.phase()))?;
    pretty_kv(w, "Date", &opp.reference_date)?;
    if let Some(location) = &opp.location {
        pretty_kv(w, "Location", location)?;
    }
    if let Some(salary) = &opp.salary {
        pretty_kv(w, "Salary", salary)?;
    }
    if let Some(contact) = &opp.contact_name {
        pretty_kv(w, "Contact", contact)?;
    }
    if !opp.tags.is_empty() {
        let tags: Vec<&str> = opp.tags.iter().map(String::as_str).collect();
        pretty_kv(w, "Tags", tags.join(", "))?;
    }
    if let Some(notes) = &opp.notes {
        pretty_kv(w, "Notes", notes)?;
    }
    if !view.events.is_empty() {
        writeln!(w)?;
        writeln!(w, "Events")?;
        for event in &view.events {
            let when = event
                .time
                .as_deref()
                .map_or_else(|| event.date.clone(), |t| format!("{} {t}", event.date));
            writeln!(w, "  {when:<17} {:<10} {}", event.kind, event.title)?;
        }
    }
    Ok(())
}
