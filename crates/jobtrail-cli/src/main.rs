#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::{CliClock, Session};
use jobtrail_core::config::resolve_config;
use output::OutputMode;
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "jobtrail: track a job search from bookmark to offer",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Opportunities",
        about = "Track a new opportunity",
        long_about = "Add an opportunity. Reminders for its status are scheduled automatically.",
        after_help = "EXAMPLES:\n    # Bookmark a listing\n    jt add --company Acme --position \"Backend Engineer\"\n\n    # Record an application sent today\n    jt add --company Acme --position Engineer --status applied\n\n    # Emit machine-readable output\n    jt add --company Acme --position Engineer --json"
    )]
    Add(cmd::opportunity::AddArgs),

    #[command(
        next_help_heading = "Opportunities",
        about = "Edit an opportunity",
        long_about = "Change fields of an opportunity. Reminders are rescheduled when status, date, company, position or location change.",
        after_help = "EXAMPLES:\n    # Fix the company name\n    jt update 1 --company \"Acme Corp\"\n\n    # Adopt the id assigned by the remote store\n    jt update 1704067200000 --new-id 42"
    )]
    Update(cmd::opportunity::UpdateArgs),

    #[command(
        next_help_heading = "Opportunities",
        about = "Move an opportunity to a new status",
        long_about = "Set the pipeline status of an opportunity and reschedule its reminders.",
        after_help = "EXAMPLES:\n    # Interview booked\n    jt status 1 first-interview\n\n    # Quoted labels work too\n    jt status 1 \"Offer Received\""
    )]
    Status(cmd::opportunity::StatusArgs),

    #[command(
        next_help_heading = "Opportunities",
        about = "Delete an opportunity",
        long_about = "Delete an opportunity together with its events and chat thread."
    )]
    Delete(cmd::opportunity::DeleteArgs),

    #[command(
        next_help_heading = "Read",
        about = "List opportunities",
        long_about = "List opportunities with optional filters.",
        after_help = "EXAMPLES:\n    # Everything still in play\n    jt list --open\n\n    # Interviews only\n    jt list --phase interview\n\n    # Free-text search\n    jt list -s remote --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one opportunity",
        long_about = "Show an opportunity with its events and chat thread."
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Pipeline counts by phase and status"
    )]
    Summary,

    #[command(
        next_help_heading = "Read",
        about = "Events in the coming days",
        after_help = "EXAMPLES:\n    # The next two weeks\n    jt upcoming\n\n    # A fixed window\n    jt upcoming --from 2024-03-01 --days 7"
    )]
    Upcoming(cmd::summary::UpcomingArgs),

    #[command(next_help_heading = "Calendar", about = "Manage calendar events")]
    Event {
        #[command(subcommand)]
        command: cmd::event::EventCommand,
    },

    #[command(
        next_help_heading = "Calendar",
        about = "Export events as iCalendar",
        long_about = "Render one event, one opportunity's events, or the whole calendar as iCalendar text.",
        after_help = "EXAMPLES:\n    # Whole calendar to a file\n    jt export -o jobs.ics\n\n    # A single event to stdout\n    jt export ev-3"
    )]
    Export(cmd::export::ExportArgs),

    #[command(next_help_heading = "Notes", about = "Per-opportunity chat threads")]
    Chat {
        #[command(subcommand)]
        command: cmd::chat::ChatCommand,
    },

    #[command(
        next_help_heading = "Notes",
        about = "Show or edit the user profile"
    )]
    Profile(cmd::profile::ProfileArgs),

    #[command(
        next_help_heading = "Notes",
        about = "Show or replace the master resume"
    )]
    Resume(cmd::profile::ResumeArgs),

    #[command(
        next_help_heading = "Data",
        about = "Hydrate from a remote-store export",
        long_about = "Replace collections with those present in a JSON document. Absent collections are kept."
    )]
    Load(cmd::load::LoadArgs),

    #[command(
        next_help_heading = "Data",
        about = "Apply a raw action document",
        after_help = "EXAMPLES:\n    # Delete through the action interface\n    jt dispatch '{\"type\": \"DELETE_OPPORTUNITY\", \"payload\": 1}'\n\n    # Read the action from stdin\n    echo '{\"type\": \"SET_MASTER_RESUME\", \"payload\": \"...\"}' | jt dispatch -"
    )]
    Dispatch(cmd::dispatch::DispatchArgs),

    #[command(
        next_help_heading = "Data",
        about = "Check the snapshot for broken references",
        long_about = "Check the snapshot on disk for dangling events, orphan threads and repeated ids."
    )]
    Doctor {
        /// Write the repaired state back.
        #[arg(long)]
        fix: bool,
    },

    #[command(
        next_help_heading = "Shell",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    jt completions bash > ~/.local/share/bash-completion/completions/jt"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("JOBTRAIL_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "jobtrail=debug,jt=debug,info"
        } else {
            "jobtrail=info,jt=info,warn"
        })
    });

    let format = env::var("JOBTRAIL_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let config = resolve_config(cli.json)?;
    let output = OutputMode::from_resolved(&config.resolved_output);
    let clock = CliClock::from_env(env::var("JOBTRAIL_NOW").ok().as_deref());
    debug!(data_dir = %config.data_dir.display(), ?output, "resolved configuration");

    let mut session = Session::open(&config, output, clock)?;

    match &cli.command {
        Commands::Add(args) => cmd::opportunity::run_add(args, &mut session),
        Commands::Update(args) => cmd::opportunity::run_update(args, &mut session),
        Commands::Status(args) => cmd::opportunity::run_status(args, &mut session),
        Commands::Delete(args) => cmd::opportunity::run_delete(args, &mut session),
        Commands::List(args) => cmd::list::run_list(args, &session),
        Commands::Show(args) => cmd::show::run_show(args, &session),
        Commands::Summary => cmd::summary::run_summary(&session),
        Commands::Upcoming(args) => cmd::summary::run_upcoming(args, &session),
        Commands::Event { command } => cmd::event::run_event(command, &mut session),
        Commands::Export(args) => cmd::export::run_export(args, &session),
        Commands::Chat { command } => cmd::chat::run_chat(command, &mut session),
        Commands::Profile(args) => cmd::profile::run_profile(args, &mut session),
        Commands::Resume(args) => cmd::profile::run_resume(args, &mut session),
        Commands::Load(args) => cmd::load::run_load(args, &mut session),
        Commands::Dispatch(args) => cmd::dispatch::run_dispatch(args, &mut session),
        Commands::Doctor { fix } => cmd::doctor::run_doctor(*fix, &session),
        Commands::Completions(_) => Ok(()),
    }
}
