//! `jt profile` and `jt resume`: auxiliary data next to the pipeline.

use super::{Session, read_input};
use crate::output::{pretty_kv, pretty_section, render, render_mode};
use clap::Args;
use jobtrail_core::model::ProfilePatch;
use jobtrail_core::{Action, UserProfile};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// Pass an empty string to clear.
    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    /// One-line professional summary.
    #[arg(long)]
    pub headline: Option<String>,

    #[arg(long)]
    pub linkedin: Option<String>,

    #[arg(long)]
    pub github: Option<String>,

    #[arg(long)]
    pub portfolio: Option<String>,

    /// Replace the skill list (repeatable).
    #[arg(long = "skill")]
    pub skills: Option<Vec<String>>,

    /// Replace the target role list (repeatable).
    #[arg(long = "target-role")]
    pub target_roles: Option<Vec<String>>,
}

impl ProfileArgs {
    fn patch(&self) -> ProfilePatch {
        ProfilePatch {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            location: self.location.clone(),
            headline: self.headline.clone(),
            linkedin: self.linkedin.clone(),
            github: self.github.clone(),
            portfolio: self.portfolio.clone(),
            skills: self.skills.clone(),
            target_roles: self.target_roles.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Replace the master resume with the contents of a file (`-` for stdin).
    #[arg(long, conflicts_with = "text")]
    pub file: Option<String>,

    /// Replace the master resume with this text.
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Resume<'a> {
    master_resume: &'a str,
}

/// Show the profile, or merge the given fields into it first.
pub fn run_profile(args: &ProfileArgs, session: &mut Session) -> anyhow::Result<()> {
    let patch = args.patch();
    let output = session.output;
    let state = if patch == ProfilePatch::default() {
        session.state()
    } else {
        session.commit(Action::UpdateUserProfile(patch))?
    };

    render_mode(
        output,
        &state.user_profile,
        |p, w| {
            writeln!(w, "{}\t{}", p.name, p.email)?;
            Ok(())
        },
        render_profile_pretty,
    )
}

/// Show the master resume, or replace it first.
pub fn run_resume(args: &ResumeArgs, session: &mut Session) -> anyhow::Result<()> {
    let replacement = match (&args.file, &args.text) {
        (Some(path), _) => Some(read_input(path)?),
        (None, Some(text)) => Some(text.clone()),
        (None, None) => None,
    };

    let output = session.output;
    let state = match replacement {
        Some(text) => session.commit(Action::SetMasterResume(text))?,
        None => session.state(),
    };

    let resume = Resume {
        master_resume: &state.master_resume,
    };
    render(output, &resume, |r, w| {
        if r.master_resume.is_empty() {
            return writeln!(w, "(no resume stored)");
        }
        write!(w, "{}", r.master_resume)?;
        if !r.master_resume.ends_with('\n') {
            writeln!(w)?;
        }
        Ok(())
    })
}

fn render_profile_pretty(p: &UserProfile, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, if p.name.is_empty() { "Profile" } else { &p.name })?;
    pretty_kv(w, "Email", &p.email)?;
    let optional = [
        ("Phone", &p.phone),
        ("Location", &p.location),
        ("Headline", &p.headline),
        ("LinkedIn", &p.linkedin),
        ("GitHub", &p.github),
        ("Portfolio", &p.portfolio),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            pretty_kv(w, key, value)?;
        }
    }
    if !p.skills.is_empty() {
        pretty_kv(w, "Skills", p.skills.join(", "))?;
    }
    if !p.target_roles.is_empty() {
        pretty_kv(w, "Targets", p.target_roles.join(", "))?;
    }
    Ok(())
}
