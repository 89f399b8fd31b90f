//! `jt doctor`: verify the snapshot on disk and optionally repair it.

use super::Session;
use crate::output::{fail, render};
use jobtrail_core::state::IntegrityIssue;
use jobtrail_core::ErrorCode;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct DoctorReport {
    path: PathBuf,
    ok: bool,
    issues: Vec<IntegrityIssue>,
    fixed: bool,
}

/// Check the raw snapshot (before any load-time repair) for broken
/// invariants. With `fix`, the repaired tree is written back.
pub fn run_doctor(fix: bool, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let raw = match session.snapshots.load_raw() {
        Ok(state) => state,
        Err(err) => return fail(output, err.code(), err.to_string()),
    };
    let issues = raw.check_integrity();
    for issue in &issues {
        tracing::warn!(%issue, "integrity issue");
    }

    let fixed = fix && !issues.is_empty();
    if fixed {
        let repaired = raw.into_consistent();
        if let Err(err) = session.snapshots.save(&repaired) {
            return fail(output, err.code(), err.to_string());
        }
        tracing::info!(repaired = issues.len(), "snapshot repaired");
    }

    let report = DoctorReport {
        path: session.snapshots.path().to_path_buf(),
        ok: issues.is_empty(),
        issues,
        fixed,
    };
    render(output, &report, |r, w| {
        if r.ok {
            return writeln!(w, "{}: ok", r.path.display());
        }
        for issue in &r.issues {
            writeln!(w, "  {issue}")?;
        }
        if r.fixed {
            writeln!(w, "{}: repaired {} issues", r.path.display(), r.issues.len())
        } else {
            writeln!(w, "{}: {} issues (run with --fix to repair)", r.path.display(), r.issues.len())
        }
    })?;

    if report.ok || report.fixed {
        Ok(())
    } else {
        anyhow::bail!("{}: {} integrity issues", ErrorCode::IntegrityViolation, report.issues.len())
    }
}
