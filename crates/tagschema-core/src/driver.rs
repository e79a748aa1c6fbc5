//! The convergence driver: one interpreter for both passes.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  backend::Schema,
  error::{Error, Result},
  flag::Flag,
  step::{Probe, Step, forward_steps, reverse_steps, teardown_steps},
};

const BANNER: &str = "********************************************************************************";

// ─── Report ──────────────────────────────────────────────────────────────────

/// An edit the driver executed, tagged with its step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedEdit {
  pub step: &'static str,
  pub edit: String,
}

/// What a single pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
  pub applied:  Vec<AppliedEdit>,
  /// Flags written during this pass, in order, without repeats.
  pub marked:   Vec<Flag>,
  /// Set when `revert` dropped both tables outright.
  pub teardown: bool,
}

impl Report {
  pub fn is_noop(&self) -> bool { self.applied.is_empty() }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevertOptions {
  /// Drop `tags` and `taggings` even when this tool did not create them.
  pub force_tables_removal: bool,
}

// ─── Passes ──────────────────────────────────────────────────────────────────

/// Bring the schema to the target shape, recording every change applied.
///
/// Safe to re-run: a second pass applies nothing, and a pass restarted after
/// a failure resumes past the edits that already completed.
pub fn converge<B: Schema>(db: &mut B) -> Result<Report> {
  db.initialize().map_err(|e| Error::Ledger {
    op:     "initialize".into(),
    source: Box::new(e),
  })?;

  let mut report = Report::default();
  run(db, &forward_steps(), &mut report)?;
  info!(edits = report.applied.len(), "schema converged");
  Ok(report)
}

/// Undo the changes recorded in the ledger, then drop the ledger.
///
/// Changes that were inherited from a pre-existing schema are never touched.
/// Both tables are dropped outright only when this tool created both of them
/// or `force_tables_removal` is set.
pub fn revert<B: Schema>(db: &mut B, options: RevertOptions) -> Result<Report> {
  let mut created = true;
  for flag in [Flag::TagsTableCreated, Flag::TaggingsTableCreated] {
    created &= db.is_marked(flag).map_err(|e| Error::Ledger {
      op:     format!("read {flag}"),
      source: Box::new(e),
    })?;
  }

  let mut report = Report::default();
  if options.force_tables_removal || created {
    report.teardown = true;
    run(db, &teardown_steps(), &mut report)?;
  } else {
    warn!("{BANNER}");
    warn!(
      "WARNING: reverting recorded changes only; whichever of the `tags` and \
       `taggings` tables this tool did not create is shared and will be kept"
    );
    warn!(
      "to remove them, re-run revert with force_tables_removal enabled \
       (TAGSCHEMA_FORCE_TABLES_REMOVAL=yes or --force-tables-removal)"
    );
    warn!("{BANNER}");
    run(db, &reverse_steps(), &mut report)?;
  }

  db.drop_ledger().map_err(|e| Error::Ledger {
    op:     "drop".into(),
    source: Box::new(e),
  })?;
  info!(
    edits = report.applied.len(),
    teardown = report.teardown,
    "schema reverted"
  );
  Ok(report)
}

// ─── Interpreter ─────────────────────────────────────────────────────────────

fn run<B: Schema>(db: &mut B, steps: &[Step], report: &mut Report) -> Result<()> {
  for step in steps {
    if !holds(db, step.name, &step.when)? {
      debug!(step = step.name, "step not needed");
      continue;
    }

    for action in &step.actions {
      if !holds(db, step.name, &action.when)? {
        debug!(step = step.name, edit = %action.edit, "edit not needed");
        continue;
      }

      action.edit.apply(db).map_err(|e| Error::Edit {
        step:   step.name,
        edit:   action.edit.to_string(),
        source: Box::new(e),
      })?;
      info!(step = step.name, edit = %action.edit, "applied");
      report.applied.push(AppliedEdit {
        step: step.name,
        edit: action.edit.to_string(),
      });

      if let Some(flag) = action.marks {
        mark(db, flag, report)?;
      }
    }

    if let Some(flag) = step.marks {
      mark(db, flag, report)?;
    }
  }
  Ok(())
}

fn holds<B: Schema>(db: &B, step: &'static str, probe: &Probe) -> Result<bool> {
  probe.holds(db).map_err(|e| Error::Probe { step, source: Box::new(e) })
}

fn mark<B: Schema>(db: &mut B, flag: Flag, report: &mut Report) -> Result<()> {
  db.mark(flag).map_err(|e| Error::Ledger {
    op:     format!("mark {flag}"),
    source: Box::new(e),
  })?;
  if !report.marked.contains(&flag) {
    info!(%flag, "marked");
    report.marked.push(flag);
  }
  Ok(())
}
