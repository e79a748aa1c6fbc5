//! The fixed step tables and the predicate language their guards use.
//!
//! A [`Step`] is plain data: a gate, an ordered list of guarded [`Action`]s,
//! and the ledger flags they write. Both passes are interpreted by the same
//! loop in [`crate::driver`], so the tables can be inspected and tested
//! without a database.

use std::{fmt, ops::Not};

use crate::{
  backend::{Engine, Schema},
  flag::Flag,
  schema::{
    ColumnDef, IndexDef, IndexTarget, MYSQL_TAG_NAME_COLLATION, TAG_ID,
    TAG_NAME, TAGGABLE_CONTEXT, TAGGABLE_TAGGER_CONTEXT, TAGGER, TAGGINGS,
    TAGGINGS_IDX, TAGGINGS_IDY, TAGS, TableDef, UNIQUE_TAGGING,
    context_column, tagger_columns, taggings_count_column, taggings_table,
    tags_table,
  },
};

// ─── Probe ───────────────────────────────────────────────────────────────────

/// A predicate over discrete schema facts, evaluated live on every use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
  Always,
  TableExists(&'static str),
  ColumnExists(&'static str, &'static str),
  IndexExists(&'static str, &'static [&'static str]),
  NamedIndexExists(&'static str, &'static str),
  Marked(Flag),
  Engine(Engine),
  Not(Box<Probe>),
  All(Vec<Probe>),
  Any(Vec<Probe>),
}

impl Probe {
  pub fn holds<B: Schema + ?Sized>(&self, db: &B) -> Result<bool, B::Error> {
    Ok(match self {
      Self::Always => true,
      Self::TableExists(table) => db.table_exists(table)?,
      Self::ColumnExists(table, column) => db.column_exists(table, column)?,
      Self::IndexExists(table, columns) => db.index_exists(table, columns)?,
      Self::NamedIndexExists(table, name) => {
        db.named_index_exists(table, name)?
      }
      Self::Marked(flag) => db.is_marked(*flag)?,
      Self::Engine(engine) => db.engine() == *engine,
      Self::Not(inner) => !inner.holds(db)?,
      Self::All(probes) => {
        for probe in probes {
          if !probe.holds(db)? {
            return Ok(false);
          }
        }
        true
      }
      Self::Any(probes) => {
        for probe in probes {
          if probe.holds(db)? {
            return Ok(true);
          }
        }
        false
      }
    })
  }
}

impl Not for Probe {
  type Output = Probe;

  fn not(self) -> Probe { Probe::Not(Box::new(self)) }
}

// ─── Edit ────────────────────────────────────────────────────────────────────

/// One schema edit handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
  CreateTable(TableDef),
  DropTable(&'static str),
  AddColumn {
    table:  &'static str,
    column: ColumnDef,
  },
  RemoveColumn {
    table:  &'static str,
    column: &'static str,
  },
  AddIndex(IndexDef),
  RemoveIndex {
    table:  &'static str,
    target: IndexTarget,
  },
  /// Recompute `tags.taggings_count` for every tag.
  ResetTaggingsCounters,
  Raw(&'static str),
}

impl Edit {
  pub(crate) fn apply<B: Schema + ?Sized>(
    &self,
    db: &mut B,
  ) -> Result<(), B::Error> {
    match self {
      Self::CreateTable(table) => db.create_table(table),
      Self::DropTable(table) => db.drop_table(table),
      Self::AddColumn { table, column } => db.add_column(table, column),
      Self::RemoveColumn { table, column } => db.remove_column(table, column),
      Self::AddIndex(index) => db.add_index(index),
      Self::RemoveIndex { table, target } => db.remove_index(table, target),
      Self::ResetTaggingsCounters => {
        for tag_id in db.tag_ids()? {
          db.reset_taggings_count(tag_id)?;
        }
        Ok(())
      }
      Self::Raw(sql) => db.execute_raw(sql),
    }
  }
}

impl fmt::Display for Edit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::CreateTable(table) => write!(f, "create table {}", table.name),
      Self::DropTable(table) => write!(f, "drop table {table}"),
      Self::AddColumn { table, column } => {
        write!(f, "add column {table}.{}", column.name)
      }
      Self::RemoveColumn { table, column } => {
        write!(f, "remove column {table}.{column}")
      }
      Self::AddIndex(index) => write!(
        f,
        "add {}index {} on {}({})",
        if index.unique { "unique " } else { "" },
        index.name(),
        index.table,
        index.columns.join(", ")
      ),
      Self::RemoveIndex { table, target } => {
        write!(f, "remove index {target} from {table}")
      }
      Self::ResetTaggingsCounters => write!(f, "reset tags.taggings_count"),
      Self::Raw(sql) => write!(f, "execute `{sql}`"),
    }
  }
}

// ─── Action / Step ───────────────────────────────────────────────────────────

/// A guarded edit. `marks` is written right after the edit succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
  pub when:  Probe,
  pub edit:  Edit,
  pub marks: Option<Flag>,
}

impl Action {
  pub fn new(when: Probe, edit: Edit) -> Self {
    Self { when, edit, marks: None }
  }

  pub fn marks(mut self, flag: Flag) -> Self {
    self.marks = Some(flag);
    self
  }
}

/// A gated bundle of actions. `marks` is written once every action has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
  pub name:    &'static str,
  pub when:    Probe,
  pub actions: Vec<Action>,
  pub marks:   Option<Flag>,
}

// ─── Guard helpers ───────────────────────────────────────────────────────────

fn add_column(table: &'static str, column: ColumnDef) -> Action {
  Action::new(
    !Probe::ColumnExists(table, column.name),
    Edit::AddColumn { table, column },
  )
}

fn remove_column(table: &'static str, column: &'static str) -> Action {
  Action::new(
    Probe::ColumnExists(table, column),
    Edit::RemoveColumn { table, column },
  )
}

fn index_present(index: &IndexDef) -> Probe {
  match index.name {
    Some(name) => Probe::NamedIndexExists(index.table, name),
    None => Probe::IndexExists(index.table, index.columns),
  }
}

fn add_index(index: IndexDef) -> Action {
  Action::new(!index_present(&index), Edit::AddIndex(index))
}

fn remove_index(index: IndexDef) -> Action {
  let target = match index.name {
    Some(name) => IndexTarget::Named(name),
    None => IndexTarget::Columns(index.columns),
  };
  Action::new(index_present(&index), Edit::RemoveIndex {
    table: index.table,
    target,
  })
}

fn drop_table(table: &'static str) -> Action {
  Action::new(Probe::TableExists(table), Edit::DropTable(table))
}

/// Indexes of the missing-indexes bundle. `taggings(tag_id)` comes last so an
/// interrupted bundle still passes its gate on the next run.
fn missing_indexes() -> Vec<IndexDef> {
  vec![
    IndexDef::on(TAGGINGS, &["taggable_id"]),
    IndexDef::on(TAGGINGS, &["taggable_type"]),
    IndexDef::on(TAGGINGS, &["tagger_id"]),
    IndexDef::on(TAGGINGS, &["context"]),
    IndexDef::on(TAGGINGS, TAGGER),
    IndexDef::on(TAGGINGS, TAGGABLE_TAGGER_CONTEXT).named(TAGGINGS_IDY),
    IndexDef::on(TAGGINGS, TAG_ID),
  ]
}

// ─── Forward table ───────────────────────────────────────────────────────────

/// The convergence sequence. Ledger initialisation precedes it.
pub fn forward_steps() -> Vec<Step> {
  let [tagger_id, tagger_type] = tagger_columns();

  vec![
    Step {
      name:    "create_tables",
      when:    Probe::Any(vec![
        !Probe::TableExists(TAGS),
        !Probe::TableExists(TAGGINGS),
      ]),
      actions: vec![
        Action::new(!Probe::TableExists(TAGS), Edit::CreateTable(tags_table()))
          .marks(Flag::TagsTableCreated),
        Action::new(
          !Probe::TableExists(TAGGINGS),
          Edit::CreateTable(taggings_table()),
        )
        .marks(Flag::TaggingsTableCreated),
      ],
      marks:   None,
    },
    Step {
      name:    "add_context",
      when:    !Probe::ColumnExists(TAGGINGS, "context"),
      actions: vec![
        add_column(TAGGINGS, context_column()).marks(Flag::ColumnContextAdded),
      ],
      marks:   None,
    },
    Step {
      name:    "add_tagger_reference",
      when:    Probe::Any(vec![
        !Probe::ColumnExists(TAGGINGS, "tagger_id"),
        !Probe::ColumnExists(TAGGINGS, "tagger_type"),
      ]),
      actions: vec![
        add_column(TAGGINGS, tagger_id).marks(Flag::ReferenceTaggerIdAdded),
        add_column(TAGGINGS, tagger_type)
          .marks(Flag::ReferenceTaggerTypeAdded),
      ],
      marks:   None,
    },
    Step {
      name:    "unique_indices",
      // A foreign schema that already has the counter column has had this
      // bundle applied. If we added the column ourselves, a previous run
      // stopped partway and the bundle resumes.
      when:    Probe::All(vec![
        !Probe::Marked(Flag::UniqueIndicesApplied),
        Probe::Any(vec![
          !Probe::ColumnExists(TAGS, "taggings_count"),
          Probe::Marked(Flag::ColumnTaggingsCountAdded),
        ]),
      ]),
      actions: vec![
        add_index(IndexDef::on(TAGS, TAG_NAME).unique())
          .marks(Flag::IndexNameAdded),
        remove_index(IndexDef::on(TAGGINGS, TAG_ID))
          .marks(Flag::IndexTagIdRemoved),
        remove_index(IndexDef::on(TAGGINGS, TAGGABLE_CONTEXT)),
        add_index(
          IndexDef::on(TAGGINGS, UNIQUE_TAGGING)
            .unique()
            .named(TAGGINGS_IDX),
        )
        .marks(Flag::IndexTaggingsIdxAdded),
        add_column(TAGS, taggings_count_column())
          .marks(Flag::ColumnTaggingsCountAdded),
        Action::new(
          Probe::ColumnExists(TAGS, "taggings_count"),
          Edit::ResetTaggingsCounters,
        ),
        add_index(IndexDef::on(TAGGINGS, TAGGABLE_CONTEXT)),
        Action::new(
          Probe::Engine(Engine::Mysql),
          Edit::Raw(MYSQL_TAG_NAME_COLLATION),
        ),
      ],
      marks:   Some(Flag::UniqueIndicesApplied),
    },
    Step {
      name:    "missing_indexes",
      when:    Probe::All(vec![
        !Probe::Marked(Flag::IndexTaggingsIdyAdded),
        !Probe::IndexExists(TAGGINGS, TAG_ID),
      ]),
      actions: missing_indexes().into_iter().map(add_index).collect(),
      marks:   Some(Flag::IndexTaggingsIdyAdded),
    },
  ]
}

// ─── Reverse tables ──────────────────────────────────────────────────────────

/// Fine-grained reversal. Every step is gated on its own ledger flag; the
/// action guards only keep an interrupted revert re-runnable.
pub fn reverse_steps() -> Vec<Step> {
  let mut bundle = missing_indexes();
  bundle.reverse();

  vec![
    Step {
      name:    "remove_missing_indexes",
      when:    Probe::Marked(Flag::IndexTaggingsIdyAdded),
      actions: bundle.into_iter().map(remove_index).collect(),
      marks:   None,
    },
    Step {
      name:    "remove_taggings_count",
      when:    Probe::Marked(Flag::ColumnTaggingsCountAdded),
      actions: vec![remove_column(TAGS, "taggings_count")],
      marks:   None,
    },
    Step {
      name:    "remove_taggings_idx",
      when:    Probe::Marked(Flag::IndexTaggingsIdxAdded),
      actions: vec![remove_index(
        IndexDef::on(TAGGINGS, UNIQUE_TAGGING)
          .unique()
          .named(TAGGINGS_IDX),
      )],
      marks:   None,
    },
    Step {
      name:    "restore_tag_id_index",
      when:    Probe::Marked(Flag::IndexTagIdRemoved),
      actions: vec![add_index(IndexDef::on(TAGGINGS, TAG_ID))],
      marks:   None,
    },
    Step {
      name:    "remove_tag_name_index",
      when:    Probe::Marked(Flag::IndexNameAdded),
      actions: vec![remove_index(IndexDef::on(TAGS, TAG_NAME))],
      marks:   None,
    },
    Step {
      name:    "remove_tagger_type",
      when:    Probe::Marked(Flag::ReferenceTaggerTypeAdded),
      actions: vec![remove_column(TAGGINGS, "tagger_type")],
      marks:   None,
    },
    Step {
      name:    "remove_tagger_id",
      when:    Probe::Marked(Flag::ReferenceTaggerIdAdded),
      actions: vec![remove_column(TAGGINGS, "tagger_id")],
      marks:   None,
    },
    Step {
      name:    "remove_context",
      when:    Probe::Marked(Flag::ColumnContextAdded),
      actions: vec![remove_column(TAGGINGS, "context")],
      marks:   None,
    },
    // Only reached when one of the two tables was inherited.
    Step {
      name:    "drop_created_taggings",
      when:    Probe::Marked(Flag::TaggingsTableCreated),
      actions: vec![drop_table(TAGGINGS)],
      marks:   None,
    },
    Step {
      name:    "drop_created_tags",
      when:    Probe::Marked(Flag::TagsTableCreated),
      actions: vec![drop_table(TAGS)],
      marks:   None,
    },
  ]
}

/// Full destructive removal of both tables.
pub fn teardown_steps() -> Vec<Step> {
  vec![Step {
    name:    "drop_tables",
    when:    Probe::Always,
    actions: vec![drop_table(TAGGINGS), drop_table(TAGS)],
    marks:   None,
  }]
}
