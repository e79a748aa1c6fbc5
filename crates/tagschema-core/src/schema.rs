//! Table, column and index definitions for the converged tagging schema.

use std::fmt;

pub const TAGS: &str = "tags";
pub const TAGGINGS: &str = "taggings";

/// Name of the six-column composite unique index on `taggings`.
pub const TAGGINGS_IDX: &str = "taggings_idx";
/// Name of the composite lookup index added by the missing-indexes bundle.
pub const TAGGINGS_IDY: &str = "taggings_idy";

pub const TAG_ID: &[&str] = &["tag_id"];
pub const TAG_NAME: &[&str] = &["name"];
pub const TAGGABLE_CONTEXT: &[&str] = &["taggable_id", "taggable_type", "context"];
pub const TAGGER: &[&str] = &["tagger_id", "tagger_type"];
pub const UNIQUE_TAGGING: &[&str] = &[
  "tag_id",
  "taggable_id",
  "taggable_type",
  "context",
  "tagger_id",
  "tagger_type",
];
pub const TAGGABLE_TAGGER_CONTEXT: &[&str] =
  &["taggable_id", "taggable_type", "tagger_id", "context"];

/// Length limit of `taggings.context`; keeps composite indexes within the
/// MySQL key length.
pub const CONTEXT_LIMIT: u32 = 128;

/// Makes `tags.name` compare case-sensitively on MySQL-family engines.
pub const MYSQL_TAG_NAME_COLLATION: &str =
  "ALTER TABLE tags MODIFY name varchar(255) CHARACTER SET utf8 COLLATE utf8_bin;";

// ─── Columns ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Integer,
  String { limit: Option<u32> },
  DateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
  pub name:    &'static str,
  pub kind:    ColumnType,
  pub default: Option<i64>,
}

impl ColumnDef {
  pub const fn integer(name: &'static str) -> Self {
    Self { name, kind: ColumnType::Integer, default: None }
  }

  pub const fn string(name: &'static str) -> Self {
    Self { name, kind: ColumnType::String { limit: None }, default: None }
  }

  pub const fn datetime(name: &'static str) -> Self {
    Self { name, kind: ColumnType::DateTime, default: None }
  }

  pub const fn limit(mut self, limit: u32) -> Self {
    self.kind = ColumnType::String { limit: Some(limit) };
    self
  }

  pub const fn with_default(mut self, value: i64) -> Self {
    self.default = Some(value);
    self
  }
}

// ─── Indexes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
  pub table:   &'static str,
  /// Ordered; two indexes over the same columns in a different order differ.
  pub columns: &'static [&'static str],
  pub unique:  bool,
  pub name:    Option<&'static str>,
}

impl IndexDef {
  pub const fn on(table: &'static str, columns: &'static [&'static str]) -> Self {
    Self { table, columns, unique: false, name: None }
  }

  pub const fn unique(mut self) -> Self {
    self.unique = true;
    self
  }

  pub const fn named(mut self, name: &'static str) -> Self {
    self.name = Some(name);
    self
  }

  /// The explicit name, or `index_<table>_on_<a>_and_<b>`.
  pub fn name(&self) -> String {
    match self.name {
      Some(name) => name.to_owned(),
      None => default_index_name(self.table, self.columns),
    }
  }
}

pub fn default_index_name(table: &str, columns: &[&str]) -> String {
  format!("index_{table}_on_{}", columns.join("_and_"))
}

/// How an index is identified when it is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexTarget {
  Columns(&'static [&'static str]),
  Named(&'static str),
}

impl fmt::Display for IndexTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Columns(columns) => write!(f, "({})", columns.join(", ")),
      Self::Named(name) => write!(f, "{name}"),
    }
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// A table created together with its indexes as one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
  pub name:    &'static str,
  /// Excludes the implicit integer primary key `id`.
  pub columns: Vec<ColumnDef>,
  pub indexes: Vec<IndexDef>,
}

pub fn context_column() -> ColumnDef {
  ColumnDef::string("context").limit(CONTEXT_LIMIT)
}

pub fn tagger_columns() -> [ColumnDef; 2] {
  [ColumnDef::integer("tagger_id"), ColumnDef::string("tagger_type")]
}

pub fn taggings_count_column() -> ColumnDef {
  ColumnDef::integer("taggings_count").with_default(0)
}

pub fn tags_table() -> TableDef {
  TableDef {
    name:    TAGS,
    columns: vec![ColumnDef::string("name")],
    indexes: Vec::new(),
  }
}

/// Baseline `taggings` with the `tag_id` and taggable/context indexes.
pub fn taggings_table() -> TableDef {
  let [tagger_id, tagger_type] = tagger_columns();
  TableDef {
    name:    TAGGINGS,
    columns: vec![
      ColumnDef::integer("tag_id"),
      ColumnDef::integer("taggable_id"),
      ColumnDef::string("taggable_type"),
      tagger_id,
      tagger_type,
      context_column(),
      ColumnDef::datetime("created_at"),
    ],
    indexes: vec![
      IndexDef::on(TAGGINGS, TAG_ID),
      IndexDef::on(TAGGINGS, TAGGABLE_CONTEXT),
    ],
  }
}
