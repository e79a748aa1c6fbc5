//! Collaborator traits implemented by database backends.
//!
//! Every method is synchronous and blocking. The driver never caches an
//! answer: earlier edits in the same pass change what later probes see.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
  flag::Flag,
  schema::{ColumnDef, IndexDef, IndexTarget, TableDef},
};

/// Relational engine family behind a backend.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Engine {
  #[default]
  Sqlite,
  Mysql,
  Postgres,
}

/// Shared error type for all collaborator traits of one backend.
pub trait Backend {
  type Error: std::error::Error + Send + Sync + 'static;
}

// ─── Schema Inspector ────────────────────────────────────────────────────────

/// Side-effect-free existence predicates against the live schema.
pub trait SchemaInspector: Backend {
  fn table_exists(&self, table: &str) -> Result<bool, Self::Error>;

  fn column_exists(&self, table: &str, column: &str)
  -> Result<bool, Self::Error>;

  /// True when some index on `table` covers exactly `columns`, in order.
  fn index_exists(
    &self,
    table: &str,
    columns: &[&str],
  ) -> Result<bool, Self::Error>;

  fn named_index_exists(
    &self,
    table: &str,
    name: &str,
  ) -> Result<bool, Self::Error>;
}

// ─── Schema edits ────────────────────────────────────────────────────────────

pub trait SchemaEditor: Backend {
  /// Create `table` and all of its indexes.
  fn create_table(&mut self, table: &TableDef) -> Result<(), Self::Error>;

  fn drop_table(&mut self, table: &str) -> Result<(), Self::Error>;

  fn add_column(
    &mut self,
    table: &str,
    column: &ColumnDef,
  ) -> Result<(), Self::Error>;

  /// Remove `column`. Indexes covering it are removed along with it.
  fn remove_column(
    &mut self,
    table: &str,
    column: &str,
  ) -> Result<(), Self::Error>;

  fn add_index(&mut self, index: &IndexDef) -> Result<(), Self::Error>;

  fn remove_index(
    &mut self,
    table: &str,
    target: &IndexTarget,
  ) -> Result<(), Self::Error>;

  /// Run an engine-specific statement verbatim.
  fn execute_raw(&mut self, sql: &str) -> Result<(), Self::Error>;
}

// ─── Change Ledger ───────────────────────────────────────────────────────────

/// Persistent record of which changes this tool applied itself.
pub trait ChangeLedger: Backend {
  /// Create the ledger if absent. Safe to call on every run.
  fn initialize(&mut self) -> Result<(), Self::Error>;

  /// Record `flag`. Marking an already-set flag is a no-op.
  fn mark(&mut self, flag: Flag) -> Result<(), Self::Error>;

  /// False when the ledger itself does not exist.
  fn is_marked(&self, flag: Flag) -> Result<bool, Self::Error>;

  /// Remove the ledger and its storage. No-op when absent.
  fn drop_ledger(&mut self) -> Result<(), Self::Error>;
}

// ─── Data-layer collaborators ────────────────────────────────────────────────

/// Recomputes the `tags.taggings_count` counter cache.
pub trait CounterCache: Backend {
  fn tag_ids(&self) -> Result<Vec<i64>, Self::Error>;

  /// Persist the authoritative count of `taggings` rows for `tag_id`.
  fn reset_taggings_count(&mut self, tag_id: i64) -> Result<(), Self::Error>;
}

pub trait EngineProbe: Backend {
  fn engine(&self) -> Engine;
}

/// Everything the driver needs from a backend.
pub trait Schema:
  SchemaInspector + SchemaEditor + ChangeLedger + CounterCache + EngineProbe
{
}

impl<T> Schema for T where
  T: SchemaInspector + SchemaEditor + ChangeLedger + CounterCache + EngineProbe
{
}
