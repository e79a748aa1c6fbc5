//! In-memory [`Schema`](crate::Schema) used by the unit tests.
//!
//! Mirrors the failure modes of a real engine (duplicate objects, missing
//! objects and uncovered index columns are errors) and can fail the n-th edit
//! to simulate an interrupted run.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::{
  backend::{
    Backend, ChangeLedger, CounterCache, Engine, EngineProbe, SchemaEditor,
    SchemaInspector,
  },
  flag::Flag,
  schema::{ColumnDef, IndexDef, IndexTarget, TableDef},
};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct FakeError(String);

fn fail<T>(msg: impl Into<String>) -> Result<T, FakeError> {
  Err(FakeError(msg.into()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeIndex {
  pub columns: Vec<String>,
  pub unique:  bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeTable {
  pub columns: BTreeSet<String>,
  pub indexes: BTreeMap<String, FakeIndex>,
}

impl FakeTable {
  pub fn with_columns(columns: &[&str]) -> Self {
    Self {
      columns: columns.iter().map(|c| c.to_string()).collect(),
      indexes: BTreeMap::new(),
    }
  }

  pub fn with_index(mut self, index: IndexDef) -> Self {
    self.indexes.insert(index.name(), FakeIndex {
      columns: index.columns.iter().map(|c| c.to_string()).collect(),
      unique:  index.unique,
    });
    self
  }

  fn index_by_columns(&self, columns: &[&str]) -> Option<&String> {
    self
      .indexes
      .iter()
      .find(|(_, index)| {
        index.columns.len() == columns.len()
          && index.columns.iter().zip(columns).all(|(a, b)| a == b)
      })
      .map(|(name, _)| name)
  }
}

#[derive(Debug, Default)]
pub struct FakeDb {
  pub tables:   BTreeMap<String, FakeTable>,
  pub ledger:   Option<BTreeSet<Flag>>,
  pub engine:   Engine,
  /// Raw statements executed, in order.
  pub raw:      Vec<String>,
  /// `tag_id` of every tagging row.
  pub taggings: Vec<i64>,
  /// Tag id to its stored `taggings_count`.
  pub counters: BTreeMap<i64, i64>,
  /// Edits attempted so far.
  pub edits:    usize,
  /// Fail the edit with this zero-based ordinal.
  pub fail_at:  Option<usize>,
}

impl FakeDb {
  pub fn with_table(mut self, name: &str, table: FakeTable) -> Self {
    self.tables.insert(name.to_owned(), table);
    self
  }

  fn table(&self, name: &str) -> Result<&FakeTable, FakeError> {
    match self.tables.get(name) {
      Some(table) => Ok(table),
      None => fail(format!("no such table: {name}")),
    }
  }

  fn table_mut(&mut self, name: &str) -> Result<&mut FakeTable, FakeError> {
    match self.tables.get_mut(name) {
      Some(table) => Ok(table),
      None => fail(format!("no such table: {name}")),
    }
  }

  fn begin_edit(&mut self) -> Result<(), FakeError> {
    let ordinal = self.edits;
    self.edits += 1;
    if self.fail_at == Some(ordinal) {
      return fail(format!("injected failure at edit {ordinal}"));
    }
    Ok(())
  }
}

impl Backend for FakeDb {
  type Error = FakeError;
}

impl SchemaInspector for FakeDb {
  fn table_exists(&self, table: &str) -> Result<bool, FakeError> {
    Ok(self.tables.contains_key(table))
  }

  fn column_exists(&self, table: &str, column: &str) -> Result<bool, FakeError> {
    Ok(self.tables.get(table).is_some_and(|t| t.columns.contains(column)))
  }

  fn index_exists(
    &self,
    table: &str,
    columns: &[&str],
  ) -> Result<bool, FakeError> {
    Ok(
      self
        .tables
        .get(table)
        .is_some_and(|t| t.index_by_columns(columns).is_some()),
    )
  }

  fn named_index_exists(
    &self,
    table: &str,
    name: &str,
  ) -> Result<bool, FakeError> {
    Ok(self.tables.get(table).is_some_and(|t| t.indexes.contains_key(name)))
  }
}

impl SchemaEditor for FakeDb {
  fn create_table(&mut self, def: &TableDef) -> Result<(), FakeError> {
    self.begin_edit()?;
    if self.tables.contains_key(def.name) {
      return fail(format!("table {} already exists", def.name));
    }
    let mut table = FakeTable::default();
    table.columns.insert("id".into());
    table.columns.extend(def.columns.iter().map(|c| c.name.to_owned()));
    for index in &def.indexes {
      table = table.with_index(index.clone());
    }
    self.tables.insert(def.name.to_owned(), table);
    Ok(())
  }

  fn drop_table(&mut self, table: &str) -> Result<(), FakeError> {
    self.begin_edit()?;
    match self.tables.remove(table) {
      Some(_) => Ok(()),
      None => fail(format!("no such table: {table}")),
    }
  }

  fn add_column(
    &mut self,
    table: &str,
    column: &ColumnDef,
  ) -> Result<(), FakeError> {
    self.begin_edit()?;
    let t = self.table_mut(table)?;
    if !t.columns.insert(column.name.to_owned()) {
      return fail(format!("duplicate column {table}.{}", column.name));
    }
    Ok(())
  }

  fn remove_column(&mut self, table: &str, column: &str) -> Result<(), FakeError> {
    self.begin_edit()?;
    let t = self.table_mut(table)?;
    if !t.columns.remove(column) {
      return fail(format!("no such column {table}.{column}"));
    }
    t.indexes.retain(|_, index| !index.columns.iter().any(|c| c == column));
    Ok(())
  }

  fn add_index(&mut self, index: &IndexDef) -> Result<(), FakeError> {
    self.begin_edit()?;
    let name = index.name();
    let t = self.table(index.table)?;
    if t.indexes.contains_key(&name) {
      return fail(format!("index {name} already exists"));
    }
    if let Some(missing) =
      index.columns.iter().find(|c| !t.columns.contains(**c))
    {
      return fail(format!("no such column {}.{missing}", index.table));
    }
    let table = self.table_mut(index.table)?;
    let updated = std::mem::take(table).with_index(index.clone());
    *table = updated;
    Ok(())
  }

  fn remove_index(
    &mut self,
    table: &str,
    target: &IndexTarget,
  ) -> Result<(), FakeError> {
    self.begin_edit()?;
    let t = self.table_mut(table)?;
    let name = match target {
      IndexTarget::Named(name) => Some(name.to_string()),
      IndexTarget::Columns(columns) => t.index_by_columns(columns).cloned(),
    };
    match name.and_then(|n| t.indexes.remove(&n)) {
      Some(_) => Ok(()),
      None => fail(format!("no index {target} on {table}")),
    }
  }

  fn execute_raw(&mut self, sql: &str) -> Result<(), FakeError> {
    self.begin_edit()?;
    self.raw.push(sql.to_owned());
    Ok(())
  }
}

impl ChangeLedger for FakeDb {
  fn initialize(&mut self) -> Result<(), FakeError> {
    self.ledger.get_or_insert_with(BTreeSet::new);
    Ok(())
  }

  fn mark(&mut self, flag: Flag) -> Result<(), FakeError> {
    match self.ledger.as_mut() {
      Some(ledger) => {
        ledger.insert(flag);
        Ok(())
      }
      None => fail("ledger not initialised"),
    }
  }

  fn is_marked(&self, flag: Flag) -> Result<bool, FakeError> {
    Ok(self.ledger.as_ref().is_some_and(|l| l.contains(&flag)))
  }

  fn drop_ledger(&mut self) -> Result<(), FakeError> {
    self.ledger = None;
    Ok(())
  }
}

impl CounterCache for FakeDb {
  fn tag_ids(&self) -> Result<Vec<i64>, FakeError> {
    Ok(self.counters.keys().copied().collect())
  }

  fn reset_taggings_count(&mut self, tag_id: i64) -> Result<(), FakeError> {
    self.begin_edit()?;
    let count = self.taggings.iter().filter(|t| **t == tag_id).count();
    self.counters.insert(tag_id, count as i64);
    Ok(())
  }
}

impl EngineProbe for FakeDb {
  fn engine(&self) -> Engine { self.engine }
}
