//! [`SqliteSchema`]: the collaborator traits over a live SQLite connection.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use tagschema_core::{
  Backend, ChangeLedger, CounterCache, Engine, EngineProbe, Flag,
  SchemaEditor, SchemaInspector,
  schema::{ColumnDef, IndexDef, IndexTarget, TableDef},
};

use crate::{
  ddl,
  error::SchemaError,
  schema::{CREATE_LEDGER, DROP_LEDGER, LEDGER_TABLE},
};

/// A user-visible index and its ordered key columns.
///
/// A `None` column is an expression key. Such an index never matches a
/// plain column list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexInfo {
  pub name:       String,
  pub unique:     bool,
  /// Backs an inline `UNIQUE` constraint and cannot be dropped on its own.
  pub constraint: bool,
  pub columns:    Vec<Option<String>>,
}

impl IndexInfo {
  /// True when the index keys are exactly `columns`, in order.
  pub fn is_on(&self, columns: &[&str]) -> bool {
    self.columns.len() == columns.len()
      && self
        .columns
        .iter()
        .zip(columns)
        .all(|(have, want)| have.as_deref() == Some(*want))
  }

  pub fn covers(&self, column: &str) -> bool {
    self.columns.iter().any(|c| c.as_deref() == Some(column))
  }
}

/// Borrowing adapter; every query hits the connection, nothing is cached.
pub struct SqliteSchema<'c> {
  conn: &'c Connection,
}

impl<'c> SqliteSchema<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }

  /// Indexes from `CREATE INDEX` or an inline `UNIQUE`; primary keys are
  /// left out.
  pub fn indexes(&self, table: &str) -> rusqlite::Result<Vec<IndexInfo>> {
    let mut stmt = self.conn.prepare(
      "SELECT il.name, il.\"unique\", il.origin, ii.name
         FROM pragma_index_list(?1) AS il
         JOIN pragma_index_info(il.name) AS ii
        WHERE il.origin IN ('c', 'u')
        ORDER BY il.name, ii.seqno",
    )?;
    let rows = stmt.query_map(rusqlite::params![table], |r| {
      Ok((
        r.get::<_, String>(0)?,
        r.get::<_, bool>(1)?,
        r.get::<_, String>(2)?,
        r.get::<_, Option<String>>(3)?,
      ))
    })?;

    let mut indexes: Vec<IndexInfo> = Vec::new();
    for row in rows {
      let (name, unique, origin, column) = row?;
      match indexes.last_mut() {
        Some(last) if last.name == name => last.columns.push(column),
        _ => indexes.push(IndexInfo {
          name,
          unique,
          constraint: origin == "u",
          columns: vec![column],
        }),
      }
    }
    Ok(indexes)
  }

  pub fn columns(&self, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = self
      .conn
      .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let rows = stmt.query_map(rusqlite::params![table], |r| r.get(0))?;
    rows.collect()
  }

  /// The first droppable index keyed on exactly `columns`.
  fn droppable_index_on(
    &self,
    table: &str,
    columns: &[&str],
  ) -> rusqlite::Result<Option<String>> {
    Ok(
      self
        .indexes(table)?
        .into_iter()
        .find(|index| !index.constraint && index.is_on(columns))
        .map(|index| index.name),
    )
  }

  fn count(
    &self,
    sql: &str,
    params: impl rusqlite::Params,
  ) -> rusqlite::Result<bool> {
    let n: i64 = self.conn.query_row(sql, params, |r| r.get(0))?;
    Ok(n > 0)
  }
}

impl Backend for SqliteSchema<'_> {
  type Error = SchemaError;
}

// ─── Schema Inspector ────────────────────────────────────────────────────────

impl SchemaInspector for SqliteSchema<'_> {
  fn table_exists(&self, table: &str) -> Result<bool, SchemaError> {
    Ok(self.count(
      "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
      rusqlite::params![table],
    )?)
  }

  fn column_exists(
    &self,
    table: &str,
    column: &str,
  ) -> Result<bool, SchemaError> {
    Ok(self.count(
      "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
      rusqlite::params![table, column],
    )?)
  }

  fn index_exists(
    &self,
    table: &str,
    columns: &[&str],
  ) -> Result<bool, SchemaError> {
    Ok(self.indexes(table)?.iter().any(|index| index.is_on(columns)))
  }

  fn named_index_exists(
    &self,
    table: &str,
    name: &str,
  ) -> Result<bool, SchemaError> {
    Ok(self.count(
      "SELECT COUNT(*) FROM sqlite_master
        WHERE type = 'index' AND tbl_name = ?1 AND name = ?2",
      rusqlite::params![table, name],
    )?)
  }
}

// ─── Schema edits ────────────────────────────────────────────────────────────

impl SchemaEditor for SqliteSchema<'_> {
  fn create_table(&mut self, table: &TableDef) -> Result<(), SchemaError> {
    self.conn.execute_batch(&ddl::create_table(table))?;
    Ok(())
  }

  fn drop_table(&mut self, table: &str) -> Result<(), SchemaError> {
    self
      .conn
      .execute_batch(&format!("DROP TABLE {}", ddl::quote(table)))?;
    Ok(())
  }

  fn add_column(
    &mut self,
    table: &str,
    column: &ColumnDef,
  ) -> Result<(), SchemaError> {
    self.conn.execute_batch(&format!(
      "ALTER TABLE {} ADD COLUMN {}",
      ddl::quote(table),
      ddl::column(column)
    ))?;
    Ok(())
  }

  /// SQLite refuses to drop an indexed column, so covering indexes go first.
  fn remove_column(
    &mut self,
    table: &str,
    column: &str,
  ) -> Result<(), SchemaError> {
    for index in self.indexes(table)? {
      if !index.constraint && index.covers(column) {
        self
          .conn
          .execute_batch(&format!("DROP INDEX {}", ddl::quote(&index.name)))?;
      }
    }
    self.conn.execute_batch(&format!(
      "ALTER TABLE {} DROP COLUMN {}",
      ddl::quote(table),
      ddl::quote(column)
    ))?;
    Ok(())
  }

  fn add_index(&mut self, index: &IndexDef) -> Result<(), SchemaError> {
    self.conn.execute_batch(&ddl::create_index(index))?;
    Ok(())
  }

  fn remove_index(
    &mut self,
    table: &str,
    target: &IndexTarget,
  ) -> Result<(), SchemaError> {
    let name = match target {
      IndexTarget::Named(name) if self.named_index_exists(table, name)? => {
        Some(name.to_string())
      }
      IndexTarget::Named(_) => None,
      IndexTarget::Columns(columns) => {
        self.droppable_index_on(table, columns)?
      }
    };
    let name = name.ok_or_else(|| SchemaError::IndexNotFound {
      table:  table.to_owned(),
      target: target.to_string(),
    })?;
    self
      .conn
      .execute_batch(&format!("DROP INDEX {}", ddl::quote(&name)))?;
    Ok(())
  }

  fn execute_raw(&mut self, sql: &str) -> Result<(), SchemaError> {
    self.conn.execute_batch(sql)?;
    Ok(())
  }
}

// ─── Change Ledger ───────────────────────────────────────────────────────────

impl ChangeLedger for SqliteSchema<'_> {
  fn initialize(&mut self) -> Result<(), SchemaError> {
    self.conn.execute_batch(CREATE_LEDGER)?;
    Ok(())
  }

  fn mark(&mut self, flag: Flag) -> Result<(), SchemaError> {
    self.conn.execute(
      "INSERT OR IGNORE INTO tagschema_ledger (flag, applied_at) VALUES (?1, ?2)",
      rusqlite::params![flag.as_str(), Utc::now().to_rfc3339()],
    )?;
    Ok(())
  }

  fn is_marked(&self, flag: Flag) -> Result<bool, SchemaError> {
    if !self.table_exists(LEDGER_TABLE)? {
      return Ok(false);
    }
    let marked = self
      .conn
      .query_row(
        "SELECT 1 FROM tagschema_ledger WHERE flag = ?1",
        rusqlite::params![flag.as_str()],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false);
    Ok(marked)
  }

  fn drop_ledger(&mut self) -> Result<(), SchemaError> {
    self.conn.execute_batch(DROP_LEDGER)?;
    Ok(())
  }
}

// ─── Data-layer collaborators ────────────────────────────────────────────────

impl CounterCache for SqliteSchema<'_> {
  fn tag_ids(&self) -> Result<Vec<i64>, SchemaError> {
    let mut stmt = self.conn.prepare("SELECT id FROM tags ORDER BY id")?;
    let ids = stmt
      .query_map([], |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
  }

  fn reset_taggings_count(&mut self, tag_id: i64) -> Result<(), SchemaError> {
    self.conn.execute(
      "UPDATE tags
          SET taggings_count = (SELECT COUNT(*) FROM taggings WHERE tag_id = ?1)
        WHERE id = ?1",
      rusqlite::params![tag_id],
    )?;
    Ok(())
  }
}

impl EngineProbe for SqliteSchema<'_> {
  fn engine(&self) -> Engine { Engine::Sqlite }
}
