//! [`Reconciler`]: async entry points over a `tokio_rusqlite` connection.

use std::{path::Path, str::FromStr as _};

use chrono::{DateTime, Utc};
use tagschema_core::{Flag, Report, RevertOptions};

use crate::{
  Error, Result,
  backend::SqliteSchema,
  schema::LEDGER_TABLE,
};

/// A ledger row: a flag and when it was first set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
  pub flag:       Flag,
  pub applied_at: DateTime<Utc>,
}

/// Reconciles the tagging schema of one SQLite database.
///
/// Cloning is cheap; the inner connection is reference-counted. Concurrent
/// passes against the same database are not supported.
#[derive(Clone)]
pub struct Reconciler {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl Reconciler {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  /// Open an in-memory database, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  /// Run the forward pass.
  pub async fn converge(&self) -> Result<Report> {
    self.in_transaction(|schema| tagschema_core::converge(schema)).await
  }

  /// Run the reverse pass and drop the ledger.
  pub async fn revert(&self, options: RevertOptions) -> Result<Report> {
    self
      .in_transaction(move |schema| tagschema_core::revert(schema, options))
      .await
  }

  /// Every flag currently set, in the order it was recorded. Empty when the
  /// ledger does not exist.
  pub async fn ledger(&self) -> Result<Vec<LedgerEntry>> {
    let rows: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let exists: i64 = conn.query_row(
          "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
          rusqlite::params![LEDGER_TABLE],
          |r| r.get(0),
        )?;
        if exists == 0 {
          return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(
          "SELECT flag, applied_at FROM tagschema_ledger ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(flag, applied_at)| {
        let flag =
          Flag::from_str(&flag).map_err(|_| Error::UnknownFlag(flag.clone()))?;
        let applied_at = DateTime::parse_from_rfc3339(&applied_at)
          .map(|dt| dt.with_timezone(&Utc))
          .map_err(|e| Error::DateParse(e.to_string()))?;
        Ok(LedgerEntry { flag, applied_at })
      })
      .collect()
  }

  /// Run `pass` on the connection thread inside one transaction; it commits
  /// only when the pass succeeds.
  async fn in_transaction<F>(&self, pass: F) -> Result<Report>
  where
    F: FnOnce(&mut SqliteSchema<'_>) -> tagschema_core::Result<Report>
      + Send
      + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = pass(&mut SqliteSchema::new(&tx));
        match &outcome {
          Ok(_) => tx.commit()?,
          Err(e) => {
            tracing::warn!("pass failed, rolling back: {e}");
            tx.rollback()?;
          }
        }
        Ok(outcome)
      })
      .await?;
    Ok(outcome?)
  }
}
