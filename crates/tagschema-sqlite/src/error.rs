//! Error types for `tagschema-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("reconcile error: {0}")]
  Reconcile(#[from] tagschema_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("unknown ledger flag: {0:?}")]
  UnknownFlag(String),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error raised by [`SqliteSchema`](crate::SqliteSchema) while a pass runs.
#[derive(Debug, Error)]
pub enum SchemaError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("no index {target} on {table}")]
  IndexNotFound { table: String, target: String },
}
