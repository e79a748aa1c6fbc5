//! SQLite backend for the tagging schema reconciler.
//!
//! [`SqliteSchema`] implements the collaborator traits of `tagschema-core`
//! over a borrowed [`rusqlite::Connection`]. [`Reconciler`] wraps
//! [`tokio_rusqlite`] and runs each pass on the connection thread inside a
//! single transaction, so a failed pass leaves the database untouched.

mod backend;
mod ddl;
mod reconciler;
mod schema;

pub mod error;

pub use backend::{IndexInfo, SqliteSchema};
pub use error::{Error, Result, SchemaError};
pub use reconciler::{LedgerEntry, Reconciler};
