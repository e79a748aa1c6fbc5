//! Error types for `tagschema-core`.

use thiserror::Error;

/// A backend failure, boxed so the driver stays backend-agnostic.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every variant aborts the run. Nothing is marked for the failing edit, so
/// the next run retries it.
#[derive(Debug, Error)]
pub enum Error {
  /// The inspector could not answer an existence query.
  #[error("step {step}: schema probe failed: {source}")]
  Probe {
    step:   &'static str,
    #[source]
    source: BoxError,
  },

  #[error("step {step}: {edit} failed: {source}")]
  Edit {
    step:   &'static str,
    edit:   String,
    #[source]
    source: BoxError,
  },

  #[error("ledger {op} failed: {source}")]
  Ledger {
    op:     String,
    #[source]
    source: BoxError,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
