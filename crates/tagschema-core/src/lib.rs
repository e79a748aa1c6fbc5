//! Core types and the reconciliation driver for the tagging schema.
//!
//! This crate knows nothing about a concrete database. Backends implement the
//! collaborator traits in [`backend`]; the fixed step tables in [`step`] are
//! interpreted against them by [`converge`] and [`revert`].

pub mod backend;
pub mod driver;
pub mod error;
pub mod flag;
pub mod schema;
pub mod step;

pub use backend::{
  Backend, ChangeLedger, CounterCache, Engine, EngineProbe, Schema,
  SchemaEditor, SchemaInspector,
};
pub use driver::{AppliedEdit, Report, RevertOptions, converge, revert};
pub use error::{Error, Result};
pub use flag::Flag;

#[cfg(test)]
mod fake;
