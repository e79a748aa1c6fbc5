//! Ledger flags: one per structural change the driver can apply.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A marker meaning "this change was applied by this tool".
///
/// The snake_case form is the key persisted in the ledger and must stay
/// stable across releases.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Flag {
  /// `tags` was created from scratch.
  TagsTableCreated,
  /// `taggings` was created from scratch, with its baseline indexes.
  TaggingsTableCreated,
  ColumnContextAdded,
  ReferenceTaggerIdAdded,
  ReferenceTaggerTypeAdded,
  IndexNameAdded,
  /// The single-column `taggings(tag_id)` index was dropped.
  IndexTagIdRemoved,
  IndexTaggingsIdxAdded,
  ColumnTaggingsCountAdded,
  /// The whole unique-indices bundle ran to completion.
  UniqueIndicesApplied,
  /// The whole missing-indexes bundle ran to completion.
  IndexTaggingsIdyAdded,
}

impl Flag {
  pub fn as_str(self) -> &'static str { self.into() }
}
