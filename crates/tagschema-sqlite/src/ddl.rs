//! Rendering schema definitions as SQLite DDL.

use tagschema_core::schema::{ColumnDef, ColumnType, IndexDef, TableDef};

pub fn quote(ident: &str) -> String {
  format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn column(def: &ColumnDef) -> String {
  let kind = match def.kind {
    ColumnType::Integer => "integer".to_owned(),
    ColumnType::String { limit: None } => "varchar".to_owned(),
    ColumnType::String { limit: Some(n) } => format!("varchar({n})"),
    ColumnType::DateTime => "datetime".to_owned(),
  };
  match def.default {
    Some(value) => format!("{} {kind} DEFAULT {value}", quote(def.name)),
    None => format!("{} {kind}", quote(def.name)),
  }
}

pub fn create_index(def: &IndexDef) -> String {
  let columns: Vec<String> = def.columns.iter().map(|c| quote(c)).collect();
  format!(
    "CREATE {}INDEX {} ON {} ({})",
    if def.unique { "UNIQUE " } else { "" },
    quote(&def.name()),
    quote(def.table),
    columns.join(", ")
  )
}

/// `CREATE TABLE` followed by its indexes, as one batch.
pub fn create_table(def: &TableDef) -> String {
  let mut columns =
    vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL", quote("id"))];
  columns.extend(def.columns.iter().map(column));

  let mut statements =
    vec![format!("CREATE TABLE {} ({})", quote(def.name), columns.join(", "))];
  statements.extend(def.indexes.iter().map(create_index));
  statements.join(";\n") + ";"
}
