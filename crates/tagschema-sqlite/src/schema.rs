//! SQL for the change ledger table.

pub const LEDGER_TABLE: &str = "tagschema_ledger";

/// One row per flag that has been set.
pub const CREATE_LEDGER: &str = "
CREATE TABLE IF NOT EXISTS tagschema_ledger (
    flag        TEXT PRIMARY KEY,   -- snake_case Flag name
    applied_at  TEXT NOT NULL       -- ISO 8601 UTC
);
";

pub const DROP_LEDGER: &str = "DROP TABLE IF EXISTS tagschema_ledger";
