//! Database schema definitions
//!
//! One database holds every named store. Deleting a row from `caches` removes
//! all of its entries through the foreign key.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Named content stores, one per version tag
CREATE TABLE IF NOT EXISTS caches (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

-- Stored response snapshots
CREATE TABLE IF NOT EXISTS entries (
    cache_name TEXT NOT NULL REFERENCES caches(name) ON DELETE CASCADE,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    opaque INTEGER NOT NULL DEFAULT 0,
    stored_at TEXT NOT NULL,
    PRIMARY KEY (cache_name, url)
);

CREATE INDEX IF NOT EXISTS idx_entries_cache ON entries(cache_name);
"#;

/// Creates all tables and indexes if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
