//! v001 -- Initial schema creation.
//!
//! Creates the two core tables: `messages` (the durable mirror of the
//! remote chat history) and `failed_uploads` (the outbox of sends that
//! failed at the transport level).

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Messages (append-only, keyed by the server-assigned id)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id        INTEGER PRIMARY KEY NOT NULL,  -- server-assigned message id
    image_id  INTEGER,                       -- local blob identifier, images only
    sender    TEXT NOT NULL,
    recipient TEXT NOT NULL,
    text      TEXT,                          -- exactly one of text / link is set
    link      TEXT,
    time      TEXT NOT NULL                  -- millisecond timestamp string
);

-- ----------------------------------------------------------------
-- Failed uploads (the durable outbox, mutable)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS failed_uploads (
    local_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    sender     TEXT NOT NULL,
    recipient  TEXT NOT NULL,
    text       TEXT,                         -- exactly one of text / image_path is set
    image_path TEXT
);
"#;

/// Apply the v001 schema.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
