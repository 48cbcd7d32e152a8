//! Durable outbox of transport-failed sends.
//!
//! The outbox owns its own SQLite connection on purpose: the outbound
//! pipeline and the retry loop touch it without taking the engine's log
//! permit, so it must not share the [`Database`] handle that lives inside
//! that permit.  The internal mutex only guards the connection itself and
//! is never held across an await point.
//!
//! [`Database`]: crate::Database

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::database::default_db_path;
use crate::error::Result;
use crate::migrations;
use crate::models::FailedUpload;

/// Handle to the `failed_uploads` table.
pub struct Outbox {
    conn: Mutex<Connection>,
}

impl Outbox {
    /// Open the outbox inside the default application database.
    pub fn new() -> Result<Self> {
        Self::open_at(&default_db_path()?)
    }

    /// Open the outbox inside the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Queue a failed send for retry.  `local_id` is assigned by SQLite.
    pub fn insert(&self, record: &FailedUpload) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO failed_uploads (sender, recipient, text, image_path)
             VALUES (?1, ?2, ?3, ?4)",
            params![record.from, record.to, record.text, record.image_path],
        )?;
        Ok(())
    }

    /// Every queued send, in insertion (storage) order.
    pub fn all(&self) -> Result<Vec<FailedUpload>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT local_id, sender, recipient, text, image_path
             FROM failed_uploads
             ORDER BY local_id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(FailedUpload {
                local_id: row.get(0)?,
                from: row.get(1)?,
                to: row.get(2)?,
                text: row.get(3)?,
                image_path: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Remove a queued send after a retry attempt has been dispatched.
    pub fn delete(&self, local_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let affected = conn.execute(
            "DELETE FROM failed_uploads WHERE local_id = ?1",
            params![local_id],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_outbox() -> (tempfile::TempDir, Outbox) {
        let dir = tempfile::tempdir().unwrap();
        let outbox = Outbox::open_at(&dir.path().join("test.db")).unwrap();
        (dir, outbox)
    }

    #[test]
    fn insert_assigns_increasing_local_ids() {
        let (_dir, outbox) = open_test_outbox();

        outbox
            .insert(&FailedUpload::text("a", "b", "first"))
            .unwrap();
        outbox
            .insert(&FailedUpload::image("a", "b", "/tmp/p.png"))
            .unwrap();

        let all = outbox.all().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].local_id < all[1].local_id);
        assert_eq!(all[0].text.as_deref(), Some("first"));
        assert_eq!(all[0].image_path, None);
        assert_eq!(all[1].text, None);
        assert_eq!(all[1].image_path.as_deref(), Some("/tmp/p.png"));
    }

    #[test]
    fn delete_removes_exactly_one_row() {
        let (_dir, outbox) = open_test_outbox();

        outbox.insert(&FailedUpload::text("a", "b", "one")).unwrap();
        outbox.insert(&FailedUpload::text("a", "b", "two")).unwrap();

        let all = outbox.all().unwrap();
        assert!(outbox.delete(all[0].local_id).unwrap());
        assert!(!outbox.delete(all[0].local_id).unwrap());

        let rest = outbox.all().unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].text.as_deref(), Some("two"));
    }

    #[test]
    fn shares_database_file_with_message_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");

        let db = crate::Database::open_at(&path).unwrap();
        let outbox = Outbox::open_at(&path).unwrap();

        outbox.insert(&FailedUpload::text("a", "b", "hi")).unwrap();
        assert_eq!(outbox.all().unwrap().len(), 1);
        drop(db);
    }
}
