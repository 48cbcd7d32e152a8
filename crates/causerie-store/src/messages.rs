use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::MessageRecord;

impl Database {
    /// Append one message row.  The table is append-only: rows are never
    /// updated or deleted, and a duplicate server id is an error.
    pub fn insert_message(&self, record: &MessageRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO messages (id, image_id, sender, recipient, text, link, time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.image_id,
                record.from,
                record.to,
                record.text,
                record.link,
                record.time,
            ],
        )?;
        Ok(())
    }

    /// Every stored message in ascending server-id order, which is also the
    /// order the log is rebuilt in on cold start.
    pub fn get_all_messages(&self) -> Result<Vec<MessageRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, image_id, sender, recipient, text, link, time
             FROM messages
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Local image id for the message with the given server id.
    ///
    /// `Ok(None)` means the message exists but carries no image payload.
    pub fn get_image_id(&self, id: i64) -> Result<Option<i64>> {
        self.conn()
            .query_row(
                "SELECT image_id FROM messages WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    Ok(MessageRecord {
        id: row.get(0)?,
        image_id: row.get(1)?,
        from: row.get(2)?,
        to: row.get(3)?,
        text: row.get(4)?,
        link: row.get(5)?,
        time: row.get(6)?,
    })
}
