//! Database repository layer
//!
//! Query, insert and delete operations for uploads and committed messages.
//! Timestamps are stored as ISO 8601 text without an offset; archive exports
//! carry no timezone information.

use crate::error::Result;
use crate::types::{Message, Upload, UploadBatch, UploadStatus};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

/// Storage format for timestamps.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format(TIME_FORMAT).to_string()
}

fn parse_ts(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT).unwrap_or_default()
}

/// Database handle with a single pooled connection
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Upload operations
    // ============================================

    /// Insert a pending upload, returning its id
    pub fn insert_upload(&self, folder_id: i64, file_name: &str, payload: &[u8]) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO uploads (folder_id, file_name, payload, in_progress) VALUES (?1, ?2, ?3, 0)",
            params![folder_id, file_name, payload],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All pending uploads across every folder, in natural return order
    pub fn pending_uploads(&self) -> Result<Vec<Upload>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, folder_id, file_name, payload, in_progress FROM uploads")?;
        let uploads = stmt
            .query_map([], Self::row_to_upload)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(uploads)
    }

    /// Uploads awaiting ingestion for one folder, payload omitted
    pub fn upload_statuses(&self, folder_id: i64) -> Result<Vec<UploadStatus>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, folder_id, file_name, in_progress FROM uploads WHERE folder_id = ?1")?;
        let uploads = stmt
            .query_map([folder_id], |row| {
                Ok(UploadStatus {
                    id: row.get("id")?,
                    folder_id: row.get("folder_id")?,
                    file_name: row.get("file_name")?,
                    in_progress: row.get::<_, i64>("in_progress")? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(uploads)
    }

    /// Mark an upload as picked up by the scheduler
    pub fn mark_upload_in_progress(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("UPDATE uploads SET in_progress = 1 WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Delete an upload record
    pub fn delete_upload(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM uploads WHERE id = ?1", [id])?;
        Ok(())
    }

    fn row_to_upload(row: &Row) -> rusqlite::Result<Upload> {
        Ok(Upload {
            id: row.get("id")?,
            folder_id: row.get("folder_id")?,
            file_name: row.get("file_name")?,
            payload: row.get("payload")?,
            in_progress: row.get::<_, i64>("in_progress")? != 0,
        })
    }

    // ============================================
    // Message operations
    // ============================================

    /// Insert a batch of messages in one transaction
    pub fn insert_messages(&self, messages: &[Message]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        for message in messages {
            tx.execute(
                r#"
                INSERT INTO messages (folder_id, sender, sent_at, ingested_at, body)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    message.folder_id,
                    message.sender,
                    fmt_ts(message.sent_at),
                    fmt_ts(message.ingested_at),
                    message.body,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Load the `(body, sent_at)` dedup key set for a folder in one query
    pub fn message_keys(&self, folder_id: i64) -> Result<HashSet<(String, NaiveDateTime)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT body, sent_at FROM messages WHERE folder_id = ?1")?;
        let keys = stmt
            .query_map([folder_id], |row| {
                let body: String = row.get(0)?;
                let sent_at: String = row.get(1)?;
                Ok((body, parse_ts(&sent_at)))
            })?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(keys)
    }

    /// All messages of a folder in insertion order
    pub fn folder_messages(&self, folder_id: i64) -> Result<Vec<Message>> {
        self.query_messages(
            "SELECT * FROM messages WHERE folder_id = ?1 ORDER BY id",
            folder_id,
        )
    }

    /// All messages of a folder, newest first
    pub fn folder_messages_desc(&self, folder_id: i64) -> Result<Vec<Message>> {
        self.query_messages(
            "SELECT * FROM messages WHERE folder_id = ?1 ORDER BY sent_at DESC",
            folder_id,
        )
    }

    fn query_messages(&self, sql: &str, folder_id: i64) -> Result<Vec<Message>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let messages = stmt
            .query_map([folder_id], Self::row_to_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Messages inside the half-open window `[from, until)`
    pub fn messages_in_range(
        &self,
        folder_id: i64,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<Message>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE folder_id = ?1 AND sent_at >= ?2 AND sent_at < ?3 ORDER BY id",
        )?;
        let messages = stmt
            .query_map(
                params![folder_id, fmt_ts(from), fmt_ts(until)],
                Self::row_to_message,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Earliest and latest declared message times in a folder
    pub fn sent_at_bounds(&self, folder_id: i64) -> Result<Option<(NaiveDateTime, NaiveDateTime)>> {
        let conn = self.conn.lock().unwrap();
        let bounds: (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(sent_at), MAX(sent_at) FROM messages WHERE folder_id = ?1",
            [folder_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(match bounds {
            (Some(min), Some(max)) => Some((parse_ts(&min), parse_ts(&max))),
            _ => None,
        })
    }

    /// Number of messages at or after the given instant
    pub fn count_messages_since(&self, folder_id: i64, since: NaiveDateTime) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE folder_id = ?1 AND sent_at >= ?2",
            params![folder_id, fmt_ts(since)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Distinct sender names of a folder, in first-insert order
    pub fn distinct_senders(&self, folder_id: i64) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT sender FROM messages WHERE folder_id = ?1 GROUP BY sender ORDER BY MIN(id)")?;
        let senders = stmt
            .query_map([folder_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(senders)
    }

    /// Message bodies of one sender, in insertion order
    pub fn sender_bodies(&self, folder_id: i64, sender: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT body FROM messages WHERE folder_id = ?1 AND sender = ?2 ORDER BY id",
        )?;
        let bodies = stmt
            .query_map(params![folder_id, sender], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bodies)
    }

    /// First and last declared message times of one sender
    pub fn sender_bounds(
        &self,
        folder_id: i64,
        sender: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime)>> {
        let conn = self.conn.lock().unwrap();
        let bounds: (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(sent_at), MAX(sent_at) FROM messages WHERE folder_id = ?1 AND sender = ?2",
            params![folder_id, sender],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(match bounds {
            (Some(min), Some(max)) => Some((parse_ts(&min), parse_ts(&max))),
            _ => None,
        })
    }

    /// Rewrite a sender name on all matching messages, returning the number
    /// of rows touched
    pub fn rename_sender(&self, folder_id: i64, old_name: &str, new_name: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE messages SET sender = ?3 WHERE folder_id = ?1 AND sender = ?2",
            params![folder_id, old_name, new_name],
        )?;
        Ok(updated)
    }

    /// Delete all messages of one sender, returning the number of rows deleted
    pub fn delete_sender(&self, folder_id: i64, sender: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM messages WHERE folder_id = ?1 AND sender = ?2",
            params![folder_id, sender],
        )?;
        Ok(deleted)
    }

    /// Distinct ingestion timestamps of a folder with their message counts
    pub fn upload_batches(&self, folder_id: i64) -> Result<Vec<UploadBatch>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT ingested_at, COUNT(*) FROM messages WHERE folder_id = ?1
             GROUP BY ingested_at ORDER BY ingested_at",
        )?;
        let batches = stmt
            .query_map([folder_id], |row| {
                let ingested_at: String = row.get(0)?;
                Ok(UploadBatch {
                    ingested_at: parse_ts(&ingested_at),
                    message_count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(batches)
    }

    /// Delete every message committed by the batch with the given ingestion
    /// timestamp
    pub fn delete_upload_batch(&self, folder_id: i64, ingested_at: NaiveDateTime) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM messages WHERE folder_id = ?1 AND ingested_at = ?2",
            params![folder_id, fmt_ts(ingested_at)],
        )?;
        Ok(deleted)
    }

    /// Total message count of a folder
    pub fn count_messages(&self, folder_id: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE folder_id = ?1",
            [folder_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
        let sent_at: String = row.get("sent_at")?;
        let ingested_at: String = row.get("ingested_at")?;
        Ok(Message {
            id: row.get("id")?,
            folder_id: row.get("folder_id")?,
            sender: row.get("sender")?,
            sent_at: parse_ts(&sent_at),
            ingested_at: parse_ts(&ingested_at),
            body: row.get("body")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn message(folder_id: i64, sender: &str, sent: &str, body: &str) -> Message {
        Message {
            id: None,
            folder_id,
            sender: sender.to_string(),
            sent_at: ts(sent),
            ingested_at: ts("2021-06-01 12:00:00"),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_upload_round_trip() {
        let db = test_db();
        let id = db.insert_upload(1, "chat.txt", b"payload").unwrap();

        let pending = db.pending_uploads().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].file_name, "chat.txt");
        assert!(!pending[0].in_progress);

        db.mark_upload_in_progress(id).unwrap();
        let statuses = db.upload_statuses(1).unwrap();
        assert!(statuses[0].in_progress);

        db.delete_upload(id).unwrap();
        assert!(db.pending_uploads().unwrap().is_empty());
    }

    #[test]
    fn test_message_keys_scoped_to_folder() {
        let db = test_db();
        db.insert_messages(&[
            message(1, "Ana", "2021-03-12 14:22:00", "hello"),
            message(2, "Ana", "2021-03-12 14:22:00", "other folder"),
        ])
        .unwrap();

        let keys = db.message_keys(1).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&("hello".to_string(), ts("2021-03-12 14:22:00"))));
    }

    #[test]
    fn test_rename_and_delete_sender() {
        let db = test_db();
        db.insert_messages(&[
            message(1, "Ana", "2021-03-12 14:22:00", "one"),
            message(1, "Ana", "2021-03-12 14:23:00", "two"),
            message(1, "Bob", "2021-03-12 14:24:00", "three"),
        ])
        .unwrap();

        assert_eq!(db.rename_sender(1, "Ana", "Anna").unwrap(), 2);
        let senders = db.distinct_senders(1).unwrap();
        assert!(senders.contains(&"Anna".to_string()));
        assert!(!senders.contains(&"Ana".to_string()));

        assert_eq!(db.delete_sender(1, "Bob").unwrap(), 1);
        assert_eq!(db.count_messages(1).unwrap(), 2);
    }

    #[test]
    fn test_sent_at_bounds_empty_folder() {
        let db = test_db();
        assert!(db.sent_at_bounds(7).unwrap().is_none());
    }

    #[test]
    fn test_upload_batches_group_by_ingestion_time() {
        let db = test_db();
        let mut first = message(1, "Ana", "2021-03-12 14:22:00", "one");
        first.ingested_at = ts("2021-06-01 10:00:00");
        let mut second = message(1, "Ana", "2021-03-12 14:23:00", "two");
        second.ingested_at = ts("2021-06-01 10:00:00");
        let mut third = message(1, "Bob", "2021-03-12 14:24:00", "three");
        third.ingested_at = ts("2021-06-02 09:00:00");
        db.insert_messages(&[first, second, third]).unwrap();

        let batches = db.upload_batches(1).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].message_count, 2);
        assert_eq!(batches[1].message_count, 1);

        db.delete_upload_batch(1, ts("2021-06-01 10:00:00")).unwrap();
        assert_eq!(db.count_messages(1).unwrap(), 1);
    }
}
