//! Domain types for chatmon-core
//!
//! Stored records (`Message`, `Upload`) are owned by the database layer.
//! Everything else is a derived, per-request view handed outward to the
//! HTTP/UI collaborator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A committed chat message. Immutable once stored.
///
/// `(body, sent_at)` is the deduplication key within a folder; the store
/// never holds two messages with an identical key in the same folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Row id, `None` before the first insert
    pub id: Option<i64>,
    /// Folder (logical chat) this message belongs to
    pub folder_id: i64,
    /// Sender name as it appeared in the archive
    pub sender: String,
    /// Timestamp declared by the archive
    pub sent_at: NaiveDateTime,
    /// Timestamp assigned at commit; shared by all messages of one upload
    pub ingested_at: NaiveDateTime,
    /// Body text, possibly spanning several physical lines
    pub body: String,
}

/// A message reconstructed by an archive parser, not yet checked for
/// duplication or committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub sender: String,
    pub sent_at: NaiveDateTime,
    pub body: String,
}

/// A pending unit of ingestion work.
///
/// Created when a file is received; consumed and deleted by the scheduler
/// after all of its messages are committed, or deleted immediately when the
/// file-name suffix is unrecognized.
#[derive(Debug, Clone)]
pub struct Upload {
    pub id: i64,
    pub folder_id: i64,
    /// Declared file name; its suffix selects the parser variant
    pub file_name: String,
    /// Raw archive bytes
    pub payload: Vec<u8>,
    /// Set once the scheduler picks the upload up
    pub in_progress: bool,
}

/// Upload listing entry without the payload bytes.
#[derive(Debug, Clone, Serialize)]
pub struct UploadStatus {
    pub id: i64,
    pub folder_id: i64,
    pub file_name: String,
    pub in_progress: bool,
}

/// Pagination metadata for a message page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Offset after clamping to >= 0
    pub offset: usize,
    /// Page size after clamping to [0, 100]
    pub size: usize,
    /// There are older messages past this page
    pub has_older: bool,
    /// There are newer messages before this page
    pub has_newer: bool,
    /// Total message count divided by the page size, truncating
    pub total_pages: usize,
    /// (offset + size) / size, truncating
    pub current_page: usize,
}

/// One page of messages, newest first, plus pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub info: PageInfo,
    pub messages: Vec<Message>,
}

/// Per-sender activity summary for a folder.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantSummary {
    pub sender: String,
    pub message_count: i64,
    pub word_count: i64,
    pub first_message: NaiveDateTime,
    pub last_message: NaiveDateTime,
    /// Share of the folder's total messages, truncating integer percent
    pub message_share: i64,
    /// Share of the folder's total words, truncating integer percent
    pub word_share: i64,
}

/// One entry of a batch participant update. Deletion takes priority over a
/// rename on the same entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantUpdate {
    /// Current sender name
    pub sender: String,
    /// Replacement name; ignored when blank or unchanged
    pub new_name: String,
    /// Delete all of this sender's messages instead of renaming
    pub delete: bool,
}

/// Word frequency entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: i64,
}

/// Message count for one hour of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: i64,
}

/// Percentage share for one hour of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourShare {
    pub hour: u32,
    pub share: i64,
}

/// Percentage share of one sender's messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderShare {
    pub sender: String,
    pub share: i64,
}

/// Folder-wide totals over a resolved date range.
#[derive(Debug, Clone, Serialize)]
pub struct FolderSummary {
    pub total_messages: i64,
    pub total_words: i64,
    /// Top-10 words longer than five characters, by frequency
    pub common_words: Vec<WordCount>,
    /// Top-10 hours of day by message share
    pub common_hours: Vec<HourShare>,
}

/// Detailed per-sender breakdown: counts, favorite words, hour histogram.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantDetail {
    pub sender: String,
    pub message_count: i64,
    pub word_count: i64,
    /// Top-10 words by frequency, any length
    pub common_words: Vec<WordCount>,
    /// Message counts per hour of day, in order of first appearance
    pub hours: Vec<HourCount>,
    pub message_share: i64,
    pub word_share: i64,
}

/// One ingestion batch: every message committed by the same upload shares an
/// ingestion timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadBatch {
    pub ingested_at: NaiveDateTime,
    pub message_count: i64,
}

/// Date/time formats accepted by the structured archive and by date query
/// parameters, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a locale-neutral date/time string.
///
/// Accepts common ISO-like formats with and without fractional seconds, an
/// RFC 3339 timestamp (offset discarded), or a bare date taken as midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
