//! Deduplication filter for ingestion.
//!
//! The key is `(body, sent_at)`; sender is intentionally excluded, so a
//! message with identical text and timestamp counts as the same message even
//! when attributed to a different name.

use crate::db::Database;
use crate::error::Result;
use crate::types::Candidate;
use chrono::NaiveDateTime;
use std::collections::HashSet;

/// Membership filter over the committed `(body, sent_at)` pairs of a folder.
///
/// Loaded once per upload with a single query; candidates that pass are
/// absorbed into the set so one archive cannot commit the same key twice.
pub struct DedupFilter {
    seen: HashSet<(String, NaiveDateTime)>,
}

impl DedupFilter {
    /// Batch-load the committed key set of a folder.
    pub fn load(db: &Database, folder_id: i64) -> Result<Self> {
        Ok(Self {
            seen: db.message_keys(folder_id)?,
        })
    }

    /// Build a filter from an explicit key set (for tests).
    pub fn from_keys(seen: HashSet<(String, NaiveDateTime)>) -> Self {
        Self { seen }
    }

    /// Admit a candidate if its key is new, recording the key.
    pub fn admit(&mut self, candidate: &Candidate) -> bool {
        self.seen
            .insert((candidate.body.clone(), candidate.sent_at))
    }

    /// Number of known keys.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no key is known yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(body: &str, minute: u32) -> Candidate {
        Candidate {
            sender: "Ana".to_string(),
            sent_at: chrono::NaiveDate::from_ymd_opt(2021, 3, 12)
                .unwrap()
                .and_hms_opt(14, minute, 0)
                .unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_admits_new_and_rejects_known() {
        let mut filter = DedupFilter::from_keys(HashSet::new());
        assert!(filter.admit(&candidate("hello", 22)));
        assert!(!filter.admit(&candidate("hello", 22)));
        assert!(filter.admit(&candidate("hello", 23)));
        assert!(filter.admit(&candidate("other", 22)));
        assert_eq!(filter.len(), 3);
    }

    #[test]
    fn test_sender_excluded_from_key() {
        let mut filter = DedupFilter::from_keys(HashSet::new());
        assert!(filter.admit(&candidate("hello", 22)));

        let mut other_sender = candidate("hello", 22);
        other_sender.sender = "Bob".to_string();
        assert!(!filter.admit(&other_sender));
    }
}
