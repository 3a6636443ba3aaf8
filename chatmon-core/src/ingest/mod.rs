//! Ingestion layer: draining pending uploads into the committed corpus.
//!
//! ```text
//! ┌──────────┐     ┌─────────────────┐     ┌──────────────┐     ┌──────────┐
//! │ uploads  │ ──► │ IngestScheduler │ ──► │ DedupFilter  │ ──► │ messages │
//! │ (queue)  │     │ (single-flight) │     │ (body, time) │     │ (store)  │
//! └──────────┘     └─────────────────┘     └──────────────┘     └──────────┘
//!                         │
//!                         ▼
//!                  ┌───────────────────┐
//!                  │  ArchiveParser    │
//!                  │  ├─ text (.txt)   │
//!                  │  └─ json (.json)  │
//!                  └───────────────────┘
//! ```
//!
//! The scheduler owns a process-wide exclusive gate: at most one ingestion
//! run executes at a time. Callers arriving during an active run block until
//! the gate is released, then perform their own full drain of the queue.

mod dedup;
pub mod parsers;

pub use dedup::DedupFilter;
pub use parsers::{ArchiveParser, JsonArchiveParser, TextArchiveParser};

use crate::db::Database;
use crate::error::Result;
use crate::types::{Message, Upload};
use std::sync::{Arc, Mutex};

/// Result of one full drain of the pending-upload queue.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Uploads fully parsed and committed
    pub uploads_processed: usize,
    /// Uploads dropped because no parser claimed their file name
    pub uploads_discarded: usize,
    /// Messages committed to the store
    pub messages_committed: usize,
    /// Candidates skipped as duplicates of committed history
    pub duplicates_skipped: usize,
    /// Per-upload failures (file name, error message); the run continued
    pub errors: Vec<(String, String)>,
}

/// Drains the pending-upload queue: parse, deduplicate, commit in batches.
///
/// Holds the single-flight gate for its entire lifetime; the gate is
/// acquired per run and released on every exit path.
pub struct IngestScheduler {
    db: Arc<Database>,
    parsers: Vec<Box<dyn ArchiveParser>>,
    gate: Mutex<()>,
}

impl IngestScheduler {
    /// Create a scheduler with the default parsers.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            parsers: parsers::create_all_parsers(),
            gate: Mutex::new(()),
        }
    }

    /// Create a scheduler with custom parsers.
    pub fn with_parsers(db: Arc<Database>, parsers: Vec<Box<dyn ArchiveParser>>) -> Self {
        Self {
            db,
            parsers,
            gate: Mutex::new(()),
        }
    }

    /// Process every currently pending upload exactly once.
    ///
    /// A failure inside one upload aborts that upload only; batches already
    /// flushed stay committed and the run moves on to the next upload.
    pub fn process_pending(&self) -> Result<IngestReport> {
        let _permit = self
            .gate
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let uploads = self.db.pending_uploads()?;
        let mut report = IngestReport::default();

        tracing::info!(pending = uploads.len(), "Starting ingestion run");

        for upload in uploads {
            if let Err(e) = self.db.mark_upload_in_progress(upload.id) {
                report.errors.push((upload.file_name.clone(), e.to_string()));
                continue;
            }

            let parser = self
                .parsers
                .iter()
                .find(|p| p.handles(&upload.file_name))
                .map(|p| p.as_ref());

            let Some(parser) = parser else {
                // Unknown suffix is not an error; the upload is dropped.
                tracing::info!(
                    upload_id = upload.id,
                    file_name = %upload.file_name,
                    "Discarding upload with unrecognized suffix"
                );
                self.db.delete_upload(upload.id)?;
                report.uploads_discarded += 1;
                continue;
            };

            match self.process_upload(parser, &upload) {
                Ok((committed, duplicates)) => {
                    report.uploads_processed += 1;
                    report.messages_committed += committed;
                    report.duplicates_skipped += duplicates;
                    tracing::info!(
                        upload_id = upload.id,
                        folder_id = upload.folder_id,
                        format = parser.format(),
                        committed,
                        duplicates,
                        "Upload committed"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        upload_id = upload.id,
                        folder_id = upload.folder_id,
                        error = %e,
                        "Upload failed; already flushed batches are kept"
                    );
                    report.errors.push((upload.file_name.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Parse one upload, filter duplicates, and commit in batches.
    ///
    /// Flushes whenever the in-memory accumulation reaches the parser's batch
    /// size, and always flushes the remainder. The upload record is deleted
    /// only after every message is committed.
    fn process_upload(&self, parser: &dyn ArchiveParser, upload: &Upload) -> Result<(usize, usize)> {
        let ingested_at = chrono::Local::now().naive_local();
        let candidates = parser.parse(&upload.payload)?;
        let mut filter = DedupFilter::load(&self.db, upload.folder_id)?;

        let mut pending: Vec<Message> = Vec::new();
        let mut committed = 0;
        let mut duplicates = 0;

        for candidate in candidates {
            if !filter.admit(&candidate) {
                duplicates += 1;
                continue;
            }
            pending.push(Message {
                id: None,
                folder_id: upload.folder_id,
                sender: candidate.sender,
                sent_at: candidate.sent_at,
                ingested_at,
                body: candidate.body,
            });
            if pending.len() >= parser.batch_size() {
                self.db.insert_messages(&pending)?;
                committed += pending.len();
                pending.clear();
            }
        }

        if !pending.is_empty() {
            self.db.insert_messages(&pending)?;
            committed += pending.len();
        }

        self.db.delete_upload(upload.id)?;
        Ok((committed, duplicates))
    }
}
