//! Per-participant summaries and bulk sender rewrites.
//!
//! A participant is a projection over the sender-name column, not a stored
//! entity: renaming one is a bulk rewrite of the name on all matching
//! messages, removing one is a bulk delete.

use super::{share, words, Analytics};
use crate::error::Result;
use crate::types::{ParticipantSummary, ParticipantUpdate};

impl Analytics<'_> {
    /// Activity summary per distinct sender, sorted by sender name.
    pub fn participants(&self, folder_id: i64) -> Result<Vec<ParticipantSummary>> {
        let senders = self.db.distinct_senders(folder_id)?;

        let mut summaries = Vec::with_capacity(senders.len());
        let mut total_messages = 0;
        let mut total_words = 0;

        for sender in senders {
            let Some((first_message, last_message)) = self.db.sender_bounds(folder_id, &sender)?
            else {
                continue;
            };
            let bodies = self.db.sender_bodies(folder_id, &sender)?;

            let message_count = bodies.len() as i64;
            let word_count: i64 = bodies.iter().map(|body| words(body).count() as i64).sum();

            total_messages += message_count;
            total_words += word_count;

            summaries.push(ParticipantSummary {
                sender,
                message_count,
                word_count,
                first_message,
                last_message,
                message_share: 0,
                word_share: 0,
            });
        }

        for summary in &mut summaries {
            summary.message_share = share(summary.message_count, total_messages);
            summary.word_share = share(summary.word_count, total_words);
        }

        summaries.sort_by(|a, b| a.sender.cmp(&b.sender));
        Ok(summaries)
    }

    /// Bulk-rewrite a sender name on all matching messages.
    pub fn rename_participant(&self, folder_id: i64, old_name: &str, new_name: &str) -> Result<usize> {
        let updated = self.db.rename_sender(folder_id, old_name, new_name)?;
        tracing::info!(folder_id, old_name, new_name, updated, "Participant renamed");
        Ok(updated)
    }

    /// Bulk-delete all messages of one sender.
    pub fn delete_participant(&self, folder_id: i64, sender: &str) -> Result<usize> {
        let deleted = self.db.delete_sender(folder_id, sender)?;
        tracing::info!(folder_id, sender, deleted, "Participant deleted");
        Ok(deleted)
    }

    /// Apply a batch of renames and deletions, then return the recomputed
    /// summary. Deletion takes priority over a rename on the same entry;
    /// renames to a blank or unchanged name are ignored.
    pub fn update_participants(
        &self,
        folder_id: i64,
        updates: &[ParticipantUpdate],
    ) -> Result<Vec<ParticipantSummary>> {
        for update in updates {
            if update.delete {
                self.delete_participant(folder_id, &update.sender)?;
            } else if update.new_name != update.sender && !update.new_name.trim().is_empty() {
                self.rename_participant(folder_id, &update.sender, &update.new_name)?;
            }
        }

        self.participants(folder_id)
    }
}
