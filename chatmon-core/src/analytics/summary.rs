//! Date-range summaries and time-series over a folder.

use super::{count_first_seen, rounded_share, share, words, Analytics};
use crate::error::Result;
use crate::types::{
    FolderSummary, HourCount, HourShare, ParticipantDetail, SenderShare, WordCount,
};
use chrono::Timelike;
use std::collections::HashMap;

/// Words shorter than this never reach the folder-summary top list.
const COMMON_WORD_MIN_CHARS: usize = 5;

/// Entries kept in a top list before the rest is cut (or folded into
/// "Others" for the sender series).
const TOP_LIMIT: usize = 10;

impl Analytics<'_> {
    /// Folder-wide totals for a window: message and word counts, top-10 long
    /// words by frequency, top-10 hours of day by message share. Ties keep
    /// first-seen order.
    pub fn folder_summary(&self, folder_id: i64, from: &str, until: &str) -> Result<FolderSummary> {
        let (from, until) = self.resolve_range(folder_id, from, until)?;
        let messages = self.db.messages_in_range(folder_id, from, until)?;

        let total_messages = messages.len() as i64;
        let mut total_words = 0;
        let mut long_words: Vec<String> = Vec::new();

        for message in &messages {
            for word in words(&message.body) {
                total_words += 1;
                if word.chars().count() > COMMON_WORD_MIN_CHARS {
                    long_words.push(word.to_string());
                }
            }
        }

        let mut common_words: Vec<WordCount> = count_first_seen(long_words)
            .into_iter()
            .map(|(word, count)| WordCount { word, count })
            .collect();
        common_words.sort_by(|a, b| b.count.cmp(&a.count));
        common_words.truncate(TOP_LIMIT);

        let mut common_hours: Vec<HourShare> =
            count_first_seen(messages.iter().map(|m| m.sent_at.hour()))
                .into_iter()
                .map(|(hour, count)| HourShare {
                    hour,
                    share: share(count, total_messages),
                })
                .collect();
        common_hours.sort_by(|a, b| b.share.cmp(&a.share));
        common_hours.truncate(TOP_LIMIT);

        Ok(FolderSummary {
            total_messages,
            total_words,
            common_words,
            common_hours,
        })
    }

    /// Message share per hour of day, in order of first appearance.
    pub fn message_hour_shares(&self, folder_id: i64, from: &str, until: &str) -> Result<Vec<HourShare>> {
        let (from, until) = self.resolve_range(folder_id, from, until)?;
        let messages = self.db.messages_in_range(folder_id, from, until)?;
        let total = messages.len() as i64;

        let shares = count_first_seen(messages.iter().map(|m| m.sent_at.hour()))
            .into_iter()
            .map(|(hour, count)| HourShare {
                hour,
                share: share(count, total),
            })
            .collect();

        Ok(shares)
    }

    /// Word share per hour of day, relative to the window's total word
    /// count, in order of first appearance.
    pub fn word_hour_shares(&self, folder_id: i64, from: &str, until: &str) -> Result<Vec<HourShare>> {
        let (from, until) = self.resolve_range(folder_id, from, until)?;
        let messages = self.db.messages_in_range(folder_id, from, until)?;

        let mut index: HashMap<u32, usize> = HashMap::new();
        let mut hour_words: Vec<(u32, i64)> = Vec::new();
        for message in &messages {
            let hour = message.sent_at.hour();
            let word_count = words(&message.body).count() as i64;
            match index.get(&hour) {
                Some(&slot) => hour_words[slot].1 += word_count,
                None => {
                    index.insert(hour, hour_words.len());
                    hour_words.push((hour, word_count));
                }
            }
        }

        let total_words: i64 = hour_words.iter().map(|(_, count)| count).sum();
        let shares = hour_words
            .into_iter()
            .map(|(hour, count)| HourShare {
                hour,
                share: share(count, total_words),
            })
            .collect();

        Ok(shares)
    }

    /// Message share per sender, rounded, top-10 by share descending. When
    /// the window holds more than nine distinct senders, the rest is folded
    /// into a synthetic "Others" entry whose share is the sum of the
    /// excluded shares.
    pub fn sender_shares(&self, folder_id: i64, from: &str, until: &str) -> Result<Vec<SenderShare>> {
        let (from, until) = self.resolve_range(folder_id, from, until)?;
        let messages = self.db.messages_in_range(folder_id, from, until)?;
        let total = messages.len() as i64;

        let mut shares: Vec<SenderShare> =
            count_first_seen(messages.iter().map(|m| m.sender.clone()))
                .into_iter()
                .map(|(sender, count)| SenderShare {
                    sender,
                    share: rounded_share(count, total),
                })
                .collect();

        let distinct = shares.len();
        shares.sort_by(|a, b| b.share.cmp(&a.share));

        let mut top: Vec<SenderShare> = shares.iter().take(TOP_LIMIT).cloned().collect();
        if distinct > 9 {
            let others = shares.iter().skip(TOP_LIMIT).map(|s| s.share).sum();
            top.push(SenderShare {
                sender: "Others".to_string(),
                share: others,
            });
        }

        Ok(top)
    }

    /// Detailed per-sender breakdown: counts, top-10 words of any length,
    /// hour histogram, and shares of the folder totals.
    ///
    /// The window is validated but the breakdown spans the whole folder.
    pub fn participant_details(
        &self,
        folder_id: i64,
        from: &str,
        until: &str,
    ) -> Result<Vec<ParticipantDetail>> {
        self.resolve_range(folder_id, from, until)?;
        let messages = self.db.folder_messages(folder_id)?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut details: Vec<ParticipantDetail> = Vec::new();
        let mut sender_words: Vec<Vec<String>> = Vec::new();
        let mut sender_hours: Vec<Vec<u32>> = Vec::new();

        for message in &messages {
            let slot = match index.get(&message.sender) {
                Some(&slot) => slot,
                None => {
                    let slot = details.len();
                    index.insert(message.sender.clone(), slot);
                    details.push(ParticipantDetail {
                        sender: message.sender.clone(),
                        message_count: 0,
                        word_count: 0,
                        common_words: Vec::new(),
                        hours: Vec::new(),
                        message_share: 0,
                        word_share: 0,
                    });
                    sender_words.push(Vec::new());
                    sender_hours.push(Vec::new());
                    slot
                }
            };

            details[slot].message_count += 1;
            for word in words(&message.body) {
                details[slot].word_count += 1;
                sender_words[slot].push(word.to_string());
            }
            sender_hours[slot].push(message.sent_at.hour());
        }

        for (slot, detail) in details.iter_mut().enumerate() {
            let mut common_words: Vec<WordCount> =
                count_first_seen(sender_words[slot].drain(..))
                    .into_iter()
                    .map(|(word, count)| WordCount { word, count })
                    .collect();
            common_words.sort_by(|a, b| b.count.cmp(&a.count));
            common_words.truncate(TOP_LIMIT);
            detail.common_words = common_words;

            detail.hours = count_first_seen(sender_hours[slot].drain(..))
                .into_iter()
                .map(|(hour, count)| HourCount { hour, count })
                .collect();
        }

        let total_messages: i64 = details.iter().map(|d| d.message_count).sum();
        let total_words: i64 = details.iter().map(|d| d.word_count).sum();
        for detail in &mut details {
            detail.message_share = share(detail.message_count, total_messages);
            detail.word_share = share(detail.word_count, total_words);
        }

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::Error;
    use crate::types::Message;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn message(sender: &str, sent: &str, body: &str) -> Message {
        Message {
            id: None,
            folder_id: 1,
            sender: sender.to_string(),
            sent_at: ts(sent),
            ingested_at: ts("2021-06-01 12:00:00"),
            body: body.to_string(),
        }
    }

    fn db_with(messages: &[Message]) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db.insert_messages(messages).unwrap();
        db
    }

    #[test]
    fn test_blank_range_bounds_fail_to_parse() {
        let db = db_with(&[message("Ana", "2021-03-12 14:22:00", "hello")]);
        let err = Analytics::new(&db).folder_summary(1, "", "").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_supplied_bounds_fall_back_to_full_range() {
        // Any non-blank bound resolves to the folder's own time span; the
        // newest message sits on the open end of the window.
        let db = db_with(&[
            message("Ana", "2021-03-12 14:22:00", "alpha"),
            message("Ana", "2021-03-12 14:23:00", "beta"),
            message("Ana", "2021-03-12 14:24:00", "gamma"),
        ]);
        let summary = Analytics::new(&db)
            .folder_summary(1, "1999-01-01", "")
            .unwrap();
        assert_eq!(summary.total_messages, 2);
    }

    #[test]
    fn test_folder_summary_counts_and_long_words() {
        let db = db_with(&[
            message("Ana", "2021-03-12 14:22:00", "wonderful wonderful day"),
            message("Bob", "2021-03-12 15:10:00", "magnificent day"),
            message("Bob", "2021-03-12 15:30:00", "tail"),
        ]);
        let summary = Analytics::new(&db).folder_summary(1, "x", "y").unwrap();

        assert_eq!(summary.total_messages, 2);
        assert_eq!(summary.total_words, 5);
        // Only words longer than five characters qualify.
        assert_eq!(summary.common_words.len(), 2);
        assert_eq!(summary.common_words[0].word, "wonderful");
        assert_eq!(summary.common_words[0].count, 2);
        assert_eq!(summary.common_words[1].word, "magnificent");
    }

    #[test]
    fn test_hour_shares_truncate_and_keep_first_seen_order() {
        let db = db_with(&[
            message("Ana", "2021-03-12 14:22:00", "a"),
            message("Ana", "2021-03-12 15:10:00", "b"),
            message("Ana", "2021-03-12 14:40:00", "c"),
            message("Ana", "2021-03-12 16:00:00", "end marker"),
        ]);
        let shares = Analytics::new(&db).message_hour_shares(1, "x", "y").unwrap();

        // Window spans minutes up to but excluding the newest message.
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].hour, 14);
        assert_eq!(shares[0].share, 66);
        assert_eq!(shares[1].hour, 15);
        assert_eq!(shares[1].share, 33);
    }

    #[test]
    fn test_word_hour_shares() {
        let db = db_with(&[
            message("Ana", "2021-03-12 14:22:00", "one two three"),
            message("Ana", "2021-03-12 15:10:00", "four"),
            message("Ana", "2021-03-12 16:00:00", "end marker"),
        ]);
        let shares = Analytics::new(&db).word_hour_shares(1, "x", "y").unwrap();

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].hour, 14);
        assert_eq!(shares[0].share, 75);
        assert_eq!(shares[1].share, 25);
    }

    #[test]
    fn test_sender_shares_fold_tail_into_others() {
        let mut messages: Vec<Message> = (0..12)
            .map(|i| {
                message(
                    &format!("sender{:02}", i),
                    &format!("2021-03-12 14:{:02}:00", i),
                    "hi",
                )
            })
            .collect();
        // Push the window's open end past every sender's message.
        messages.push(message("sender00", "2021-03-12 14:30:00", "bye"));
        let db = db_with(&messages);

        let shares = Analytics::new(&db).sender_shares(1, "x", "y").unwrap();

        assert_eq!(shares.len(), 11);
        assert_eq!(shares[10].sender, "Others");
        // Two senders fall outside the top ten; each holds 1/12 of the
        // window, rounded to 8.
        assert_eq!(shares[10].share, 16);
    }

    #[test]
    fn test_sender_shares_no_others_below_ten_senders() {
        let db = db_with(&[
            message("Ana", "2021-03-12 14:00:00", "a"),
            message("Bob", "2021-03-12 14:01:00", "b"),
            message("Ana", "2021-03-12 14:02:00", "end"),
        ]);
        let shares = Analytics::new(&db).sender_shares(1, "x", "y").unwrap();
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|s| s.sender != "Others"));
    }

    #[test]
    fn test_empty_folder_summaries_do_not_fault() {
        let db = db_with(&[]);
        let analytics = Analytics::new(&db);

        let summary = analytics.folder_summary(1, "x", "y").unwrap();
        assert_eq!(summary.total_messages, 0);
        assert_eq!(summary.total_words, 0);
        assert!(summary.common_words.is_empty());

        assert!(analytics.message_hour_shares(1, "x", "y").unwrap().is_empty());
        assert!(analytics.sender_shares(1, "x", "y").unwrap().is_empty());
    }

    #[test]
    fn test_participant_details_span_whole_folder() {
        let db = db_with(&[
            message("Ana", "2021-03-12 14:22:00", "one two"),
            message("Bob", "2021-03-12 15:10:00", "three"),
        ]);
        let details = Analytics::new(&db).participant_details(1, "x", "y").unwrap();

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].sender, "Ana");
        assert_eq!(details[0].word_count, 2);
        assert_eq!(details[0].message_share, 50);
        assert_eq!(details[0].word_share, 66);
        assert_eq!(details[1].hours, vec![HourCount { hour: 15, count: 1 }]);
    }
}
