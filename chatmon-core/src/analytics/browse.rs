//! Paginated browsing and substring search over a folder's messages.

use super::Analytics;
use crate::error::{Error, Result};
use crate::types::{parse_datetime, Message, MessagePage, PageInfo};

impl Analytics<'_> {
    /// All messages of a folder, oldest first.
    pub fn all_messages(&self, folder_id: i64) -> Result<Vec<Message>> {
        self.db.folder_messages(folder_id)
    }

    /// One page of messages, newest first.
    ///
    /// The size is clamped to `[0, 100]` with 100 as the out-of-range
    /// default; the offset is clamped to zero. Page arithmetic is truncating
    /// integer division throughout.
    pub fn page_messages(&self, folder_id: i64, offset: i64, size: i64) -> Result<MessagePage> {
        let size = if (0..=100).contains(&size) {
            size as usize
        } else {
            100
        };
        let offset = offset.max(0) as usize;

        let all = self.db.folder_messages_desc(folder_id)?;
        let total = all.len();
        let messages: Vec<Message> = all.into_iter().skip(offset).take(size).collect();

        let info = PageInfo {
            offset,
            size,
            has_older: offset + size < total,
            has_newer: offset > 0,
            total_pages: if size == 0 { 0 } else { total / size },
            current_page: if size == 0 { 0 } else { (offset + size) / size },
        };

        Ok(MessagePage { info, messages })
    }

    /// Case-insensitive substring search, newest first.
    ///
    /// Only the skip offset is applied to the result; everything from the
    /// offset onward is returned unbounded.
    pub fn search_messages(&self, folder_id: i64, query: &str, offset: i64) -> Result<Vec<Message>> {
        let offset = offset.max(0) as usize;
        let needle = query.to_lowercase();

        let matches = self
            .db
            .folder_messages_desc(folder_id)?
            .into_iter()
            .filter(|m| m.body.to_lowercase().contains(&needle))
            .skip(offset)
            .collect();

        Ok(matches)
    }

    /// Index of the first message at or after the given date in the
    /// newest-first ordering: the count of messages since that instant,
    /// minus one.
    pub fn search_index_by_date(&self, folder_id: i64, date: &str) -> Result<i64> {
        let since = parse_datetime(date)
            .ok_or_else(|| Error::parse("range", format!("unparseable date: {:?}", date)))?;
        Ok(self.db.count_messages_since(folder_id, since)? - 1)
    }
}
