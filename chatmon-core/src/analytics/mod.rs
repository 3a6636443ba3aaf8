//! Read-side aggregation engine over the committed corpus.
//!
//! Every operation is pure relative to the committed message set of one
//! folder, optionally windowed by a date range, and recomputed per request;
//! nothing here is persisted.

mod browse;
mod participants;
mod summary;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::parse_datetime;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::hash::Hash;

/// Analytics facade over a message store.
pub struct Analytics<'a> {
    db: &'a Database,
}

impl<'a> Analytics<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Resolve a `[from, until]` window from two date strings.
    ///
    /// When both bounds are blank the strings themselves are used as parse
    /// targets and the operation fails; in every other case the window
    /// defaults to the folder's earliest and latest message times and the
    /// supplied values are not consulted further. This mirrors the upstream
    /// behavior exactly and is tracked as an open product question.
    fn resolve_range(
        &self,
        folder_id: i64,
        from: &str,
        until: &str,
    ) -> Result<(NaiveDateTime, NaiveDateTime)> {
        if from.trim().is_empty() && until.trim().is_empty() {
            let from = parse_datetime(from)
                .ok_or_else(|| Error::parse("range", format!("unparseable bound: {:?}", from)))?;
            let until = parse_datetime(until)
                .ok_or_else(|| Error::parse("range", format!("unparseable bound: {:?}", until)))?;
            return Ok((from, until));
        }

        match self.db.sent_at_bounds(folder_id)? {
            Some(bounds) => Ok(bounds),
            // Empty folder: a collapsed window that selects nothing.
            None => Ok((NaiveDateTime::default(), NaiveDateTime::default())),
        }
    }
}

/// Word tokenizer: split on sentence punctuation and spaces, dropping empty
/// tokens.
pub(crate) fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '?', '!', ' ', ';', ':', ','])
        .filter(|token| !token.is_empty())
}

/// Truncating integer percentage, defined as zero for an empty total.
pub(crate) fn share(count: i64, total: i64) -> i64 {
    if total == 0 {
        0
    } else {
        count * 100 / total
    }
}

/// Rounded integer percentage, defined as zero for an empty total. Used by
/// the per-sender time-series only.
pub(crate) fn rounded_share(count: i64, total: i64) -> i64 {
    if total == 0 {
        0
    } else {
        ((count * 100) as f64 / total as f64).round() as i64
    }
}

/// Count occurrences, preserving the order in which keys first appear.
/// Downstream top-N selections sort stably, so ties keep this order.
pub(crate) fn count_first_seen<K, I>(keys: I) -> Vec<(K, i64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, i64)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_splits_on_punctuation_and_space() {
        let tokens: Vec<&str> = words("hello, world! how: are;you..fine?").collect();
        assert_eq!(tokens, vec!["hello", "world", "how", "are", "you", "fine"]);
    }

    #[test]
    fn test_words_drops_empty_tokens() {
        assert_eq!(words("  ...  ").count(), 0);
        assert_eq!(words("").count(), 0);
    }

    #[test]
    fn test_share_truncates() {
        assert_eq!(share(1, 3), 33);
        assert_eq!(share(2, 3), 66);
        assert_eq!(share(3, 3), 100);
    }

    #[test]
    fn test_share_zero_total_is_zero() {
        assert_eq!(share(5, 0), 0);
        assert_eq!(rounded_share(5, 0), 0);
    }

    #[test]
    fn test_rounded_share_rounds() {
        assert_eq!(rounded_share(1, 3), 33);
        assert_eq!(rounded_share(2, 3), 67);
    }

    #[test]
    fn test_count_first_seen_keeps_encounter_order() {
        let counts = count_first_seen(vec!["b", "a", "b", "c", "a", "b"]);
        assert_eq!(counts, vec![("b", 3), ("a", 2), ("c", 1)]);
    }
}
