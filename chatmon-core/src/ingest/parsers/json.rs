//! Structured chat export parser.
//!
//! The archive is a JSON array of records, each already delimiting one
//! message; there is no body-merging step. A record date that fails to parse
//! fails the whole archive, surfacing as an ingestion failure for that
//! upload only.

use super::ArchiveParser;
use crate::error::{Error, Result};
use crate::types::{parse_datetime, Candidate};
use serde::Deserialize;

/// One record of the structured export.
#[derive(Debug, Deserialize)]
struct ArchiveRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "From")]
    from: String,
    #[serde(rename = "MsgContent")]
    body: String,
}

/// Parser for structured `.json` chat exports.
pub struct JsonArchiveParser;

impl ArchiveParser for JsonArchiveParser {
    fn format(&self) -> &'static str {
        "json"
    }

    fn handles(&self, file_name: &str) -> bool {
        file_name.ends_with("json")
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<Candidate>> {
        let records: Vec<ArchiveRecord> = serde_json::from_slice(raw)?;

        records
            .into_iter()
            .map(|record| {
                let sent_at = parse_datetime(&record.date).ok_or_else(|| {
                    Error::parse("json", format!("unparseable record date: {:?}", record.date))
                })?;
                Ok(Candidate {
                    sender: record.from,
                    sent_at,
                    body: record.body,
                })
            })
            .collect()
    }

    fn batch_size(&self) -> usize {
        5_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let raw = br#"[
            {"Date": "2021-03-12T14:22:00", "From": "Ana", "MsgContent": "hello"},
            {"Date": "2021-03-12 14:25:00", "From": "Bob", "MsgContent": "hi"}
        ]"#;
        let candidates = JsonArchiveParser.parse(raw).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].sender, "Ana");
        assert_eq!(candidates[0].body, "hello");
        assert_eq!(candidates[1].sent_at.format("%H:%M").to_string(), "14:25");
    }

    #[test]
    fn test_bad_record_date_fails_whole_archive() {
        let raw = br#"[
            {"Date": "2021-03-12T14:22:00", "From": "Ana", "MsgContent": "hello"},
            {"Date": "whenever", "From": "Bob", "MsgContent": "hi"}
        ]"#;
        let err = JsonArchiveParser.parse(raw).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(JsonArchiveParser.parse(b"{not json").is_err());
    }

    #[test]
    fn test_empty_array() {
        assert!(JsonArchiveParser.parse(b"[]").unwrap().is_empty());
    }
}
