//! Line-oriented chat export parser.
//!
//! The archive is a sequence of physical lines. A *header line* looks like
//! `12/03/2021 14:22 - Sender: body` and opens a new message; every line
//! whose date prefix does not parse is a continuation of the message before
//! it, joined with a literal `" \n "` marker. A message is only known
//! complete once the next header line is seen; the accumulator still pending
//! at end of scan is flushed unconditionally.
//!
//! Bodies wrapped entirely in angle brackets (`<Media omitted>` and friends)
//! are placeholders for non-text content and produce no candidate.

use super::ArchiveParser;
use crate::error::Result;
use crate::types::Candidate;
use chrono::NaiveDateTime;

/// Timestamp format of the header date prefix.
const HEADER_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Parser for line-oriented `.txt` chat exports.
pub struct TextArchiveParser;

impl ArchiveParser for TextArchiveParser {
    fn format(&self) -> &'static str {
        "text"
    }

    fn handles(&self, file_name: &str) -> bool {
        file_name.ends_with("txt")
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<Candidate>> {
        let text = String::from_utf8_lossy(raw);
        Ok(parse_lines(&text))
    }

    fn batch_size(&self) -> usize {
        10_000
    }
}

/// In-flight message being reconstructed across physical lines.
struct Accumulator {
    sender: String,
    sent_at: NaiveDateTime,
    body: String,
}

impl Accumulator {
    /// A candidate is only emitted when both sender and body are non-blank;
    /// this guards against a first header that never fully seeded.
    fn into_candidate(self) -> Option<Candidate> {
        if self.sender.trim().is_empty() || self.body.trim().is_empty() {
            return None;
        }
        Some(Candidate {
            sender: self.sender,
            sent_at: self.sent_at,
            body: self.body,
        })
    }
}

fn parse_lines(text: &str) -> Vec<Candidate> {
    // Accept \n, \r\n and bare \r terminators.
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();
    let mut candidates = Vec::new();
    let mut current: Option<Accumulator> = None;

    // The final line is deliberately never scanned as a header; the pending
    // accumulator is flushed after the loop instead.
    let scan_end = lines.len().saturating_sub(1);

    for line in &lines[..scan_end] {
        match header_date(line) {
            Some(sent_at) => {
                let body = header_body(line);
                if body.trim().is_empty() {
                    // Placeholder or empty header; the line is dropped and the
                    // current message keeps accumulating.
                    continue;
                }
                if let Some(finished) = current.take() {
                    candidates.extend(finished.into_candidate());
                }
                current = Some(Accumulator {
                    sender: header_sender(line),
                    sent_at,
                    body: body.to_string(),
                });
            }
            None => {
                if let Some(acc) = current.as_mut() {
                    acc.body = format!("{} \n {}", acc.body, line);
                }
            }
        }
    }

    if let Some(finished) = current.take() {
        candidates.extend(finished.into_candidate());
    }

    candidates
}

/// Parse the date prefix of a header line.
///
/// The prefix runs up to the first `-`. After trimming it must be at least
/// six characters, and its last two characters (the space-dash artifact of
/// the export format) are stripped before parsing.
fn header_date(line: &str) -> Option<NaiveDateTime> {
    let dash = line.find('-')?;
    let prefix = line[..=dash].trim();
    let len = prefix.chars().count();
    if len < 6 {
        return None;
    }
    let cut = prefix.char_indices().nth(len - 2).map(|(i, _)| i)?;
    NaiveDateTime::parse_from_str(&prefix[..cut], HEADER_DATE_FORMAT).ok()
}

/// Portion of the line after the date prefix, trimmed.
fn after_date(line: &str) -> &str {
    match line.find('-') {
        Some(dash) => line[dash + 1..].trim(),
        None => line.trim(),
    }
}

/// Sender name between the date prefix and the first `:`, empty when the
/// line carries no colon.
fn header_sender(line: &str) -> String {
    let after = after_date(line);
    match after.find(':') {
        Some(colon) => {
            let head = after[..=colon].trim();
            head[..head.len() - 1].to_string()
        }
        None => String::new(),
    }
}

/// Body after the sender delimiter. Bodies wrapped entirely in angle
/// brackets are media placeholders and normalize to empty.
fn header_body(line: &str) -> &str {
    let after = after_date(line);
    let body = match after.find(':') {
        Some(colon) => after[colon + 1..].trim(),
        None => after,
    };
    if body.starts_with('<') && body.ends_with('>') {
        ""
    } else {
        body
    }
}
