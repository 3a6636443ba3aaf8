//! Archive parsers
//!
//! Each supported export format implements [`ArchiveParser`]. The scheduler
//! dispatches an upload to the first parser whose suffix matches the declared
//! file name; uploads nobody claims are discarded.

mod json;
mod text;

pub use json::JsonArchiveParser;
pub use text::TextArchiveParser;

use crate::error::Result;
use crate::types::Candidate;

/// Trait implemented by all archive parsers.
///
/// Parsers are pure: raw bytes in, ordered candidate messages out.
/// Deduplication and commit happen later in the scheduler.
pub trait ArchiveParser: Send + Sync {
    /// Short format name, used in errors and logs
    fn format(&self) -> &'static str;

    /// Whether this parser claims the given file name
    fn handles(&self, file_name: &str) -> bool;

    /// Convert one uploaded archive into ordered message candidates
    fn parse(&self, raw: &[u8]) -> Result<Vec<Candidate>>;

    /// Number of deduplicated candidates accumulated before a commit is
    /// flushed to the store. The asymmetry between formats is intentional.
    fn batch_size(&self) -> usize;
}

/// Create all parsers known to the scheduler.
pub fn create_all_parsers() -> Vec<Box<dyn ArchiveParser>> {
    vec![Box::new(TextArchiveParser), Box::new(JsonArchiveParser)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_dispatch_by_suffix() {
        let parsers = create_all_parsers();
        let for_name = |name: &str| {
            parsers
                .iter()
                .find(|p| p.handles(name))
                .map(|p| p.format())
        };

        assert_eq!(for_name("chat.txt"), Some("text"));
        assert_eq!(for_name("export.json"), Some("json"));
        assert_eq!(for_name("picture.jpg"), None);
        assert_eq!(for_name("archive.zip"), None);
    }

    #[test]
    fn test_batch_sizes_are_asymmetric() {
        assert_eq!(TextArchiveParser.batch_size(), 10_000);
        assert_eq!(JsonArchiveParser.batch_size(), 5_000);
    }
}
