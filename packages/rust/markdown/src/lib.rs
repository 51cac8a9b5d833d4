//! Publication metadata extraction from review-document markdown.
//!
//! Two stages, composed by [`MarkdownParser::parse`]:
//! 1. [`Extractor`] walks the lines and yields candidate records tagged with
//!    the topic header active at that point.
//! 2. [`Aggregator`] merges candidates sharing an identifier and returns the
//!    list sorted by identifier.

mod aggregate;
mod extract;
mod grammar;

use tracing::{info, instrument};

use mirreview_shared::{ParseStats, ParserOptions, PublicationRecord, Result};

pub use aggregate::{Aggregator, aggregate};
pub use extract::{Candidate, ExtractStats, ExtractedCandidate, Extractor};
pub use grammar::{Grammar, clean_date};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Result of parsing one document.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Deduplicated publications, sorted by identifier.
    pub publications: Vec<PublicationRecord>,
    /// Extraction and merge counters.
    pub stats: ParseStats,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Reusable parser holding a compiled [`Grammar`].
#[derive(Debug, Clone)]
pub struct MarkdownParser {
    grammar: Grammar,
}

impl MarkdownParser {
    /// Compile a parser for `opts`. Fails only on unusable options.
    pub fn new(opts: &ParserOptions) -> Result<Self> {
        Ok(Self {
            grammar: Grammar::new(opts)?,
        })
    }

    /// Lazy candidate stream over `markdown`.
    pub fn extract<'a>(&'a self, markdown: &'a str) -> Extractor<'a> {
        Extractor::new(&self.grammar, markdown)
    }

    /// Extract and deduplicate. Never fails: malformed input yields an
    /// empty list.
    #[instrument(skip_all, fields(bytes = markdown.len()))]
    pub fn parse(&self, markdown: &str) -> ParseOutcome {
        let mut extractor = self.extract(markdown);
        let mut aggregator = Aggregator::new();
        aggregator.extend(extractor.by_ref());

        let extract_stats = extractor.stats();
        let duplicates_merged = aggregator.duplicates_merged();
        let publications = aggregator.finish();

        let stats = ParseStats {
            candidates: extract_stats.candidates,
            dropped_blocks: extract_stats.dropped_blocks,
            duplicates_merged,
            records: publications.len(),
        };

        info!(
            records = stats.records,
            candidates = stats.candidates,
            duplicates = stats.duplicates_merged,
            dropped = stats.dropped_blocks,
            topics = extract_stats.topic_headers,
            "parsed review document"
        );

        ParseOutcome {
            publications,
            stats,
        }
    }
}

/// One-shot convenience wrapper around [`MarkdownParser`].
pub fn parse_publications(markdown: &str, opts: &ParserOptions) -> Result<ParseOutcome> {
    Ok(MarkdownParser::new(opts)?.parse(markdown))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
