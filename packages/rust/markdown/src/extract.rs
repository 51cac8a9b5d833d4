//! Metadata extractor: a forward-only state machine over document lines.
//!
//! States:
//! - `Scanning`: looking for a topic header or the first line of a title.
//! - `InTitleBlock`: accumulating title fragments.
//! - `SeekingMetadata`: scanning a bounded window for identifier, date and URL.
//!
//! The extractor never fails. A title block with no identifier inside its
//! window is dropped and counted in [`ExtractStats::dropped_blocks`].

use tracing::{debug, trace};

use crate::grammar::{Grammar, clean_title_fragment, ends_title_block};

/// A provisional publication from one title/metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub identifier: String,
    pub title: String,
    pub date: String,
    pub source_url: String,
}

/// A candidate together with the topic header active where it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCandidate {
    pub topic: Option<String>,
    pub candidate: Candidate,
}

/// Counters kept while extracting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Candidates yielded.
    pub candidates: usize,
    /// Title blocks discarded (no identifier in the window, or empty title).
    pub dropped_blocks: usize,
    /// Topic header lines seen.
    pub topic_headers: usize,
}

#[derive(Debug, Clone)]
enum State {
    Scanning,
    InTitleBlock {
        fragments: Vec<String>,
    },
    SeekingMetadata {
        title: String,
        window_end: usize,
        identifier: Option<(String, String)>,
        source_url: Option<String>,
    },
}

/// Lazy iterator of [`ExtractedCandidate`]s in source order.
///
/// Cloning an extractor (or calling [`Extractor::restart`]) starts a fresh
/// pass over the same text.
#[derive(Debug, Clone)]
pub struct Extractor<'a> {
    grammar: &'a Grammar,
    lines: Vec<&'a str>,
    pos: usize,
    state: State,
    topic: Option<String>,
    stats: ExtractStats,
}

impl<'a> Extractor<'a> {
    /// Prepare an extraction pass over `text`.
    pub fn new(grammar: &'a Grammar, text: &'a str) -> Self {
        Self {
            grammar,
            lines: text.lines().map(str::trim).collect(),
            pos: 0,
            state: State::Scanning,
            topic: None,
            stats: ExtractStats::default(),
        }
    }

    /// Rewind to the start of the text.
    pub fn restart(&mut self) {
        self.pos = 0;
        self.state = State::Scanning;
        self.topic = None;
        self.stats = ExtractStats::default();
    }

    /// Counters so far; final once the iterator is exhausted.
    pub fn stats(&self) -> ExtractStats {
        self.stats
    }

    fn enter_seeking(&mut self, fragments: Vec<String>) {
        let window_end = (self.pos + self.grammar.lookahead_window()).min(self.lines.len());
        self.state = State::SeekingMetadata {
            title: fragments.join(" "),
            window_end,
            identifier: None,
            source_url: None,
        };
    }

    /// Whether the line at the cursor carries on a bold title.
    fn title_continues(&self) -> bool {
        self.lines
            .get(self.pos)
            .is_some_and(|next| self.grammar.is_title_start(next))
    }

    fn finish_block(
        &mut self,
        title: String,
        identifier: Option<(String, String)>,
        source_url: Option<String>,
    ) -> Option<ExtractedCandidate> {
        self.state = State::Scanning;

        match identifier {
            Some((identifier, date)) if !title.is_empty() => {
                self.stats.candidates += 1;
                let source_url =
                    source_url.unwrap_or_else(|| self.grammar.canonical_url(&identifier));
                trace!(%identifier, topic = ?self.topic, "candidate extracted");
                Some(ExtractedCandidate {
                    topic: self.topic.clone(),
                    candidate: Candidate {
                        identifier,
                        title,
                        date,
                        source_url,
                    },
                })
            }
            _ => {
                self.stats.dropped_blocks += 1;
                debug!(line = self.pos, %title, "title block without identifier dropped");
                None
            }
        }
    }
}

impl Iterator for Extractor<'_> {
    type Item = ExtractedCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Scanning) {
                State::Scanning => {
                    let line = *self.lines.get(self.pos)?;
                    if let Some(topic) = self.grammar.topic_header(line) {
                        trace!(%topic, line = self.pos, "topic header");
                        self.stats.topic_headers += 1;
                        self.topic = Some(topic);
                        self.pos += 1;
                    } else if self.grammar.is_title_start(line) {
                        self.state = State::InTitleBlock {
                            fragments: Vec::new(),
                        };
                    } else {
                        self.pos += 1;
                    }
                }

                State::InTitleBlock { mut fragments } => match self.lines.get(self.pos) {
                    Some(&line) if !line.is_empty() && !self.grammar.holds_identifier(line) => {
                        let fragment = clean_title_fragment(line);
                        if !fragment.is_empty() {
                            fragments.push(fragment);
                        }
                        self.pos += 1;

                        if ends_title_block(line) && !self.title_continues() {
                            self.enter_seeking(fragments);
                        } else {
                            self.state = State::InTitleBlock { fragments };
                        }
                    }
                    _ => self.enter_seeking(fragments),
                },

                State::SeekingMetadata {
                    title,
                    window_end,
                    mut identifier,
                    mut source_url,
                } => {
                    if self.pos >= window_end {
                        if let Some(found) = self.finish_block(title, identifier, source_url) {
                            return Some(found);
                        }
                        continue;
                    }

                    let line = self.lines[self.pos];
                    self.pos += 1;

                    if !line.is_empty() {
                        if source_url.is_none() {
                            source_url = self.grammar.source_url(line);
                        }
                        if identifier.is_none() {
                            identifier = self.grammar.identifier_and_date(line);
                        }
                        if identifier.is_some() && source_url.is_some() {
                            if let Some(found) = self.finish_block(title, identifier, source_url)
                            {
                                return Some(found);
                            }
                            continue;
                        }
                    }

                    self.state = State::SeekingMetadata {
                        title,
                        window_end,
                        identifier,
                        source_url,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirreview_shared::ParserOptions;

    fn grammar() -> Grammar {
        Grammar::new(&ParserOptions::default()).expect("default grammar")
    }

    fn extract_all(text: &str) -> (Vec<ExtractedCandidate>, ExtractStats) {
        let g = grammar();
        let mut ex = Extractor::new(&g, text);
        let items: Vec<_> = ex.by_ref().collect();
        (items, ex.stats())
    }

    #[test]
    fn single_block_with_topic() {
        let doc = "**EDUCATION**\\\n\n**Report on Schools**\\\nGAO-24-050, March 2024\\\n<https://www.gao.gov/products/GAO-24-050>\n";
        let (items, stats) = extract_all(doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].topic.as_deref(), Some("Education"));
        assert_eq!(items[0].candidate.identifier, "GAO-24-050");
        assert_eq!(items[0].candidate.title, "Report on Schools");
        assert_eq!(items[0].candidate.date, "March 2024");
        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.topic_headers, 1);
    }

    #[test]
    fn two_bold_lines_form_one_title() {
        let doc = "**Report on Schools**\\\n**Funding Gaps**\\\nGAO-24-050, March 2024\nhttps://www.gao.gov/products/GAO-24-050\n";
        let (items, _) = extract_all(doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].candidate.title, "Report on Schools Funding Gaps");
        assert_eq!(items[0].candidate.identifier, "GAO-24-050");
        assert_eq!(items[0].candidate.date, "March 2024");
    }

    #[test]
    fn bold_metadata_line_ends_title() {
        let doc = "**Grid Reliability**\\\n**GAO-24-500, May 2024**\\\nhttps://www.gao.gov/products/GAO-24-500\n";
        let (items, stats) = extract_all(doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].candidate.title, "Grid Reliability");
        assert_eq!(items[0].candidate.identifier, "GAO-24-500");
        assert_eq!(items[0].candidate.date, "May 2024");
        assert_eq!(stats.dropped_blocks, 0);
    }

    #[test]
    fn unbolded_middle_line_joins_title() {
        let doc = "**Federal Student Aid:\nImproved Oversight of\nLoan Servicers**\\\nGAO-24-106530, April 2024\n";
        let (items, _) = extract_all(doc);
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].candidate.title,
            "Federal Student Aid: Improved Oversight of Loan Servicers"
        );
        assert_eq!(
            items[0].candidate.source_url,
            "https://www.gao.gov/products/GAO-24-106530"
        );
    }

    #[test]
    fn identifier_line_ends_title_without_being_consumed() {
        let doc = "**Unterminated title\nGAO-24-7, June 2024\n";
        let (items, _) = extract_all(doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].candidate.title, "Unterminated title");
        assert_eq!(items[0].candidate.date, "June 2024");
    }

    #[test]
    fn header_then_title_without_metadata_yields_nothing() {
        let (items, stats) = extract_all("**EDUCATION**\\\n**Report on Schools**\\");
        assert!(items.is_empty());
        assert_eq!(stats.dropped_blocks, 1);
    }

    #[test]
    fn identifier_beyond_window_is_not_found() {
        let doc = "**A Title**\\\n\none\ntwo\nthree\nfour\nGAO-24-1, May 2024\n";
        let (items, stats) = extract_all(doc);
        assert!(items.is_empty());
        assert_eq!(stats.dropped_blocks, 1);
    }

    #[test]
    fn missing_date_is_empty_string() {
        let doc = "**Title**\\\nGAO-24-9\\\n";
        let (items, _) = extract_all(doc);
        assert_eq!(items[0].candidate.date, "");
    }

    #[test]
    fn wrapped_url_is_used() {
        let doc = "**Title**\\\nGAO-24-123, May 2024\\\n<https://urldefense.com/v3/__https:*2F*2Fwww.gao.gov*2Fproducts*2FGAO-24-123__;!!x$>\n";
        let (items, _) = extract_all(doc);
        assert_eq!(
            items[0].candidate.source_url,
            "https://www.gao.gov/products/GAO-24-123"
        );
    }

    #[test]
    fn banner_lines_are_skipped() {
        let doc = "**GAO Month in Review: May 2024**\n\n**LEGAL PRODUCTS AND DECISIONS:**\n\n**Title**\\\nGAO-24-2, May 2024\n";
        let (items, stats) = extract_all(doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].topic, None);
        assert_eq!(stats.dropped_blocks, 0);
    }

    #[test]
    fn topic_register_changes_between_blocks() {
        let doc = "**ENERGY**\n**One**\\\nGAO-24-1, May 2024\nhttps://www.gao.gov/products/GAO-24-1\n\n**SPACE**\\\n**Two**\\\nGAO-24-2, May 2024\nhttps://www.gao.gov/products/GAO-24-2\n";
        let (items, _) = extract_all(doc);
        let topics: Vec<_> = items.iter().map(|i| i.topic.clone().unwrap()).collect();
        assert_eq!(topics, vec!["Energy", "Space"]);
    }

    #[test]
    fn restart_replays_the_same_sequence() {
        let g = grammar();
        let doc = "**ENERGY**\n**One**\\\nGAO-24-1, May 2024\n";
        let mut ex = Extractor::new(&g, doc);
        let first: Vec<_> = ex.by_ref().collect();
        ex.restart();
        let second: Vec<_> = ex.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_and_garbage_input() {
        assert!(extract_all("").0.is_empty());
        assert!(extract_all("just\nsome\ntext\n\n").0.is_empty());
        assert!(extract_all("**\n**\n**").0.is_empty());
    }
}
