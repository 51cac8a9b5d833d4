//! Line-shape predicates for the review document's markdown micro-grammar.
//!
//! A review document converted to markdown looks like this:
//!
//! ```text
//! **EDUCATION**\
//!
//! **Report on Schools**\
//! **Funding Gaps**\
//! GAO-24-050, March 2024\
//! <https://www.gao.gov/products/GAO-24-050>
//! ```
//!
//! [`Grammar`] compiles the patterns that depend on [`ParserOptions`]
//! (identifier prefix, product domain, header style); the fixed cleanup
//! patterns are process-wide statics.

use std::sync::LazyLock;

use regex::Regex;

use mirreview_shared::{HeaderStyle, ParserOptions, Result, ReviewError, normalize_topic};

/// Bold delimiter.
const BOLD: &str = "**";

/// Bold close followed by a line-continuation backslash.
const BOLD_CONTINUATION: &str = "**\\";

/// Everything from the first link/URL artifact to end of line.
static DATE_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(?:\[|\(http|http|\]).*$").expect("date tail regex")
});

/// Compiled, option-dependent patterns.
#[derive(Debug, Clone)]
pub struct Grammar {
    topic_header: Regex,
    identifier_start: Regex,
    identifier_with_date: Regex,
    wrapped_url: Regex,
    plain_url: Regex,
    header_style: HeaderStyle,
    banner_phrases: Vec<String>,
    domain: String,
    lookahead_window: usize,
}

impl Grammar {
    /// Compile the grammar for `opts`.
    pub fn new(opts: &ParserOptions) -> Result<Self> {
        if opts.lookahead_window == 0 {
            return Err(ReviewError::config("lookahead window must be at least 1"));
        }

        let prefix = regex::escape(opts.identifier_prefix.trim());
        let domain = regex::escape(opts.domain.trim());
        let id = format!(r"{prefix}-\d+-\d+");

        let compile = |pattern: String| {
            Regex::new(&pattern)
                .map_err(|e| ReviewError::config(format!("invalid parser pattern: {e}")))
        };

        Ok(Self {
            topic_header: compile(r"^\*\*[A-Z][A-Z\s&]*\*\*(\\)?$".to_string())?,
            identifier_start: compile(format!("^{id}"))?,
            identifier_with_date: compile(format!(r"({id}),?\s*(.+)?"))?,
            wrapped_url: compile(format!(
                r"https:?\*2F\*2Fwww\.{domain}\*2Fproducts\*2F({id})"
            ))?,
            plain_url: compile(format!(r"https://www\.{domain}/products/({id})"))?,
            header_style: opts.header_style,
            banner_phrases: opts.banner_phrases.clone(),
            domain: opts.domain.trim().to_string(),
            lookahead_window: opts.lookahead_window,
        })
    }

    /// Number of lines scanned for metadata after a title block.
    pub fn lookahead_window(&self) -> usize {
        self.lookahead_window
    }

    /// If `line` is a topic header, return its normalized label.
    pub fn topic_header(&self, line: &str) -> Option<String> {
        let caps = self.topic_header.captures(line)?;
        if self.header_style == HeaderStyle::Strict && caps.get(1).is_none() {
            return None;
        }
        let raw = line.replace(BOLD, "").replace('\\', "");
        Some(normalize_topic(&raw))
    }

    /// Whether `line` opens a publication title block.
    pub fn is_title_start(&self, line: &str) -> bool {
        line.starts_with(BOLD)
            && self.topic_header(line).is_none()
            && !self.holds_identifier(line)
            && !self
                .banner_phrases
                .iter()
                .any(|phrase| line.contains(phrase.as_str()))
    }

    /// Whether `line` begins with a publication identifier.
    pub fn starts_with_identifier(&self, line: &str) -> bool {
        self.identifier_start.is_match(line)
    }

    /// Like [`starts_with_identifier`](Self::starts_with_identifier), but
    /// also matches a bolded metadata line such as `**GAO-24-1, May 2024**`.
    pub fn holds_identifier(&self, line: &str) -> bool {
        self.starts_with_identifier(&clean_title_fragment(line))
    }

    /// Find an identifier and the cleaned date text that follows it.
    pub fn identifier_and_date(&self, line: &str) -> Option<(String, String)> {
        let caps = self.identifier_with_date.captures(line)?;
        let identifier = caps[1].to_string();
        let date = caps.get(2).map(|m| clean_date(m.as_str())).unwrap_or_default();
        Some((identifier, date))
    }

    /// Find a product URL, unwrapping the `*2F`-encoded redirect form first.
    pub fn source_url(&self, line: &str) -> Option<String> {
        self.wrapped_url
            .captures(line)
            .or_else(|| self.plain_url.captures(line))
            .map(|caps| self.canonical_url(&caps[1]))
    }

    /// Canonical product URL for `identifier`.
    pub fn canonical_url(&self, identifier: &str) -> String {
        format!("https://www.{}/products/{identifier}", self.domain)
    }
}

/// Whether a consumed title line closes its block (`**\` or `**`).
pub fn ends_title_block(line: &str) -> bool {
    line.ends_with(BOLD_CONTINUATION) || line.ends_with(BOLD)
}

/// Strip bold delimiters and continuation backslashes from a title line.
pub fn clean_title_fragment(line: &str) -> String {
    line.replace(BOLD, "").replace('\\', "").trim().to_string()
}

/// Cut link artifacts off a raw date tail and trim trailing punctuation.
pub fn clean_date(raw: &str) -> String {
    let cut = DATE_TAIL_RE.replace(raw, "");
    cut.trim()
        .trim_end_matches(|c: char| matches!(c, ',' | '\\' | '*') || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        Grammar::new(&ParserOptions::default()).expect("default grammar")
    }

    #[test]
    fn topic_header_with_and_without_marker() {
        let g = grammar();
        assert_eq!(g.topic_header(r"**EDUCATION**\").as_deref(), Some("Education"));
        assert_eq!(g.topic_header("**EDUCATION**").as_deref(), Some("Education"));
        assert_eq!(
            g.topic_header(r"**JUSTICE AND LAW ENFORCEMENT**\").as_deref(),
            Some("Justice & Law Enforcement")
        );
    }

    #[test]
    fn strict_header_requires_marker() {
        let opts = ParserOptions {
            header_style: HeaderStyle::Strict,
            ..ParserOptions::default()
        };
        let g = Grammar::new(&opts).unwrap();
        assert!(g.topic_header(r"**ENERGY**\").is_some());
        assert!(g.topic_header("**ENERGY**").is_none());
    }

    #[test]
    fn mixed_case_bold_is_not_a_header() {
        let g = grammar();
        assert!(g.topic_header("**Report on Schools**").is_none());
        assert!(g.is_title_start(r"**Report on Schools**\"));
    }

    #[test]
    fn unknown_header_passes_through() {
        let g = grammar();
        assert_eq!(
            g.topic_header(r"**SPECIAL PUBLICATIONS**\").as_deref(),
            Some("SPECIAL PUBLICATIONS")
        );
    }

    #[test]
    fn banners_are_not_titles() {
        let g = grammar();
        assert!(!g.is_title_start("**GAO Month in Review: March 2024**"));
        assert!(!g.is_title_start(r"**LEGAL PRODUCTS AND DECISIONS:**\"));
        assert!(!g.is_title_start("Plain paragraph"));
    }

    #[test]
    fn bold_metadata_is_not_a_title() {
        let g = grammar();
        assert!(g.holds_identifier(r"**GAO-24-500, May 2024**\"));
        assert!(g.holds_identifier("GAO-24-500"));
        assert!(!g.holds_identifier("**Report on GAO-24-500**"));
        assert!(!g.is_title_start(r"**GAO-24-500, May 2024**\"));
    }

    #[test]
    fn identifier_with_and_without_date() {
        let g = grammar();
        assert_eq!(
            g.identifier_and_date(r"GAO-24-050, March 2024\"),
            Some(("GAO-24-050".into(), "March 2024".into()))
        );
        assert_eq!(
            g.identifier_and_date("GAO-24-050"),
            Some(("GAO-24-050".into(), String::new()))
        );
        assert!(g.identifier_and_date("no identifier here").is_none());
        assert!(g.starts_with_identifier("GAO-24-050, March 2024"));
        assert!(!g.starts_with_identifier("See GAO-24-050"));
    }

    #[test]
    fn wrapped_url_is_unwrapped() {
        let g = grammar();
        let line = "<https://urldefense.com/v3/__https:*2F*2Fwww.gao.gov*2Fproducts*2FGAO-24-123__;!!abc$>";
        assert_eq!(
            g.source_url(line).as_deref(),
            Some("https://www.gao.gov/products/GAO-24-123")
        );
    }

    #[test]
    fn plain_url_is_canonicalized() {
        let g = grammar();
        assert_eq!(
            g.source_url("[link](https://www.gao.gov/products/GAO-24-050?utm=x)").as_deref(),
            Some("https://www.gao.gov/products/GAO-24-050")
        );
        assert!(g.source_url("https://example.com/GAO-24-050").is_none());
    }

    #[test]
    fn custom_prefix_and_domain() {
        let opts = ParserOptions {
            domain: "example.org".into(),
            identifier_prefix: "RPT".into(),
            ..ParserOptions::default()
        };
        let g = Grammar::new(&opts).unwrap();
        assert!(g.starts_with_identifier("RPT-1-2, May 2024"));
        assert!(!g.starts_with_identifier("GAO-1-2, May 2024"));
        assert_eq!(g.canonical_url("RPT-1-2"), "https://www.example.org/products/RPT-1-2");
    }

    #[test]
    fn zero_window_rejected() {
        let opts = ParserOptions {
            lookahead_window: 0,
            ..ParserOptions::default()
        };
        assert!(Grammar::new(&opts).is_err());
    }

    #[test]
    fn date_cleanup() {
        assert_eq!(clean_date("January 2024 [link](http://x)"), "January 2024");
        assert_eq!(clean_date(r"March 2024\"), "March 2024");
        assert_eq!(clean_date("March 2024, https://www.gao.gov/x"), "March 2024");
        assert_eq!(clean_date("April 2024 (https://www.gao.gov/x)"), "April 2024");
        assert_eq!(clean_date("May 2024]"), "May 2024");
        assert_eq!(clean_date(r"May 2024**\"), "May 2024");
        assert_eq!(clean_date("  "), "");
    }

    #[test]
    fn title_fragment_cleanup() {
        assert_eq!(clean_title_fragment(r"**Report on Schools**\"), "Report on Schools");
        assert_eq!(clean_title_fragment("continued title"), "continued title");
        assert_eq!(clean_title_fragment(r"**\"), "");
        assert!(ends_title_block(r"**Funding Gaps**\"));
        assert!(ends_title_block("Funding Gaps**"));
        assert!(!ends_title_block("**Report on"));
    }
}
