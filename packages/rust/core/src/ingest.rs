//! Document ingest: bytes in, [`LoadedDocument`] out.
//!
//! Ingest is all-or-nothing. Conversion and decoding failures return an
//! error and nothing else; the caller's session is only replaced once a
//! complete document exists.

use std::path::Path;

use tracing::{info, instrument};

use mirreview_markdown::MarkdownParser;
use mirreview_shared::{
    AppConfig, DocumentFingerprint, LoadedDocument, ParserOptions, Result, ReviewError,
    TrackChanges,
};

use crate::convert::DocumentConverter;

/// Upload formats, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Markdown or plain text, parsed directly.
    Markdown,
    /// Word document, converted first.
    Word,
}

impl DocumentKind {
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "md" | "markdown" | "txt" => Ok(Self::Markdown),
            "docx" => Ok(Self::Word),
            "" => Err(ReviewError::validation(format!(
                "{file_name} has no file extension; expected .docx or .md"
            ))),
            other => Err(ReviewError::validation(format!(
                "unsupported file type .{other}; expected .docx or .md"
            ))),
        }
    }
}

/// Progress callback for long-running ingest phases.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the document is loaded.
    fn done(&self, document: &LoadedDocument);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _document: &LoadedDocument) {}
}

/// Loads review documents with a fixed parser and converter.
#[derive(Debug, Clone)]
pub struct Ingestor<C> {
    parser: MarkdownParser,
    converter: C,
    track_changes: TrackChanges,
}

impl<C: DocumentConverter> Ingestor<C> {
    pub fn new(parser: &ParserOptions, converter: C, track_changes: TrackChanges) -> Result<Self> {
        Ok(Self {
            parser: MarkdownParser::new(parser)?,
            converter,
            track_changes,
        })
    }

    /// Build from the parser and converter sections of `config`.
    pub fn from_config(config: &AppConfig, converter: C) -> Result<Self> {
        Self::new(
            &ParserOptions::from(config),
            converter,
            config.converter.track_changes,
        )
    }

    /// Turn an upload into markdown, converting Word documents first.
    pub async fn to_markdown(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        match DocumentKind::from_file_name(file_name)? {
            DocumentKind::Markdown => {
                String::from_utf8(bytes.to_vec()).map_err(|source| ReviewError::Decode {
                    file_name: file_name.to_string(),
                    source,
                })
            }
            DocumentKind::Word => self.converter.convert(bytes, self.track_changes).await,
        }
    }

    /// Convert, parse and fingerprint one upload.
    #[instrument(skip_all, fields(file = %file_name, bytes = bytes.len()))]
    pub async fn load(
        &self,
        file_name: &str,
        bytes: &[u8],
        progress: &dyn ProgressReporter,
    ) -> Result<LoadedDocument> {
        let fingerprint = DocumentFingerprint::of(bytes);

        if DocumentKind::from_file_name(file_name)? == DocumentKind::Word {
            progress.phase("Converting document");
        }
        let markdown = self.to_markdown(file_name, bytes).await?;

        progress.phase("Parsing publications");
        let outcome = self.parser.parse(&markdown);

        let document = LoadedDocument {
            file_name: file_name.to_string(),
            fingerprint,
            publications: outcome.publications,
            stats: outcome.stats,
        };

        info!(
            fingerprint = %document.fingerprint.short(),
            records = document.publications.len(),
            "document loaded"
        );
        progress.done(&document);
        Ok(document)
    }

    /// Read `path` from disk and [`load`](Self::load) it.
    pub async fn load_path(
        &self,
        path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<LoadedDocument> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ReviewError::io(path, e))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.load(file_name, &bytes, progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Converter stub returning canned output.
    struct FakeConverter {
        output: std::result::Result<String, &'static str>,
        seen_mode: Mutex<Option<TrackChanges>>,
    }

    impl FakeConverter {
        fn ok(markdown: &str) -> Self {
            Self {
                output: Ok(markdown.to_string()),
                seen_mode: Mutex::new(None),
            }
        }

        fn unavailable() -> Self {
            Self {
                output: Err("fake-pandoc"),
                seen_mode: Mutex::new(None),
            }
        }
    }

    impl DocumentConverter for FakeConverter {
        async fn convert(&self, _bytes: &[u8], mode: TrackChanges) -> Result<String> {
            *self.seen_mode.lock().unwrap() = Some(mode);
            match &self.output {
                Ok(md) => Ok(md.clone()),
                Err(tool) => Err(ReviewError::ConverterUnavailable {
                    tool: tool.to_string(),
                }),
            }
        }
    }

    const DOC: &str = "**ENERGY**\\\n\n**Grid Reliability**\\\nGAO-24-500, May 2024\\\nhttps://www.gao.gov/products/GAO-24-500\n";

    fn ingestor(converter: FakeConverter) -> Ingestor<FakeConverter> {
        Ingestor::new(&ParserOptions::default(), converter, TrackChanges::Reject)
            .expect("default options")
    }

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::from_file_name("may.md").unwrap(), DocumentKind::Markdown);
        assert_eq!(DocumentKind::from_file_name("MAY.MD").unwrap(), DocumentKind::Markdown);
        assert_eq!(DocumentKind::from_file_name("may.txt").unwrap(), DocumentKind::Markdown);
        assert_eq!(DocumentKind::from_file_name("may.docx").unwrap(), DocumentKind::Word);
        assert!(DocumentKind::from_file_name("may.pdf").is_err());
        assert!(DocumentKind::from_file_name("README").is_err());
    }

    #[tokio::test]
    async fn markdown_is_parsed_directly() {
        let ing = ingestor(FakeConverter::ok("unused"));
        let doc = ing.load("may.md", DOC.as_bytes(), &SilentProgress).await.unwrap();
        assert_eq!(doc.file_name, "may.md");
        assert_eq!(doc.publications.len(), 1);
        assert_eq!(doc.publications[0].original_topics, vec!["Energy"]);
        assert_eq!(doc.fingerprint, DocumentFingerprint::of(DOC.as_bytes()));
        assert!(ing.converter.seen_mode.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn word_document_goes_through_converter() {
        let ing = ingestor(FakeConverter::ok(DOC));
        let doc = ing.load("may.docx", b"PK\x03\x04", &SilentProgress).await.unwrap();
        assert_eq!(doc.publications[0].identifier, "GAO-24-500");
        assert_eq!(doc.fingerprint, DocumentFingerprint::of(b"PK\x03\x04"));
        assert_eq!(
            *ing.converter.seen_mode.lock().unwrap(),
            Some(TrackChanges::Reject)
        );
    }

    #[tokio::test]
    async fn converter_failure_propagates() {
        let ing = ingestor(FakeConverter::unavailable());
        let err = ing.load("may.docx", b"PK", &SilentProgress).await.unwrap_err();
        assert!(matches!(err, ReviewError::ConverterUnavailable { .. }));
    }

    #[tokio::test]
    async fn invalid_utf8_is_decode_error() {
        let ing = ingestor(FakeConverter::ok(""));
        let err = ing
            .load("may.md", &[0xff, 0xfe, 0x00], &SilentProgress)
            .await
            .unwrap_err();
        match err {
            ReviewError::Decode { file_name, .. } => assert_eq!(file_name, "may.md"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let ing = ingestor(FakeConverter::ok(DOC));
        let err = ing.load("may.pdf", b"%PDF", &SilentProgress).await.unwrap_err();
        assert!(matches!(err, ReviewError::Validation { .. }));
    }

    #[tokio::test]
    async fn empty_markdown_loads_empty_document() {
        let ing = ingestor(FakeConverter::ok(""));
        let doc = ing.load("empty.md", b"", &SilentProgress).await.unwrap();
        assert!(doc.publications.is_empty());
    }

    #[tokio::test]
    async fn load_fixture_from_disk() {
        let ing = ingestor(FakeConverter::ok(""));
        let doc = ing
            .load_path(&fixture_path("markdown/month_in_review.md"), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(doc.file_name, "month_in_review.md");
        assert_eq!(doc.publications.len(), 5);
        assert_eq!(doc.stats.records, 5);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let ing = ingestor(FakeConverter::ok(""));
        let err = ing
            .load_path(Path::new("/nonexistent/may.md"), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Io { .. }));
    }
}
