//! The syntax-highlighting service interface.
//!
//! The engine does not highlight code itself; it asks a
//! [`SyntaxHighlighter`] for spans over a piece of code and wraps each
//! highlighted run in an `<h->` element whose `data-h` attribute carries
//! the short identifier of the highlight kind.

use thiserror::Error;

/// A classification of one highlighted run of code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Keyword,
    String,
    Number,
    Comment,
    Identifier,
    Type,
    Operator,
    Punctuation,
    Attribute,
    Other,
}

impl HighlightKind {
    /// The short identifier used in `data-h` attributes.
    pub fn short_name(self) -> &'static str {
        match self {
            HighlightKind::Keyword => "kw",
            HighlightKind::String => "str",
            HighlightKind::Number => "num",
            HighlightKind::Comment => "cmt",
            HighlightKind::Identifier => "id",
            HighlightKind::Type => "ty",
            HighlightKind::Operator => "op",
            HighlightKind::Punctuation => "p",
            HighlightKind::Attribute => "attr",
            HighlightKind::Other => "x",
        }
    }
}

/// One highlighted region, in byte offsets into the highlighted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan {
    pub begin: usize,
    pub length: usize,
    pub kind: HighlightKind,
}

impl HighlightSpan {
    pub fn end(&self) -> usize {
        self.begin + self.length
    }
}

/// Why highlighting failed.
///
/// A failed highlight is never fatal: the code is still emitted, just
/// without highlight elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HighlightError {
    #[error("the language is not supported")]
    UnsupportedLanguage,
    #[error("the code is malformed and cannot be highlighted")]
    MalformedCode,
    #[error("highlighting failed")]
    Other,
}

/// Produces highlight spans for source code in supported languages.
pub trait SyntaxHighlighter {
    /// The language names this highlighter understands.
    fn languages(&self) -> &[&str];

    /// Appends spans covering `code` to `out`. Spans must be sorted by
    /// `begin` and must not overlap.
    fn highlight(
        &self,
        out: &mut Vec<HighlightSpan>,
        code: &str,
        language: &str,
    ) -> Result<(), HighlightError>;
}

/// A highlighter that supports no languages. The default service.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHighlighter;

impl SyntaxHighlighter for NoHighlighter {
    fn languages(&self) -> &[&str] {
        &[]
    }

    fn highlight(
        &self,
        _out: &mut Vec<HighlightSpan>,
        _code: &str,
        _language: &str,
    ) -> Result<(), HighlightError> {
        Err(HighlightError::UnsupportedLanguage)
    }
}
