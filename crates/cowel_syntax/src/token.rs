//! Token types for the cowel lexer and parser.
//!
//! Tokens are the atomic syntactic units produced by the lexer and
//! consumed by the parser. They fall into three groups:
//!
//! | Category | Examples | Context |
//! |----------|----------|---------|
//! | **Markup** | text runs, escapes, comments, `\name` | document, block, string |
//! | **Structure** | `{` `}` `(` `)` `,` `=` `...` `"` | groups and blocks |
//! | **Value** | `unit`, `true`, `0x1f`, identifiers | inside groups |
//!
//! Every token carries a [`Span`]; concatenating the spanned text of a
//! token sequence reproduces the source byte-for-byte.

use cowel_base::Span;

/// The kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Markup tokens.
    /// A literal text run at the document level.
    DocumentText,
    /// A literal text run inside a brace-delimited block.
    BlockText,
    /// A literal text run inside a quoted string.
    QuotedStringText,
    /// An escape sequence such as `\{`.
    Escape,
    /// A backslash followed by a character outside the escape set.
    ReservedEscape,
    /// A `\:` comment, including its terminating LF/CRLF if any.
    LineComment,
    /// A `\*…*\` comment.
    BlockComment,
    /// A backslash followed by a directive name, e.g. `\b`.
    DirectiveSpliceName,

    // Structural tokens.
    BraceLeft,
    BraceRight,
    ParenthesisLeft,
    ParenthesisRight,
    Comma,
    Equals,
    /// The `...` argument-forwarding member.
    Ellipsis,
    /// A `"` opening or closing a quoted string.
    StringQuote,

    // Value tokens, emitted inside groups.
    Unit,
    Null,
    True,
    False,
    Infinity,
    NegativeInfinity,
    BinaryInt,
    OctalInt,
    DecimalInt,
    HexadecimalInt,
    DecimalFloat,
    /// A number-shaped token that is not a well-formed literal.
    ReservedNumber,
    UnquotedIdentifier,
    QuotedIdentifier,
    Whitespace,
    /// A character that could not form any token.
    Error,
}

impl TokenKind {
    /// Returns `true` for the four well-formed integer literal kinds.
    pub fn is_integer_literal(self) -> bool {
        matches!(
            self,
            TokenKind::BinaryInt
                | TokenKind::OctalInt
                | TokenKind::DecimalInt
                | TokenKind::HexadecimalInt
        )
    }

    /// Returns `true` for text-run kinds.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            TokenKind::DocumentText | TokenKind::BlockText | TokenKind::QuotedStringText
        )
    }

    /// Returns `true` for comment kinds.
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

/// One lexed token: a kind and the source region it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The text this token covers in `source`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.range()]
    }
}
