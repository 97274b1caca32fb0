//! The three-context lexer for cowel source text.
//!
//! Lexing is context-sensitive: what terminates a text run depends on
//! where the run appears.
//!
//! - **document**: braces and commas are literal; only `\` starts a
//!   special construct.
//! - **block** (inside `{…}`): `{` increases depth, `}` closes the block
//!   when the depth is zero.
//! - **quoted string** (inside `"…"`): an unescaped `"` closes the string.
//!
//! Inside a parenthesized group, the lexer switches to the value
//! sublanguage: identifiers, keywords, numeric literals in four bases,
//! operators, nested strings, blocks, and directives.
//!
//! Lexing is total: failures produce `Error`, `ReservedEscape`, or
//! `ReservedNumber` tokens, report through the error callback, and clear
//! the success flag, but a complete token sequence is always produced.
//! Concatenating the token texts reproduces the source byte-for-byte.

use cowel_base::diag::ids;
use cowel_base::{SourcePosition, Span};

use crate::scan;
use crate::token::{Token, TokenKind};

/// Receives lexer errors: a diagnostic id, the offending span, and a
/// rendered message.
pub type LexErrorSink<'e> = dyn FnMut(&'static str, Span, String) + 'e;

/// Lexes `source` into a token sequence.
///
/// Always returns a complete sequence; the flag is `false` if any error
/// was reported.
pub fn lex<'e>(source: &str, on_error: &'e mut LexErrorSink<'e>) -> (Vec<Token>, bool) {
    let mut lexer = Lexer {
        source,
        out: Vec::new(),
        pos: SourcePosition::default(),
        success: true,
        on_error,
    };
    lexer.consume_markup_sequence(ContentContext::Document);
    (lexer.out, lexer.success)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentContext {
    Document,
    Block,
    QuotedString,
}

struct Lexer<'a, 'e> {
    source: &'a str,
    out: Vec<Token>,
    pos: SourcePosition,
    success: bool,
    on_error: &'e mut LexErrorSink<'e>,
}

impl<'a, 'e> Lexer<'a, 'e> {
    fn remainder(&self) -> &'a str {
        &self.source[self.pos.byte..]
    }

    fn eof(&self) -> bool {
        self.pos.byte == self.source.len()
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos.byte).copied()
    }

    fn peek_is(&self, c: u8) -> bool {
        self.peek() == Some(c)
    }

    /// Emits a token of `length` bytes at the current position and
    /// advances past it.
    fn emit(&mut self, kind: TokenKind, length: usize) {
        debug_assert!(self.pos.byte + length <= self.source.len());
        let span = Span::new(self.pos, length);
        self.out.push(Token::new(kind, span));
        self.advance_by(length);
    }

    fn advance_by(&mut self, n: usize) {
        let text = &self.source[self.pos.byte..self.pos.byte + n];
        self.pos.advance(text);
    }

    fn error(&mut self, id: &'static str, span: Span, message: String) {
        (self.on_error)(id, span, message);
        self.success = false;
    }

    fn consume_markup_sequence(&mut self, context: ContentContext) {
        let mut brace_level = 0usize;
        while self.expect_markup_element(context, &mut brace_level) {}
    }

    /// Consumes one markup element: a special construct introduced by a
    /// backslash, or a maximal text run. Returns `false` when the context
    /// terminates (EOF, closing brace, or closing quote).
    fn expect_markup_element(&mut self, context: ContentContext, brace_level: &mut usize) -> bool {
        if self.peek_is(b'\\') {
            let matched = self.expect_line_comment()
                || self.expect_block_comment()
                || self.expect_directive_splice();
            if !matched {
                self.consume_escape();
            }
            return true;
        }

        let remainder = self.remainder();
        let mut text_length = 0;
        for &c in remainder.as_bytes() {
            if c == b'\\' {
                break;
            }
            match context {
                ContentContext::Document => {
                    // At the document level, braces and commas are literal.
                }
                ContentContext::QuotedString => {
                    // Braces have no special meaning within strings, but an
                    // unescaped quote ends the string.
                    if c == b'"' {
                        break;
                    }
                }
                ContentContext::Block => {
                    if c == b'{' {
                        *brace_level += 1;
                    } else if c == b'}' {
                        if *brace_level == 0 {
                            break;
                        }
                        *brace_level -= 1;
                    }
                }
            }
            text_length += 1;
        }

        if text_length == 0 {
            return false;
        }

        let text_kind = match context {
            ContentContext::Document => TokenKind::DocumentText,
            ContentContext::Block => TokenKind::BlockText,
            ContentContext::QuotedString => TokenKind::QuotedStringText,
        };
        self.emit(text_kind, text_length);
        true
    }

    fn consume_escape(&mut self) {
        let remainder = self.remainder();
        debug_assert!(remainder.starts_with('\\'));

        let escape = scan::match_escape(remainder);
        if escape.length == 1 {
            self.error(
                ids::PARSE,
                Span::new(self.pos, 1),
                "Backslash at the end of the file is not valid.".into(),
            );
        }
        if escape.is_reserved {
            self.error(
                ids::PARSE,
                Span::new(self.pos, escape.length),
                format!(
                    "Expected comment or escape sequence, but got '{}' following a backslash.",
                    &remainder[..escape.length]
                ),
            );
        }

        let kind = if escape.is_reserved {
            TokenKind::ReservedEscape
        } else {
            TokenKind::Escape
        };
        self.emit(kind, escape.length);
    }

    fn expect_whitespace(&mut self) -> bool {
        let space = scan::match_whitespace(self.remainder());
        if space == 0 {
            return false;
        }
        self.emit(TokenKind::Whitespace, space);
        true
    }

    fn expect_line_comment(&mut self) -> bool {
        let remainder = self.remainder();
        let length = scan::match_line_comment(remainder);
        if length == 0 {
            return false;
        }
        // The terminating LF or CRLF belongs to the comment token; an
        // EOF-terminated comment has an empty suffix.
        let suffix = &remainder[length..];
        let suffix_length = if suffix.starts_with("\r\n") {
            2
        } else if suffix.starts_with('\n') {
            1
        } else {
            0
        };
        self.emit(TokenKind::LineComment, length + suffix_length);
        true
    }

    fn expect_block_comment(&mut self) -> bool {
        let Some(comment) = scan::match_block_comment(self.remainder()) else {
            return false;
        };
        if !comment.is_terminated {
            self.error(
                ids::PARSE,
                Span::new(self.pos, 2),
                "Unterminated block comment.".into(),
            );
        }
        self.emit(TokenKind::BlockComment, comment.length);
        true
    }

    fn expect_directive_splice(&mut self) -> bool {
        debug_assert!(self.peek_is(b'\\'));
        let name_length = scan::match_identifier(&self.remainder()[1..]);
        if name_length == 0 {
            return false;
        }
        self.emit(TokenKind::DirectiveSpliceName, 1 + name_length);

        if self.peek_is(b'(') {
            self.consume_group();
        }
        if self.peek_is(b'{') {
            self.consume_block();
        }
        true
    }

    /// Lexes a parenthesized group using the value sublanguage.
    fn consume_group(&mut self) {
        debug_assert!(self.peek_is(b'('));
        self.emit(TokenKind::ParenthesisLeft, 1);

        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                b'(' => {
                    self.emit(TokenKind::ParenthesisLeft, 1);
                    depth += 1;
                }
                b')' => {
                    self.emit(TokenKind::ParenthesisRight, 1);
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                b'{' => self.consume_block(),
                b'=' => self.emit(TokenKind::Equals, 1),
                b',' => self.emit(TokenKind::Comma, 1),
                b'"' => self.consume_quoted_string(),
                b'.' => {
                    let ellipsis = scan::match_ellipsis(self.remainder());
                    if ellipsis != 0 {
                        self.emit(TokenKind::Ellipsis, ellipsis);
                    } else {
                        self.consume_numeric_literal();
                    }
                }
                b'-' | b'+' => self.consume_signed_literal(),
                b'0'..=b'9' => self.consume_numeric_literal(),
                b'\\' => {
                    let matched = self.expect_line_comment()
                        || self.expect_block_comment()
                        || self.expect_directive_splice();
                    if !matched {
                        self.consume_escape();
                    }
                }
                b' ' | b'\t' | b'\r' | b'\n' | 0x0B => {
                    let matched = self.expect_whitespace();
                    debug_assert!(matched);
                }
                _ => {
                    if !self.expect_identifier_or_literal() {
                        self.consume_error_character();
                    }
                }
            }
        }
    }

    /// Consumes a `-`/`+` introducing `-infinity` or a signed number.
    fn consume_signed_literal(&mut self) {
        let remainder = self.remainder();
        if remainder.starts_with('-') {
            let after = &remainder[1..];
            if scan::match_identifier(after) == "infinity".len() && after.starts_with("infinity") {
                self.emit(TokenKind::NegativeInfinity, 1 + "infinity".len());
                return;
            }
        }
        if scan::match_reserved_number(remainder) != 0 {
            self.consume_numeric_literal();
        } else {
            self.consume_error_character();
        }
    }

    fn consume_error_character(&mut self) {
        // Cover the whole code point so the token never slices UTF-8.
        let length = self
            .remainder()
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.error(
            ids::PARSE,
            Span::new(self.pos, length),
            "Unable to form a token.".into(),
        );
        self.emit(TokenKind::Error, length);
    }

    /// Matches the reserved-number superset greedily, then validates it
    /// as a literal in one of the four bases or as a float.
    fn consume_numeric_literal(&mut self) {
        let remainder = self.remainder();
        let reserved_length = scan::match_reserved_number(remainder);
        debug_assert!(reserved_length != 0);
        let text = &remainder[..reserved_length];

        let Some(kind) = scan::classify_number(text) else {
            self.error(
                ids::PARSE,
                Span::new(self.pos, reserved_length),
                "Invalid numeric literal.".into(),
            );
            self.emit(TokenKind::ReservedNumber, reserved_length);
            return;
        };
        let token_kind = match kind {
            scan::NumberKind::Binary => TokenKind::BinaryInt,
            scan::NumberKind::Octal => TokenKind::OctalInt,
            scan::NumberKind::Decimal => TokenKind::DecimalInt,
            scan::NumberKind::Hexadecimal => TokenKind::HexadecimalInt,
            scan::NumberKind::Float => TokenKind::DecimalFloat,
        };
        self.emit(token_kind, reserved_length);
    }

    fn expect_identifier_or_literal(&mut self) -> bool {
        let length = scan::match_identifier(self.remainder());
        if length == 0 {
            return false;
        }
        let kind = match &self.remainder()[..length] {
            "unit" => TokenKind::Unit,
            "null" => TokenKind::Null,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "infinity" => TokenKind::Infinity,
            _ => TokenKind::UnquotedIdentifier,
        };
        self.emit(kind, length);
        true
    }

    fn consume_quoted_string(&mut self) {
        let initial_pos = self.pos;
        debug_assert!(self.peek_is(b'"'));
        self.emit(TokenKind::StringQuote, 1);

        self.consume_markup_sequence(ContentContext::QuotedString);

        if self.peek_is(b'"') {
            self.emit(TokenKind::StringQuote, 1);
        } else {
            self.error(
                ids::PARSE_STRING_UNCLOSED,
                Span::new(initial_pos, 1),
                "No matching '\"'. This string is unterminated.".into(),
            );
        }
    }

    fn consume_block(&mut self) {
        let initial_pos = self.pos;
        debug_assert!(self.peek_is(b'{'));
        self.emit(TokenKind::BraceLeft, 1);

        self.consume_markup_sequence(ContentContext::Block);

        if self.peek_is(b'}') {
            self.emit(TokenKind::BraceRight, 1);
        } else {
            debug_assert!(self.eof());
            self.error(
                ids::PARSE_BLOCK_UNCLOSED,
                Span::new(initial_pos, 1),
                "No matching '}'. This block is unclosed.".into(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn lex_ok(source: &str) -> Vec<(TokenKind, String)> {
        let (tokens, success) = lex(source, &mut |id, span, message| {
            panic!("unexpected lex error [{id}] at {span:?}: {message}");
        });
        assert!(success);
        assert_roundtrip(source, &tokens);
        tokens
            .iter()
            .map(|t| (t.kind, t.text(source).to_string()))
            .collect()
    }

    fn lex_err(source: &str) -> (Vec<Token>, Vec<&'static str>) {
        let mut errors = Vec::new();
        let (tokens, success) = lex(source, &mut |id, _, _| errors.push(id));
        assert!(!success);
        assert!(!errors.is_empty());
        assert_roundtrip(source, &tokens);
        (tokens, errors)
    }

    fn assert_roundtrip(source: &str, tokens: &[Token]) {
        let rebuilt: String = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(rebuilt, source);
    }

    fn kinds(tokens: &[(TokenKind, String)]) -> Vec<TokenKind> {
        tokens.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn empty_source() {
        assert!(lex_ok("").is_empty());
    }

    #[test]
    fn plain_text_is_one_token() {
        let tokens = lex_ok("hello {braces} and , commas");
        assert_eq!(kinds(&tokens), [DocumentText]);
    }

    #[test]
    fn escape_sequences() {
        let tokens = lex_ok("\\{x\\}");
        assert_eq!(kinds(&tokens), [Escape, DocumentText, Escape]);
        assert_eq!(tokens[0].1, "\\{");
    }

    #[test]
    fn reserved_escape_is_reported() {
        let (tokens, _) = lex_err("\\1");
        assert_eq!(tokens[0].kind, ReservedEscape);
    }

    #[test]
    fn bare_backslash_at_eof() {
        let (tokens, _) = lex_err("text\\");
        assert_eq!(tokens.last().unwrap().kind, Escape);
        assert_eq!(tokens.last().unwrap().span.length, 1);
    }

    #[test]
    fn line_comment_includes_terminator() {
        let tokens = lex_ok("\\: note\nrest");
        assert_eq!(kinds(&tokens), [LineComment, DocumentText]);
        assert_eq!(tokens[0].1, "\\: note\n");
        assert_eq!(tokens[1].1, "rest");
    }

    #[test]
    fn line_comment_at_eof_has_no_suffix() {
        let tokens = lex_ok("\\: note");
        assert_eq!(kinds(&tokens), [LineComment]);
        assert_eq!(tokens[0].1, "\\: note");
    }

    #[test]
    fn block_comment() {
        let tokens = lex_ok("a\\* hidden *\\b");
        assert_eq!(kinds(&tokens), [DocumentText, BlockComment, DocumentText]);
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let (tokens, _) = lex_err("\\*oops");
        assert_eq!(tokens[0].kind, BlockComment);
    }

    #[test]
    fn directive_without_arguments() {
        let tokens = lex_ok("\\b{bold}");
        assert_eq!(
            kinds(&tokens),
            [DirectiveSpliceName, BraceLeft, BlockText, BraceRight]
        );
        assert_eq!(tokens[0].1, "\\b");
    }

    #[test]
    fn directive_with_group_and_block() {
        let tokens = lex_ok("\\x(a, b = 2){c}");
        assert_eq!(
            kinds(&tokens),
            [
                DirectiveSpliceName,
                ParenthesisLeft,
                UnquotedIdentifier,
                Comma,
                Whitespace,
                UnquotedIdentifier,
                Whitespace,
                Equals,
                Whitespace,
                DecimalInt,
                ParenthesisRight,
                BraceLeft,
                BlockText,
                BraceRight,
            ]
        );
    }

    #[test]
    fn nested_braces_in_blocks() {
        let tokens = lex_ok("\\x{a{b}c}");
        assert_eq!(
            kinds(&tokens),
            [DirectiveSpliceName, BraceLeft, BlockText, BraceRight]
        );
        assert_eq!(tokens[2].1, "a{b}c");
    }

    #[test]
    fn unclosed_block_is_reported() {
        let (_, errors) = lex_err("\\x{oops");
        assert!(errors.contains(&ids::PARSE_BLOCK_UNCLOSED));
    }

    #[test]
    fn keywords_in_groups() {
        let tokens = lex_ok("\\x(unit,null,true,false,infinity,-infinity)");
        assert_eq!(
            kinds(&tokens),
            [
                DirectiveSpliceName,
                ParenthesisLeft,
                Unit,
                Comma,
                Null,
                Comma,
                True,
                Comma,
                False,
                Comma,
                Infinity,
                Comma,
                NegativeInfinity,
                ParenthesisRight,
            ]
        );
    }

    #[test]
    fn numeric_literal_bases() {
        let tokens = lex_ok("\\x(0b11, 0o17, 42, 0x2a, 1.5e3)");
        let kinds: Vec<TokenKind> = kinds(&tokens)
            .into_iter()
            .filter(|k| {
                !matches!(
                    *k,
                    Whitespace | Comma | ParenthesisLeft | ParenthesisRight | DirectiveSpliceName
                )
            })
            .collect();
        assert_eq!(
            kinds,
            [BinaryInt, OctalInt, DecimalInt, HexadecimalInt, DecimalFloat]
        );
    }

    #[test]
    fn malformed_number_becomes_reserved() {
        let (tokens, errors) = lex_err("\\x(0b2)");
        assert!(tokens.iter().any(|t| t.kind == ReservedNumber));
        assert!(errors.contains(&ids::PARSE));
    }

    #[test]
    fn quoted_string_in_group() {
        let tokens = lex_ok("\\x(\"hi\")");
        assert_eq!(
            kinds(&tokens),
            [
                DirectiveSpliceName,
                ParenthesisLeft,
                StringQuote,
                QuotedStringText,
                StringQuote,
                ParenthesisRight,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (_, errors) = lex_err("\\x(\"oops)");
        assert!(errors.contains(&ids::PARSE_STRING_UNCLOSED));
    }

    #[test]
    fn ellipsis_member() {
        let tokens = lex_ok("\\x(a, ...)");
        assert!(kinds(&tokens).contains(&Ellipsis));
    }

    #[test]
    fn nested_directive_in_group() {
        let tokens = lex_ok("\\x(a = \\y{z})");
        let kinds = kinds(&tokens);
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == DirectiveSpliceName)
                .count(),
            2
        );
    }

    #[test]
    fn cr_without_lf_is_plain_text() {
        let tokens = lex_ok("a\rb");
        assert_eq!(kinds(&tokens), [DocumentText]);
    }
}
