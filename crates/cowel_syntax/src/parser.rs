//! Recursive-descent parser from tokens to the typed AST.
//!
//! The parser mirrors the lexer's context structure: a document is a
//! markup sequence; a directive is a name, an optional group, and an
//! optional block; groups hold positional, named, and ellipsis members
//! whose values belong to the value sublanguage.
//!
//! Parsing is total in the same way lexing is: errors are reported
//! through the callback, the success flag is cleared, and a best-effort
//! tree is still produced. Every node preserves its exact source text.

use cowel_base::diag::ids;
use cowel_base::{FileId, FileSpan, SourcePosition, Span};

use crate::ast::{
    Directive, FloatStatus, GroupMember, MarkupElement, MemberValue, ParsedFloat, ParsedInt,
    Primary, PrimaryKind,
};
use crate::lexer;
use crate::token::{Token, TokenKind};

/// Receives parse errors: a diagnostic id, the offending span, and a
/// rendered message.
pub type ParseErrorSink<'e> = dyn FnMut(&'static str, FileSpan, String) + 'e;

/// Lexes and parses `source` into a sequence of markup elements.
///
/// Always returns a complete (possibly partial-quality) tree; the flag is
/// `false` if any lexer or parser error was reported.
pub fn parse<'a, 'e>(
    source: &'a str,
    file: FileId,
    on_error: &'e mut ParseErrorSink<'e>,
) -> (Vec<MarkupElement<'a>>, bool) {
    let (tokens, lex_success) = {
        let mut lex_on_error = |id: &'static str, span: Span, message: String| {
            on_error(id, FileSpan::new(file, span), message);
        };
        lexer::lex(source, &mut lex_on_error)
    };

    let mut parser = Parser {
        source,
        file,
        tokens,
        index: 0,
        success: lex_success,
        on_error,
    };
    let elements = parser.parse_markup_sequence(None);
    log::trace!(
        "parsed {} top-level markup elements from {} bytes",
        elements.len(),
        source.len()
    );
    (elements, parser.success)
}

struct Parser<'a, 'e> {
    source: &'a str,
    file: FileId,
    tokens: Vec<Token>,
    index: usize,
    success: bool,
    on_error: &'e mut ParseErrorSink<'e>,
}

impl<'a, 'e> Parser<'a, 'e> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.index).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.index];
        self.index += 1;
        token
    }

    fn error(&mut self, id: &'static str, span: Span, message: String) {
        (self.on_error)(id, FileSpan::new(self.file, span), message);
        self.success = false;
    }

    /// A file span from `begin` to the byte offset `end_byte`.
    fn span_from(&self, begin: SourcePosition, end_byte: usize) -> FileSpan {
        FileSpan::new(self.file, Span::new(begin, end_byte - begin.byte))
    }

    fn slice(&self, span: FileSpan) -> &'a str {
        &self.source[span.range()]
    }

    /// The byte offset one past the last consumed token.
    fn consumed_end(&self) -> usize {
        if self.index == 0 {
            0
        } else {
            self.tokens[self.index - 1].span.end_byte()
        }
    }

    fn parse_markup_sequence(&mut self, terminator: Option<TokenKind>) -> Vec<MarkupElement<'a>> {
        let mut elements = Vec::new();
        while let Some(token) = self.peek() {
            if Some(token.kind) == terminator {
                break;
            }
            match token.kind {
                kind if kind.is_text() => {
                    let token = self.advance();
                    elements.push(MarkupElement::Primary(self.basic_primary(
                        PrimaryKind::Text,
                        token,
                    )));
                }
                TokenKind::Escape | TokenKind::ReservedEscape => {
                    let token = self.advance();
                    elements.push(MarkupElement::Primary(self.basic_primary(
                        PrimaryKind::Escape,
                        token,
                    )));
                }
                TokenKind::LineComment | TokenKind::BlockComment => {
                    let comment = self.parse_comment();
                    elements.push(MarkupElement::Primary(comment));
                }
                TokenKind::DirectiveSpliceName => {
                    let directive = self.parse_directive();
                    elements.push(MarkupElement::Directive(directive));
                }
                TokenKind::Error => {
                    // Already reported by the lexer.
                    self.advance();
                }
                _ => {
                    self.error(
                        ids::PARSE,
                        token.span,
                        format!("Unexpected {:?} token in markup.", token.kind),
                    );
                    self.advance();
                }
            }
        }
        elements
    }

    fn basic_primary(&self, kind: PrimaryKind, token: Token) -> Primary<'a> {
        let span = FileSpan::new(self.file, token.span);
        Primary::basic(kind, span, self.slice(span))
    }

    fn parse_comment(&mut self) -> Primary<'a> {
        let token = self.advance();
        let span = FileSpan::new(self.file, token.span);
        let source = self.slice(span);
        let suffix_length = match token.kind {
            TokenKind::LineComment => {
                if source.ends_with("\r\n") {
                    2
                } else if source.ends_with('\n') {
                    1
                } else {
                    0
                }
            }
            _ => {
                if source.ends_with("*\\") {
                    2
                } else {
                    0
                }
            }
        };
        Primary::comment(span, source, suffix_length)
    }

    fn parse_directive(&mut self) -> Directive<'a> {
        let name_token = self.advance();
        debug_assert_eq!(name_token.kind, TokenKind::DirectiveSpliceName);
        let begin = name_token.span.begin;
        let name = &self.source[name_token.span.range()][1..];

        let arguments = if self.peek_kind() == Some(TokenKind::ParenthesisLeft) {
            Some(self.parse_group())
        } else {
            None
        };
        let content = if self.peek_kind() == Some(TokenKind::BraceLeft) {
            Some(self.parse_block())
        } else {
            None
        };

        let span = self.span_from(begin, self.consumed_end());
        Directive::new(span, self.slice(span), name, arguments, content)
    }

    fn parse_block(&mut self) -> Primary<'a> {
        let open = self.advance();
        debug_assert_eq!(open.kind, TokenKind::BraceLeft);

        let elements = self.parse_markup_sequence(Some(TokenKind::BraceRight));
        if self.peek_kind() == Some(TokenKind::BraceRight) {
            self.advance();
        }
        // An unclosed block has already been reported by the lexer.

        let span = self.span_from(open.span.begin, self.consumed_end());
        Primary::block(span, self.slice(span), elements)
    }

    fn parse_quoted_string(&mut self) -> Primary<'a> {
        let open = self.advance();
        debug_assert_eq!(open.kind, TokenKind::StringQuote);

        let elements = self.parse_markup_sequence(Some(TokenKind::StringQuote));
        if self.peek_kind() == Some(TokenKind::StringQuote) {
            self.advance();
        }

        let span = self.span_from(open.span.begin, self.consumed_end());
        Primary::quoted_string(span, self.slice(span), elements)
    }

    /// Skips whitespace and comments, which separate but do not form
    /// group members.
    fn skip_group_filler(&mut self) {
        while matches!(
            self.peek_kind(),
            Some(TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment)
        ) {
            self.advance();
        }
    }

    /// Peeks past whitespace without consuming anything.
    fn peek_kind_skipping_whitespace(&self, from: usize) -> Option<TokenKind> {
        self.tokens[from..]
            .iter()
            .map(|t| t.kind)
            .find(|k| *k != TokenKind::Whitespace)
    }

    fn parse_group(&mut self) -> Primary<'a> {
        let open = self.advance();
        debug_assert_eq!(open.kind, TokenKind::ParenthesisLeft);

        let mut members = Vec::new();
        loop {
            self.skip_group_filler();
            let Some(token) = self.peek() else {
                self.error(
                    ids::PARSE_GROUP_UNCLOSED,
                    open.span,
                    "No matching ')'. This group is unclosed.".into(),
                );
                break;
            };
            if token.kind == TokenKind::ParenthesisRight {
                self.advance();
                break;
            }

            if let Some(member) = self.parse_group_member(token) {
                members.push(member);
            }

            self.skip_group_filler();
            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.advance();
                }
                Some(TokenKind::ParenthesisRight) | None => {}
                Some(kind) => {
                    let span = self.peek().map(|t| t.span).unwrap_or(open.span);
                    self.error(
                        ids::PARSE_GROUP_UNEXPECTED,
                        span,
                        format!("Expected ',' or ')' after a group member, but got {kind:?}."),
                    );
                    self.advance();
                }
            }
        }

        let span = self.span_from(open.span.begin, self.consumed_end());
        Primary::group(span, self.slice(span), members)
    }

    fn parse_group_member(&mut self, first: Token) -> Option<GroupMember<'a>> {
        if first.kind == TokenKind::Ellipsis {
            self.advance();
            let span = FileSpan::new(self.file, first.span);
            return Some(GroupMember::ellipsis(span, self.slice(span)));
        }

        // `name = value` forms a named member; the name itself must be an
        // identifier.
        if first.kind == TokenKind::UnquotedIdentifier
            && self.peek_kind_skipping_whitespace(self.index + 1) == Some(TokenKind::Equals)
        {
            let name_token = self.advance();
            let name = self.basic_primary(PrimaryKind::UnquotedString, name_token);
            self.skip_group_filler();
            let equals = self.advance();
            debug_assert_eq!(equals.kind, TokenKind::Equals);
            self.skip_group_filler();

            let value = self.parse_member_value()?;
            let span = self.span_from(name_token.span.begin, self.consumed_end());
            return Some(GroupMember::named(span, self.slice(span), name, value));
        }

        let value = self.parse_member_value()?;
        let span = value.span();
        let source = value.source();
        Some(GroupMember::positional(span, source, value))
    }

    fn parse_member_value(&mut self) -> Option<MemberValue<'a>> {
        let token = self.peek()?;
        let primary = match token.kind {
            TokenKind::Unit => self.advance_basic(PrimaryKind::Unit),
            TokenKind::Null => self.advance_basic(PrimaryKind::Null),
            TokenKind::True | TokenKind::False => self.advance_basic(PrimaryKind::Bool),
            TokenKind::Infinity | TokenKind::NegativeInfinity => {
                self.advance_basic(PrimaryKind::Infinity)
            }
            kind if kind.is_integer_literal() => {
                let token = self.advance();
                let span = FileSpan::new(self.file, token.span);
                let source = self.slice(span);
                Primary::integer(span, source, parse_int(source))
            }
            TokenKind::DecimalFloat => {
                let token = self.advance();
                let span = FileSpan::new(self.file, token.span);
                let source = self.slice(span);
                Primary::floating(span, source, parse_float(source))
            }
            TokenKind::UnquotedIdentifier => self.advance_basic(PrimaryKind::UnquotedString),
            TokenKind::StringQuote => self.parse_quoted_string(),
            TokenKind::ParenthesisLeft => self.parse_group(),
            TokenKind::BraceLeft => self.parse_block(),
            TokenKind::DirectiveSpliceName => {
                return Some(MemberValue::Directive(self.parse_directive()));
            }
            TokenKind::ReservedNumber => {
                // The lexer has already reported the malformed literal;
                // keep the token as an opaque string so that parsing can
                // continue.
                self.advance_basic(PrimaryKind::UnquotedString)
            }
            TokenKind::Error => {
                self.advance();
                return None;
            }
            kind => {
                self.error(
                    ids::PARSE_GROUP_UNEXPECTED,
                    token.span,
                    format!("Expected a value, but got {kind:?}."),
                );
                self.advance();
                return None;
            }
        };
        Some(MemberValue::Primary(primary))
    }

    fn advance_basic(&mut self, kind: PrimaryKind) -> Primary<'a> {
        let token = self.advance();
        self.basic_primary(kind, token)
    }
}

/// Parses an integer literal in any of the four bases into the `i128`
/// fast path. Out-of-range literals yield `in_range == false` and a zero
/// value; consumers re-parse the preserved source at arbitrary precision.
pub fn parse_int(text: &str) -> ParsedInt {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = if let Some(d) = unsigned.strip_prefix("0b") {
        (2, d)
    } else if let Some(d) = unsigned.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = unsigned.strip_prefix("0x") {
        (16, d)
    } else {
        (10, unsigned)
    };

    let Ok(magnitude) = u128::from_str_radix(digits, radix) else {
        return ParsedInt {
            value: 0,
            in_range: false,
        };
    };
    let limit = if negative {
        i128::MAX as u128 + 1
    } else {
        i128::MAX as u128
    };
    if magnitude > limit {
        return ParsedInt {
            value: 0,
            in_range: false,
        };
    }
    let value = if negative {
        (magnitude as i128).wrapping_neg()
    } else {
        magnitude as i128
    };
    ParsedInt {
        value,
        in_range: true,
    }
}

/// Parses a float literal, detecting overflow (signed infinity) and
/// underflow (signed zero).
pub fn parse_float(text: &str) -> ParsedFloat {
    let value: f64 = text.parse().unwrap_or(0.0);
    let status = if value.is_infinite() {
        FloatStatus::Overflow
    } else if value == 0.0 && mantissa_has_nonzero_digit(text) {
        FloatStatus::Underflow
    } else {
        FloatStatus::Ok
    };
    ParsedFloat { value, status }
}

fn mantissa_has_nonzero_digit(text: &str) -> bool {
    text.split(['e', 'E'])
        .next()
        .unwrap_or("")
        .bytes()
        .any(|b| (b'1'..=b'9').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowel_base::FileId;

    fn parse_ok(source: &str) -> Vec<MarkupElement<'_>> {
        let (elements, success) = parse(source, FileId::MAIN, &mut |id, span, message| {
            panic!("unexpected parse error [{id}] at {span:?}: {message}");
        });
        assert!(success);
        elements
    }

    fn parse_err(source: &str) -> (Vec<MarkupElement<'_>>, Vec<&'static str>) {
        let mut errors = Vec::new();
        let (elements, success) = parse(source, FileId::MAIN, &mut |id, _, _| errors.push(id));
        assert!(!success);
        (elements, errors)
    }

    fn only_directive<'a>(elements: &'a [MarkupElement<'a>]) -> &'a Directive<'a> {
        assert_eq!(elements.len(), 1);
        elements[0].as_directive().expect("expected a directive")
    }

    #[test]
    fn top_level_source_concatenation_roundtrips() {
        let source = "text \\b{bold \\i{x}} more\n\\: comment\n\\x(a, b = 2){y}";
        let elements = parse_ok(source);
        let rebuilt: String = elements.iter().map(MarkupElement::source).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn text_only() {
        let elements = parse_ok("hello");
        assert_eq!(elements.len(), 1);
        let p = elements[0].as_primary().unwrap();
        assert_eq!(p.kind(), PrimaryKind::Text);
        assert_eq!(p.source(), "hello");
    }

    #[test]
    fn directive_name_and_content() {
        let elements = parse_ok("\\b{bold}");
        let d = only_directive(&elements);
        assert_eq!(d.name(), "b");
        assert!(d.arguments().is_none());
        assert_eq!(d.content_elements().len(), 1);
        assert_eq!(d.source(), "\\b{bold}");
    }

    #[test]
    fn directive_with_members() {
        let elements = parse_ok("\\x(a, b = 2, ...)");
        let d = only_directive(&elements);
        let members = d.argument_members();
        assert_eq!(members.len(), 3);

        assert_eq!(members[0].kind(), crate::ast::MemberKind::Positional);
        let a = members[0].value().unwrap().as_primary().unwrap();
        assert_eq!(a.kind(), PrimaryKind::UnquotedString);
        assert_eq!(a.source(), "a");

        assert_eq!(members[1].kind(), crate::ast::MemberKind::Named);
        assert_eq!(members[1].name_text(), Some("b"));
        let b = members[1].value().unwrap().as_primary().unwrap();
        assert_eq!(b.int_value().unwrap().value, 2);

        assert_eq!(members[2].kind(), crate::ast::MemberKind::Ellipsis);
        assert!(d.has_ellipsis());
    }

    #[test]
    fn nested_directive_as_member_value() {
        let elements = parse_ok("\\x(a = \\y{z})");
        let d = only_directive(&elements);
        let inner = d.argument_members()[0]
            .value()
            .unwrap()
            .as_directive()
            .unwrap();
        assert_eq!(inner.name(), "y");
    }

    #[test]
    fn value_literals() {
        let elements = parse_ok("\\x(unit, null, true, false, infinity, -infinity, 0x2a, 1.5)");
        let d = only_directive(&elements);
        let kinds: Vec<PrimaryKind> = d
            .argument_members()
            .iter()
            .map(|m| m.value().unwrap().as_primary().unwrap().kind())
            .collect();
        assert_eq!(
            kinds,
            [
                PrimaryKind::Unit,
                PrimaryKind::Null,
                PrimaryKind::Bool,
                PrimaryKind::Bool,
                PrimaryKind::Infinity,
                PrimaryKind::Infinity,
                PrimaryKind::Int,
                PrimaryKind::DecimalFloat,
            ]
        );
    }

    #[test]
    fn comment_suffix_handling() {
        let elements = parse_ok("\\: note\nrest");
        let comment = elements[0].as_primary().unwrap();
        assert_eq!(comment.kind(), PrimaryKind::Comment);
        assert_eq!(comment.comment_suffix(), "\n");
        assert_eq!(comment.comment_text(), " note");
    }

    #[test]
    fn eof_comment_has_empty_suffix() {
        let elements = parse_ok("\\: note");
        let comment = elements[0].as_primary().unwrap();
        assert_eq!(comment.comment_suffix_length(), 0);
        assert_eq!(comment.comment_suffix(), "");
        assert_eq!(comment.comment_text(), " note");
    }

    #[test]
    fn unclosed_block_reports_and_recovers() {
        let (elements, errors) = parse_err("\\x{oops");
        assert!(errors.contains(&ids::PARSE_BLOCK_UNCLOSED));
        let d = only_directive(&elements);
        assert_eq!(d.content_elements().len(), 1);
    }

    #[test]
    fn parse_int_fast_path() {
        assert_eq!(
            parse_int("42"),
            ParsedInt {
                value: 42,
                in_range: true
            }
        );
        assert_eq!(parse_int("-0x2a").value, -42);
        assert_eq!(parse_int("0b101").value, 5);
        assert_eq!(parse_int("0o17").value, 15);
    }

    #[test]
    fn parse_int_range_limits() {
        let max = parse_int("170141183460469231731687303715884105727");
        assert!(max.in_range);
        assert_eq!(max.value, i128::MAX);

        let min = parse_int("-170141183460469231731687303715884105728");
        assert!(min.in_range);
        assert_eq!(min.value, i128::MIN);

        let over = parse_int("170141183460469231731687303715884105728");
        assert!(!over.in_range);
        assert_eq!(over.value, 0);
    }

    #[test]
    fn parse_float_statuses() {
        assert_eq!(parse_float("1.5").status, FloatStatus::Ok);
        let over = parse_float("1e999");
        assert_eq!(over.status, FloatStatus::Overflow);
        assert!(over.value.is_infinite() && over.value > 0.0);

        let under = parse_float("1e-999");
        assert_eq!(under.status, FloatStatus::Underflow);
        assert_eq!(under.value, 0.0);

        assert_eq!(parse_float("0.0").status, FloatStatus::Ok);
    }

    #[test]
    fn quoted_string_members() {
        let elements = parse_ok("\\x(\"hi \\b{there}\")");
        let d = only_directive(&elements);
        let s = d.argument_members()[0].value().unwrap().as_primary().unwrap();
        assert_eq!(s.kind(), PrimaryKind::QuotedString);
        assert_eq!(s.elements().len(), 2);
    }

    #[test]
    fn block_as_member_value() {
        let elements = parse_ok("\\x(body = {lazy \\y})");
        let d = only_directive(&elements);
        let block = d.argument_members()[0].value().unwrap().as_primary().unwrap();
        assert_eq!(block.kind(), PrimaryKind::Block);
        assert_eq!(block.elements().len(), 2);
    }

    #[test]
    fn unclosed_group_reports() {
        let (_, errors) = parse_err("\\x(a");
        assert!(errors.contains(&ids::PARSE_GROUP_UNCLOSED));
    }
}
