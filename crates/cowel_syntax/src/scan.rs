//! Low-level text scanning shared by the lexer, the parser, and content
//! policies.
//!
//! Every `match_*` function inspects the *start* of its input and returns
//! the length of the match in bytes, or a structured result carrying that
//! length. None of them allocate.

/// Returns `true` if `b` can start an identifier.
pub fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

/// Returns `true` if `b` can continue an identifier.
///
/// Directive names permit interior dashes, e.g. `wg21-head`.
pub fn is_identifier_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Matches an identifier at the start of `str`, returning its length.
pub fn match_identifier(str: &str) -> usize {
    let bytes = str.as_bytes();
    if bytes.is_empty() || !is_identifier_start(bytes[0]) {
        return 0;
    }
    let mut length = 1;
    while length < bytes.len() && is_identifier_continue(bytes[length]) {
        length += 1;
    }
    length
}

/// Returns `true` if the whole of `str` is a valid directive name.
pub fn is_directive_name(str: &str) -> bool {
    !str.is_empty() && match_identifier(str) == str.len()
}

/// Returns `true` if `b` may follow a backslash to form an escape.
///
/// The escape set is exactly the ASCII punctuation characters; letters
/// start directive names, and everything else is reserved.
pub fn is_escapable(b: u8) -> bool {
    b.is_ascii_punctuation()
}

/// The result of matching an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeMatch {
    /// Total length including the backslash. Length 1 means the backslash
    /// sits at the end of the input.
    pub length: usize,
    /// The escaped character is outside the permitted escape set.
    pub is_reserved: bool,
}

/// Matches a `\x` escape at the start of `str`, which must begin with a
/// backslash. The escaped character is taken as a whole code point so
/// that multi-byte characters are never sliced.
pub fn match_escape(str: &str) -> EscapeMatch {
    debug_assert!(str.starts_with('\\'));
    let Some(c) = str[1..].chars().next() else {
        return EscapeMatch {
            length: 1,
            is_reserved: false,
        };
    };
    let is_reserved = !(c.is_ascii() && is_escapable(c as u8));
    EscapeMatch {
        length: 1 + c.len_utf8(),
        is_reserved,
    }
}

/// Matches a `\:` line comment, returning its length *excluding* the line
/// terminator. Returns 0 if `str` does not start one.
pub fn match_line_comment(str: &str) -> usize {
    if !str.starts_with("\\:") {
        return 0;
    }
    match str.find('\n') {
        Some(lf) if str.as_bytes()[lf - 1] == b'\r' => lf - 1,
        Some(lf) => lf,
        None => str.len(),
    }
}

/// The result of matching a block comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCommentMatch {
    /// Total length including the `\*` prefix and, if terminated, the
    /// `*\` suffix.
    pub length: usize,
    pub is_terminated: bool,
}

/// Matches a `\*…*\` block comment. Returns `None` if `str` does not
/// start one. Block comments do not nest.
pub fn match_block_comment(str: &str) -> Option<BlockCommentMatch> {
    if !str.starts_with("\\*") {
        return None;
    }
    match str[2..].find("*\\") {
        Some(end) => Some(BlockCommentMatch {
            length: 2 + end + 2,
            is_terminated: true,
        }),
        None => Some(BlockCommentMatch {
            length: str.len(),
            is_terminated: false,
        }),
    }
}

/// Matches the `...` ellipsis member, returning 3 or 0.
pub fn match_ellipsis(str: &str) -> usize {
    if str.starts_with("...") {
        3
    } else {
        0
    }
}

/// Returns `true` for the whitespace characters recognized in groups.
pub fn is_cowel_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0B)
}

/// Matches a run of whitespace, returning its length.
pub fn match_whitespace(str: &str) -> usize {
    str.bytes().take_while(|&b| is_cowel_whitespace(b)).count()
}

/// Matches a "reserved number": the greedy superset of every numeric
/// literal, in the manner of a preprocessing number. An optional sign is
/// followed by a digit or `.`, then alphanumerics, dots, and signed
/// exponent markers.
pub fn match_reserved_number(str: &str) -> usize {
    let bytes = str.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'-' | b'+')));
    match bytes.get(sign) {
        Some(b'.') => {}
        Some(b) if b.is_ascii_digit() => {}
        _ => return 0,
    }
    let mut length = sign + 1;
    while length < bytes.len() {
        let rest = &bytes[length..];
        if rest.starts_with(b"e+")
            || rest.starts_with(b"e-")
            || rest.starts_with(b"E+")
            || rest.starts_with(b"E-")
        {
            length += 2;
        } else if rest[0].is_ascii_alphanumeric() || rest[0] == b'.' {
            length += 1;
        } else {
            break;
        }
    }
    length
}

/// The shape of a validated numeric literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
    Float,
}

/// Validates that the whole of `str` is a well-formed numeric literal and
/// classifies it. This is the restrictive second stage after
/// [`match_reserved_number`].
pub fn classify_number(str: &str) -> Option<NumberKind> {
    let unsigned = str.strip_prefix(['-', '+']).unwrap_or(str);
    if unsigned.is_empty() {
        return None;
    }
    if let Some(digits) = unsigned.strip_prefix("0b") {
        return all_digits(digits, 2).then_some(NumberKind::Binary);
    }
    if let Some(digits) = unsigned.strip_prefix("0o") {
        return all_digits(digits, 8).then_some(NumberKind::Octal);
    }
    if let Some(digits) = unsigned.strip_prefix("0x") {
        return all_digits(digits, 16).then_some(NumberKind::Hexadecimal);
    }
    classify_decimal(unsigned)
}

fn all_digits(str: &str, radix: u32) -> bool {
    !str.is_empty() && str.chars().all(|c| c.is_digit(radix))
}

fn classify_decimal(str: &str) -> Option<NumberKind> {
    let (mantissa, exponent) = match str.find(['e', 'E']) {
        Some(e) => (&str[..e], Some(&str[e + 1..])),
        None => (str, None),
    };
    if let Some(exp) = exponent {
        let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
        if !all_digits(exp, 10) {
            return None;
        }
    }
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(dot) => (&mantissa[..dot], Some(&mantissa[dot + 1..])),
        None => (mantissa, None),
    };
    let int_ok = int_part.is_empty() || all_digits(int_part, 10);
    let frac_ok = match frac_part {
        Some(frac) => frac.is_empty() || all_digits(frac, 10),
        None => true,
    };
    if !int_ok || !frac_ok {
        return None;
    }
    // At least one mantissa digit must be present.
    if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
        return None;
    }
    if frac_part.is_some() || exponent.is_some() {
        Some(NumberKind::Float)
    } else {
        Some(NumberKind::Decimal)
    }
}

/// A blank-line sequence found by [`find_blank_line_sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankLine {
    /// Index of the first whitespace byte of the sequence.
    pub begin: usize,
    /// Length of the sequence in bytes. The last byte is always `\n`.
    pub length: usize,
}

/// Finds the first blank-line sequence in `str`.
///
/// A blank-line sequence is a maximal run of whitespace containing at
/// least two line feeds; it ends at the last line feed of the run, so
/// trailing indentation stays with the following text. A lone `\n` is
/// not a blank-line sequence.
pub fn find_blank_line_sequence(str: &str) -> Option<BlankLine> {
    let bytes = str.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !is_cowel_whitespace(bytes[i]) {
            i += 1;
            continue;
        }
        let begin = i;
        let mut newlines = 0;
        let mut last_lf = begin;
        while i < bytes.len() && is_cowel_whitespace(bytes[i]) {
            if bytes[i] == b'\n' {
                newlines += 1;
                last_lf = i;
            }
            i += 1;
        }
        if newlines >= 2 {
            return Some(BlankLine {
                begin,
                length: last_lf - begin + 1,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_allow_dashes_and_underscores() {
        assert_eq!(match_identifier("wg21-head rest"), 9);
        assert_eq!(match_identifier("_x1"), 3);
        assert_eq!(match_identifier("1abc"), 0);
        assert_eq!(match_identifier("-abc"), 0);
        assert!(is_directive_name("cowel_macro"));
        assert!(!is_directive_name(""));
        assert!(!is_directive_name("a b"));
    }

    #[test]
    fn escape_matches_punctuation() {
        assert_eq!(
            match_escape("\\{"),
            EscapeMatch {
                length: 2,
                is_reserved: false
            }
        );
        assert_eq!(
            match_escape("\\1"),
            EscapeMatch {
                length: 2,
                is_reserved: true
            }
        );
        assert_eq!(match_escape("\\").length, 1);
    }

    #[test]
    fn escape_takes_whole_code_points() {
        let m = match_escape("\\ß");
        assert_eq!(m.length, 3);
        assert!(m.is_reserved);
    }

    #[test]
    fn line_comment_excludes_terminator() {
        assert_eq!(match_line_comment("\\: hi\nrest"), 5);
        assert_eq!(match_line_comment("\\: hi\r\nrest"), 5);
        assert_eq!(match_line_comment("\\: eof"), 6);
        assert_eq!(match_line_comment("no"), 0);
    }

    #[test]
    fn block_comment_termination() {
        assert_eq!(
            match_block_comment("\\*x*\\rest"),
            Some(BlockCommentMatch {
                length: 5,
                is_terminated: true
            })
        );
        assert_eq!(
            match_block_comment("\\*x"),
            Some(BlockCommentMatch {
                length: 3,
                is_terminated: false
            })
        );
        assert_eq!(match_block_comment("\\:"), None);
    }

    #[test]
    fn reserved_number_is_greedy() {
        assert_eq!(match_reserved_number("123abc,"), 6);
        assert_eq!(match_reserved_number("1e+5)"), 4);
        assert_eq!(match_reserved_number("-0x1f,"), 5);
        assert_eq!(match_reserved_number(".5"), 2);
        assert_eq!(match_reserved_number("abc"), 0);
    }

    #[test]
    fn classify_number_bases() {
        assert_eq!(classify_number("0b101"), Some(NumberKind::Binary));
        assert_eq!(classify_number("0o777"), Some(NumberKind::Octal));
        assert_eq!(classify_number("-0x1F"), Some(NumberKind::Hexadecimal));
        assert_eq!(classify_number("42"), Some(NumberKind::Decimal));
        assert_eq!(classify_number("1.5e-3"), Some(NumberKind::Float));
        assert_eq!(classify_number(".5"), Some(NumberKind::Float));
        assert_eq!(classify_number("0b"), None);
        assert_eq!(classify_number("1.2.3"), None);
        assert_eq!(classify_number("123abc"), None);
    }

    #[test]
    fn blank_line_requires_two_newlines() {
        assert_eq!(find_blank_line_sequence("a\nb"), None);
        assert_eq!(
            find_blank_line_sequence("a\n\nb"),
            Some(BlankLine { begin: 1, length: 2 })
        );
    }

    #[test]
    fn blank_line_ends_at_last_newline() {
        // Trailing indentation belongs to the following text.
        let blank = find_blank_line_sequence("first\n\t\t\n\n second").unwrap();
        assert_eq!(blank.begin, 5);
        assert_eq!(&"first\n\t\t\n\n second"[blank.begin..blank.begin + blank.length], "\n\t\t\n\n");
    }
}
