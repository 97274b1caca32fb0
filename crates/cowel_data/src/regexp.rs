//! ECMAScript-flavor regular expressions over a shared compiled program.
//!
//! A [`RegExp`] owns its compiled program behind a reference count, so
//! cloning a handle is cheap. Patterns are written in ECMAScript syntax;
//! before compilation they are normalized for the backing engine:
//!
//! - `\uHHHH` is rewritten to the equivalent `\x{HHHH}` code-point escape
//!   *without* decoding, so regex-special characters never gain special
//!   meaning through the rewrite.
//! - A `\u` that is not followed by four hex digits (or a braced escape)
//!   is an identity escape and becomes a literal `u`.
//!
//! Flags follow the ECMAScript letters `d g i m s u v y`; duplicates and
//! unknown letters are rejected with a [`RegExpFlagsError`] identifying
//! the offending letter by index and length.

use std::rc::Rc;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// The ECMAScript flag string, in canonical order.
pub const FLAGS_STRING: &str = "dgimsuvy";

/// A set of ECMAScript regular-expression flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegExpFlags(u8);

impl RegExpFlags {
    /// `d` — report match indices.
    pub const INDICES: RegExpFlags = RegExpFlags(1 << 0);
    /// `g` — global matching.
    pub const GLOBAL: RegExpFlags = RegExpFlags(1 << 1);
    /// `i` — case-insensitive matching.
    pub const IGNORE_CASE: RegExpFlags = RegExpFlags(1 << 2);
    /// `m` — `^`/`$` match at line breaks.
    pub const MULTILINE: RegExpFlags = RegExpFlags(1 << 3);
    /// `s` — `.` matches line terminators.
    pub const DOT_ALL: RegExpFlags = RegExpFlags(1 << 4);
    /// `u` — Unicode mode.
    pub const UNICODE: RegExpFlags = RegExpFlags(1 << 5);
    /// `v` — Unicode sets mode.
    pub const UNICODE_SETS: RegExpFlags = RegExpFlags(1 << 6);
    /// `y` — sticky matching.
    pub const STICKY: RegExpFlags = RegExpFlags(1 << 7);

    pub fn contains(self, other: RegExpFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parses a flag string, rejecting unknown and duplicate letters.
    pub fn parse(flags: &str) -> Result<RegExpFlags, RegExpFlagsError> {
        let mut result = RegExpFlags::default();
        let mut index = 0;
        for c in flags.chars() {
            let Some(flag_index) = FLAGS_STRING.find(c) else {
                return Err(RegExpFlagsError {
                    kind: RegExpFlagsErrorKind::Invalid,
                    index,
                    length: c.len_utf8(),
                });
            };
            let flag = RegExpFlags(1 << flag_index);
            if result.contains(flag) {
                return Err(RegExpFlagsError {
                    kind: RegExpFlagsErrorKind::Duplicate,
                    index,
                    length: c.len_utf8(),
                });
            }
            result.0 |= flag.0;
            index += c.len_utf8();
        }
        Ok(result)
    }

    /// Renders the flags as letters in canonical order.
    pub fn to_flag_string(self) -> String {
        FLAGS_STRING
            .chars()
            .enumerate()
            .filter(|(i, _)| self.0 >> i & 1 != 0)
            .map(|(_, c)| c)
            .collect()
    }
}

impl std::ops::BitOr for RegExpFlags {
    type Output = RegExpFlags;

    fn bitor(self, other: RegExpFlags) -> RegExpFlags {
        RegExpFlags(self.0 | other.0)
    }
}

/// Why a flag string failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegExpFlagsErrorKind {
    /// A letter outside `dgimsuvy`.
    Invalid,
    /// A letter given more than once.
    Duplicate,
}

/// A malformed flag string, locating the offending letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind:?} regular expression flag at index {index}")]
pub struct RegExpFlagsError {
    pub kind: RegExpFlagsErrorKind,
    /// Byte index of the offending letter.
    pub index: usize,
    /// Byte length of the offending letter.
    pub length: usize,
}

/// Errors from constructing a [`RegExp`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegExpError {
    #[error("the pattern is not a valid regular expression")]
    BadPattern,
}

/// The outcome of executing a regular expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegExpStatus {
    /// Execution completed; no match was found.
    Unmatched,
    /// Execution completed; a match was found.
    Matched,
    /// Something went wrong while executing.
    ExecutionError,
}

/// A match region in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegExpMatch {
    pub index: usize,
    pub length: usize,
}

/// The result of [`RegExp::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegExpSearch {
    pub status: RegExpStatus,
    pub found: RegExpMatch,
}

/// A compiled ECMAScript-flavored regular expression.
///
/// Cloning shares the underlying compiled programs.
#[derive(Debug, Clone)]
pub struct RegExp {
    /// Matches anywhere in the haystack.
    search_program: Rc<Regex>,
    /// The same pattern anchored to the whole haystack.
    full_program: Rc<Regex>,
    flags: RegExpFlags,
}

impl RegExp {
    /// Compiles `pattern` under the given flags.
    pub fn new(pattern: &str, flags: RegExpFlags) -> Result<RegExp, RegExpError> {
        let normalized = normalize_unicode_escapes(pattern);

        let build = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(flags.contains(RegExpFlags::IGNORE_CASE))
                .multi_line(flags.contains(RegExpFlags::MULTILINE))
                .dot_matches_new_line(flags.contains(RegExpFlags::DOT_ALL))
                .build()
                .map_err(|_| RegExpError::BadPattern)
        };

        let search_program = build(&normalized)?;
        let full_program = build(&format!(r"\A(?:{normalized})\z"))?;
        Ok(RegExp {
            search_program: Rc::new(search_program),
            full_program: Rc::new(full_program),
            flags,
        })
    }

    /// Compiles `pattern` with flags given as an ECMAScript flag string.
    pub fn with_flag_string(pattern: &str, flags: &str) -> Result<RegExp, RegExpError> {
        let flags = RegExpFlags::parse(flags).map_err(|_| RegExpError::BadPattern)?;
        RegExp::new(pattern, flags)
    }

    pub fn flags(&self) -> RegExpFlags {
        self.flags
    }

    pub fn is_global(&self) -> bool {
        self.flags.contains(RegExpFlags::GLOBAL)
    }

    pub fn is_sticky(&self) -> bool {
        self.flags.contains(RegExpFlags::STICKY)
    }

    /// Whether `haystack` matches this expression in its entirety.
    pub fn matches(&self, haystack: &str) -> RegExpStatus {
        if self.full_program.is_match(haystack) {
            RegExpStatus::Matched
        } else {
            RegExpStatus::Unmatched
        }
    }

    /// Finds the first occurrence of this expression in `haystack`.
    /// Offsets are byte offsets into the UTF-8 haystack.
    pub fn search(&self, haystack: &str) -> RegExpSearch {
        match self.search_program.find(haystack) {
            Some(found) => RegExpSearch {
                status: RegExpStatus::Matched,
                found: RegExpMatch {
                    index: found.start(),
                    length: found.end() - found.start(),
                },
            },
            None => RegExpSearch {
                status: RegExpStatus::Unmatched,
                found: RegExpMatch::default(),
            },
        }
    }

    /// Replaces occurrences of this expression in `haystack` with
    /// `replacement`, appending the result to `out`.
    ///
    /// With the `g` flag every occurrence is replaced; without it only
    /// the first. Returns `Matched` if at least one replacement happened.
    pub fn replace_all(
        &self,
        out: &mut String,
        haystack: &str,
        replacement: &str,
    ) -> RegExpStatus {
        let status = if self.search_program.is_match(haystack) {
            RegExpStatus::Matched
        } else {
            RegExpStatus::Unmatched
        };
        let replaced = if self.is_global() {
            self.search_program.replace_all(haystack, replacement)
        } else {
            self.search_program.replace(haystack, replacement)
        };
        out.push_str(&replaced);
        status
    }
}

/// Rewrites ECMAScript `\uHHHH` and `\u{…}` escapes to the backing
/// engine's `\x{…}` form without decoding them, and turns a bare `\u`
/// into the identity escape `u`. All other escapes pass through.
fn normalize_unicode_escapes(pattern: &str) -> String {
    let bytes = pattern.as_bytes();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 >= bytes.len() {
            let Some(c) = pattern[i..].chars().next() else {
                break;
            };
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        if bytes[i + 1] != b'u' {
            // Copy the escape verbatim, keeping the escaped character
            // whole.
            let Some(c) = pattern[i + 1..].chars().next() else {
                out.push('\\');
                break;
            };
            out.push('\\');
            out.push(c);
            i += 1 + c.len_utf8();
            continue;
        }
        // `\u{…}` passes through with `x` substituted for `u`.
        if bytes.get(i + 2) == Some(&b'{') {
            out.push_str("\\x");
            i += 2;
            continue;
        }
        // `\uHHHH` becomes `\x{HHHH}`.
        let hex = &bytes[i + 2..];
        if hex.len() >= 4 && hex[..4].iter().all(u8::is_ascii_hexdigit) {
            out.push_str("\\x{");
            out.push_str(&pattern[i + 2..i + 6]);
            out.push('}');
            i += 6;
            continue;
        }
        // Identity escape: `\u` matches `u`.
        out.push('u');
        i += 2;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regexp(pattern: &str) -> RegExp {
        RegExp::new(pattern, RegExpFlags::default()).unwrap()
    }

    #[test]
    fn flags_parse_and_render() {
        let flags = RegExpFlags::parse("gi").unwrap();
        assert!(flags.contains(RegExpFlags::GLOBAL));
        assert!(flags.contains(RegExpFlags::IGNORE_CASE));
        assert!(!flags.contains(RegExpFlags::MULTILINE));
        assert_eq!(flags.to_flag_string(), "gi");
    }

    #[test]
    fn duplicate_flag_is_located() {
        let error = RegExpFlags::parse("gg").unwrap_err();
        assert_eq!(error.kind, RegExpFlagsErrorKind::Duplicate);
        assert_eq!(error.index, 1);
        assert_eq!(error.length, 1);
    }

    #[test]
    fn unknown_flag_is_located() {
        let error = RegExpFlags::parse("gz").unwrap_err();
        assert_eq!(error.kind, RegExpFlagsErrorKind::Invalid);
        assert_eq!(error.index, 1);
    }

    #[test]
    fn literal_pattern_matches_whole_string() {
        let re = regexp("awoo");
        assert_eq!(re.matches("awoo"), RegExpStatus::Matched);
        assert_eq!(re.matches("awooo"), RegExpStatus::Unmatched);
        assert_eq!(re.matches("xawoo"), RegExpStatus::Unmatched);
    }

    #[test]
    fn unicode_property_classes() {
        let re = regexp(r"\p{Ll}+");
        assert_eq!(re.matches("abc"), RegExpStatus::Matched);
        assert_eq!(re.matches("αβγ"), RegExpStatus::Matched);
        assert_eq!(re.matches("ABC"), RegExpStatus::Unmatched);
    }

    #[test]
    fn unicode_escape_is_rewritten_not_decoded() {
        let re = regexp(r"\u0030");
        assert_eq!(re.matches("0"), RegExpStatus::Matched);

        // A rewritten escape for `(` must not open a regex group.
        let re = regexp(r"\u0028");
        assert_eq!(re.matches("("), RegExpStatus::Matched);
    }

    #[test]
    fn bare_unicode_escape_is_identity() {
        let re = regexp(r"\u");
        assert_eq!(re.matches("u"), RegExpStatus::Matched);
    }

    #[test]
    fn escaped_backslash_before_u_is_preserved() {
        // `\\u1234` is a literal backslash followed by `u1234`, not a
        // Unicode escape.
        let re = regexp(r"\\u1234");
        assert_eq!(re.matches(r"\u1234"), RegExpStatus::Matched);
        assert_eq!(re.matches("\u{1234}"), RegExpStatus::Unmatched);
    }

    #[test]
    fn search_reports_byte_offsets() {
        let re = regexp("w");
        let result = re.search("ßw");
        assert_eq!(result.status, RegExpStatus::Matched);
        assert_eq!(result.found, RegExpMatch { index: 2, length: 1 });

        let re = regexp("ß");
        let result = re.search("wß");
        assert_eq!(result.found, RegExpMatch { index: 1, length: 2 });
    }

    #[test]
    fn search_miss() {
        let result = regexp("z").search("abc");
        assert_eq!(result.status, RegExpStatus::Unmatched);
    }

    #[test]
    fn replace_all_honors_global_flag() {
        let global = RegExp::with_flag_string("a", "g").unwrap();
        let mut out = String::new();
        assert_eq!(global.replace_all(&mut out, "banana", "_"), RegExpStatus::Matched);
        assert_eq!(out, "b_n_n_");

        let first_only = regexp("a");
        let mut out = String::new();
        first_only.replace_all(&mut out, "banana", "_");
        assert_eq!(out, "b_nana");
    }

    #[test]
    fn bad_pattern_is_rejected() {
        assert_eq!(
            RegExp::new("(unclosed", RegExpFlags::default()).unwrap_err(),
            RegExpError::BadPattern
        );
    }

    #[test]
    fn clones_share_the_program() {
        let re = regexp("abc+");
        let clone = re.clone();
        assert!(Rc::ptr_eq(&re.search_program, &clone.search_program));
    }

    #[test]
    fn case_insensitive_flag() {
        let re = RegExp::with_flag_string("abc", "i").unwrap();
        assert_eq!(re.matches("AbC"), RegExpStatus::Matched);
    }
}
