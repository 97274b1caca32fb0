//! The diagnostic channel: severities, diagnostics, and the logger trait.
//!
//! Diagnostics carry a hierarchical dotted identifier (see [`ids`]), a
//! severity, a source location, and a message. Emitting is filtered by the
//! logger's minimum severity; the engine never formats diagnostics itself,
//! it only hands structured values to the [`Logger`].
//!
//! ## Identifier scheme
//!
//! | Shape | Example | Meaning |
//! |-------|---------|---------|
//! | `area.detail` | `parse.block.unclosed` | Engine-level diagnostics |
//! | `directive:detail` | `macro:put.invalid` | Directive-specific diagnostics |
//!
//! The identifier strings are stable and part of the external interface;
//! embedders match on them in tests.

use crate::span::FileSpan;

/// The severity of a diagnostic, ordered from least to most severe.
///
/// [`Severity::None`] is greater than all emittable levels; using it as a
/// minimum level silences all diagnostics, even errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Very fine-grained progress messages.
    Trace,
    /// Debugging messages.
    Debug,
    /// Informational messages.
    Info,
    /// Minor problems, only interesting in verbose runs.
    SoftWarning,
    /// Major problems with the document.
    Warning,
    /// Problems that prevent proper content generation.
    Error,
    /// Problems that abort the current generation.
    Fatal,
    /// Greater than all other levels; never emitted.
    None,
}

impl Severity {
    /// Returns `true` if a diagnostic of this severity may be emitted.
    pub fn is_emittable(self) -> bool {
        self != Severity::None
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Trace
    }
}

/// A structured diagnostic produced during lexing, parsing, or generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity. `severity.is_emittable()` holds.
    pub severity: Severity,
    /// Dot-separated identifier from the [`ids`] catalog.
    pub id: &'static str,
    /// The span of code responsible for this diagnostic.
    pub location: FileSpan,
    /// Human-readable message.
    pub message: String,
}

/// Receives diagnostics whose severity passes the minimum level.
///
/// The caller performs the severity check before invoking [`Logger::log`],
/// so implementations only need to record or render.
pub trait Logger {
    /// The minimum severity this logger wants to receive.
    fn min_severity(&self) -> Severity;

    fn log(&mut self, diagnostic: Diagnostic);
}

/// A logger that collects diagnostics into memory, for tests and embedders
/// that want to inspect them after a run.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    min_severity: Severity,
    pub diagnostics: Vec<Diagnostic>,
}

impl MemoryLogger {
    pub fn new(min_severity: Severity) -> Self {
        Self {
            min_severity,
            diagnostics: Vec::new(),
        }
    }

    /// Returns `true` if any collected diagnostic carries the given id.
    pub fn was_logged(&self, id: &str) -> bool {
        self.diagnostics.iter().any(|d| d.id == id)
    }
}

impl Logger for MemoryLogger {
    fn min_severity(&self) -> Severity {
        self.min_severity
    }

    fn log(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// The catalog of diagnostic identifiers.
///
/// These exact strings are emitted so that external tooling can match on
/// them; do not edit existing entries.
pub mod ids {
    /// Lexing failed; the source contains malformed constructs.
    pub const PARSE: &str = "parse";
    /// A directive block was not terminated via closing brace.
    pub const PARSE_BLOCK_UNCLOSED: &str = "parse.block.unclosed";
    /// A quoted string was not terminated.
    pub const PARSE_STRING_UNCLOSED: &str = "parse.string.unclosed";
    /// A group was not terminated via closing parenthesis.
    pub const PARSE_GROUP_UNCLOSED: &str = "parse.group.unclosed";
    /// An unexpected token was encountered inside a group.
    pub const PARSE_GROUP_UNEXPECTED: &str = "parse.group.unexpected";

    /// Directive lookup failed.
    pub const DIRECTIVE_LOOKUP_UNRESOLVED: &str = "directive-lookup.unresolved";
    /// Directive invocations nested beyond the supported depth.
    pub const DIRECTIVE_RECURSION_LIMIT: &str = "directive.recursion-limit";
    /// A (non-fatal) error placeholder could not be produced.
    pub const ERROR_ERROR: &str = "error.error";
    /// An argument failed its declared type.
    pub const TYPE_MISMATCH: &str = "type.mismatch";
    /// A duplicate `id` attribute would have been generated.
    pub const DUPLICATE_ID: &str = "id.duplicate";

    /// A reference to a section that does not exist.
    pub const SECTION_REF_NOT_FOUND: &str = "section-ref.not-found";
    /// Section references form a cycle.
    pub const SECTION_REF_CIRCULAR: &str = "section-ref.circular";

    /// Conversion of the highlight theme from JSON failed.
    pub const THEME_CONVERSION: &str = "theme.conversion";
    /// The requested highlight language is not supported.
    pub const HIGHLIGHT_LANGUAGE: &str = "highlight.language";
    /// The code could not be highlighted because it is malformed.
    pub const HIGHLIGHT_MALFORMED: &str = "highlight.malformed";
    /// Something else went wrong during highlighting.
    pub const HIGHLIGHT_ERROR: &str = "highlight.error";

    /// Unable to perform arithmetic due to a parse error.
    pub const ARITHMETIC_PARSE: &str = "arithmetic.parse";
    /// Division by zero in arithmetic.
    pub const ARITHMETIC_DIV_BY_ZERO: &str = "arithmetic.div-by-zero";

    /// In `\cowel_macro`, a macro was defined more than once.
    pub const MACRO_REDEFINITION: &str = "macro:redefinition";
    /// In `\cowel_macro`, no name was provided.
    pub const MACRO_NAME_MISSING: &str = "macro:name.missing";
    /// In `\cowel_macro`, the name is not a valid directive name.
    pub const MACRO_NAME_INVALID: &str = "macro:name.invalid";
    /// In `\cowel_put`, the content is invalid.
    pub const MACRO_PUT_INVALID: &str = "macro:put.invalid";
    /// In `\cowel_put`, the positional index is out of range.
    pub const MACRO_PUT_OUT_OF_RANGE: &str = "macro:put.out-of-range";
    /// `\cowel_put` was used outside of any macro expansion.
    pub const MACRO_PUT_OUTSIDE_ARGS: &str = "macro:put.args.outside-args";

    /// In `\cowel_alias`, an alias name is missing or empty.
    pub const ALIAS_NAME_MISSING: &str = "alias:name.missing";
    /// In `\cowel_alias`, a name is not a valid directive name.
    pub const ALIAS_NAME_INVALID: &str = "alias:name.invalid";
    /// In `\cowel_alias`, the name is already taken.
    pub const ALIAS_DUPLICATE: &str = "alias:duplicate";

    /// In `\cowel_invoke`, the target name is not a valid identifier.
    pub const INVOKE_NAME_INVALID: &str = "invoke:name.invalid";
    /// In `\cowel_invoke`, no directive with the target name exists.
    pub const INVOKE_LOOKUP_FAILED: &str = "invoke:lookup.failed";

    /// In `\cowel_here`, no section name was provided.
    pub const HERE_NO_SECTION: &str = "here:no-section";
    /// In `\cowel_there`, no section name was provided.
    pub const THERE_NO_SECTION: &str = "there:no-section";

    /// In `\ref`, no `to` argument was provided.
    pub const REF_TO_MISSING: &str = "ref:to.missing";

    /// In `\cowel_var_let`, no variable name was provided.
    pub const VAR_NAME_MISSING: &str = "var:name.missing";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_matches_escalation() {
        assert!(Severity::Trace < Severity::Debug);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
        assert!(Severity::Fatal < Severity::None);
    }

    #[test]
    fn none_is_not_emittable() {
        assert!(!Severity::None.is_emittable());
        assert!(Severity::Error.is_emittable());
    }

    #[test]
    fn memory_logger_collects() {
        let mut logger = MemoryLogger::new(Severity::Warning);
        logger.log(Diagnostic {
            severity: Severity::Error,
            id: ids::TYPE_MISMATCH,
            location: FileSpan::default(),
            message: "expected str".into(),
        });
        assert!(logger.was_logged("type.mismatch"));
        assert!(!logger.was_logged("parse"));
    }
}
