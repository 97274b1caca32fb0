//! Syntax-highlight capture and programmatic invocation.

use cowel_engine::highlight::{HighlightError, HighlightKind, HighlightSpan, SyntaxHighlighter};
use cowel_engine::{
    generate_html, GenerateOptions, GenerationMode, MemoryLogger, ProcessingStatus, Severity,
};

/// Highlights every occurrence of `let` as a keyword.
struct LetHighlighter;

impl SyntaxHighlighter for LetHighlighter {
    fn languages(&self) -> &[&str] {
        &["toy"]
    }

    fn highlight(
        &self,
        out: &mut Vec<HighlightSpan>,
        code: &str,
        language: &str,
    ) -> Result<(), HighlightError> {
        if language != "toy" {
            return Err(HighlightError::UnsupportedLanguage);
        }
        let mut search_from = 0;
        while let Some(found) = code[search_from..].find("let") {
            out.push(HighlightSpan {
                begin: search_from + found,
                length: 3,
                kind: HighlightKind::Keyword,
            });
            search_from += found + 3;
        }
        Ok(())
    }
}

fn minimal_with_highlighter(source: &str) -> (ProcessingStatus, String, MemoryLogger) {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let highlighter = LetHighlighter;
    let mut options = GenerateOptions::new(source);
    options.mode = GenerationMode::Minimal;
    options.logger = Some(&mut logger);
    options.highlighter = Some(&highlighter);
    let result = generate_html(options);
    (result.status, result.output, logger)
}

#[test]
fn highlighted_runs_are_wrapped_in_h_elements() {
    let (status, output, _) = minimal_with_highlighter("\\cowel_code(toy){let x = 1}");
    assert_eq!(status, ProcessingStatus::Ok);
    assert_eq!(
        output,
        "<code><h- data-h=\"kw\">let</h-> x = 1</code>"
    );
}

#[test]
fn code_content_is_escaped() {
    let (status, output, _) = minimal_with_highlighter("\\cowel_code(toy){a < b}");
    assert_eq!(status, ProcessingStatus::Ok);
    assert_eq!(output, "<code>a &lt; b</code>");
}

#[test]
fn unsupported_language_warns_but_emits_code() {
    let (status, output, logger) = minimal_with_highlighter("\\cowel_code(nope){x}");
    assert_eq!(status, ProcessingStatus::Ok);
    assert_eq!(output, "<code>x</code>");
    assert!(logger.was_logged("highlight.language"));
}

#[test]
fn code_without_language_is_not_highlighted() {
    let (status, output, logger) = minimal_with_highlighter("\\cowel_code{let x}");
    assert_eq!(status, ProcessingStatus::Ok);
    assert_eq!(output, "<code>let x</code>");
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn invoke_calls_the_named_directive() {
    let source = "\\cowel_macro(m){ok}\\cowel_invoke(m)";
    let (status, output, _) = minimal_with_highlighter(source);
    assert_eq!(status, ProcessingStatus::Ok);
    assert_eq!(output, "ok");
}

#[test]
fn invoke_with_invalid_name_is_reported() {
    let (status, _, logger) = minimal_with_highlighter("\\cowel_invoke(\"not a name\")");
    assert_eq!(status, ProcessingStatus::Error);
    assert!(logger.was_logged("invoke:name.invalid"));
}

#[test]
fn invoke_with_unknown_name_is_reported() {
    let (status, _, logger) = minimal_with_highlighter("\\cowel_invoke(nosuch)");
    assert_eq!(status, ProcessingStatus::Error);
    assert!(logger.was_logged("invoke:lookup.failed"));
}

#[test]
fn invoke_forwards_content() {
    let source = "\\cowel_macro(shout){\\cowel_put!}\\cowel_invoke(shout){hey}";
    let (status, output, _) = minimal_with_highlighter(source);
    assert_eq!(status, ProcessingStatus::Ok);
    assert_eq!(output, "hey!");
}
