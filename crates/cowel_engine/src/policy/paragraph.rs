//! Paragraph splitting.
//!
//! This policy wraps an HTML output and inserts `<p>…</p>` boundaries at
//! blank-line sequences in *text* writes. It is a state machine over
//! `{outside, inside} × directive depth` plus a small line state for
//! comment terminators; there is no buffering.
//!
//! Directives are treated as black boxes: writes from inside a directive
//! are forwarded without splitting, so `\i{...}` can never produce
//! interleaved `<i><p>` nonsense. A directive that wants the
//! surrounding splitting to apply to its contents opts in through
//! [`ContentPolicy::inherit_paragraph`].

use cowel_base::ProcessingStatus;
use cowel_syntax::ast::{Directive, Primary};
use cowel_syntax::scan;

use crate::context::Context;
use crate::policy::html::write_escaped_text;
use crate::policy::{ContentPolicy, OutputLanguage, TextSink};
use crate::stack::FrameIndex;

const OPENING_TAG: &str = "<p>";
const CLOSING_TAG: &str = "</p>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParagraphsState {
    Outside,
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// Somewhere in the middle of a line.
    Middle,
    /// Immediately after a comment that consumed its line terminator; a
    /// following leading line feed completes a blank line.
    AfterCommentTerminator,
}

/// The paragraph-splitting content policy.
pub struct ParagraphSplitPolicy<'s> {
    sink: &'s mut dyn TextSink,
    state: ParagraphsState,
    line_state: LineState,
    directive_depth: usize,
    /// One entry per directive currently being consumed; `true` once
    /// that directive has released its depth via `inherit_paragraph`.
    guards: Vec<bool>,
}

impl<'s> ParagraphSplitPolicy<'s> {
    pub fn new(sink: &'s mut dyn TextSink) -> Self {
        Self {
            sink,
            state: ParagraphsState::Outside,
            line_state: LineState::Middle,
            directive_depth: 0,
            guards: Vec::new(),
        }
    }

    fn write_html(&mut self, chars: &str) -> bool {
        self.sink.write(chars, OutputLanguage::Html)
    }

    fn write_text(&mut self, chars: &str) -> bool {
        write_escaped_text(self.sink, chars)
    }

    fn split_into_paragraphs(&mut self, text: &str) {
        let mut text = text;

        // A comment's terminator plus a leading line feed form a blank
        // line even though each text node alone contains only one.
        if self.line_state == LineState::AfterCommentTerminator && text.starts_with('\n') {
            self.leave_paragraph();
            text = &text[1..];
        }
        self.line_state = LineState::Middle;

        // A lone leading line feed belongs to the preceding element's
        // terminator; it is forwarded as-is and never splits.
        if text.starts_with('\n')
            && scan::find_blank_line_sequence(text).map_or(true, |b| b.begin != 0)
        {
            self.write_html("\n");
            text = &text[1..];
        }

        while !text.is_empty() {
            let Some(blank) = scan::find_blank_line_sequence(text) else {
                self.enter_paragraph();
                self.write_text(text);
                break;
            };
            if blank.begin != 0 {
                self.enter_paragraph();
                self.write_text(&text[..blank.begin]);
            }
            self.leave_paragraph();
            // The blank run itself produces no output.
            text = &text[blank.begin + blank.length..];
        }
    }
}

impl TextSink for ParagraphSplitPolicy<'_> {
    fn write(&mut self, chars: &str, language: OutputLanguage) -> bool {
        if self.directive_depth != 0 || language != OutputLanguage::Text {
            return match language {
                OutputLanguage::Text => self.write_text(chars),
                OutputLanguage::Html => self.write_html(chars),
                OutputLanguage::None => false,
            };
        }
        if !chars.is_empty() {
            self.split_into_paragraphs(chars);
        }
        true
    }
}

impl<'a> ContentPolicy<'a> for ParagraphSplitPolicy<'_> {
    fn consume_text(
        &mut self,
        text: &'a Primary<'a>,
        _ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        if self.directive_depth != 0 {
            self.write_text(text.source());
        } else {
            self.split_into_paragraphs(text.source());
        }
        ProcessingStatus::Ok
    }

    fn consume_comment(
        &mut self,
        comment: &'a Primary<'a>,
        _ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        // Comments syntactically include their terminating newline, so a
        // leading newline in the following text completes a blank line.
        self.line_state = if comment.comment_suffix_length() != 0 {
            LineState::AfterCommentTerminator
        } else {
            LineState::Middle
        };
        ProcessingStatus::Ok
    }

    fn consume_escape(
        &mut self,
        escape: &'a Primary<'a>,
        _ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        self.line_state = LineState::Middle;
        let text = escape.escaped();
        if text.is_empty() {
            return ProcessingStatus::Ok;
        }
        self.enter_paragraph();
        self.write_text(text);
        ProcessingStatus::Ok
    }

    fn consume_directive(
        &mut self,
        directive: &'a Directive<'a>,
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        // Writes a directive performs through this policy are forwarded
        // rather than split, which keeps its own tags intact. consume
        // may be entered recursively, so a plain bool is insufficient.
        self.line_state = LineState::Middle;
        self.directive_depth += 1;
        self.guards.push(false);
        let status = crate::eval::apply_behavior(self, directive, frame, ctx);
        let released = self.guards.pop().unwrap_or(false);
        if !released {
            debug_assert!(self.directive_depth != 0);
            self.directive_depth -= 1;
        }
        status
    }

    fn enter_paragraph(&mut self) {
        // Depth 1 is permitted so that a directive appearing at the top
        // level relative to this policy can itself open a paragraph.
        if self.directive_depth <= 1 && self.state == ParagraphsState::Outside {
            self.write_html(OPENING_TAG);
            self.state = ParagraphsState::Inside;
        }
    }

    fn leave_paragraph(&mut self) {
        if self.directive_depth <= 1 && self.state == ParagraphsState::Inside {
            self.write_html(CLOSING_TAG);
            self.state = ParagraphsState::Outside;
        }
    }

    fn inherit_paragraph(&mut self) {
        if let Some(released) = self.guards.last_mut() {
            if !*released {
                *released = true;
                debug_assert!(self.directive_depth != 0);
                self.directive_depth -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::VecTextSink;

    fn split(chunks: &[&str]) -> String {
        let mut sink = VecTextSink::new();
        {
            let mut policy = ParagraphSplitPolicy::new(&mut sink);
            for chunk in chunks {
                policy.write(chunk, OutputLanguage::Text);
            }
            policy.leave_paragraph();
        }
        sink.into_string()
    }

    #[test]
    fn blank_line_splits_paragraphs() {
        assert_eq!(split(&["a\n\nb"]), "<p>a</p><p>b</p>");
    }

    #[test]
    fn single_newline_does_not_split() {
        assert_eq!(split(&["a\nb"]), "<p>a\nb</p>");
    }

    #[test]
    fn lone_leading_newline_is_forwarded() {
        assert_eq!(split(&["a", "\nb"]), "<p>a\nb</p>");
    }

    #[test]
    fn leading_blank_line_closes_paragraph() {
        assert_eq!(split(&["a", "\n\nb"]), "<p>a</p><p>b</p>");
    }

    #[test]
    fn trailing_blank_is_swallowed() {
        assert_eq!(split(&["a\n\n"]), "<p>a</p>");
    }

    #[test]
    fn text_is_escaped_inside_paragraphs() {
        assert_eq!(split(&["a<b"]), "<p>a&lt;b</p>");
    }

    #[test]
    fn enter_and_leave_are_idempotent() {
        let mut sink = VecTextSink::new();
        {
            let mut policy = ParagraphSplitPolicy::new(&mut sink);
            policy.enter_paragraph();
            policy.enter_paragraph();
            policy.write("x", OutputLanguage::Text);
            policy.leave_paragraph();
            policy.leave_paragraph();
        }
        assert_eq!(sink.as_str(), "<p>x</p>");
    }

    #[test]
    fn html_writes_bypass_splitting() {
        let mut sink = VecTextSink::new();
        {
            let mut policy = ParagraphSplitPolicy::new(&mut sink);
            policy.write("a", OutputLanguage::Text);
            policy.write("<hr>", OutputLanguage::Html);
            policy.leave_paragraph();
        }
        assert_eq!(sink.as_str(), "<p>a<hr></p>");
    }
}
