//! Syntax-highlight capture.
//!
//! This policy accumulates two interleaved streams: plain text destined
//! for highlighting, and raw HTML injected mid-code (e.g. by formatting
//! directives inside a code block). On flush it asks the highlighter for
//! spans over the text portion and re-emits everything in order,
//! wrapping each highlighted run in `<h- data-h="…">`.

use cowel_base::ProcessingStatus;
use cowel_syntax::ast::{Directive, Primary};

use crate::context::Context;
use crate::highlight::{HighlightError, HighlightSpan};
use crate::policy::html::HtmlWriter;
use crate::policy::{ContentPolicy, OutputLanguage, TextSink};
use crate::stack::FrameIndex;

const HIGHLIGHT_TAG: &str = "h-";
const HIGHLIGHT_ATTRIBUTE: &str = "data-h";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanType {
    Highlight,
    Html,
}

#[derive(Debug, Clone, Copy)]
struct OutputSpan {
    span_type: SpanType,
    begin: usize,
    length: usize,
}

/// Captures code (and injected HTML) for later highlighting.
#[derive(Debug, Default)]
pub struct SyntaxHighlightPolicy {
    spans: Vec<OutputSpan>,
    text: String,
    html: String,
}

impl SyntaxHighlightPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated plain-text portion.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Highlights the captured text and writes the interleaved result
    /// to `out`.
    ///
    /// Even if highlighting fails the captured content is still written,
    /// just without highlight elements; the error is returned so the
    /// caller can diagnose it.
    pub fn write_highlighted(
        &self,
        out: &mut dyn TextSink,
        ctx: &mut Context<'_, '_>,
        language: &str,
    ) -> Result<(), HighlightError> {
        let mut highlights = Vec::new();
        let result = ctx
            .highlighter
            .highlight(&mut highlights, &self.text, language);

        let mut writer = HtmlWriter::new(out);
        for span in &self.spans {
            match span.span_type {
                SpanType::Html => {
                    writer.write_inner_html(&self.html[span.begin..span.begin + span.length]);
                }
                SpanType::Highlight => {
                    generate_highlighted_html(
                        &mut writer,
                        &self.text,
                        span.begin,
                        span.length,
                        &highlights,
                    );
                }
            }
        }
        result
    }
}

/// Writes one captured text span, wrapping the parts covered by
/// `highlights` in `<h->` elements.
fn generate_highlighted_html(
    out: &mut HtmlWriter,
    code: &str,
    begin: usize,
    length: usize,
    highlights: &[HighlightSpan],
) {
    debug_assert!(begin + length <= code.len());
    let end = begin + length;
    let mut index = begin;

    let first = highlights.partition_point(|h| h.end() <= begin);
    for highlight in &highlights[first..] {
        if highlight.begin >= end {
            break;
        }
        // Leading non-highlighted content.
        if highlight.begin > index {
            out.write_inner_text(&code[index..highlight.begin]);
            index = highlight.begin;
        }
        // A captured span may end in the middle of a highlight, like
        // `\i{in}t x` where the keyword highlight for `int` extends past
        // the captured `in`.
        let actual_end = end.min(highlight.end());
        if index >= actual_end {
            break;
        }
        out.open_tag_with_attributes(HIGHLIGHT_TAG)
            .attribute(HIGHLIGHT_ATTRIBUTE, highlight.kind.short_name())
            .end();
        out.write_inner_text(&code[index..actual_end]);
        out.close_tag(HIGHLIGHT_TAG);
        index = actual_end;
    }

    if index < end {
        out.write_inner_text(&code[index..end]);
    }
}

impl TextSink for SyntaxHighlightPolicy {
    fn write(&mut self, chars: &str, language: OutputLanguage) -> bool {
        if chars.is_empty() {
            return true;
        }
        match language {
            OutputLanguage::Text => {
                self.spans.push(OutputSpan {
                    span_type: SpanType::Highlight,
                    begin: self.text.len(),
                    length: chars.len(),
                });
                self.text.push_str(chars);
                true
            }
            OutputLanguage::Html => {
                self.spans.push(OutputSpan {
                    span_type: SpanType::Html,
                    begin: self.html.len(),
                    length: chars.len(),
                });
                self.html.push_str(chars);
                true
            }
            OutputLanguage::None => false,
        }
    }
}

impl<'a> ContentPolicy<'a> for SyntaxHighlightPolicy {
    fn consume_text(
        &mut self,
        text: &'a Primary<'a>,
        _ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        self.write(text.source(), OutputLanguage::Text);
        ProcessingStatus::Ok
    }

    fn consume_escape(
        &mut self,
        escape: &'a Primary<'a>,
        _ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        self.write(escape.escaped(), OutputLanguage::Text);
        ProcessingStatus::Ok
    }

    fn consume_comment(
        &mut self,
        _comment: &'a Primary<'a>,
        _ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        ProcessingStatus::Ok
    }

    fn consume_directive(
        &mut self,
        directive: &'a Directive<'a>,
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        crate::eval::apply_behavior(self, directive, frame, ctx)
    }
}
