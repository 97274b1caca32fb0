//! HTML writing: escaping, tags, attributes, and the plain HTML content
//! policy.

use cowel_base::ProcessingStatus;
use cowel_syntax::ast::{Directive, Primary};

use crate::context::Context;
use crate::policy::{ContentPolicy, OutputLanguage, TextSink};
use crate::stack::FrameIndex;

/// Writes `chars` to `sink` with HTML text escaping applied.
///
/// Only `&`, `<`, and `>` require escaping in inner text.
pub fn write_escaped_text(sink: &mut dyn TextSink, chars: &str) -> bool {
    write_escaped(sink, chars, false)
}

/// Writes `chars` to `sink` with HTML attribute-value escaping applied.
pub fn write_escaped_attribute(sink: &mut dyn TextSink, chars: &str) -> bool {
    write_escaped(sink, chars, true)
}

fn write_escaped(sink: &mut dyn TextSink, chars: &str, in_attribute: bool) -> bool {
    let mut rest = chars;
    loop {
        let split = rest
            .bytes()
            .position(|b| matches!(b, b'&' | b'<' | b'>') || (in_attribute && b == b'"'));
        let Some(split) = split else {
            return rest.is_empty() || sink.write(rest, OutputLanguage::Html);
        };
        if split != 0 && !sink.write(&rest[..split], OutputLanguage::Html) {
            return false;
        }
        let replacement = match rest.as_bytes()[split] {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            _ => "&quot;",
        };
        if !sink.write(replacement, OutputLanguage::Html) {
            return false;
        }
        rest = &rest[split + 1..];
    }
}

/// A low-level HTML emitter over a [`TextSink`].
pub struct HtmlWriter<'w> {
    sink: &'w mut dyn TextSink,
}

impl<'w> HtmlWriter<'w> {
    pub fn new(sink: &'w mut dyn TextSink) -> Self {
        Self { sink }
    }

    /// Writes text content, escaping HTML-relevant characters.
    pub fn write_inner_text(&mut self, text: &str) -> bool {
        write_escaped_text(self.sink, text)
    }

    /// Writes pre-rendered HTML verbatim.
    pub fn write_inner_html(&mut self, html: &str) -> bool {
        self.sink.write(html, OutputLanguage::Html)
    }

    /// Writes `<name>`.
    pub fn open_tag(&mut self, name: &str) -> bool {
        self.sink.write("<", OutputLanguage::Html)
            && self.sink.write(name, OutputLanguage::Html)
            && self.sink.write(">", OutputLanguage::Html)
    }

    /// Writes `</name>`.
    pub fn close_tag(&mut self, name: &str) -> bool {
        self.sink.write("</", OutputLanguage::Html)
            && self.sink.write(name, OutputLanguage::Html)
            && self.sink.write(">", OutputLanguage::Html)
    }

    /// Writes `<name`, leaving the tag open for attributes; finish with
    /// [`AttributeWriter::end`].
    pub fn open_tag_with_attributes<'t>(&'t mut self, name: &str) -> AttributeWriter<'t, 'w> {
        self.sink.write("<", OutputLanguage::Html);
        self.sink.write(name, OutputLanguage::Html);
        AttributeWriter { writer: self }
    }
}

/// Writes the attributes of a tag opened with
/// [`HtmlWriter::open_tag_with_attributes`].
pub struct AttributeWriter<'t, 'w> {
    writer: &'t mut HtmlWriter<'w>,
}

impl AttributeWriter<'_, '_> {
    pub fn attribute(self, key: &str, value: &str) -> Self {
        self.writer.sink.write(" ", OutputLanguage::Html);
        self.writer.sink.write(key, OutputLanguage::Html);
        self.writer.sink.write("=\"", OutputLanguage::Html);
        write_escaped_attribute(self.writer.sink, value);
        self.writer.sink.write("\"", OutputLanguage::Html);
        self
    }

    /// Closes the opening tag.
    pub fn end(self) {
        self.writer.sink.write(">", OutputLanguage::Html);
    }
}

/// The plain HTML content policy: text is escaped, HTML passes through,
/// directives are invoked with this policy as their output.
pub struct HtmlContentPolicy<'s> {
    sink: &'s mut dyn TextSink,
}

impl<'s> HtmlContentPolicy<'s> {
    pub fn new(sink: &'s mut dyn TextSink) -> Self {
        Self { sink }
    }
}

impl TextSink for HtmlContentPolicy<'_> {
    fn write(&mut self, chars: &str, language: OutputLanguage) -> bool {
        match language {
            OutputLanguage::Text => write_escaped_text(self.sink, chars),
            OutputLanguage::Html => self.sink.write(chars, OutputLanguage::Html),
            OutputLanguage::None => false,
        }
    }
}

impl<'a> ContentPolicy<'a> for HtmlContentPolicy<'_> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::VecTextSink;

    #[test]
    fn inner_text_is_escaped() {
        let mut sink = VecTextSink::new();
        let mut writer = HtmlWriter::new(&mut sink);
        writer.write_inner_text("a < b & c > d");
        assert_eq!(sink.as_str(), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn attributes_escape_quotes() {
        let mut sink = VecTextSink::new();
        let mut writer = HtmlWriter::new(&mut sink);
        writer
            .open_tag_with_attributes("h-")
            .attribute("data-h", "a\"b")
            .end();
        writer.close_tag("h-");
        assert_eq!(sink.as_str(), "<h- data-h=\"a&quot;b\"></h->");
    }

    #[test]
    fn html_policy_escapes_text_only() {
        let mut sink = VecTextSink::new();
        let mut policy = HtmlContentPolicy::new(&mut sink);
        policy.write("<b>", OutputLanguage::Html);
        policy.write("1 < 2", OutputLanguage::Text);
        policy.write("</b>", OutputLanguage::Html);
        assert_eq!(sink.as_str(), "<b>1 &lt; 2</b>");
    }
}
