//! Content policies: the composable sink stack that output flows
//! through.
//!
//! Output is not a single byte buffer. A [`TextSink`] accepts character
//! data tagged with its [`OutputLanguage`]; a [`ContentPolicy`] is a
//! sink that additionally consumes AST nodes, so policies can react to
//! document structure (paragraph splitting, highlight capture) before
//! the characters reach the terminal buffer.
//!
//! The chain is a visitor with state, not a coroutine: each policy
//! forwards to the one beneath it synchronously.

pub mod highlight;
pub mod html;
pub mod paragraph;

use cowel_base::ProcessingStatus;
use cowel_syntax::ast::{Directive, Primary};

use crate::context::Context;
use crate::stack::FrameIndex;

pub use highlight::SyntaxHighlightPolicy;
pub use html::{HtmlContentPolicy, HtmlWriter};
pub use paragraph::ParagraphSplitPolicy;

/// What language a run of characters is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLanguage {
    /// Raw characters with no defined language.
    None,
    /// Plain text; HTML-relevant characters must be escaped before they
    /// reach an HTML output.
    Text,
    /// Already well-formed HTML.
    Html,
}

/// Accepts character data. Returns `false` if the write was rejected.
pub trait TextSink {
    fn write(&mut self, chars: &str, language: OutputLanguage) -> bool;
}

/// A [`TextSink`] that also consumes AST nodes.
///
/// `consume_directive` receives the frame its directive was written in;
/// behaviors it invokes push new frames on top of it.
pub trait ContentPolicy<'a>: TextSink {
    fn consume_text(
        &mut self,
        text: &'a Primary<'a>,
        ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus;

    fn consume_escape(
        &mut self,
        escape: &'a Primary<'a>,
        ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus;

    fn consume_comment(
        &mut self,
        comment: &'a Primary<'a>,
        ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus;

    fn consume_directive(
        &mut self,
        directive: &'a Directive<'a>,
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus;

    /// Opens a paragraph, where supported. No-op by default.
    fn enter_paragraph(&mut self) {}

    /// Closes a paragraph, where supported. No-op by default.
    fn leave_paragraph(&mut self) {}

    /// Lets the currently consumed directive's contents participate in
    /// the surrounding paragraph splitting. No-op by default.
    fn inherit_paragraph(&mut self) {}
}

/// The terminal buffer at the bottom of a policy stack.
#[derive(Debug, Default)]
pub struct VecTextSink {
    data: String,
}

impl VecTextSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn into_string(self) -> String {
        self.data
    }
}

impl TextSink for VecTextSink {
    fn write(&mut self, chars: &str, _language: OutputLanguage) -> bool {
        self.data.push_str(chars);
        true
    }
}

/// A policy that flattens everything it consumes into plain text.
///
/// Used to evaluate markup to strings: directive names, string
/// arguments, quoted-string contents.
#[derive(Debug, Default)]
pub struct PlaintextPolicy {
    data: String,
}

impl PlaintextPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.data
    }
}

impl TextSink for PlaintextPolicy {
    fn write(&mut self, chars: &str, _language: OutputLanguage) -> bool {
        self.data.push_str(chars);
        true
    }
}

impl<'a> ContentPolicy<'a> for PlaintextPolicy {
    fn consume_text(
        &mut self,
        text: &'a Primary<'a>,
        _ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        self.data.push_str(text.source());
        ProcessingStatus::Ok
    }

    fn consume_escape(
        &mut self,
        escape: &'a Primary<'a>,
        _ctx: &mut Context<'a, '_>,
    ) -> ProcessingStatus {
        self.data.push_str(escape.escaped());
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
