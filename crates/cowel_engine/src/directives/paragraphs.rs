//! Paragraph control.
//!
//! Directives are black boxes to paragraph splitting by default.
//! `\cowel_paragraphs` opts its content into the surrounding splitting;
//! the enter/leave pair opens and closes paragraphs explicitly, which
//! behaviors appearing at the top level relative to the splitter may
//! use to join the paragraph structure around them.

use cowel_base::ProcessingStatus;

use crate::context::Context;
use crate::eval;
use crate::params::{match_empty_pack, MatchFail};
use crate::policy::ContentPolicy;
use crate::stack::Invocation;

/// `\cowel_paragraphs{content}`
pub fn splice_paragraphs<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let empty = match_empty_pack(
        call.arguments,
        call.content_frame,
        ctx,
        &MatchFail::error(call.arguments_span),
    );
    out.inherit_paragraph();
    let status = eval::splice_all(out, call.content_elements(), call.content_frame, ctx);
    status.max(empty)
}

/// `\cowel_paragraph_enter`
pub fn splice_paragraph_enter<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let status = match_empty_pack(
        call.arguments,
        call.content_frame,
        ctx,
        &MatchFail::error(call.arguments_span),
    );
    out.enter_paragraph();
    status
}

/// `\cowel_paragraph_leave`
pub fn splice_paragraph_leave<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let status = match_empty_pack(
        call.arguments,
        call.content_frame,
        ctx,
        &MatchFail::error(call.arguments_span),
    );
    out.leave_paragraph();
    status
}
