//! The visible error placeholder element.

use cowel_base::ProcessingStatus;

use crate::context::Context;
use crate::eval;
use crate::policy::{ContentPolicy, OutputLanguage};
use crate::stack::Invocation;

/// `\error{...}` — renders its content inside an `<error->` element.
pub fn splice_error<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let text = match eval::splice_to_plaintext(call.content_elements(), call.content_frame, ctx) {
        Ok(text) => text,
        Err(status) => return status,
    };
    out.write("<error->", OutputLanguage::Html);
    out.write(&text, OutputLanguage::Text);
    out.write("</error->", OutputLanguage::Html);
    ProcessingStatus::Ok
}
