//! Section redirection and referencing.
//!
//! `\cowel_there(section){content}` appends content to a named section;
//! `\cowel_here(section)` emits a reference that is substituted by the
//! section's accumulated content during final assembly. Together they
//! support out-of-order composition: a bibliography entry, for example,
//! writes an inline anchor where it appears and a rendered entry into a
//! separate section.

use cowel_base::diag::ids;
use cowel_base::ProcessingStatus;

use crate::context::Context;
use crate::eval;
use crate::params::{
    GroupMemberMatcher, Optionality, PackUsualMatcher, SpliceableToStringMatcher,
};
use crate::policy::{ContentPolicy, HtmlContentPolicy, OutputLanguage, VecTextSink};
use crate::sections::reference_section;
use crate::stack::Invocation;

fn match_section_name<'a>(
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> Result<String, ProcessingStatus> {
    let mut name = SpliceableToStringMatcher::new();
    let status = {
        let mut parameters = [GroupMemberMatcher::new(
            "section",
            Optionality::Mandatory,
            &mut name,
        )];
        PackUsualMatcher::new(&mut parameters).match_call(call, ctx, ProcessingStatus::Error)
    };
    if status != ProcessingStatus::Ok {
        return Err(status);
    }
    Ok(name.get_or_default(""))
}

/// `\cowel_here(section)`
pub fn splice_here<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let name = match match_section_name(call, ctx) {
        Ok(name) => name,
        Err(status) => return eval::try_generate_error(out, call.directive, ctx, status),
    };
    if name.is_empty() {
        ctx.try_error(
            ids::HERE_NO_SECTION,
            call.arguments_span,
            "No section name was provided.".into(),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    }

    let mut reference = String::new();
    if !reference_section(&mut reference, &name) {
        ctx.try_error(
            ids::HERE_NO_SECTION,
            call.arguments_span,
            format!("The section name \"{name}\" is too long to be referenced."),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    }
    out.write(&reference, OutputLanguage::Html);
    ProcessingStatus::Ok
}

/// `\cowel_there(section){content}`
pub fn splice_there<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let name = match match_section_name(call, ctx) {
        Ok(name) => name,
        Err(status) => return eval::try_generate_error(out, call.directive, ctx, status),
    };
    if name.is_empty() {
        ctx.try_error(
            ids::THERE_NO_SECTION,
            call.arguments_span,
            "No section name was provided.".into(),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    }

    // The content is generated into a local capture first, because the
    // section store cannot be borrowed while evaluation may reach it.
    let mut capture = VecTextSink::new();
    let status = {
        let mut policy = HtmlContentPolicy::new(&mut capture);
        eval::splice_all(&mut policy, call.content_elements(), call.content_frame, ctx)
    };
    if status == ProcessingStatus::Fatal {
        return status;
    }

    let previous = ctx.sections.current_index();
    ctx.sections.go_to(&name);
    ctx.sections.current_mut().append_html(capture.as_str());
    ctx.sections.set_current_index(previous);
    status
}
