//! Programmatic invocation.
//!
//! `\cowel_invoke(name, args...){content}` invokes the directive named
//! by its first argument. Every member after the name — including an
//! ellipsis — becomes the target's argument list, so macros can forward
//! their own arguments to a computed target:
//!
//! ```text
//! \cowel_macro(wrap){\cowel_invoke(inner, ...)}
//! \wrap(a, b = 2)   →   inner receives positional a and named b = 2
//! ```

use std::borrow::Cow;

use cowel_base::diag::ids;
use cowel_base::ProcessingStatus;
use cowel_syntax::ast::MemberKind;
use cowel_syntax::scan;

use crate::context::Context;
use crate::eval;
use crate::policy::ContentPolicy;
use crate::stack::Invocation;

/// `\cowel_invoke(name, args...){content}`
pub fn splice_invoke<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let Some(first) = call.arguments.first() else {
        ctx.try_error(
            ids::INVOKE_NAME_INVALID,
            call.arguments_span,
            "No directive name to invoke was provided.".into(),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    };
    if first.kind() != MemberKind::Positional {
        ctx.try_error(
            ids::INVOKE_NAME_INVALID,
            first.span(),
            "The first argument must be the positional name of the directive to invoke.".into(),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    }
    let Some(name_value) = first.value() else {
        return ProcessingStatus::Error;
    };

    let name = match eval::splice_member_to_plaintext(name_value, call.content_frame, ctx) {
        Ok(name) => name,
        Err(status) => return status,
    };
    if !scan::is_directive_name(&name) {
        ctx.try_error(
            ids::INVOKE_NAME_INVALID,
            first.span(),
            format!("The name \"{name}\" is not a valid directive name."),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    }

    let Some(resolved) = ctx.find_directive(&name) else {
        ctx.try_error(
            ids::INVOKE_LOOKUP_FAILED,
            first.span(),
            format!("No directive with the name \"{name}\" was found."),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    };

    // Everything after the name is forwarded as the target's argument
    // list; ellipses within resolve against this call's own frame.
    let invocation = Invocation {
        name: Cow::Owned(name),
        directive: call.directive,
        arguments: &call.arguments[1..],
        arguments_span: call.arguments_span,
        content: call.content,
        content_frame: call.content_frame,
        call_frame: call.call_frame,
    };
    eval::invoke(out, resolved, invocation, ctx)
}
