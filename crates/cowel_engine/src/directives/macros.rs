//! Macro definition and argument insertion.
//!
//! A macro definition binds a name to a body block; invoking the name
//! splices the body, evaluated in the macro's own frame. Inside the
//! body, `\cowel_put` inserts the call's content or one of its
//! arguments, and an ellipsis member in any nested argument list
//! forwards the call's arguments onward.

use cowel_base::diag::ids;
use cowel_base::ProcessingStatus;
use cowel_syntax::ast::MemberKind;
use cowel_syntax::scan;

use crate::context::{Context, MacroDef};
use crate::eval;
use crate::params::{
    GroupMemberMatcher, Optionality, PackUsualMatcher, SpliceableToStringMatcher,
};
use crate::policy::ContentPolicy;
use crate::stack::Invocation;
use crate::value::Value;

/// `\cowel_macro(name){body}`
pub fn define_macro<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let mut name = SpliceableToStringMatcher::new();
    let name_status = {
        let mut parameters = [GroupMemberMatcher::new(
            "name",
            Optionality::Mandatory,
            &mut name,
        )];
        PackUsualMatcher::new(&mut parameters).match_call(call, ctx, ProcessingStatus::Error)
    };
    if name_status != ProcessingStatus::Ok {
        return eval::try_generate_error(out, call.directive, ctx, name_status);
    }

    let Some(name) = name.get() else {
        return ProcessingStatus::Error;
    };
    if name.is_empty() {
        ctx.try_error(
            ids::MACRO_NAME_MISSING,
            call.arguments_span,
            "The macro name must not be empty.".into(),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    }
    if !scan::is_directive_name(name) {
        ctx.try_error(
            ids::MACRO_NAME_INVALID,
            call.arguments_span,
            format!("The macro name \"{name}\" is not a valid directive name."),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    }
    if ctx.is_user_defined(name) {
        ctx.try_error(
            ids::MACRO_REDEFINITION,
            call.directive.span(),
            format!(
                "The macro \"{name}\" is already defined. \
                 Redefinitions or duplicate definitions are not allowed."
            ),
        );
        return ProcessingStatus::Error;
    }

    ctx.macros.insert(
        name.to_string(),
        MacroDef {
            body: call.content,
            definition_span: call.directive.span(),
        },
    );
    log::debug!("defined macro \"{name}\"");
    ProcessingStatus::Ok
}

/// `\cowel_put`, `\cowel_put(N)`, `\cowel_put(name)`
///
/// Inserts the enclosing macro call's content, its `N`-th positional
/// argument, or its named argument.
pub fn splice_put<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    // The enclosing macro invocation is the frame this `\cowel_put` was
    // written in.
    let Some(enclosing) = ctx.stack.get(call.content_frame) else {
        ctx.try_error(
            ids::MACRO_PUT_OUTSIDE_ARGS,
            call.directive.span(),
            "\\cowel_put can only be used inside a macro definition.".into(),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    };
    let target = enclosing.invocation.clone();

    match call.arguments.len() {
        0 => eval::splice_all(out, target.content_elements(), target.content_frame, ctx),
        1 => splice_put_argument(out, call, &target, ctx),
        _ => {
            ctx.try_error(
                ids::MACRO_PUT_INVALID,
                call.arguments_span,
                "\\cowel_put accepts at most one argument.".into(),
            );
            eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error)
        }
    }
}

fn splice_put_argument<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    target: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let member = &call.arguments[0];
    if member.kind() != MemberKind::Positional {
        ctx.try_error(
            ids::MACRO_PUT_INVALID,
            member.span(),
            "\\cowel_put takes a positional argument index or name.".into(),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    }
    let Some(selector) = member.value() else {
        return ProcessingStatus::Error;
    };

    let selector = match eval::evaluate_member_value(selector, call.content_frame, ctx) {
        Ok(value) => value,
        Err(status) => return status,
    };

    let selected = match &selector {
        Value::Int(index) => {
            let index = index.to_string().parse::<usize>().ok();
            index.and_then(|index| {
                target
                    .arguments
                    .iter()
                    .filter(|m| m.kind() == MemberKind::Positional)
                    .nth(index)
            })
        }
        Value::Str(name, _) => target
            .arguments
            .iter()
            .filter(|m| m.kind() == MemberKind::Named)
            .find(|m| m.name_text() == Some(name.as_ref())),
        _ => {
            ctx.try_error(
                ids::MACRO_PUT_INVALID,
                member.span(),
                format!(
                    "\\cowel_put takes an integer index or a name, but got {}.",
                    selector.type_of().display_name()
                ),
            );
            return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
        }
    };

    let Some(selected) = selected else {
        ctx.try_error(
            ids::MACRO_PUT_OUT_OF_RANGE,
            member.span(),
            format!(
                "The enclosing macro call has no argument matching \"{}\".",
                member.source()
            ),
        );
        return eval::try_generate_error(out, call.directive, ctx, ProcessingStatus::Error);
    };
    let Some(value) = selected.value() else {
        return ProcessingStatus::Error;
    };
    eval::splice_member_value(out, value, target.content_frame, ctx)
}
