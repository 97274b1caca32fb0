//! Alias registration.
//!
//! `\cowel_alias(name, ...){target}` registers each argument as an
//! alternative name for the target directive, which must already exist.
//! Alias failures are fatal: an alias that silently fails to register
//! would change the meaning of the rest of the document.

use cowel_base::diag::ids;
use cowel_base::ProcessingStatus;
use cowel_syntax::scan;

use crate::context::Context;
use crate::eval;
use crate::params::ValuePackMatcher;
use crate::stack::Invocation;

/// `\cowel_alias(names...){target}`
pub fn define_alias<'a>(call: &Invocation<'a>, ctx: &mut Context<'a, '_>) -> ProcessingStatus {
    let mut names = ValuePackMatcher::new();
    let match_status = names.match_call(call, ctx, ProcessingStatus::Fatal);
    if match_status != ProcessingStatus::Ok {
        if match_status.is_error() {
            ctx.try_fatal(
                ids::ALIAS_NAME_INVALID,
                call.arguments_span,
                "Fatal error because generation of an alias failed.".into(),
            );
            return ProcessingStatus::Fatal;
        }
        return match_status;
    }

    for (value, location) in names.values() {
        if !value.is_str() {
            ctx.try_error(
                ids::TYPE_MISMATCH,
                *location,
                format!(
                    "Alias names must be of type str, but the argument is of type {}.",
                    value.type_of().display_name()
                ),
            );
            return ProcessingStatus::Error;
        }
    }

    let target = match eval::splice_to_plaintext(call.content_elements(), call.content_frame, ctx)
    {
        Ok(target) => target,
        Err(status) => {
            if status.is_error() {
                ctx.try_fatal(
                    ids::ALIAS_NAME_INVALID,
                    call.content_span(),
                    "Fatal error because generation of the target name failed.".into(),
                );
                return ProcessingStatus::Fatal;
            }
            return status;
        }
    };
    if target.is_empty() {
        ctx.try_fatal(
            ids::ALIAS_NAME_MISSING,
            call.directive.span(),
            "The target name must not be empty.".into(),
        );
        return ProcessingStatus::Fatal;
    }
    if !scan::is_directive_name(&target) {
        ctx.try_fatal(
            ids::ALIAS_NAME_INVALID,
            call.content_span(),
            format!("The target name \"{target}\" is not a valid directive name."),
        );
        return ProcessingStatus::Fatal;
    }
    if ctx.find_directive(&target).is_none() {
        ctx.try_fatal(
            ids::ALIAS_NAME_INVALID,
            call.content_span(),
            format!(
                "No existing directive with the name \"{target}\" was found. \
                 A directive (possibly macro) must be defined before an alias for it \
                 can be defined."
            ),
        );
        return ProcessingStatus::Fatal;
    }

    // Collect first so that the borrow of the matched values ends
    // before the alias table is mutated.
    let alias_names: Vec<(String, cowel_base::FileSpan)> = names
        .values()
        .iter()
        .filter_map(|(value, location)| {
            value.as_str().map(|name| (name.to_string(), *location))
        })
        .collect();

    for (alias_name, location) in alias_names {
        if alias_name.is_empty() {
            ctx.try_fatal(
                ids::ALIAS_NAME_MISSING,
                location,
                "The alias name must not be empty.".into(),
            );
            return ProcessingStatus::Fatal;
        }
        if !scan::is_directive_name(&alias_name) {
            ctx.try_fatal(
                ids::ALIAS_NAME_INVALID,
                location,
                format!("The alias name \"{alias_name}\" is not a valid directive name."),
            );
            return ProcessingStatus::Fatal;
        }
        if ctx.is_user_defined(&alias_name) {
            ctx.try_fatal(
                ids::ALIAS_DUPLICATE,
                location,
                format!(
                    "The alias name \"{alias_name}\" is already defined as a macro or alias. \
                     Redefinitions or duplicate definitions are not allowed."
                ),
            );
            return ProcessingStatus::Fatal;
        }
        log::debug!("defined alias \"{alias_name}\" -> \"{target}\"");
        ctx.aliases.insert(alias_name, target.clone());
    }

    ProcessingStatus::Ok
}
