//! Generation-scoped variables.
//!
//! `\cowel_var_let(name, value)` stores a string variable for the rest
//! of the run. Embedders name variables of interest in
//! `preserved_variables`; their final values are captured when
//! generation ends, which test harnesses use to extract results from
//! documents.

use cowel_base::diag::ids;
use cowel_base::ProcessingStatus;

use crate::context::Context;
use crate::params::{
    GroupMemberMatcher, Optionality, PackUsualMatcher, SpliceableToStringMatcher,
};
use crate::stack::Invocation;

/// `\cowel_var_let(name, value)`
pub fn define_variable<'a>(
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let mut name = SpliceableToStringMatcher::new();
    let mut value = SpliceableToStringMatcher::new();
    let status = {
        let mut parameters = [
            GroupMemberMatcher::new("name", Optionality::Mandatory, &mut name),
            GroupMemberMatcher::new("value", Optionality::Mandatory, &mut value),
        ];
        PackUsualMatcher::new(&mut parameters).match_call(call, ctx, ProcessingStatus::Error)
    };
    if status != ProcessingStatus::Ok {
        return status;
    }

    let Some(name) = name.get() else {
        return ProcessingStatus::Error;
    };
    if name.is_empty() {
        ctx.try_error(
            ids::VAR_NAME_MISSING,
            call.arguments_span,
            "The variable name must not be empty.".into(),
        );
        return ProcessingStatus::Error;
    }
    let name = name.to_string();
    let value = value.get_or_default("");
    ctx.variables.insert(name, value);
    ProcessingStatus::Ok
}
