//! Parameter matching: binding a call's arguments to a declared
//! parameter set.
//!
//! A *value matcher* checks and captures one argument; a
//! [`GroupMemberMatcher`] pairs a parameter name, an optionality, and a
//! value matcher; a [`PackUsualMatcher`] binds a member list to a
//! parameter list by name and position, expanding ellipsis members
//! against the enclosing frame's arguments — which is how macros forward
//! their arguments onward.
//!
//! A non-`Ok` status either aborts (`Fatal`, `Brk`) or records an error
//! and continues as far as the matching algorithm permits.

use cowel_base::diag::ids;
use cowel_base::{FileSpan, ProcessingStatus, Severity};
use cowel_data::BigInt;
use cowel_syntax::ast::{GroupMember, MemberKind, MemberValue};

use crate::context::Context;
use crate::eval;
use crate::stack::{FrameIndex, Invocation};
use crate::types::Type;
use crate::value::Value;

/// Whether a parameter must be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optionality {
    Mandatory,
    Optional,
}

/// How a matching failure is reported.
#[derive(Debug, Clone, Copy)]
pub struct MatchFail {
    pub id: &'static str,
    pub severity: Severity,
    /// The status returned when matching fails.
    pub status: ProcessingStatus,
    /// Fallback location for failures without a more precise span.
    pub location: FileSpan,
}

impl MatchFail {
    /// The usual failure mode: a recoverable `type.mismatch` error.
    pub fn error(location: FileSpan) -> MatchFail {
        MatchFail {
            id: ids::TYPE_MISMATCH,
            severity: Severity::Error,
            status: ProcessingStatus::Error,
            location,
        }
    }

    /// A failure mode that aborts the generation.
    pub fn fatal(location: FileSpan) -> MatchFail {
        MatchFail {
            status: ProcessingStatus::Fatal,
            ..MatchFail::error(location)
        }
    }

    fn emit(&self, ctx: &mut Context<'_, '_>, location: FileSpan, message: String) {
        ctx.emit(self.severity, self.id, location, message);
    }
}

/// Checks and captures one argument value.
pub trait ValueMatcher<'a> {
    fn match_value(
        &mut self,
        argument: &'a MemberValue<'a>,
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
        on_fail: &MatchFail,
    ) -> ProcessingStatus;

    fn was_matched(&self) -> bool;
}

/// Captures markup with its frame, without evaluating anything.
#[derive(Debug, Default)]
pub struct LazyMarkupMatcher<'a> {
    captured: Option<(&'a MemberValue<'a>, FrameIndex)>,
}

impl<'a> LazyMarkupMatcher<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<(&'a MemberValue<'a>, FrameIndex)> {
        self.captured
    }
}

impl<'a> ValueMatcher<'a> for LazyMarkupMatcher<'a> {
    fn match_value(
        &mut self,
        argument: &'a MemberValue<'a>,
        frame: FrameIndex,
        _ctx: &mut Context<'a, '_>,
        _on_fail: &MatchFail,
    ) -> ProcessingStatus {
        self.captured = Some((argument, frame));
        ProcessingStatus::Ok
    }

    fn was_matched(&self) -> bool {
        self.captured.is_some()
    }
}

/// Enforces type `str` and takes the string.
#[derive(Debug, Default)]
pub struct StringMatcher<'a> {
    value: Option<(Value<'a>, FileSpan)>,
}

impl<'a> StringMatcher<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&str> {
        self.value.as_ref().and_then(|(v, _)| v.as_str())
    }

    pub fn location(&self) -> Option<FileSpan> {
        self.value.as_ref().map(|(_, span)| *span)
    }
}

impl<'a> ValueMatcher<'a> for StringMatcher<'a> {
    fn match_value(
        &mut self,
        argument: &'a MemberValue<'a>,
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
        on_fail: &MatchFail,
    ) -> ProcessingStatus {
        let value = match eval::evaluate_member_value(argument, frame, ctx) {
            Ok(value) => value,
            Err(status) => return status.max(on_fail.status),
        };
        if !value.is_str() {
            on_fail.emit(
                ctx,
                argument.span(),
                format!(
                    "Expected a value of type str, but got {}.",
                    value.type_of().display_name()
                ),
            );
            return on_fail.status;
        }
        self.value = Some((value, argument.span()));
        ProcessingStatus::Ok
    }

    fn was_matched(&self) -> bool {
        self.value.is_some()
    }
}

/// Accepts any spliceable value and renders it to a string.
#[derive(Debug, Default)]
pub struct SpliceableToStringMatcher {
    value: Option<(String, FileSpan)>,
}

impl SpliceableToStringMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&str> {
        self.value.as_ref().map(|(s, _)| s.as_str())
    }

    pub fn get_or_default(&self, fallback: &str) -> String {
        self.get().unwrap_or(fallback).to_string()
    }

    pub fn location(&self) -> Option<FileSpan> {
        self.value.as_ref().map(|(_, span)| *span)
    }
}

impl<'a> ValueMatcher<'a> for SpliceableToStringMatcher {
    fn match_value(
        &mut self,
        argument: &'a MemberValue<'a>,
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
        on_fail: &MatchFail,
    ) -> ProcessingStatus {
        if !argument.is_spliceable_value() {
            on_fail.emit(
                ctx,
                argument.span(),
                format!(
                    "Expected a spliceable value, but got {}.",
                    eval::static_type_of(argument).display_name()
                ),
            );
            return on_fail.status;
        }
        match eval::splice_member_to_plaintext(argument, frame, ctx) {
            Ok(text) => {
                self.value = Some((text, argument.span()));
                ProcessingStatus::Ok
            }
            Err(status) => status.max(on_fail.status),
        }
    }

    fn was_matched(&self) -> bool {
        self.value.is_some()
    }
}

macro_rules! typed_value_matcher {
    ($name:ident, $value_type:ty, $variant:ident, $type_name:literal) => {
        #[derive(Debug, Default)]
        pub struct $name {
            value: Option<($value_type, FileSpan)>,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn get(&self) -> Option<&$value_type> {
                self.value.as_ref().map(|(v, _)| v)
            }

            pub fn location(&self) -> Option<FileSpan> {
                self.value.as_ref().map(|(_, span)| *span)
            }
        }

        impl<'a> ValueMatcher<'a> for $name {
            fn match_value(
                &mut self,
                argument: &'a MemberValue<'a>,
                frame: FrameIndex,
                ctx: &mut Context<'a, '_>,
                on_fail: &MatchFail,
            ) -> ProcessingStatus {
                let value = match eval::evaluate_member_value(argument, frame, ctx) {
                    Ok(value) => value,
                    Err(status) => return status.max(on_fail.status),
                };
                match value {
                    Value::$variant(v) => {
                        self.value = Some((v, argument.span()));
                        ProcessingStatus::Ok
                    }
                    other => {
                        on_fail.emit(
                            ctx,
                            argument.span(),
                            format!(
                                concat!("Expected ", $type_name, ", but got {}."),
                                other.type_of().display_name()
                            ),
                        );
                        on_fail.status
                    }
                }
            }

            fn was_matched(&self) -> bool {
                self.value.is_some()
            }
        }
    };
}

typed_value_matcher!(BooleanMatcher, bool, Bool, "a boolean (true or false)");
typed_value_matcher!(IntegerMatcher, BigInt, Int, "an integer");
typed_value_matcher!(FloatMatcher, f64, Float, "a float");

/// Validates that the value is one of a sorted list of options.
#[derive(Debug)]
pub struct SortedOptionsMatcher<'o> {
    options: &'o [&'o str],
    index: Option<usize>,
}

impl<'o> SortedOptionsMatcher<'o> {
    pub fn new(options: &'o [&'o str]) -> Self {
        debug_assert!(options.windows(2).all(|w| w[0] < w[1]));
        Self {
            options,
            index: None,
        }
    }

    pub fn get_or_default(&self, fallback: &'o str) -> &'o str {
        self.index.map_or(fallback, |i| self.options[i])
    }

    pub fn index_or_default(&self, fallback: usize) -> usize {
        self.index.unwrap_or(fallback)
    }
}

impl<'a> ValueMatcher<'a> for SortedOptionsMatcher<'_> {
    fn match_value(
        &mut self,
        argument: &'a MemberValue<'a>,
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
        on_fail: &MatchFail,
    ) -> ProcessingStatus {
        let text = match eval::splice_member_to_plaintext(argument, frame, ctx) {
            Ok(text) => text,
            Err(status) => return status.max(on_fail.status),
        };
        match self.options.binary_search(&text.as_str()) {
            Ok(index) => {
                self.index = Some(index);
                ProcessingStatus::Ok
            }
            Err(_) => {
                // On mismatch, the error lists every valid option.
                let mut message = format!("\"{text}\" does not match any of the valid options (");
                for (i, option) in self.options.iter().enumerate() {
                    if i != 0 {
                        message.push_str(", ");
                    }
                    message.push('"');
                    message.push_str(option);
                    message.push('"');
                }
                message.push_str(").");
                on_fail.emit(ctx, argument.span(), message);
                on_fail.status
            }
        }
    }

    fn was_matched(&self) -> bool {
        self.index.is_some()
    }
}

/// Accepts any value analytically convertible to a target type.
#[derive(Debug)]
pub struct ValueOfTypeMatcher<'a> {
    expected: Type,
    value: Option<(Value<'a>, FileSpan)>,
}

impl<'a> ValueOfTypeMatcher<'a> {
    pub fn new(expected: Type) -> Self {
        Self {
            expected: expected.canonical(),
            value: None,
        }
    }

    pub fn get(&self) -> Option<&Value<'a>> {
        self.value.as_ref().map(|(v, _)| v)
    }
}

impl<'a> ValueMatcher<'a> for ValueOfTypeMatcher<'a> {
    fn match_value(
        &mut self,
        argument: &'a MemberValue<'a>,
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
        on_fail: &MatchFail,
    ) -> ProcessingStatus {
        let value = match eval::evaluate_member_value(argument, frame, ctx) {
            Ok(value) => value,
            Err(status) => return status.max(on_fail.status),
        };
        if !value.type_of().analytically_convertible_to(&self.expected) {
            on_fail.emit(
                ctx,
                argument.span(),
                format!(
                    "Expected a value of type {}, but got {}.",
                    self.expected.display_name(),
                    value.type_of().display_name()
                ),
            );
            return on_fail.status;
        }
        self.value = Some((value, argument.span()));
        ProcessingStatus::Ok
    }

    fn was_matched(&self) -> bool {
        self.value.is_some()
    }
}

/// The lazy counterpart of [`ValueOfTypeMatcher`]: checks the static
/// type and captures the markup unevaluated.
#[derive(Debug)]
pub struct LazyValueOfTypeMatcher<'a> {
    expected: Type,
    captured: Option<(&'a MemberValue<'a>, FrameIndex)>,
}

impl<'a> LazyValueOfTypeMatcher<'a> {
    pub fn new(expected: Type) -> Self {
        Self {
            expected: expected.canonical(),
            captured: None,
        }
    }

    pub fn get(&self) -> Option<(&'a MemberValue<'a>, FrameIndex)> {
        self.captured
    }
}

impl<'a> ValueMatcher<'a> for LazyValueOfTypeMatcher<'a> {
    fn match_value(
        &mut self,
        argument: &'a MemberValue<'a>,
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
        on_fail: &MatchFail,
    ) -> ProcessingStatus {
        let actual = eval::static_type_of(argument).canonical();
        if actual != Type::Any && !actual.analytically_convertible_to(&self.expected) {
            on_fail.emit(
                ctx,
                argument.span(),
                format!(
                    "Expected a value of type {}, but got {}.",
                    self.expected.display_name(),
                    actual.display_name()
                ),
            );
            return on_fail.status;
        }
        self.captured = Some((argument, frame));
        ProcessingStatus::Ok
    }

    fn was_matched(&self) -> bool {
        self.captured.is_some()
    }
}

/// One declared parameter: a name, an optionality, and a value matcher.
pub struct GroupMemberMatcher<'m, 'a> {
    name: &'static str,
    optionality: Optionality,
    matcher: &'m mut dyn ValueMatcher<'a>,
}

impl<'m, 'a> GroupMemberMatcher<'m, 'a> {
    pub fn new(
        name: &'static str,
        optionality: Optionality,
        matcher: &'m mut dyn ValueMatcher<'a>,
    ) -> Self {
        Self {
            name,
            optionality,
            matcher,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_mandatory(&self) -> bool {
        self.optionality == Optionality::Mandatory
    }
}

/// The arguments of the frame an ellipsis member forwards from.
fn enclosing_arguments<'a>(
    ctx: &Context<'a, '_>,
    frame: FrameIndex,
) -> Option<(&'a [GroupMember<'a>], FrameIndex)> {
    let enclosing = ctx.stack.get(frame)?;
    Some((
        enclosing.invocation.arguments,
        enclosing.invocation.content_frame,
    ))
}

/// Binds a member list to a list of declared parameters.
pub struct PackUsualMatcher<'p, 'm, 'a> {
    parameters: &'p mut [GroupMemberMatcher<'m, 'a>],
}

impl<'p, 'm, 'a> PackUsualMatcher<'p, 'm, 'a> {
    pub fn new(parameters: &'p mut [GroupMemberMatcher<'m, 'a>]) -> Self {
        Self { parameters }
    }

    /// Matches the members against the declared parameters, then checks
    /// that every mandatory parameter was bound.
    pub fn match_pack(
        &mut self,
        members: &'a [GroupMember<'a>],
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
        on_fail: &MatchFail,
    ) -> ProcessingStatus {
        let mut argument_index_by_parameter = vec![-1i32; self.parameters.len()];
        let status = self.do_match(
            members,
            frame,
            ctx,
            on_fail,
            &mut argument_index_by_parameter,
            0,
        );
        if status != ProcessingStatus::Ok {
            return status;
        }

        for parameter in self.parameters.iter() {
            if parameter.is_mandatory() && !parameter.matcher.was_matched() {
                on_fail.emit(
                    ctx,
                    on_fail.location,
                    format!(
                        "No argument for parameter \"{}\" was provided.",
                        parameter.name
                    ),
                );
                return on_fail.status;
            }
        }
        ProcessingStatus::Ok
    }

    /// Matches the arguments of `call` against the declared parameters.
    pub fn match_call(
        &mut self,
        call: &Invocation<'a>,
        ctx: &mut Context<'a, '_>,
        on_fail_status: ProcessingStatus,
    ) -> ProcessingStatus {
        let on_fail = MatchFail {
            status: on_fail_status,
            ..MatchFail::error(call.arguments_span)
        };
        self.match_pack(call.arguments, call.content_frame, ctx, &on_fail)
    }

    fn do_match(
        &mut self,
        members: &'a [GroupMember<'a>],
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
        on_fail: &MatchFail,
        argument_index_by_parameter: &mut [i32],
        cumulative_index: usize,
    ) -> ProcessingStatus {
        let mut encountered_named = false;

        for (argument_index, member) in members.iter().enumerate() {
            match member.kind() {
                MemberKind::Positional => {
                    if encountered_named {
                        on_fail.emit(
                            ctx,
                            member.span(),
                            "Providing a positional argument after a named argument is not valid."
                                .into(),
                        );
                        return on_fail.status;
                    }
                    let parameter_index = argument_index + cumulative_index;
                    if parameter_index >= argument_index_by_parameter.len() {
                        on_fail.emit(ctx, member.span(), "Too many arguments.".into());
                        return on_fail.status;
                    }
                    argument_index_by_parameter[parameter_index] = argument_index as i32;
                    let Some(value) = member.value() else {
                        continue;
                    };
                    let status = self.parameters[parameter_index]
                        .matcher
                        .match_value(value, frame, ctx, on_fail);
                    if status != ProcessingStatus::Ok {
                        return status;
                    }
                }

                MemberKind::Ellipsis => {
                    // Forward the enclosing call's arguments, evaluated
                    // in the enclosing call's content frame.
                    let Some((arguments, content_frame)) = enclosing_arguments(ctx, frame) else {
                        continue;
                    };
                    let status = self.do_match(
                        arguments,
                        content_frame,
                        ctx,
                        on_fail,
                        argument_index_by_parameter,
                        cumulative_index + argument_index,
                    );
                    if status != ProcessingStatus::Ok {
                        return status;
                    }
                }

                MemberKind::Named => {
                    encountered_named = true;
                    let Some(name) = member.name_text() else {
                        continue;
                    };
                    let Some(parameter_index) =
                        self.parameters.iter().position(|p| p.name == name)
                    else {
                        on_fail.emit(
                            ctx,
                            member.name_span(),
                            format!(
                                "The named argument \"{name}\" does not correspond to any parameter."
                            ),
                        );
                        return on_fail.status;
                    };
                    if argument_index_by_parameter[parameter_index] != -1 {
                        on_fail.emit(
                            ctx,
                            member.name_span(),
                            format!(
                                "The named argument \"{name}\" cannot be provided more than once."
                            ),
                        );
                        return on_fail.status;
                    }
                    argument_index_by_parameter[parameter_index] = argument_index as i32;
                    let Some(value) = member.value() else {
                        continue;
                    };
                    let status = self.parameters[parameter_index]
                        .matcher
                        .match_value(value, frame, ctx, on_fail);
                    if status != ProcessingStatus::Ok {
                        return status;
                    }
                }
            }
        }
        ProcessingStatus::Ok
    }
}

/// Matches a call that accepts no parameters: every argument other than
/// a (possibly empty) forwarded pack is an error.
pub fn match_empty_pack<'a>(
    members: &'a [GroupMember<'a>],
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
    on_fail: &MatchFail,
) -> ProcessingStatus {
    let mut result = ProcessingStatus::Ok;
    for member in members {
        if member.kind() == MemberKind::Ellipsis {
            let Some((arguments, content_frame)) = enclosing_arguments(ctx, frame) else {
                continue;
            };
            let status = match_empty_pack(arguments, content_frame, ctx, on_fail);
            if status != ProcessingStatus::Ok {
                return status;
            }
        } else {
            on_fail.emit(
                ctx,
                member.span(),
                "This argument does not match any parameter (no parameters are accepted).".into(),
            );
            if on_fail.status == ProcessingStatus::Fatal {
                return on_fail.status;
            }
            result = on_fail.status;
        }
    }
    result
}

/// Collects a pack of positional values, expanding ellipses. Named
/// members are not permitted.
#[derive(Debug, Default)]
pub struct ValuePackMatcher<'a> {
    values: Vec<(Value<'a>, FileSpan)>,
}

impl<'a> ValuePackMatcher<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[(Value<'a>, FileSpan)] {
        &self.values
    }

    pub fn match_pack(
        &mut self,
        members: &'a [GroupMember<'a>],
        frame: FrameIndex,
        ctx: &mut Context<'a, '_>,
        on_fail: &MatchFail,
    ) -> ProcessingStatus {
        for member in members {
            match member.kind() {
                MemberKind::Positional => {
                    let Some(value) = member.value() else {
                        continue;
                    };
                    match eval::evaluate_member_value(value, frame, ctx) {
                        Ok(value) => self.values.push((value, member.span())),
                        Err(status) => return status.max(on_fail.status),
                    }
                }
                MemberKind::Named => {
                    on_fail.emit(
                        ctx,
                        member.name_span(),
                        "A pack of values was expected here. Named arguments cannot be provided."
                            .into(),
                    );
                    return on_fail.status;
                }
                MemberKind::Ellipsis => {
                    let Some((arguments, content_frame)) = enclosing_arguments(ctx, frame) else {
                        continue;
                    };
                    let status = self.match_pack(arguments, content_frame, ctx, on_fail);
                    if status != ProcessingStatus::Ok {
                        return status;
                    }
                }
            }
        }
        ProcessingStatus::Ok
    }

    pub fn match_call(
        &mut self,
        call: &Invocation<'a>,
        ctx: &mut Context<'a, '_>,
        on_fail_status: ProcessingStatus,
    ) -> ProcessingStatus {
        let on_fail = MatchFail {
            status: on_fail_status,
            ..MatchFail::error(call.arguments_span)
        };
        self.match_pack(call.arguments, call.content_frame, ctx, &on_fail)
    }
}

/// Captures a whole argument list lazily, with its frame.
#[derive(Debug, Default)]
pub struct GroupLazyMatcher<'a> {
    captured: Option<(&'a [GroupMember<'a>], FrameIndex)>,
}

impl<'a> GroupLazyMatcher<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<(&'a [GroupMember<'a>], FrameIndex)> {
        self.captured
    }

    pub fn match_call(&mut self, call: &Invocation<'a>) -> ProcessingStatus {
        self.captured = Some((call.arguments, call.content_frame));
        ProcessingStatus::Ok
    }

    pub fn was_matched(&self) -> bool {
        self.captured.is_some()
    }
}
