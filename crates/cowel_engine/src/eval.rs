//! Directive processing: resolution, invocation, splicing, and value
//! evaluation.
//!
//! The invocation protocol is uniform for every directive:
//!
//! 1. Resolve the name (macros and aliases first, then builtins).
//! 2. Push a [`StackFrame`](crate::stack::StackFrame); the new index is
//!    the invocation's call frame.
//! 3. Run the behavior's effect against the current content policy.
//! 4. Pop the frame and propagate the status.
//!
//! Failures at step 1 log `directive-lookup.unresolved` and, subject to
//! the error behavior, emit a visible placeholder element.

use cowel_base::diag::ids;
use cowel_base::ProcessingStatus;
use cowel_data::BigInt;
use cowel_syntax::ast::{Directive, MarkupElement, MemberValue, Primary, PrimaryKind};

use crate::context::{Context, Resolved};
use crate::directives;
use crate::policy::{ContentPolicy, OutputLanguage, PlaintextPolicy};
use crate::stack::{FrameBehavior, FrameIndex, Invocation};
use crate::types::Type;
use crate::value::Value;

/// Splices a sequence of markup elements into `out`, evaluating
/// directives in `frame`.
///
/// Stops early on `Brk`-like and `Fatal` statuses; recoverable errors
/// accumulate and processing continues.
pub fn splice_all<'a>(
    out: &mut dyn ContentPolicy<'a>,
    elements: &'a [MarkupElement<'a>],
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let mut status = ProcessingStatus::Ok;
    for element in elements {
        let step = match element {
            MarkupElement::Primary(primary) => splice_primary(out, primary, frame, ctx),
            MarkupElement::Directive(directive) => out.consume_directive(directive, frame, ctx),
        };
        status = status.max(step);
        if !step.is_continuable() {
            break;
        }
    }
    status
}

fn splice_primary<'a>(
    out: &mut dyn ContentPolicy<'a>,
    primary: &'a Primary<'a>,
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    match primary.kind() {
        PrimaryKind::Text => out.consume_text(primary, ctx),
        PrimaryKind::Escape => out.consume_escape(primary, ctx),
        PrimaryKind::Comment => out.consume_comment(primary, ctx),
        _ => match evaluate_primary(primary, frame, ctx) {
            Ok(value) => splice_value(out, value, ctx),
            Err(status) => status,
        },
    }
}

/// Resolves and invokes `directive`, writing into `out`.
pub fn apply_behavior<'a>(
    out: &mut dyn ContentPolicy<'a>,
    directive: &'a Directive<'a>,
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let Some(resolved) = ctx.find_directive(directive.name()) else {
        ctx.try_error(
            ids::DIRECTIVE_LOOKUP_UNRESOLVED,
            directive.name_span(),
            format!("No directive named \"{}\" exists.", directive.name()),
        );
        return try_generate_error(out, directive, ctx, ProcessingStatus::Error);
    };
    invoke(out, resolved, Invocation::direct(directive, frame), ctx)
}

/// The deepest supported nesting of directive invocations. Recursive
/// macros hit this long before the native stack runs out.
const MAX_CALL_DEPTH: usize = 1024;

/// Invokes an already-resolved behavior. The invocation's `call_frame`
/// is assigned when its frame is pushed.
pub fn invoke<'a>(
    out: &mut dyn ContentPolicy<'a>,
    resolved: Resolved<'a>,
    invocation: Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    if ctx.stack.len() >= MAX_CALL_DEPTH {
        ctx.try_fatal(
            ids::DIRECTIVE_RECURSION_LIMIT,
            invocation.directive.span(),
            format!("Directive invocations nested deeper than {MAX_CALL_DEPTH} levels."),
        );
        return ProcessingStatus::Fatal;
    }
    let behavior = match resolved {
        Resolved::Builtin(builtin) => builtin.frame_behavior(),
        Resolved::Macro(_) => FrameBehavior::Macro,
    };
    let call_frame = ctx.stack.push(behavior, invocation);
    let call = match ctx.stack.get(call_frame) {
        Some(frame) => frame.invocation.clone(),
        None => return ProcessingStatus::Fatal,
    };

    let status = match resolved {
        Resolved::Macro(def) => match def.body {
            // The body is evaluated in the macro's own frame, so that
            // ellipsis and `\cowel_put` resolve against this call.
            Some(body) => splice_all(out, body.elements(), call.call_frame, ctx),
            None => ProcessingStatus::Ok,
        },
        Resolved::Builtin(builtin) => directives::splice_builtin(builtin, out, &call, ctx),
    };

    ctx.stack.pop();
    status
}

/// Evaluates a group-member value to a [`Value`].
pub fn evaluate_member_value<'a>(
    member_value: &'a MemberValue<'a>,
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
) -> Result<Value<'a>, ProcessingStatus> {
    match member_value {
        MemberValue::Primary(primary) => evaluate_primary(primary, frame, ctx),
        MemberValue::Directive(directive) => evaluate_directive(directive, frame, ctx),
    }
}

/// Evaluates a primary node to a [`Value`].
pub fn evaluate_primary<'a>(
    primary: &'a Primary<'a>,
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
) -> Result<Value<'a>, ProcessingStatus> {
    match primary.kind() {
        PrimaryKind::Unit => Ok(Value::Unit),
        PrimaryKind::Null => Ok(Value::Null),
        PrimaryKind::Bool => Ok(Value::Bool(primary.bool_value())),
        PrimaryKind::Int => Ok(Value::Int(int_literal_value(primary, ctx))),
        PrimaryKind::DecimalFloat => {
            let parsed = primary.float_value().map_or(0.0, |f| f.value);
            Ok(Value::Float(parsed))
        }
        PrimaryKind::Infinity => {
            let value = if primary.source().starts_with('-') {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
            Ok(Value::Float(value))
        }
        PrimaryKind::UnquotedString => Ok(Value::borrowed_str(primary.source())),
        PrimaryKind::QuotedString => {
            let text = splice_to_plaintext(primary.elements(), frame, ctx)?;
            Ok(Value::owned_str(text))
        }
        PrimaryKind::Block => Ok(Value::Block(primary, frame)),
        PrimaryKind::Group => {
            ctx.try_error(
                ids::TYPE_MISMATCH,
                primary.span(),
                "A group cannot be evaluated to a single value.".into(),
            );
            Err(ProcessingStatus::Error)
        }
        PrimaryKind::Text | PrimaryKind::Escape | PrimaryKind::Comment => {
            ctx.try_error(
                ids::TYPE_MISMATCH,
                primary.span(),
                format!("{} is not a value.", primary.kind().display_name()),
            );
            Err(ProcessingStatus::Error)
        }
    }
}

/// The integer value of an `int` literal, re-parsing the source at
/// arbitrary precision when it exceeded the fast path.
fn int_literal_value<'a>(primary: &Primary<'a>, ctx: &mut Context<'a, '_>) -> BigInt {
    let Some(parsed) = primary.int_value() else {
        return BigInt::zero();
    };
    if parsed.in_range {
        return BigInt::from(parsed.value);
    }
    match big_int_from_literal(primary.source()) {
        Some(value) => value,
        None => {
            ctx.try_error(
                ids::ARITHMETIC_PARSE,
                primary.span(),
                format!("Unable to parse \"{}\" as an integer.", primary.source()),
            );
            BigInt::zero()
        }
    }
}

/// Parses an integer literal in any of the four bases at arbitrary
/// precision.
pub fn big_int_from_literal(text: &str) -> Option<BigInt> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = if let Some(d) = unsigned.strip_prefix("0b") {
        (2, d)
    } else if let Some(d) = unsigned.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = unsigned.strip_prefix("0x") {
        (16, d)
    } else {
        (10, unsigned)
    };
    let magnitude = BigInt::from_str_base(digits, radix)?;
    Some(if negative { -&magnitude } else { magnitude })
}

/// Evaluates a directive in value position by capturing its generated
/// output as plain text.
pub fn evaluate_directive<'a>(
    directive: &'a Directive<'a>,
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
) -> Result<Value<'a>, ProcessingStatus> {
    let mut capture = PlaintextPolicy::new();
    let status = apply_behavior(&mut capture, directive, frame, ctx);
    if status != ProcessingStatus::Ok {
        return Err(status);
    }
    Ok(Value::owned_str(capture.into_string()))
}

/// Splices markup to plain text: directive names, string arguments,
/// quoted-string contents.
pub fn splice_to_plaintext<'a>(
    elements: &'a [MarkupElement<'a>],
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
) -> Result<String, ProcessingStatus> {
    let mut capture = PlaintextPolicy::new();
    let status = splice_all(&mut capture, elements, frame, ctx);
    if status != ProcessingStatus::Ok {
        return Err(status);
    }
    Ok(capture.into_string())
}

/// Renders an already-evaluated value as plain text.
pub fn splice_value_to_plaintext<'a>(
    value: &Value<'a>,
    ctx: &mut Context<'a, '_>,
) -> Result<String, ProcessingStatus> {
    match value {
        Value::Unit => Ok(String::new()),
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Str(text, _) => Ok(text.to_string()),
        Value::Block(block, frame) => splice_to_plaintext(block.elements(), *frame, ctx),
        Value::Directive(directive, frame) => {
            let value = evaluate_directive(directive, *frame, ctx)?;
            splice_value_to_plaintext(&value, ctx)
        }
    }
}

/// Evaluates a member value and renders it as plain text.
pub fn splice_member_to_plaintext<'a>(
    member_value: &'a MemberValue<'a>,
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
) -> Result<String, ProcessingStatus> {
    let value = evaluate_member_value(member_value, frame, ctx)?;
    splice_value_to_plaintext(&value, ctx)
}

/// Splices a value into the current content policy.
pub fn splice_value<'a>(
    out: &mut dyn ContentPolicy<'a>,
    value: Value<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    match value {
        Value::Unit => ProcessingStatus::Ok,
        Value::Null => {
            out.write("null", OutputLanguage::Text);
            ProcessingStatus::Ok
        }
        Value::Bool(b) => {
            out.write(if b { "true" } else { "false" }, OutputLanguage::Text);
            ProcessingStatus::Ok
        }
        Value::Int(i) => {
            out.write(&i.to_string(), OutputLanguage::Text);
            ProcessingStatus::Ok
        }
        Value::Float(f) => {
            out.write(&f.to_string(), OutputLanguage::Text);
            ProcessingStatus::Ok
        }
        Value::Str(text, _) => {
            out.write(&text, OutputLanguage::Text);
            ProcessingStatus::Ok
        }
        Value::Block(block, frame) => splice_all(out, block.elements(), frame, ctx),
        Value::Directive(directive, frame) => out.consume_directive(directive, frame, ctx),
    }
}

/// Splices a group-member value into the current content policy.
///
/// Whether a directive-valued member is spliceable cannot be known
/// statically; it is decided here, after evaluation.
pub fn splice_member_value<'a>(
    out: &mut dyn ContentPolicy<'a>,
    member_value: &'a MemberValue<'a>,
    frame: FrameIndex,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    match member_value {
        MemberValue::Directive(directive) => out.consume_directive(directive, frame, ctx),
        MemberValue::Primary(primary) => match primary.kind() {
            PrimaryKind::Text => out.consume_text(primary, ctx),
            PrimaryKind::Escape => out.consume_escape(primary, ctx),
            PrimaryKind::Comment => out.consume_comment(primary, ctx),
            PrimaryKind::Group => {
                ctx.try_error(
                    ids::TYPE_MISMATCH,
                    primary.span(),
                    "A group cannot be spliced into markup.".into(),
                );
                ProcessingStatus::Error
            }
            _ => match evaluate_primary(primary, frame, ctx) {
                Ok(value) => splice_value(out, value, ctx),
                Err(status) => status,
            },
        },
    }
}

/// The type of a member value as far as analysis alone can tell, without
/// evaluating anything.
pub fn static_type_of(member_value: &MemberValue<'_>) -> Type {
    match member_value {
        // A directive's result type is unknown until evaluated.
        MemberValue::Directive(_) => Type::Any,
        MemberValue::Primary(primary) => static_type_of_primary(primary),
    }
}

fn static_type_of_primary(primary: &Primary<'_>) -> Type {
    match primary.kind() {
        PrimaryKind::Unit => Type::Unit,
        PrimaryKind::Null => Type::Null,
        PrimaryKind::Bool => Type::Bool,
        PrimaryKind::Int => Type::Int,
        PrimaryKind::DecimalFloat | PrimaryKind::Infinity => Type::Float,
        PrimaryKind::UnquotedString | PrimaryKind::QuotedString => Type::Str,
        PrimaryKind::Block => Type::Block,
        PrimaryKind::Group => {
            let members = primary
                .members()
                .iter()
                .map(|member| match member.value() {
                    Some(value) => match member.name() {
                        Some(_) => Type::Named(Box::new(static_type_of(value))),
                        None => static_type_of(value),
                    },
                    // An ellipsis forwards an unknown pack.
                    None => Type::Pack(Box::new(Type::Any)),
                })
                .collect();
            Type::Group(members)
        }
        PrimaryKind::Text | PrimaryKind::Escape | PrimaryKind::Comment => Type::Nothing,
    }
}

/// Emits a visible `\error`-style placeholder for a failed directive,
/// when the error behavior permits it, and returns `status`.
pub fn try_generate_error<'a>(
    out: &mut dyn ContentPolicy<'a>,
    directive: &'a Directive<'a>,
    ctx: &mut Context<'a, '_>,
    status: ProcessingStatus,
) -> ProcessingStatus {
    if ctx.emit_error_placeholders {
        let ok = out.write("<error->", OutputLanguage::Html)
            && out.write(directive.source(), OutputLanguage::Text)
            && out.write("</error->", OutputLanguage::Html);
        if !ok {
            ctx.try_error(
                ids::ERROR_ERROR,
                directive.span(),
                "Unable to generate an error placeholder.".into(),
            );
        }
    }
    status
}

/// Splices document root content: a convenience wrapper used by the
/// generator and by tests.
pub fn splice_root<'a>(
    out: &mut dyn ContentPolicy<'a>,
    elements: &'a [MarkupElement<'a>],
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let status = splice_all(out, elements, FrameIndex::ROOT, ctx);
    // Every paragraph opened at the root must be closed before the
    // document ends.
    out.leave_paragraph();
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowel_base::{FileId, MemoryLogger, Severity};

    use crate::context::Context;
    use crate::highlight::NoHighlighter;
    use crate::loader::NoFileLoader;

    fn parse_elements(source: &'static str) -> Vec<MarkupElement<'static>> {
        let (elements, success) =
            cowel_syntax::parse(source, FileId::MAIN, &mut |id, _, message: String| {
                panic!("unexpected parse error [{id}]: {message}");
            });
        assert!(success);
        elements
    }

    /// Evaluates the first argument of `\x(...)` in `source`.
    macro_rules! eval_first_argument {
        ($source:expr, $value:ident => $body:block) => {
            let elements = parse_elements($source);
            let directive = elements[0].as_directive().expect("expected a directive");
            let member = &directive.argument_members()[0];

            let mut loader = NoFileLoader;
            let mut logger = MemoryLogger::new(Severity::Trace);
            let highlighter = NoHighlighter;
            let mut ctx = Context::new(&mut loader, &mut logger, &highlighter, Severity::Trace);
            let $value = evaluate_member_value(
                member.value().expect("member value"),
                FrameIndex::ROOT,
                &mut ctx,
            )
            .expect("evaluation succeeds");
            $body
        };
    }

    #[test]
    fn literals_evaluate_to_their_values() {
        eval_first_argument!("\\x(true)", value => {
            assert_eq!(value, Value::Bool(true));
        });
        eval_first_argument!("\\x(42)", value => {
            assert_eq!(value, Value::Int(BigInt::from(42)));
        });
        eval_first_argument!("\\x(unit)", value => {
            assert_eq!(value, Value::Unit);
        });
        eval_first_argument!("\\x(null)", value => {
            assert_eq!(value, Value::Null);
        });
        eval_first_argument!("\\x(-infinity)", value => {
            assert_eq!(value.as_float(), Some(f64::NEG_INFINITY));
        });
    }

    #[test]
    fn out_of_range_literals_reparse_at_arbitrary_precision() {
        eval_first_argument!("\\x(170141183460469231731687303715884105728)", value => {
            assert_eq!(value, Value::Int(BigInt::pow2(127)));
        });
    }

    #[test]
    fn hexadecimal_literals_evaluate() {
        eval_first_argument!("\\x(0x2a)", value => {
            assert_eq!(value, Value::Int(BigInt::from(42)));
        });
    }

    #[test]
    fn quoted_strings_evaluate_their_markup() {
        eval_first_argument!("\\x(\"a\\{b\")", value => {
            assert_eq!(value.as_str(), Some("a{b"));
        });
    }

    #[test]
    fn blocks_evaluate_to_lazy_thunks() {
        eval_first_argument!("\\x({later})", value => {
            assert!(matches!(value, Value::Block(_, FrameIndex::ROOT)));
        });
    }

    #[test]
    fn static_types_of_members() {
        let elements = parse_elements("\\x(5, word, {b}, (1, n = 2), \\y)");
        let directive = elements[0].as_directive().expect("expected a directive");
        let types: Vec<Type> = directive
            .argument_members()
            .iter()
            .map(|m| static_type_of(m.value().expect("value")))
            .collect();
        assert_eq!(types[0], Type::Int);
        assert_eq!(types[1], Type::Str);
        assert_eq!(types[2], Type::Block);
        assert_eq!(
            types[3],
            Type::Group(vec![Type::Int, Type::Named(Box::new(Type::Int))])
        );
        // A directive's type is unknown until evaluated.
        assert_eq!(types[4], Type::Any);
    }

    #[test]
    fn big_int_literals_parse_in_every_base() {
        assert_eq!(big_int_from_literal("0b101"), Some(BigInt::from(5)));
        assert_eq!(big_int_from_literal("-0o17"), Some(BigInt::from(-15)));
        assert_eq!(big_int_from_literal("0xff"), Some(BigInt::from(255)));
        assert_eq!(big_int_from_literal("+9"), Some(BigInt::from(9)));
        assert_eq!(big_int_from_literal("zzz"), None);
    }
}
