//! The builtin directives of the engine itself.
//!
//! This is deliberately not a document-formatting vocabulary: the
//! builtins here are the ones the processing engine needs to be a
//! language — macro definition and expansion, aliasing, programmatic
//! invocation, section redirection, paragraph control, highlight
//! capture, and error placeholders. User-defined macros and aliases are
//! looked up before any of these names.

mod alias;
mod code;
mod error;
mod invoke;
mod macros;
mod paragraphs;
mod sections;
mod vars;

use cowel_base::ProcessingStatus;

use crate::context::Context;
use crate::policy::ContentPolicy;
use crate::stack::{FrameBehavior, Invocation};

pub use macros::splice_put;

/// One builtin directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinDirective {
    /// `\cowel_macro(name){body}` — defines a macro.
    Macro,
    /// `\cowel_alias(names...){target}` — registers alias names.
    Alias,
    /// `\cowel_invoke(name, args...){content}` — invokes by computed name.
    Invoke,
    /// `\cowel_put` / `\cowel_put(index)` / `\cowel_put(name)` — inserts
    /// the enclosing macro call's content or arguments.
    Put,
    /// `\error{...}` — a visible error placeholder.
    Error,
    /// `\cowel_here(section)` — references a section's content here.
    Here,
    /// `\cowel_there(section){content}` — appends content to a section.
    There,
    /// `\cowel_paragraphs{content}` — content participates in the
    /// surrounding paragraph splitting.
    Paragraphs,
    /// `\cowel_paragraph_enter` — opens a paragraph.
    ParagraphEnter,
    /// `\cowel_paragraph_leave` — closes a paragraph.
    ParagraphLeave,
    /// `\cowel_code(lang){content}` — syntax-highlighted code.
    Code,
    /// `\cowel_var_let(name, value)` — defines a captured variable.
    VarLet,
}

/// Looks up a builtin by name.
pub fn builtin(name: &str) -> Option<BuiltinDirective> {
    use BuiltinDirective::*;
    let directive = match name {
        "cowel_macro" => Macro,
        "cowel_alias" => Alias,
        "cowel_invoke" => Invoke,
        "cowel_put" => Put,
        "error" => Error,
        "cowel_here" => Here,
        "cowel_there" => There,
        "cowel_paragraphs" => Paragraphs,
        "cowel_paragraph_enter" => ParagraphEnter,
        "cowel_paragraph_leave" => ParagraphLeave,
        "cowel_code" => Code,
        "cowel_var_let" => VarLet,
        _ => return None,
    };
    Some(directive)
}

impl BuiltinDirective {
    pub fn frame_behavior(self) -> FrameBehavior {
        match self {
            BuiltinDirective::Macro | BuiltinDirective::Alias => FrameBehavior::Alias,
            BuiltinDirective::VarLet => FrameBehavior::Evaluator,
            _ => FrameBehavior::Generative,
        }
    }
}

/// Runs a builtin's effect against the current content policy.
pub fn splice_builtin<'a>(
    builtin: BuiltinDirective,
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    match builtin {
        BuiltinDirective::Macro => macros::define_macro(out, call, ctx),
        BuiltinDirective::Alias => alias::define_alias(call, ctx),
        BuiltinDirective::Invoke => invoke::splice_invoke(out, call, ctx),
        BuiltinDirective::Put => macros::splice_put(out, call, ctx),
        BuiltinDirective::Error => error::splice_error(out, call, ctx),
        BuiltinDirective::Here => sections::splice_here(out, call, ctx),
        BuiltinDirective::There => sections::splice_there(out, call, ctx),
        BuiltinDirective::Paragraphs => paragraphs::splice_paragraphs(out, call, ctx),
        BuiltinDirective::ParagraphEnter => paragraphs::splice_paragraph_enter(out, call, ctx),
        BuiltinDirective::ParagraphLeave => paragraphs::splice_paragraph_leave(out, call, ctx),
        BuiltinDirective::Code => code::splice_code(out, call, ctx),
        BuiltinDirective::VarLet => vars::define_variable(call, ctx),
    }
}
