//! The call stack and the invocation model.
//!
//! Every directive invocation pushes one [`StackFrame`]. Frames are
//! addressed by plain integer [`FrameIndex`]es into the stack vector,
//! never by pointers; the stack is append/pop only within evaluation, so
//! indices stay valid for the lifetime of a value's evaluation.
//!
//! The distinction between the two frame fields of an [`Invocation`]
//! carries the whole macro model:
//!
//! - `content_frame` is the frame in which the invocation's arguments
//!   and content were *written*. All content in a macro body shares the
//!   macro invocation's frame, like locals share a function's frame.
//! - `call_frame` is the new frame formed by this invocation.
//!
//! An ellipsis member resolves against the arguments of the frame its
//! *own* argument list was written in, which is what makes forwarding
//! through nested macro expansions come out right.

use std::borrow::Cow;

use cowel_base::FileSpan;
use cowel_syntax::ast::{Directive, GroupMember, MarkupElement, Primary};

/// An index into the call stack. The document top level, outside any
/// invocation, is [`FrameIndex::ROOT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndex(pub i32);

impl FrameIndex {
    /// Top-level content, outside any invocation.
    pub const ROOT: FrameIndex = FrameIndex(-1);

    pub fn is_root(self) -> bool {
        self.0 < 0
    }
}

/// What kind of behavior a frame is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBehavior {
    /// Emits into the current content policy.
    Generative,
    /// Produces a `Value`.
    Evaluator,
    /// Registers a new directive name.
    Alias,
    /// Substitutes its definition body.
    Macro,
}

/// One directive invocation, as seen by parameter matching and by the
/// invoked behavior.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    /// The name the directive was invoked under. For `\x` this is `x`;
    /// for `\cowel_invoke(x)` it is also `x`, computed at runtime.
    pub name: Cow<'a, str>,
    /// The directive responsible for the invocation. Not necessarily a
    /// directive whose own name matches `name`.
    pub directive: &'a Directive<'a>,
    /// The argument members of this invocation. A programmatic caller
    /// may pass a subset of the syntactic members.
    pub arguments: &'a [GroupMember<'a>],
    /// Where to point diagnostics about the argument list.
    pub arguments_span: FileSpan,
    /// The content block, if any.
    pub content: Option<&'a Primary<'a>>,
    /// The frame the arguments and content were written in.
    pub content_frame: FrameIndex,
    /// The frame formed by this invocation.
    pub call_frame: FrameIndex,
}

impl<'a> Invocation<'a> {
    /// An invocation of `directive` as written in the source ("direct
    /// call"), with content written in `content_frame`.
    pub fn direct(directive: &'a Directive<'a>, content_frame: FrameIndex) -> Invocation<'a> {
        Invocation {
            name: Cow::Borrowed(directive.name()),
            directive,
            arguments: directive.argument_members(),
            arguments_span: directive
                .arguments()
                .map_or(directive.name_span(), Primary::span),
            content: directive.content(),
            content_frame,
            call_frame: FrameIndex::ROOT,
        }
    }

    pub fn has_arguments(&self) -> bool {
        !self.arguments.is_empty()
    }

    pub fn content_elements(&self) -> &'a [MarkupElement<'a>] {
        self.content.map_or(&[], Primary::elements)
    }

    pub fn content_span(&self) -> FileSpan {
        self.content.map_or(self.directive.span(), Primary::span)
    }
}

/// One entry of the call stack.
#[derive(Debug, Clone)]
pub struct StackFrame<'a> {
    pub behavior: FrameBehavior,
    pub invocation: Invocation<'a>,
}

/// The evaluation call stack.
#[derive(Debug, Default)]
pub struct CallStack<'a> {
    frames: Vec<StackFrame<'a>>,
}

impl<'a> CallStack<'a> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Pushes a frame; its index becomes the invocation's `call_frame`.
    pub fn push(&mut self, behavior: FrameBehavior, mut invocation: Invocation<'a>) -> FrameIndex {
        let index = FrameIndex(self.frames.len() as i32);
        invocation.call_frame = index;
        self.frames.push(StackFrame {
            behavior,
            invocation,
        });
        index
    }

    pub fn pop(&mut self) {
        debug_assert!(!self.frames.is_empty());
        self.frames.pop();
    }

    pub fn get(&self, index: FrameIndex) -> Option<&StackFrame<'a>> {
        if index.is_root() {
            return None;
        }
        self.frames.get(index.0 as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// The index of the topmost frame, or [`FrameIndex::ROOT`] when the
    /// stack is empty.
    pub fn top_index(&self) -> FrameIndex {
        FrameIndex(self.frames.len() as i32 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowel_base::FileId;

    #[test]
    fn root_index_is_negative() {
        assert!(FrameIndex::ROOT.is_root());
        assert!(!FrameIndex(0).is_root());
    }

    #[test]
    fn push_assigns_call_frames_in_order() {
        let (elements, success) = cowel_syntax::parse("\\a{\\b}", FileId::MAIN, &mut |_, _, _| {});
        assert!(success);
        let a = elements[0].as_directive().unwrap();

        let mut stack = CallStack::new();
        assert_eq!(stack.top_index(), FrameIndex::ROOT);
        assert!(stack.get(FrameIndex::ROOT).is_none());

        let first = stack.push(FrameBehavior::Generative, Invocation::direct(a, FrameIndex::ROOT));
        assert_eq!(first, FrameIndex(0));
        assert_eq!(stack.get(first).unwrap().invocation.call_frame, first);

        let second = stack.push(FrameBehavior::Macro, Invocation::direct(a, first));
        assert_eq!(second, FrameIndex(1));
        assert_eq!(stack.get(second).unwrap().invocation.content_frame, first);

        stack.pop();
        stack.pop();
        assert!(stack.is_empty());
    }
}
