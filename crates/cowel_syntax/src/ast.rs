//! The typed AST produced by the parser.
//!
//! The tree is built once and never mutated afterwards. Every node borrows
//! its source text (zero-copy) and carries a [`FileSpan`], so concatenating
//! the source of a document's top-level elements reproduces the input.
//!
//! There are two node families:
//!
//! - [`Primary`] — everything that is not a directive: literals, text,
//!   escapes, comments, quoted strings, blocks, and groups.
//! - [`Directive`] — a `\name(arguments){content}` invocation.
//!
//! A [`MarkupElement`] is either of the two; a [`GroupMember`] is one
//! positional, named, or ellipsis entry of a parenthesized group.

use cowel_base::{FileSpan, StringKind};

/// The kind of a [`Primary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKind {
    Unit,
    Null,
    Bool,
    Int,
    DecimalFloat,
    Infinity,
    UnquotedString,
    QuotedString,
    Block,
    Group,
    Text,
    Escape,
    Comment,
}

impl PrimaryKind {
    /// Returns `true` iff this kind is a value: something that can be
    /// passed around within the scripting sublanguage and to directives.
    ///
    /// Markup elements like text or comments are not values.
    pub fn is_value(self) -> bool {
        use PrimaryKind::*;
        !matches!(self, Text | Escape | Comment)
    }

    /// Returns `true` iff this kind can be spliced into markup.
    ///
    /// Groups are values but cannot be spliced.
    pub fn is_spliceable(self) -> bool {
        self != PrimaryKind::Group
    }

    /// Returns `true` iff this kind is a value that can be spliced.
    pub fn is_spliceable_value(self) -> bool {
        self.is_value() && self.is_spliceable()
    }

    pub fn display_name(self) -> &'static str {
        use PrimaryKind::*;
        match self {
            Unit => "unit",
            Null => "null",
            Bool => "boolean literal",
            Int => "integer literal",
            DecimalFloat => "floating-point literal",
            Infinity => "infinity",
            UnquotedString => "unquoted string",
            QuotedString => "quoted string",
            Block => "block",
            Group => "group",
            Text => "text",
            Escape => "escape",
            Comment => "comment",
        }
    }
}

/// A parsed integer literal.
///
/// Values representable as `i128` take the fast path; larger literals keep
/// `value == 0` with `in_range == false`, and consumers that need the
/// exact value re-parse the preserved source text at arbitrary precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInt {
    pub value: i128,
    pub in_range: bool,
}

/// How a float literal survived parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatStatus {
    /// `value` holds the (possibly rounded) value.
    Ok,
    /// Floating-point overflow; `value` holds correctly signed infinity.
    Overflow,
    /// Floating-point underflow; `value` holds correctly signed zero.
    Underflow,
}

/// A parsed float literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedFloat {
    pub value: f64,
    pub status: FloatStatus,
}

/// Kind-dependent payload of a [`Primary`].
#[derive(Debug, Clone, PartialEq)]
enum Extra<'a> {
    None,
    /// Length of a comment's terminator suffix (0, 1, or 2 bytes).
    CommentSuffix(usize),
    Int(ParsedInt),
    Float(ParsedFloat),
    /// Markup elements of a block or quoted string.
    Elements(Vec<MarkupElement<'a>>),
    /// Members of a group.
    Members(Vec<GroupMember<'a>>),
}

/// Any AST node that is not a directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Primary<'a> {
    kind: PrimaryKind,
    string_kind: StringKind,
    span: FileSpan,
    source: &'a str,
    extra: Extra<'a>,
}

impl<'a> Primary<'a> {
    /// Creates a node with no payload: literals, text, escapes, strings.
    pub fn basic(kind: PrimaryKind, span: FileSpan, source: &'a str) -> Self {
        debug_assert!(!matches!(
            kind,
            PrimaryKind::Int
                | PrimaryKind::DecimalFloat
                | PrimaryKind::Block
                | PrimaryKind::QuotedString
                | PrimaryKind::Group
                | PrimaryKind::Comment
        ));
        Self {
            kind,
            string_kind: StringKind::classify(source),
            span,
            source,
            extra: Extra::None,
        }
    }

    pub fn integer(span: FileSpan, source: &'a str, value: ParsedInt) -> Self {
        Self {
            kind: PrimaryKind::Int,
            string_kind: StringKind::Ascii,
            span,
            source,
            extra: Extra::Int(value),
        }
    }

    pub fn floating(span: FileSpan, source: &'a str, value: ParsedFloat) -> Self {
        Self {
            kind: PrimaryKind::DecimalFloat,
            string_kind: StringKind::Ascii,
            span,
            source,
            extra: Extra::Float(value),
        }
    }

    pub fn comment(span: FileSpan, source: &'a str, suffix_length: usize) -> Self {
        Self {
            kind: PrimaryKind::Comment,
            string_kind: StringKind::classify(source),
            span,
            source,
            extra: Extra::CommentSuffix(suffix_length),
        }
    }

    pub fn quoted_string(
        span: FileSpan,
        source: &'a str,
        elements: Vec<MarkupElement<'a>>,
    ) -> Self {
        Self {
            kind: PrimaryKind::QuotedString,
            string_kind: StringKind::classify(source),
            span,
            source,
            extra: Extra::Elements(elements),
        }
    }

    pub fn block(span: FileSpan, source: &'a str, elements: Vec<MarkupElement<'a>>) -> Self {
        Self {
            kind: PrimaryKind::Block,
            string_kind: StringKind::classify(source),
            span,
            source,
            extra: Extra::Elements(elements),
        }
    }

    pub fn group(span: FileSpan, source: &'a str, members: Vec<GroupMember<'a>>) -> Self {
        Self {
            kind: PrimaryKind::Group,
            string_kind: StringKind::classify(source),
            span,
            source,
            extra: Extra::Members(members),
        }
    }

    pub fn kind(&self) -> PrimaryKind {
        self.kind
    }

    pub fn string_kind(&self) -> StringKind {
        self.string_kind
    }

    pub fn span(&self) -> FileSpan {
        self.span
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn is_value(&self) -> bool {
        self.kind.is_value()
    }

    pub fn is_spliceable(&self) -> bool {
        self.kind.is_spliceable()
    }

    pub fn is_spliceable_value(&self) -> bool {
        self.kind.is_spliceable_value()
    }

    /// The value of a boolean literal. Meaningful only for [`PrimaryKind::Bool`].
    pub fn bool_value(&self) -> bool {
        debug_assert_eq!(self.kind, PrimaryKind::Bool);
        self.source == "true"
    }

    pub fn int_value(&self) -> Option<ParsedInt> {
        match self.extra {
            Extra::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn float_value(&self) -> Option<ParsedFloat> {
        match self.extra {
            Extra::Float(v) => Some(v),
            _ => None,
        }
    }

    /// The escaped characters of an escape, without the backslash.
    pub fn escaped(&self) -> &'a str {
        debug_assert_eq!(self.kind, PrimaryKind::Escape);
        &self.source[1..]
    }

    /// The span covering the escaped characters.
    pub fn escaped_span(&self) -> FileSpan {
        debug_assert_eq!(self.kind, PrimaryKind::Escape);
        self.span.to_right(1)
    }

    /// The terminator suffix of a comment: empty for EOF-terminated line
    /// comments, otherwise the LF/CRLF (line) or `*\` (block).
    pub fn comment_suffix(&self) -> &'a str {
        &self.source[self.source.len() - self.comment_suffix_length()..]
    }

    pub fn comment_suffix_length(&self) -> usize {
        match self.extra {
            Extra::CommentSuffix(n) => n,
            _ => 0,
        }
    }

    /// The text of a comment, excluding the two-byte prefix and the suffix.
    pub fn comment_text(&self) -> &'a str {
        debug_assert_eq!(self.kind, PrimaryKind::Comment);
        &self.source[2..self.source.len() - self.comment_suffix_length()]
    }

    /// Child markup elements of a block or quoted string; empty otherwise.
    pub fn elements(&self) -> &[MarkupElement<'a>] {
        match &self.extra {
            Extra::Elements(elements) => elements,
            _ => &[],
        }
    }

    /// Members of a group; empty otherwise.
    pub fn members(&self) -> &[GroupMember<'a>] {
        match &self.extra {
            Extra::Members(members) => members,
            _ => &[],
        }
    }
}

/// A `\name(arguments){content}` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive<'a> {
    span: FileSpan,
    source: &'a str,
    name: &'a str,
    has_ellipsis: bool,
    arguments: Option<Box<Primary<'a>>>,
    content: Option<Box<Primary<'a>>>,
}

impl<'a> Directive<'a> {
    pub fn new(
        span: FileSpan,
        source: &'a str,
        name: &'a str,
        arguments: Option<Primary<'a>>,
        content: Option<Primary<'a>>,
    ) -> Self {
        debug_assert!(arguments
            .as_ref()
            .map_or(true, |a| a.kind() == PrimaryKind::Group));
        debug_assert!(content
            .as_ref()
            .map_or(true, |c| c.kind() == PrimaryKind::Block));
        let has_ellipsis = arguments.as_ref().map_or(false, |args| {
            args.members()
                .iter()
                .any(|m| m.kind() == MemberKind::Ellipsis)
        });
        Self {
            span,
            source,
            name,
            has_ellipsis,
            arguments: arguments.map(Box::new),
            content: content.map(Box::new),
        }
    }

    pub fn span(&self) -> FileSpan {
        self.span
    }

    /// The source code of this directive, including the leading backslash.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// The name of the directive, not including the leading backslash.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The span of the name, including the leading backslash.
    pub fn name_span(&self) -> FileSpan {
        self.span.with_length(1 + self.name.len())
    }

    /// Whether any argument member is an ellipsis.
    pub fn has_ellipsis(&self) -> bool {
        self.has_ellipsis
    }

    pub fn arguments(&self) -> Option<&Primary<'a>> {
        self.arguments.as_deref()
    }

    pub fn content(&self) -> Option<&Primary<'a>> {
        self.content.as_deref()
    }

    /// The argument members, or an empty slice when no group was written.
    pub fn argument_members(&self) -> &[GroupMember<'a>] {
        self.arguments.as_deref().map_or(&[], Primary::members)
    }

    /// The content elements, or an empty slice when no block was written.
    pub fn content_elements(&self) -> &[MarkupElement<'a>] {
        self.content.as_deref().map_or(&[], Primary::elements)
    }
}

/// How a [`GroupMember`] binds to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Positional,
    Named,
    Ellipsis,
}

/// The value of a group member: a primary or a nested directive.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberValue<'a> {
    Primary(Primary<'a>),
    Directive(Directive<'a>),
}

impl<'a> MemberValue<'a> {
    pub fn span(&self) -> FileSpan {
        match self {
            MemberValue::Primary(p) => p.span(),
            MemberValue::Directive(d) => d.span(),
        }
    }

    pub fn source(&self) -> &'a str {
        match self {
            MemberValue::Primary(p) => p.source(),
            MemberValue::Directive(d) => d.source(),
        }
    }

    pub fn as_primary(&self) -> Option<&Primary<'a>> {
        match self {
            MemberValue::Primary(p) => Some(p),
            MemberValue::Directive(_) => None,
        }
    }

    pub fn as_directive(&self) -> Option<&Directive<'a>> {
        match self {
            MemberValue::Directive(d) => Some(d),
            MemberValue::Primary(_) => None,
        }
    }

    pub fn is_value(&self) -> bool {
        match self {
            MemberValue::Directive(_) => true,
            MemberValue::Primary(p) => p.is_value(),
        }
    }

    /// Whether this member may be spliced into markup.
    ///
    /// For directives the answer cannot be known before evaluation, so
    /// they are classified optimistically and rejected at splice time if
    /// the evaluated value turns out not to be spliceable.
    pub fn is_spliceable_value(&self) -> bool {
        match self {
            MemberValue::Directive(_) => true,
            MemberValue::Primary(p) => p.is_spliceable_value(),
        }
    }
}

/// One member of a parenthesized group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember<'a> {
    kind: MemberKind,
    span: FileSpan,
    source: &'a str,
    name: Option<Primary<'a>>,
    value: Option<MemberValue<'a>>,
}

impl<'a> GroupMember<'a> {
    pub fn ellipsis(span: FileSpan, source: &'a str) -> Self {
        Self {
            kind: MemberKind::Ellipsis,
            span,
            source,
            name: None,
            value: None,
        }
    }

    pub fn named(
        span: FileSpan,
        source: &'a str,
        name: Primary<'a>,
        value: MemberValue<'a>,
    ) -> Self {
        Self {
            kind: MemberKind::Named,
            span,
            source,
            name: Some(name),
            value: Some(value),
        }
    }

    pub fn positional(span: FileSpan, source: &'a str, value: MemberValue<'a>) -> Self {
        Self {
            kind: MemberKind::Positional,
            span,
            source,
            name: None,
            value: Some(value),
        }
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn span(&self) -> FileSpan {
        self.span
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// The name node of a named member.
    pub fn name(&self) -> Option<&Primary<'a>> {
        self.name.as_ref()
    }

    /// The name text of a named member.
    pub fn name_text(&self) -> Option<&'a str> {
        self.name.as_ref().map(Primary::source)
    }

    pub fn name_span(&self) -> FileSpan {
        self.name.as_ref().map_or(self.span, Primary::span)
    }

    pub fn value(&self) -> Option<&MemberValue<'a>> {
        self.value.as_ref()
    }

    pub fn value_span(&self) -> FileSpan {
        self.value.as_ref().map_or(self.span, MemberValue::span)
    }
}

/// One element of a markup sequence: document roots, block contents, and
/// quoted-string contents are all sequences of these.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupElement<'a> {
    Primary(Primary<'a>),
    Directive(Directive<'a>),
}

impl<'a> MarkupElement<'a> {
    pub fn span(&self) -> FileSpan {
        match self {
            MarkupElement::Primary(p) => p.span(),
            MarkupElement::Directive(d) => d.span(),
        }
    }

    pub fn source(&self) -> &'a str {
        match self {
            MarkupElement::Primary(p) => p.source(),
            MarkupElement::Directive(d) => d.source(),
        }
    }

    pub fn as_primary(&self) -> Option<&Primary<'a>> {
        match self {
            MarkupElement::Primary(p) => Some(p),
            MarkupElement::Directive(_) => None,
        }
    }

    pub fn as_directive(&self) -> Option<&Directive<'a>> {
        match self {
            MarkupElement::Directive(d) => Some(d),
            MarkupElement::Primary(_) => None,
        }
    }
}
