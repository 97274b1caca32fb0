//! Runtime values of the scripting sublanguage.
//!
//! A [`Value`] is a tagged union. Strings use [`Cow`] so that values
//! sliced straight from the source text carry no allocation, while
//! computed strings own their storage. The `Block` and `Directive`
//! variants are lazy thunks: they carry the frame index at which the
//! captured markup must eventually be evaluated.

use std::borrow::Cow;

use cowel_base::StringKind;
use cowel_data::BigInt;
use cowel_syntax::ast::{Directive, Primary};

use crate::stack::FrameIndex;
use crate::types::Type;

/// A value in the cowel language.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// The only value of the `unit` type; splices to nothing.
    Unit,
    /// The only value of the `null` type.
    Null,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(Cow<'a, str>, StringKind),
    /// A lazy block of markup and the frame to evaluate it in.
    Block(&'a Primary<'a>, FrameIndex),
    /// A lazy directive invocation and the frame to evaluate it in.
    Directive(&'a Directive<'a>, FrameIndex),
}

impl<'a> Value<'a> {
    /// A `str` value borrowing `text`, classifying its content.
    pub fn borrowed_str(text: &'a str) -> Value<'a> {
        Value::Str(Cow::Borrowed(text), StringKind::classify(text))
    }

    /// A `str` value owning `text`, classifying its content.
    pub fn owned_str(text: String) -> Value<'a> {
        let kind = StringKind::classify(&text);
        Value::Str(Cow::Owned(text), kind)
    }

    pub fn type_of(&self) -> Type {
        match self {
            Value::Unit => Type::Unit,
            Value::Null => Type::Null,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Str(..) => Type::Str,
            Value::Block(..) | Value::Directive(..) => Type::Block,
        }
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(..))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text, _) => Some(text),
            _ => None,
        }
    }

    pub fn string_kind(&self) -> StringKind {
        match self {
            Value::Str(_, kind) => *kind,
            _ => StringKind::Unknown,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl PartialEq for Value<'_> {
    /// Values compare by type and content. Blocks and directives are
    /// not equality-comparable and always compare unequal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Str(x, _), Value::Str(y, _)) => x == y,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_of_values() {
        assert_eq!(Value::Unit.type_of(), Type::Unit);
        assert_eq!(Value::Bool(true).type_of(), Type::Bool);
        assert_eq!(Value::Int(BigInt::from(3)).type_of(), Type::Int);
        assert_eq!(Value::borrowed_str("x").type_of(), Type::Str);
    }

    #[test]
    fn string_values_track_content_kind() {
        assert_eq!(Value::borrowed_str("abc").string_kind(), StringKind::Ascii);
        assert_eq!(
            Value::owned_str("αβ".to_string()).string_kind(),
            StringKind::Unicode
        );
    }

    #[test]
    fn equality_by_content() {
        assert_eq!(Value::borrowed_str("x"), Value::owned_str("x".to_string()));
        assert_eq!(Value::Int(BigInt::from(5)), Value::Int(BigInt::from(5)));
        assert_ne!(Value::Int(BigInt::from(5)), Value::Float(5.0));
        assert_ne!(Value::Unit, Value::Null);
    }
}
