//! The cowel type system.
//!
//! Types classify the values of the scripting sublanguage. The basic
//! kinds (`any` through `block`) are leaves; groups, packs, named
//! members, lazies, and unions are compound. Analysis always works on
//! *canonical* types; see [`Type::canonical`] for the normalization
//! rules.
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `any` | The top type, a union of all types. |
//! | `nothing` | The bottom type, an empty type set. |
//! | `unit` | Directives that produce no value; splices to nothing. |
//! | `null` | Errors and absent values; splices as `null`. |
//! | `group` | A product type of named and unnamed members. |
//! | `pack` | A repetition of a member type, only inside groups. |
//! | `lazy` | A lazily evaluated value. |
//! | `union` | A sum type. |

/// The kind of a [`Type`], without its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Any,
    Nothing,
    Unit,
    Null,
    Bool,
    Int,
    Float,
    Str,
    Regex,
    Block,
    Group,
    Pack,
    Named,
    Lazy,
    Union,
}

impl TypeKind {
    /// Basic kinds have no members.
    pub fn is_basic(self) -> bool {
        !self.is_compound()
    }

    pub fn is_compound(self) -> bool {
        matches!(
            self,
            TypeKind::Group | TypeKind::Pack | TypeKind::Named | TypeKind::Lazy | TypeKind::Union
        )
    }

    /// Returns `true` iff a `Value` can hold values of this kind.
    pub fn is_value_holdable(self) -> bool {
        !matches!(
            self,
            TypeKind::Any | TypeKind::Nothing | TypeKind::Union | TypeKind::Pack | TypeKind::Named
        )
    }

    /// Returns `true` iff values of this kind can be spliced into markup.
    pub fn is_spliceable(self) -> bool {
        matches!(
            self,
            TypeKind::Unit
                | TypeKind::Null
                | TypeKind::Bool
                | TypeKind::Int
                | TypeKind::Float
                | TypeKind::Str
                | TypeKind::Block
        )
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TypeKind::Any => "any",
            TypeKind::Nothing => "nothing",
            TypeKind::Unit => "unit",
            TypeKind::Null => "null",
            TypeKind::Bool => "bool",
            TypeKind::Int => "int",
            TypeKind::Float => "float",
            TypeKind::Str => "str",
            TypeKind::Regex => "regex",
            TypeKind::Block => "block",
            TypeKind::Group => "group",
            TypeKind::Pack => "pack",
            TypeKind::Named => "named",
            TypeKind::Lazy => "lazy",
            TypeKind::Union => "union",
        }
    }
}

/// A type in the cowel type system.
///
/// The derived ordering is structural; canonical unions use it to sort
/// their alternatives deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Type {
    Any,
    Nothing,
    Unit,
    Null,
    Bool,
    Int,
    Float,
    Str,
    Regex,
    Block,
    Group(Vec<Type>),
    Pack(Box<Type>),
    Named(Box<Type>),
    Lazy(Box<Type>),
    Union(Vec<Type>),
}

impl Type {
    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Any => TypeKind::Any,
            Type::Nothing => TypeKind::Nothing,
            Type::Unit => TypeKind::Unit,
            Type::Null => TypeKind::Null,
            Type::Bool => TypeKind::Bool,
            Type::Int => TypeKind::Int,
            Type::Float => TypeKind::Float,
            Type::Str => TypeKind::Str,
            Type::Regex => TypeKind::Regex,
            Type::Block => TypeKind::Block,
            Type::Group(_) => TypeKind::Group,
            Type::Pack(_) => TypeKind::Pack,
            Type::Named(_) => TypeKind::Named,
            Type::Lazy(_) => TypeKind::Lazy,
            Type::Union(_) => TypeKind::Union,
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.kind().display_name()
    }

    pub fn is_spliceable(&self) -> bool {
        self.kind().is_spliceable()
    }

    /// Normalizes this type:
    ///
    /// - A pack or named member of `nothing` collapses to `nothing`;
    ///   packs of packs flatten.
    /// - A group containing `nothing` collapses to `nothing`.
    /// - Unions are flattened, deduplicated, and sorted; a union
    ///   containing `any` is `any`; an empty union is `nothing`; a
    ///   singleton union is its member.
    pub fn canonical(self) -> Type {
        match self {
            Type::Pack(member) => match member.canonical() {
                Type::Nothing => Type::Nothing,
                Type::Pack(inner) => Type::Pack(inner),
                member => Type::Pack(Box::new(member)),
            },
            Type::Named(member) => match member.canonical() {
                Type::Nothing => Type::Nothing,
                member => Type::Named(Box::new(member)),
            },
            Type::Lazy(member) => Type::Lazy(Box::new(member.canonical())),
            Type::Group(members) => {
                let mut canonical_members = Vec::with_capacity(members.len());
                for member in members {
                    let member = member.canonical();
                    if member == Type::Nothing {
                        return Type::Nothing;
                    }
                    canonical_members.push(member);
                }
                Type::Group(canonical_members)
            }
            Type::Union(alternatives) => {
                let mut flat = Vec::new();
                if flatten_union(alternatives, &mut flat) {
                    return Type::Any;
                }
                flat.sort();
                flat.dedup();
                match flat.len() {
                    0 => Type::Nothing,
                    1 => flat.into_iter().next().unwrap_or(Type::Nothing),
                    _ => Type::Union(flat),
                }
            }
            basic => basic,
        }
    }

    /// Whether a value of this type is known, by analysis alone, to be
    /// usable where `target` is expected. Both types must be canonical.
    ///
    /// `nothing` converts to everything (bottom); everything converts to
    /// `any`; lazy and named wrappers are transparent; a union converts
    /// when all of its alternatives do, and converts *to* a union when
    /// any alternative accepts it.
    pub fn analytically_convertible_to(&self, target: &Type) -> bool {
        if self == target || *target == Type::Any || *self == Type::Nothing {
            return true;
        }
        match (self, target) {
            (Type::Union(alternatives), _) => alternatives
                .iter()
                .all(|alt| alt.analytically_convertible_to(target)),
            (_, Type::Union(alternatives)) => alternatives
                .iter()
                .any(|alt| self.analytically_convertible_to(alt)),
            (Type::Lazy(member), _) => member.analytically_convertible_to(target),
            (_, Type::Lazy(member)) => self.analytically_convertible_to(member),
            (Type::Named(member), _) => member.analytically_convertible_to(target),
            (_, Type::Named(member)) => self.analytically_convertible_to(member),
            (Type::Pack(member), Type::Pack(target_member)) => {
                member.analytically_convertible_to(target_member)
            }
            (Type::Group(members), Type::Group(target_members)) => {
                members.len() == target_members.len()
                    && members
                        .iter()
                        .zip(target_members)
                        .all(|(m, t)| m.analytically_convertible_to(t))
            }
            _ => false,
        }
    }
}

/// Flattens nested unions into `out`; returns `true` if `any` occurs.
fn flatten_union(alternatives: Vec<Type>, out: &mut Vec<Type>) -> bool {
    for alternative in alternatives {
        match alternative.canonical() {
            Type::Any => return true,
            Type::Union(nested) => {
                // Already canonical, so one level deep at most.
                for t in nested {
                    if t == Type::Any {
                        return true;
                    }
                    out.push(t);
                }
            }
            other => out.push(other),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn union(types: Vec<Type>) -> Type {
        Type::Union(types).canonical()
    }

    #[test]
    fn pack_of_nothing_collapses() {
        assert_eq!(Type::Pack(Box::new(Type::Nothing)).canonical(), Type::Nothing);
        assert_eq!(Type::Named(Box::new(Type::Nothing)).canonical(), Type::Nothing);
    }

    #[test]
    fn pack_of_pack_flattens() {
        let nested = Type::Pack(Box::new(Type::Pack(Box::new(Type::Int))));
        assert_eq!(nested.canonical(), Type::Pack(Box::new(Type::Int)));
    }

    #[test]
    fn group_containing_nothing_collapses() {
        let group = Type::Group(vec![Type::Int, Type::Nothing, Type::Str]);
        assert_eq!(group.canonical(), Type::Nothing);
    }

    #[test]
    fn union_flattens_dedupes_and_sorts() {
        let u = union(vec![
            Type::Str,
            Type::Union(vec![Type::Int, Type::Str]),
            Type::Int,
        ]);
        assert_eq!(u, Type::Union(vec![Type::Int, Type::Str]));
    }

    #[test]
    fn union_with_any_is_any() {
        assert_eq!(union(vec![Type::Int, Type::Any]), Type::Any);
    }

    #[test]
    fn empty_union_is_nothing() {
        assert_eq!(union(vec![]), Type::Nothing);
    }

    #[test]
    fn singleton_union_is_member() {
        assert_eq!(union(vec![Type::Bool]), Type::Bool);
    }

    #[test]
    fn nothing_is_bottom() {
        assert!(Type::Nothing.analytically_convertible_to(&Type::Int));
        assert!(Type::Nothing.analytically_convertible_to(&Type::Nothing));
    }

    #[test]
    fn any_is_top() {
        assert!(Type::Int.analytically_convertible_to(&Type::Any));
        assert!(!Type::Any.analytically_convertible_to(&Type::Int));
    }

    #[test]
    fn union_conversion_rules() {
        let int_or_str = union(vec![Type::Int, Type::Str]);
        assert!(Type::Int.analytically_convertible_to(&int_or_str));
        assert!(int_or_str.analytically_convertible_to(&Type::Any));
        assert!(!int_or_str.analytically_convertible_to(&Type::Int));
        let sub = union(vec![Type::Int, Type::Str]);
        assert!(sub.analytically_convertible_to(&union(vec![
            Type::Bool,
            Type::Int,
            Type::Str
        ])));
    }

    #[test]
    fn lazy_is_transparent() {
        let lazy_int = Type::Lazy(Box::new(Type::Int));
        assert!(lazy_int.analytically_convertible_to(&Type::Int));
        assert!(Type::Int.analytically_convertible_to(&lazy_int));
    }

    #[test]
    fn spliceability() {
        assert!(Type::Str.is_spliceable());
        assert!(Type::Block.is_spliceable());
        assert!(!Type::Group(vec![]).is_spliceable());
        assert!(!Type::Regex.is_spliceable());
        assert!(!Type::Any.is_spliceable());
    }
}
