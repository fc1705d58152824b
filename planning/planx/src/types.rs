use crate::utils::disp_iter;
use crate::*;
use smallvec::{SmallVec, smallvec};
use std::fmt::{Debug, Display};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypeError {
    #[error("unknown type `{0}`")]
    UnknownType(Sym),
    #[error("type `{0}` is its own ancestor")]
    CyclicType(Sym),
}

/// Name of the root of every type hierarchy.
pub const OBJECT_TYPE: &str = "object";

/// A single-rooted hierarchy of user types.
///
/// Types may have several parents (a PDDL type declared as `t - (either a b)`), every chain of parents ends in
/// the root type `object`.
#[derive(Clone, Debug)]
pub struct TypeHierarchy {
    top_type: Sym,
    /// Associates each known type with its direct parents
    types: hashbrown::HashMap<Sym, Vec<Sym>>,
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHierarchy {
    pub fn new() -> Self {
        let top_type = Sym::from(OBJECT_TYPE);
        let mut types = hashbrown::HashMap::new();
        types.insert(top_type.clone(), Vec::new());
        Self { top_type, types }
    }

    pub fn top_type(&self) -> &Sym {
        &self.top_type
    }

    /// Reflexive-transitive is-a relation on user types.
    pub fn is_subtype_of(&self, a: &Sym, b: &Sym) -> bool {
        if a == b || b == &self.top_type {
            true
        } else if let Some(parents) = self.types.get(a) {
            parents.iter().any(|parent| self.is_subtype_of(parent, b))
        } else {
            false
        }
    }

    /// Returns true if a value of type `a` is also a value of type `b`:
    /// each alternative of `a` must be a subtype of some alternative of `b`.
    pub fn is_type_of(&self, a: &Type, b: &Type) -> bool {
        a.union.iter().all(|t| b.union.iter().any(|t2| self.is_subtype_of(t, t2)))
    }

    pub fn contains(&self, name: &Sym) -> bool {
        self.types.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sym> + '_ {
        self.types.keys()
    }

    /// Records a new type with the given parent (the root type if none is given).
    /// If the parent is not recorded yet, it is created as a child of the root type.
    /// If the type already exists, a new parent is added (multiple inheritance).
    pub fn add_type(&mut self, tpe: impl Into<Sym>, parent: Option<Sym>) -> Result<(), TypeError> {
        let tpe = tpe.into();
        let parent = parent.unwrap_or_else(|| self.top_type.clone());
        if tpe == self.top_type {
            // redeclaration of the root type: only allowed without a parent
            return if parent == self.top_type {
                Ok(())
            } else {
                Err(TypeError::CyclicType(tpe))
            };
        }
        if tpe == parent || (self.types.contains_key(&tpe) && self.is_subtype_of(&parent, &tpe)) {
            return Err(TypeError::CyclicType(tpe));
        }
        if !self.types.contains_key(&parent) {
            self.types.insert(parent.clone(), vec![self.top_type.clone()]);
        }
        let parents = self.types.entry(tpe).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
        Ok(())
    }

    /// Builds the type from the given alternatives, failing if one of them is not declared.
    /// An empty set of alternatives is interpreted as the root type.
    pub fn get_union_type(&self, alternatives: &[Sym]) -> Result<Type, TypeError> {
        if alternatives.is_empty() {
            return Ok(Type::new(self.top_type.clone()));
        }
        let mut union = SmallVec::with_capacity(alternatives.len());
        for t in alternatives {
            if !self.contains(t) {
                return Err(TypeError::UnknownType(t.clone()));
            }
            union.push(t.clone());
        }
        Ok(Type { union })
    }
}

/// Type of a parameter or object: the union of one or several user types.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type {
    union: SmallVec<[Sym; 1]>,
}

impl Type {
    pub fn new(tpe: impl Into<Sym>) -> Self {
        Type {
            union: smallvec![tpe.into()],
        }
    }

    /// Root of the type hierarchy.
    pub fn object() -> Self {
        Type::new(OBJECT_TYPE)
    }

    pub fn alternatives(&self) -> &[Sym] {
        &self.union
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.union.len() == 1 {
            write!(f, "{}", self.union[0])
        } else {
            write!(f, "(either ")?;
            disp_iter(f, self.union.iter(), " ")?;
            write!(f, ")")
        }
    }
}
impl Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hier() -> TypeHierarchy {
        let mut types = TypeHierarchy::new();
        types.add_type("vehicle", None).unwrap();
        types.add_type("truck", Some("vehicle".into())).unwrap();
        types.add_type("plane", Some("vehicle".into())).unwrap();
        types.add_type("location", None).unwrap();
        types.add_type("airport", Some("location".into())).unwrap();
        types
    }

    #[test]
    fn subtyping() {
        let types = hier();
        let s = |s: &str| Sym::from(s);
        assert!(types.is_subtype_of(&s("truck"), &s("truck")));
        assert!(types.is_subtype_of(&s("truck"), &s("vehicle")));
        assert!(types.is_subtype_of(&s("truck"), &s("object")));
        assert!(!types.is_subtype_of(&s("vehicle"), &s("truck")));
        assert!(!types.is_subtype_of(&s("truck"), &s("plane")));
        assert!(!types.is_subtype_of(&s("airport"), &s("vehicle")));
    }

    #[test]
    fn unions() {
        let types = hier();
        let either = types
            .get_union_type(&["truck".into(), "airport".into()])
            .unwrap();
        assert!(types.is_type_of(&Type::new("truck"), &either));
        assert!(types.is_type_of(&Type::new("airport"), &either));
        assert!(!types.is_type_of(&Type::new("plane"), &either));
        assert!(!types.is_type_of(&either, &Type::new("vehicle")));
        assert!(types.is_type_of(&either, &Type::object()));
        assert!(types.get_union_type(&["boat".into()]).is_err());
        assert_eq!(types.get_union_type(&[]).unwrap(), Type::object());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut types = hier();
        assert!(types.add_type("vehicle", Some("truck".into())).is_err());
        assert!(types.add_type("object", Some("truck".into())).is_err());
        assert!(types.add_type("object", None).is_ok());
    }
}
