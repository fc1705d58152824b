use crate::errors::{Span, Spanned};
use std::{
    borrow::Cow,
    fmt::{Debug, Display},
};

/// Name of an entity of the model (object, type, predicate, variable, ...),
/// possibly annotated with its origin in a source file.
///
/// Two symbols are equal iff their canonical (lower cased) strings are equal: the span never
/// takes part in comparisons or hashing.
#[derive(Clone)]
pub struct Sym {
    /// Canonical view of the symbol, uses small string optimization to avoid allocation for short identifiers
    symbol: compact_str::CompactString,
    /// Origin of the symbol. When present, it is used to display the symbol with its original case.
    pub span: Option<Span>,
}

impl Sym {
    pub fn new<'a>(s: impl Into<Cow<'a, str>>) -> Sym {
        Sym {
            symbol: s.into().into(),
            span: None,
        }
    }

    pub fn with_source<'a>(s: impl Into<Cow<'a, str>>, source: Span) -> Sym {
        Sym {
            symbol: s.into().into(),
            span: Some(source),
        }
    }

    pub fn canonical_str(&self) -> &str {
        self.symbol.as_str()
    }

    /// Returns the same symbol, without any source annotation.
    pub fn detached(&self) -> Sym {
        Sym {
            symbol: self.symbol.clone(),
            span: None,
        }
    }

    /// True if this symbol names a variable (`?x`).
    pub fn is_variable(&self) -> bool {
        self.symbol.starts_with('?')
    }
}

impl AsRef<str> for Sym {
    fn as_ref(&self) -> &str {
        &self.symbol
    }
}

impl std::borrow::Borrow<str> for Sym {
    fn borrow(&self) -> &str {
        &self.symbol
    }
}

impl From<&str> for Sym {
    fn from(value: &str) -> Self {
        Sym::new(value)
    }
}

impl From<String> for Sym {
    fn from(value: String) -> Self {
        Sym::new(value)
    }
}

impl From<&Sym> for Sym {
    fn from(value: &Sym) -> Self {
        value.clone()
    }
}

impl Spanned for Sym {
    fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }
}

impl Debug for Sym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
impl Display for Sym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let view = if let Some(span) = self.span.as_ref() {
            span.str()
        } else {
            self.symbol.as_str()
        };
        write!(f, "{view}")
    }
}

impl PartialEq for Sym {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl PartialEq<str> for Sym {
    fn eq(&self, other: &str) -> bool {
        self.canonical_str() == other
    }
}
impl PartialEq<&str> for Sym {
    fn eq(&self, other: &&str) -> bool {
        self.canonical_str() == *other
    }
}

impl Eq for Sym {}

impl PartialOrd for Sym {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Sym {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.symbol.cmp(&other.symbol)
    }
}

impl std::hash::Hash for Sym {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.symbol.as_str().hash(state)
    }
}
