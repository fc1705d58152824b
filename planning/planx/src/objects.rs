use derive_more::Display;
use thiserror::Error;

use crate::*;

/// A constant of the domain or an object of the problem.
#[derive(Clone, Display, Debug)]
#[display("{}", name)]
pub struct Object {
    name: Sym,
    tpe: Type,
}

impl Object {
    pub fn new(name: impl Into<Sym>, tpe: Type) -> Self {
        Self { name: name.into(), tpe }
    }

    pub fn name(&self) -> &Sym {
        &self.name
    }

    pub fn tpe(&self) -> &Type {
        &self.tpe
    }
}

#[derive(Error, Debug)]
pub enum ObjectError {
    #[error("duplicate object `{0}`")]
    DuplicateObjectDeclaration(Sym, Sym),
    #[error("unknown object `{0}`")]
    UnknownObject(Sym),
}

/// The namespace of all objects, where each object is identified by its index of declaration.
#[derive(Clone, Debug, Default)]
pub struct Objects {
    objects: Vec<Object>,
    index: hashbrown::HashMap<Sym, usize>,
}

impl std::fmt::Display for Objects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Objects:")?;
        for o in self.iter() {
            write!(f, "\n  {}: {}", o.name, o.tpe)?;
        }
        writeln!(f)
    }
}

impl Objects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, name: impl Into<Sym>, tpe: Type) -> Result<(), ObjectError> {
        let name = name.into();
        if let Some(&previous) = self.index.get(&name) {
            let previous = &self.objects[previous];
            if previous.tpe == tpe {
                // objects are exactly the same, ignore as some PDDL domains contain such patterns
                Ok(())
            } else {
                Err(ObjectError::DuplicateObjectDeclaration(name, previous.name.clone()))
            }
        } else {
            self.index.insert(name.clone(), self.objects.len());
            self.objects.push(Object::new(name, tpe));
            Ok(())
        }
    }

    pub fn get(&self, name: &str) -> Result<&Object, ObjectError> {
        match self.index.get(name) {
            Some(&idx) => Ok(&self.objects[idx]),
            None => Err(ObjectError::UnknownObject(Sym::from(name))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Index of the object in the namespace.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Object with the given index. Panics if the index was not produced by this namespace.
    pub fn object(&self, idx: usize) -> &Object {
        &self.objects[idx]
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> + '_ {
        self.objects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_order_and_duplicates() {
        let mut objects = Objects::new();
        objects.add_object("rooma", Type::new("room")).unwrap();
        objects.add_object("ball1", Type::new("ball")).unwrap();
        // same declaration twice is tolerated
        objects.add_object("rooma", Type::new("room")).unwrap();
        assert!(objects.add_object("rooma", Type::new("ball")).is_err());

        assert_eq!(objects.len(), 2);
        assert_eq!(objects.index_of("ball1"), Some(1));
        assert_eq!(objects.object(0).name(), &Sym::from("rooma"));
        assert_eq!(objects.get("ball1").unwrap().tpe(), &Type::new("ball"));
        assert!(objects.get("ball2").is_err());
    }

    #[test]
    fn display_lists_objects_in_order() {
        let mut objects = Objects::new();
        objects.add_object("rooma", Type::new("room")).unwrap();
        objects.add_object("ball1", Type::new("ball")).unwrap();
        assert_eq!(objects.to_string(), "Objects:\n  rooma: room\n  ball1: ball\n");
        assert_eq!(objects.object(1).to_string(), "ball1");
    }
}
