use std::sync::Arc;

use smallvec::SmallVec;

use crate::*;

/// Assignment of an object (by index) to each parameter of a list.
pub type Permutation = SmallVec<[usize; 4]>;

/// Capability of enumerating the type-consistent instantiations of a list of typed parameters.
pub trait Grounder {
    /// Lazy sequence of all assignments of objects to `params` such that each object is of the
    /// type of its parameter. Each assignment is given as indices into the object namespace.
    fn permutations(&self, params: &[Param]) -> Permutations;

    /// Name of the object with the given index.
    fn object(&self, idx: usize) -> &Sym;
}

/// Grounder over all objects and constants of a problem.
#[derive(Clone, Debug)]
pub struct ObjectGrounder {
    types: Arc<TypeHierarchy>,
    objects: Arc<Objects>,
}

impl ObjectGrounder {
    pub fn new(types: Arc<TypeHierarchy>, objects: Arc<Objects>) -> Self {
        ObjectGrounder { types, objects }
    }

    /// Indices of all objects that are instances of `tpe`.
    pub fn instances(&self, tpe: &Type) -> Vec<usize> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| self.types.is_type_of(o.tpe(), tpe))
            .map(|(i, _)| i)
            .collect()
    }
}

impl Grounder for ObjectGrounder {
    fn permutations(&self, params: &[Param]) -> Permutations {
        Permutations::new(params.iter().map(|p| self.instances(&p.tpe)).collect())
    }

    fn object(&self, idx: usize) -> &Sym {
        self.objects.object(idx).name()
    }
}

/// Cartesian product of the candidate objects of each parameter, enumerated lazily in
/// lexicographic order (the last parameter varies fastest).
///
/// An empty parameter list has exactly one (empty) permutation.
/// A parameter without any candidate results in no permutation at all.
#[derive(Clone, Debug)]
pub struct Permutations {
    domains: Vec<Vec<usize>>,
    /// position in each domain of the next permutation, `None` once exhausted
    cursor: Option<Vec<usize>>,
}

impl Permutations {
    pub fn new(domains: Vec<Vec<usize>>) -> Self {
        let mut res = Permutations { domains, cursor: None };
        res.restart();
        res
    }

    /// Restarts the enumeration from the first permutation.
    pub fn restart(&mut self) {
        self.cursor = if self.domains.iter().any(|d| d.is_empty()) {
            None
        } else {
            Some(vec![0; self.domains.len()])
        };
    }

    /// Total number of permutations of the sequence (including those already enumerated).
    pub fn count_all(&self) -> usize {
        self.domains.iter().map(|d| d.len()).product()
    }
}

impl Iterator for Permutations {
    type Item = Permutation;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        let current: Permutation = cursor
            .iter()
            .zip(self.domains.iter())
            .map(|(&pos, dom)| dom[pos])
            .collect();

        // advance the cursor, odometer style
        let mut exhausted = true;
        for i in (0..cursor.len()).rev() {
            cursor[i] += 1;
            if cursor[i] < self.domains[i].len() {
                exhausted = false;
                break;
            }
            cursor[i] = 0;
        }
        if exhausted {
            self.cursor = None;
        }
        Some(current)
    }
}
