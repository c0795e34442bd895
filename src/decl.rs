//! Atoms and declarations.
//!
//! An [`Atom`] is a predicate applied to terms, the unit the evaluator and
//! type checker both consume. A [`Decl`] is a predicate's declaration: its
//! head atom, free-form descriptor tags, alternative bound rows, and
//! (once desugared) inclusion constraints. See [`crate::desugar`] for how a
//! raw `Decl` becomes fully desugared.

use crate::term::{PredicateSym, Term};
use crate::types::TypeExpr;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A predicate applied to a list of terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// The predicate symbol.
    pub predicate: PredicateSym,
    /// The argument terms, in declaration order.
    pub args: Arc<[Term]>,
}

impl Atom {
    /// Construct an atom, checking nothing about arity (callers validate
    /// against the symbol's declared arity where that matters).
    pub fn new(predicate: PredicateSym, args: Vec<Term>) -> Self {
        Atom {
            predicate,
            args: Arc::from(args),
        }
    }

    /// `true` if every argument is already a ground constant.
    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_constant)
    }
}

/// One row of a predicate's bound declaration: one type expression per
/// argument position.
pub type BoundRow = Vec<TypeExpr>;

/// A set of atoms that must additionally be derivable for an alternative to
/// qualify, paired with the bound row it backs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InclusionConstraints {
    /// Atoms any one of `alternatives` must satisfy to license this decl's
    /// consequent (the desugared predicate itself being derivable).
    pub consequences: Vec<Atom>,
    /// Per-alternative atom lists; an alternative qualifies if every atom in
    /// it is derivable.
    pub alternatives: Vec<Vec<Atom>>,
}

impl InclusionConstraints {
    /// An empty constraint set (no name-bound references were desugared).
    pub fn empty() -> Self {
        InclusionConstraints::default()
    }

    /// Merge `other` into `self`, deduplicating atoms and alternative lists
    /// by structural equality.
    pub fn merge(&mut self, other: InclusionConstraints) {
        for atom in other.consequences {
            if !self.consequences.contains(&atom) {
                self.consequences.push(atom);
            }
        }
        for alt in other.alternatives {
            if !self.alternatives.contains(&alt) {
                self.alternatives.push(alt);
            }
        }
    }
}

/// A predicate's declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    /// The head atom: predicate applied to its formal parameter variables.
    pub declared_atom: Atom,
    /// Free-form annotation tags carried alongside the declaration.
    pub descriptors: Vec<Arc<str>>,
    /// Non-empty list of alternative bound rows (a disjunction).
    pub bounds: Vec<BoundRow>,
    /// Inclusion constraints accumulated while desugaring name-bound cells.
    /// Empty until [`crate::desugar::desugar`] has processed this decl.
    pub inclusion_constraints: InclusionConstraints,
    /// Set once this decl has passed through [`crate::desugar::desugar`].
    pub desugared: bool,
}

impl Decl {
    /// Construct a raw (not yet desugared) declaration.
    pub fn new(declared_atom: Atom, descriptors: Vec<Arc<str>>, bounds: Vec<BoundRow>) -> Self {
        Decl {
            declared_atom,
            descriptors,
            bounds,
            inclusion_constraints: InclusionConstraints::empty(),
            desugared: false,
        }
    }

    /// The predicate's declared arity, taken from its head atom.
    pub fn arity(&self) -> usize {
        self.declared_atom.args.len()
    }
}
