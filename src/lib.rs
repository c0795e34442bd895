//! Tessera Core - runtime evaluation core for a Datalog-family query language
//!
//! This crate provides the term model, union-find unifier, built-in
//! predicate/function evaluator, and structural type system shared by a
//! deductive query engine. It does not parse surface syntax, run a
//! semi-naive fixpoint, or touch persistence or the network — those are the
//! responsibility of an engine driver built on top of this core.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decl;
pub mod desugar;
pub mod error;
pub mod eval;
pub mod term;
pub mod types;
pub mod unify;

pub use decl::{Atom, BoundRow, Decl, InclusionConstraints};
pub use error::{Error, Result};
pub use eval::{decide, eval_apply_fn, eval_atom, eval_expr, eval_reduce_fn};
pub use term::{Constant, FunctionSym, Name, PredicateSym, Symbol, Term};
pub use types::{has_type, lower_bound, set_conforms, type_conforms, upper_bound, TypeChecker, TypeExpr};
pub use unify::Substitution;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn end_to_end_lt_scenario() {
        let subst = Substitution::new();
        let atom = Atom::new(
            Symbol::new(":lt", 2),
            vec![
                Term::Constant(Constant::Number(1)),
                Term::Constant(Constant::Number(2)),
            ],
        );
        let (truth, exts) = decide(&atom, &subst).unwrap();
        assert!(truth);
        assert_eq!(exts, vec![subst]);
    }
}
