//! The built-in predicate/function evaluator.
//!
//! Four entry points mirror the shape the teacher's aggregation/unification
//! modules used for fact evaluation, generalized to the full term algebra:
//! [`eval_expr`] reduces a term to a constant wherever possible, [`decide`]
//! evaluates a built-in predicate, [`eval_apply_fn`] evaluates a built-in
//! function to a constant, and [`eval_reduce_fn`] folds a reducer over a
//! row-substitution stream.

mod functions;
mod predicates;
mod reducers;

use crate::decl::Atom;
use crate::error::{Error, Result};
use crate::term::{Constant, Term};
use crate::unify::Substitution;
use std::sync::Arc;

pub use functions::eval_apply_fn;
pub use predicates::decide;
pub use reducers::eval_reduce_fn;

/// Apply `subst` to `term`, recursing through apply-expressions and
/// reducing each to a constant. Idempotent: evaluating an already-evaluated
/// term returns it unchanged.
pub fn eval_expr(term: &Term, subst: &Substitution) -> Result<Term> {
    match term {
        Term::Constant(_) => Ok(term.clone()),
        Term::Variable(name) => match subst.get(name) {
            Some(value) => Ok(Term::Constant(value)),
            None => Ok(term.clone()),
        },
        Term::ApplyFn(sym, args) => {
            let evaluated_args: Vec<Term> = args
                .iter()
                .map(|a| eval_expr(a, subst))
                .collect::<Result<_>>()?;
            let as_constants: Vec<Constant> = evaluated_args
                .iter()
                .map(|a| {
                    a.as_constant().cloned().ok_or_else(|| Error::TypeMismatch {
                        context: sym.symbol.to_string(),
                        message: "argument did not evaluate to a ground constant".to_string(),
                    })
                })
                .collect::<Result<_>>()?;
            Ok(Term::Constant(eval_apply_fn(sym, &as_constants)?))
        }
    }
}

/// Map [`eval_expr`] over an atom's arguments, grounding its head for
/// presentation as a derived fact.
pub fn eval_atom(atom: &Atom, subst: &Substitution) -> Result<Atom> {
    let args: Vec<Term> = atom
        .args
        .iter()
        .map(|t| eval_expr(t, subst))
        .collect::<Result<_>>()?;
    Ok(Atom {
        predicate: atom.predicate.clone(),
        args: Arc::from(args),
    })
}

/// `true` if `symbol` names one of the built-in predicates `decide`
/// implements, respecting the variadic (`arity == -1`) fallback rule.
pub fn is_builtin_predicate(symbol: &str, arity: usize) -> bool {
    predicates::lookup(symbol, arity).is_some()
}

/// `true` if `symbol` names one of the built-in functions `eval_apply_fn`
/// implements.
pub fn is_builtin_function(symbol: &str, arity: usize) -> bool {
    functions::lookup(symbol, arity).is_some()
}

/// `true` if `symbol` names one of the reducer functions `eval_reduce_fn`
/// implements.
pub fn is_reducer_function(symbol: &str) -> bool {
    reducers::lookup(symbol).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Symbol;

    #[test]
    fn eval_expr_is_idempotent() {
        let subst = Substitution::new();
        let term = Term::apply(
            Symbol::variadic("fn:plus"),
            vec![Term::Constant(Constant::Number(1)), Term::Constant(Constant::Number(2))],
        );
        let once = eval_expr(&term, &subst).unwrap();
        let twice = eval_expr(&once, &subst).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, Term::Constant(Constant::Number(3)));
    }

    #[test]
    fn registries_respect_variadic_fallback() {
        assert!(is_builtin_function("fn:plus", 0));
        assert!(is_builtin_function("fn:plus", 5));
        assert!(is_builtin_predicate(":lt", 2));
        assert!(!is_builtin_predicate(":lt", 3));
    }
}
