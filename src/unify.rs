//! Union-find substitution engine.
//!
//! A [`Substitution`] is a union-find forest over variable names. Each
//! variable's root is either another (still-unbound) variable or a
//! [`Constant`]; unioning two variables prefers a constant root so that
//! `find` never has to walk through a redundant variable hop once either
//! side is ground. Path compression keeps repeated `find` calls on deep
//! chains cheap, mirroring the flattening `find_matching_facts` /
//! `unify_atoms` walk in the teacher's simpler HashMap substitution.

use crate::error::{Error, Result};
use crate::term::{Constant, Term};
use ahash::AHashMap;
use std::sync::Arc;
use tracing::trace;

/// What a variable's union-find root currently is.
#[derive(Debug, Clone, PartialEq)]
enum Root {
    /// Still unbound, but unioned with another (also unbound) variable.
    Var(Arc<str>),
    /// Bound to a ground value.
    Value(Constant),
}

/// A union-find forest of variable bindings.
///
/// Cloning a `Substitution` is a deep copy of the binding map; callers that
/// need cheap branching (e.g. the evaluator trying several facts against
/// one atom) should snapshot with [`Substitution::as_const_subst_list`]
/// sparingly and otherwise clone before each speculative branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    parent: AHashMap<Arc<str>, Root>,
}

/// The outcome of resolving a variable to its current root.
enum Resolved {
    /// Unbound representative variable name.
    Var(Arc<str>),
    /// Bound value.
    Value(Constant),
}

impl Substitution {
    /// An empty substitution.
    pub fn new() -> Self {
        Substitution {
            parent: AHashMap::new(),
        }
    }

    /// Number of variables with an entry in the forest (bound or unioned).
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// `true` if no variable has been bound or unioned yet.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Resolve `var` to its current root, compressing the path walked.
    /// A variable with no entry is its own (unbound) representative.
    fn find(&mut self, var: &Arc<str>) -> Resolved {
        let mut path = Vec::new();
        let mut cur = var.clone();
        let result = loop {
            match self.parent.get(&cur) {
                Some(Root::Var(next)) => {
                    path.push(cur.clone());
                    cur = next.clone();
                }
                Some(Root::Value(value)) => break Resolved::Value(value.clone()),
                None => break Resolved::Var(cur),
            }
        };
        if path.len() > 1 {
            let root = match &result {
                Resolved::Var(name) => Root::Var(name.clone()),
                Resolved::Value(value) => Root::Value(value.clone()),
            };
            for node in &path[..path.len() - 1] {
                self.parent.insert(node.clone(), root.clone());
            }
        }
        result
    }

    /// Look up the ground value currently bound to `var`, if any. Does not
    /// report the unbound representative of a variable chain.
    pub fn get(&self, var: &str) -> Option<Constant> {
        let mut cur = Arc::<str>::from(var);
        loop {
            match self.parent.get(&cur) {
                Some(Root::Var(next)) => cur = next.clone(),
                Some(Root::Value(value)) => return Some(value.clone()),
                None => return None,
            }
        }
    }

    /// Union two variable roots, or bind a variable root to a value,
    /// biasing toward keeping constants as roots. Returns `Ok(true)` if the
    /// union succeeded, `Ok(false)` if it was a no-op (already unioned /
    /// already bound to an equal value), and an error if two distinct
    /// constants were forced to unify.
    fn union(&mut self, a: Resolved, b: Resolved) -> Result<bool> {
        match (a, b) {
            (Resolved::Value(x), Resolved::Value(y)) => {
                if x == y {
                    Ok(false)
                } else {
                    Err(Error::UnificationFailure {
                        left: x.to_string(),
                        right: y.to_string(),
                    })
                }
            }
            (Resolved::Value(value), Resolved::Var(var)) | (Resolved::Var(var), Resolved::Value(value)) => {
                trace!(%var, %value, "binding variable");
                self.parent.insert(var, Root::Value(value));
                Ok(true)
            }
            (Resolved::Var(x), Resolved::Var(y)) => {
                if x == y {
                    Ok(false)
                } else {
                    trace!(left = %x, right = %y, "unioning variables");
                    self.parent.insert(x, Root::Var(y));
                    Ok(true)
                }
            }
        }
    }

    /// Unify two terms under this substitution, extending it in place.
    /// `Term::ApplyFn` is not a valid unification operand: function calls
    /// must be reduced to a constant by the evaluator before reaching the
    /// unifier.
    pub fn unify(&mut self, left: &Term, right: &Term) -> Result<()> {
        let l = self.resolve_term(left)?;
        let r = self.resolve_term(right)?;
        self.union(l, r)?;
        Ok(())
    }

    /// Unify two terms that may mention `_` wildcards: a wildcard never
    /// binds and always succeeds against anything.
    pub fn unify_terms(&mut self, left: &Term, right: &Term) -> Result<bool> {
        if left.is_wildcard() || right.is_wildcard() {
            return Ok(true);
        }
        match self.unify(left, right) {
            Ok(()) => Ok(true),
            Err(Error::UnificationFailure { .. }) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// Unify a sequence of term pairs against a fresh clone of `self`,
    /// returning the extended substitution only if every pair unifies.
    /// Used by callers exploring multiple candidate bindings (e.g. trying
    /// several bound rows) without committing to a failed branch.
    pub fn unify_terms_extend(&self, pairs: &[(Term, Term)]) -> Result<Option<Substitution>> {
        let mut candidate = self.clone();
        for (left, right) in pairs {
            if !candidate.unify_terms(left, right)? {
                return Ok(None);
            }
        }
        Ok(Some(candidate))
    }

    fn resolve_term(&mut self, term: &Term) -> Result<Resolved> {
        match term {
            Term::Constant(c) => Ok(Resolved::Value(c.clone())),
            Term::Variable(v) => Ok(self.find(v)),
            Term::ApplyFn(sym, _) => Err(Error::TypeMismatch {
                context: "unify".to_string(),
                message: format!(
                    "apply-expression {} must be evaluated before unification",
                    sym.symbol
                ),
            }),
        }
    }

    /// Apply this substitution to `term`, replacing bound variables with
    /// their ground value and leaving unbound variables and apply-
    /// expressions (with their arguments substituted) untouched.
    pub fn apply_subst(&self, term: &Term) -> Term {
        match term {
            Term::Constant(_) => term.clone(),
            Term::Variable(v) => match self.get(v) {
                Some(value) => Term::Constant(value),
                None => term.clone(),
            },
            Term::ApplyFn(sym, args) => {
                let substituted: Vec<Term> = args.iter().map(|a| self.apply_subst(a)).collect();
                Term::ApplyFn(sym.clone(), Arc::from(substituted))
            }
        }
    }

    /// A stable, sorted snapshot of every variable currently bound to a
    /// ground value, suitable for presenting as one row of a `decide`
    /// result. Unioned-but-unbound variables are omitted.
    pub fn as_const_subst_list(&self) -> Vec<(Arc<str>, Constant)> {
        let mut out: Vec<(Arc<str>, Constant)> = self
            .parent
            .keys()
            .filter_map(|var| self.get(var).map(|value| (var.clone(), value)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Symbol;

    fn num(n: i64) -> Term {
        Term::Constant(Constant::Number(n))
    }

    #[test]
    fn binds_variable_to_constant() {
        let mut sub = Substitution::new();
        sub.unify(&Term::var("X"), &num(42)).unwrap();
        assert_eq!(sub.get("X"), Some(Constant::Number(42)));
    }

    #[test]
    fn unifying_equal_constants_is_a_noop() {
        let mut sub = Substitution::new();
        assert!(sub.unify_terms(&num(1), &num(1)).unwrap());
        assert!(sub.is_empty());
    }

    #[test]
    fn unifying_distinct_constants_fails_softly() {
        let mut sub = Substitution::new();
        assert!(!sub.unify_terms(&num(1), &num(2)).unwrap());
    }

    #[test]
    fn transitive_variable_chain_resolves_to_shared_value() {
        let mut sub = Substitution::new();
        sub.unify(&Term::var("X"), &Term::var("Y")).unwrap();
        sub.unify(&Term::var("Y"), &num(7)).unwrap();
        assert_eq!(sub.get("X"), Some(Constant::Number(7)));
        assert_eq!(sub.get("Y"), Some(Constant::Number(7)));
    }

    #[test]
    fn wildcard_never_binds() {
        let mut sub = Substitution::new();
        assert!(sub.unify_terms(&Term::var("_"), &num(9)).unwrap());
        assert!(sub.is_empty());
    }

    #[test]
    fn apply_expr_cannot_be_unified_directly() {
        let mut sub = Substitution::new();
        let expr = Term::apply(Symbol::variadic("fn:plus"), vec![num(1), num(2)]);
        assert!(sub.unify(&expr, &num(3)).is_err());
    }

    #[test]
    fn apply_subst_substitutes_nested_args() {
        let mut sub = Substitution::new();
        sub.unify(&Term::var("X"), &num(5)).unwrap();
        let expr = Term::apply(Symbol::variadic("fn:plus"), vec![Term::var("X"), num(1)]);
        let applied = sub.apply_subst(&expr);
        assert_eq!(applied, Term::apply(Symbol::variadic("fn:plus"), vec![num(5), num(1)]));
    }

    #[test]
    fn extend_does_not_mutate_on_failure() {
        let mut sub = Substitution::new();
        sub.unify(&Term::var("X"), &num(1)).unwrap();
        let result = sub
            .unify_terms_extend(&[(Term::var("X"), num(2))])
            .unwrap();
        assert!(result.is_none());
        assert_eq!(sub.get("X"), Some(Constant::Number(1)));
    }

    #[test]
    fn const_subst_list_is_sorted_and_omits_unbound() {
        let mut sub = Substitution::new();
        sub.unify(&Term::var("B"), &num(2)).unwrap();
        sub.unify(&Term::var("A"), &num(1)).unwrap();
        sub.unify(&Term::var("C"), &Term::var("D")).unwrap();
        let list = sub.as_const_subst_list();
        assert_eq!(
            list,
            vec![
                (Arc::from("A"), Constant::Number(1)),
                (Arc::from("B"), Constant::Number(2)),
            ]
        );
    }
}
