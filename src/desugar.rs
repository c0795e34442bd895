//! Declaration desugaring: resolves unary-predicate "name" bounds into
//! explicit type bounds plus inclusion constraints, detecting cycles.

use crate::decl::{Atom, Decl, InclusionConstraints};
use crate::error::{Error, Result};
use crate::term::{PredicateSym, Term};
use crate::types::{self, Context, TypeExpr};
use ahash::AHashMap;

/// A raw bound-row cell before desugaring: either already a well-formed
/// type expression, or a reference to another predicate's name (to be
/// resolved into that predicate's upper bound plus an inclusion atom).
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// An already-resolved type expression.
    Type(TypeExpr),
    /// A string/name constant naming a unary predicate this cell defers to.
    PredicateRef(PredicateSym),
}

/// A raw bound row: one [`RawCell`] per argument position, or empty to mean
/// "no constraint on any argument" (desugars to a single row of `/any`s).
pub type RawBoundRow = Vec<RawCell>;

/// A raw, not-yet-desugared declaration as supplied by the loader.
#[derive(Debug, Clone)]
pub struct RawDecl {
    /// The head atom.
    pub declared_atom: Atom,
    /// Free-form descriptor tags.
    pub descriptors: Vec<std::sync::Arc<str>>,
    /// Alternative bound rows.
    pub bounds: Vec<RawBoundRow>,
}

/// Desugar a map of raw declarations into fully desugared [`Decl`] values.
///
/// Errors abort the whole pass for an unknown predicate reference or a
/// cyclic dependency; a cell that is neither well-formed nor a predicate
/// reference is recorded as a collected error but filled with `/any` so
/// desugaring can continue and report every such problem at once.
pub fn desugar(raw: AHashMap<PredicateSym, RawDecl>) -> Result<AHashMap<PredicateSym, Decl>> {
    let mut desugarer = Desugarer {
        raw,
        done: AHashMap::new(),
        stack: Vec::new(),
        cell_errors: Vec::new(),
    };
    for symbol in desugarer.raw.keys().cloned().collect::<Vec<_>>() {
        desugarer.desugar_predicate(&symbol)?;
    }
    if let Some(first) = desugarer.cell_errors.into_iter().next() {
        return Err(first);
    }
    Ok(desugarer.done)
}

struct Desugarer {
    raw: AHashMap<PredicateSym, RawDecl>,
    done: AHashMap<PredicateSym, Decl>,
    stack: Vec<PredicateSym>,
    cell_errors: Vec<Error>,
}

impl Desugarer {
    fn desugar_predicate(&mut self, symbol: &PredicateSym) -> Result<Decl> {
        if let Some(decl) = self.done.get(symbol) {
            return Ok(decl.clone());
        }
        if self.stack.contains(symbol) {
            let mut path: Vec<String> = self.stack.iter().map(|s| s.symbol.to_string()).collect();
            path.push(symbol.symbol.to_string());
            return Err(Error::CyclicDependency { path });
        }
        let Some(raw) = self.raw.get(symbol).cloned() else {
            return Err(Error::UnknownSymbol(symbol.symbol.to_string()));
        };

        self.stack.push(symbol.clone());
        let result = self.desugar_raw(&raw);
        self.stack.pop();
        let decl = result?;
        self.done.insert(symbol.clone(), decl.clone());
        Ok(decl)
    }

    fn desugar_raw(&mut self, raw: &RawDecl) -> Result<Decl> {
        let arity = raw.declared_atom.args.len();
        let mut inclusion = InclusionConstraints::empty();

        let rows: Vec<Vec<TypeExpr>> = if raw.bounds.is_empty() {
            vec![vec![TypeExpr::Any; arity]]
        } else {
            raw.bounds
                .iter()
                .map(|row| self.desugar_row(&raw.declared_atom, row, arity, &mut inclusion))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Decl {
            declared_atom: raw.declared_atom.clone(),
            descriptors: raw.descriptors.clone(),
            bounds: rows,
            inclusion_constraints: inclusion,
            desugared: true,
        })
    }

    fn desugar_row(
        &mut self,
        head: &Atom,
        row: &RawBoundRow,
        arity: usize,
        inclusion: &mut InclusionConstraints,
    ) -> Result<Vec<TypeExpr>> {
        let mut out = Vec::with_capacity(arity);
        let mut alt_atoms = Vec::new();
        for i in 0..arity {
            let cell = row.get(i);
            let ty = match cell {
                None => TypeExpr::Any,
                Some(RawCell::Type(ty)) => {
                    let ctx = Context::default();
                    match types::well_formed_bound(&ctx, ty) {
                        Ok(()) => ty.clone(),
                        Err(err) => {
                            self.cell_errors.push(err);
                            TypeExpr::Any
                        }
                    }
                }
                Some(RawCell::PredicateRef(pred)) => {
                    let referenced = self.desugar_predicate(pred)?;
                    if referenced.arity() != 1 {
                        self.cell_errors.push(Error::MalformedType(format!(
                            "{} is not a unary predicate and cannot be used as a name bound",
                            pred.symbol
                        )));
                        TypeExpr::Any
                    } else {
                        let column: Vec<TypeExpr> =
                            referenced.bounds.iter().map(|r| r[0].clone()).collect();
                        let ctx = Context::default();
                        let bound = types::upper_bound(&ctx, &column);
                        if let Some(var) = head.args.get(i).and_then(Term::as_variable) {
                            alt_atoms.push(Atom::new(
                                pred.clone(),
                                vec![Term::var(var)],
                            ));
                        }
                        bound
                    }
                }
            };
            out.push(ty);
        }
        if !alt_atoms.is_empty() {
            let mut row_inclusion = InclusionConstraints::empty();
            row_inclusion.consequences.push(head.clone());
            row_inclusion.alternatives.push(alt_atoms);
            inclusion.merge(row_inclusion);
        }
        Ok(out)
    }
}

/// Build a [`RawCell::Type`] naming a sentinel or name-prefix type.
pub fn base_cell(name: &str) -> Result<RawCell> {
    Ok(RawCell::Type(TypeExpr::from_name(name)?))
}

/// Build a [`RawCell::PredicateRef`] referencing another unary predicate by
/// name, for use where the surface syntax wrote a bare predicate name in a
/// bound position.
pub fn predicate_ref_cell(name: impl Into<std::sync::Arc<str>>) -> RawCell {
    RawCell::PredicateRef(PredicateSym::new(name, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Symbol;

    fn unary_decl(symbol: &str, bounds: Vec<RawBoundRow>) -> (PredicateSym, RawDecl) {
        let sym = Symbol::new(symbol, 1);
        let decl = RawDecl {
            declared_atom: Atom::new(sym.clone(), vec![Term::var("X")]),
            descriptors: vec![],
            bounds,
        };
        (sym, decl)
    }

    #[test]
    fn empty_bounds_becomes_single_any_row() {
        let (sym, decl) = unary_decl("/p", vec![]);
        let mut map = AHashMap::new();
        map.insert(sym.clone(), decl);
        let result = desugar(map).unwrap();
        let desugared = &result[&sym];
        assert_eq!(desugared.bounds, vec![vec![TypeExpr::Any]]);
    }

    #[test]
    fn predicate_reference_resolves_to_upper_bound_and_adds_inclusion() {
        let (foo, foo_decl) = unary_decl("foo", vec![vec![RawCell::Type(TypeExpr::Number)]]);
        let (bar_sym, bar_decl) = unary_decl("bar", vec![vec![predicate_ref_cell("foo")]]);
        let mut map = AHashMap::new();
        map.insert(foo.clone(), foo_decl);
        map.insert(bar_sym.clone(), bar_decl);

        let result = desugar(map).unwrap();
        let bar = &result[&bar_sym];
        assert_eq!(bar.bounds, vec![vec![TypeExpr::Number]]);
        assert_eq!(bar.inclusion_constraints.alternatives.len(), 1);
    }

    #[test]
    fn repeated_identical_rows_do_not_duplicate_inclusion_constraints() {
        let (foo, foo_decl) = unary_decl("foo", vec![vec![RawCell::Type(TypeExpr::Number)]]);
        let (bar_sym, bar_decl) = unary_decl(
            "bar",
            vec![vec![predicate_ref_cell("foo")], vec![predicate_ref_cell("foo")]],
        );
        let mut map = AHashMap::new();
        map.insert(foo.clone(), foo_decl);
        map.insert(bar_sym.clone(), bar_decl);

        let result = desugar(map).unwrap();
        let bar = &result[&bar_sym];
        assert_eq!(bar.inclusion_constraints.consequences.len(), 1);
        assert_eq!(bar.inclusion_constraints.alternatives.len(), 1);
    }

    #[test]
    fn cyclic_dependency_is_reported_with_path() {
        let (foo, foo_decl) = unary_decl("foo", vec![vec![predicate_ref_cell("bar")]]);
        let (bar, bar_decl) = unary_decl("bar", vec![vec![predicate_ref_cell("foo")]]);
        let mut map = AHashMap::new();
        map.insert(foo.clone(), foo_decl);
        map.insert(bar.clone(), bar_decl);

        let err = desugar(map).unwrap_err();
        match err {
            Error::CyclicDependency { path } => {
                assert!(path.contains(&"foo".to_string()));
                assert!(path.contains(&"bar".to_string()));
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn all_rows_have_predicate_arity_length() {
        let sym = Symbol::new("baz", 2);
        let decl = RawDecl {
            declared_atom: Atom::new(sym.clone(), vec![Term::var("X"), Term::var("Y")]),
            descriptors: vec![],
            bounds: vec![vec![RawCell::Type(TypeExpr::Number)]],
        };
        let mut map = AHashMap::new();
        map.insert(sym.clone(), decl);
        let result = desugar(map).unwrap();
        assert_eq!(result[&sym].bounds[0].len(), 2);
    }
}
