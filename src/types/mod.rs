//! Structural type expressions: well-formedness, runtime membership and the
//! subtyping lattice.

pub mod name_trie;

use crate::decl::{Atom, Decl};
use crate::error::{Error, Result};
use crate::term::{Constant, Name, PredicateSym};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeExpr {
    /// `/any`: accepts every constant.
    Any,
    /// `/bot`: accepts nothing.
    Bot,
    /// `/number`.
    Number,
    /// `/float64`.
    Float64,
    /// `/string`.
    StringTy,
    /// `/name`: accepts any name constant.
    NameAny,
    /// A name prefix type, e.g. `/org/eng`: accepts any name strictly
    /// longer than the prefix.
    NamePrefix(Name),
    /// An unbound or context-bound type variable.
    Var(Arc<str>),
    /// A pair type.
    Pair(Box<TypeExpr>, Box<TypeExpr>),
    /// A tuple type of arity >= 3 (represented internally as right-nested
    /// pairs, per [`crate::term::Constant::mk_tuple`]).
    Tuple(Vec<TypeExpr>),
    /// A homogeneous list type.
    List(Box<TypeExpr>),
    /// A homogeneous map type.
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// A struct type: required fields, then optional fields.
    Struct(Vec<(Name, TypeExpr)>, Vec<(Name, TypeExpr)>),
    /// A union of alternative types (non-empty when well-formed; an empty
    /// union is used internally to represent the bottom type produced by
    /// lattice operations).
    Union(Vec<TypeExpr>),
    /// A type matching exactly one constant.
    Singleton(Constant),
    /// Sugar for `Union(Singleton(/none), Pair(Singleton(/some), T))`.
    OptionTy(Box<TypeExpr>),
    /// A function type: result type, then argument types.
    Fun(Box<TypeExpr>, Vec<TypeExpr>),
    /// A relation type: treated like a tuple of argument types for
    /// conformance purposes.
    Rel(Vec<TypeExpr>),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TypeExpr {
    fn sentinel_name(name: &str) -> TypeExpr {
        match name {
            "/any" => TypeExpr::Any,
            "/bot" => TypeExpr::Bot,
            "/number" => TypeExpr::Number,
            "/float64" => TypeExpr::Float64,
            "/string" => TypeExpr::StringTy,
            "/name" => TypeExpr::NameAny,
            _ => TypeExpr::NamePrefix(Name::new(name).expect("validated by caller")),
        }
    }

    /// Build a base type expression from its surface sentinel or name
    /// prefix spelling, e.g. `/number` or `/org/eng`.
    pub fn from_name(name: &str) -> Result<TypeExpr> {
        Name::new(name)?;
        Ok(TypeExpr::sentinel_name(name))
    }

    fn expand_option(&self) -> TypeExpr {
        match self {
            TypeExpr::OptionTy(inner) => TypeExpr::Union(vec![
                TypeExpr::Singleton(Constant::Name(Name::new("/none").expect("valid"))),
                TypeExpr::Pair(
                    Box::new(TypeExpr::Singleton(Constant::Name(
                        Name::new("/some").expect("valid"),
                    ))),
                    inner.clone(),
                ),
            ]),
            other => other.clone(),
        }
    }

    fn free_vars(&self, out: &mut HashSet<Arc<str>>) {
        match self {
            TypeExpr::Var(v) => {
                out.insert(v.clone());
            }
            TypeExpr::Pair(a, b) | TypeExpr::Map(a, b) => {
                a.free_vars(out);
                b.free_vars(out);
            }
            TypeExpr::Tuple(items) | TypeExpr::Union(items) | TypeExpr::Rel(items) => {
                for item in items {
                    item.free_vars(out);
                }
            }
            TypeExpr::List(e) | TypeExpr::OptionTy(e) => e.free_vars(out),
            TypeExpr::Struct(req, opt) => {
                for (_, t) in req.iter().chain(opt) {
                    t.free_vars(out);
                }
            }
            TypeExpr::Fun(res, args) => {
                res.free_vars(out);
                for a in args {
                    a.free_vars(out);
                }
            }
            TypeExpr::Any
            | TypeExpr::Bot
            | TypeExpr::Number
            | TypeExpr::Float64
            | TypeExpr::StringTy
            | TypeExpr::NameAny
            | TypeExpr::NamePrefix(_)
            | TypeExpr::Singleton(_) => {}
        }
    }
}

/// A well-formedness context: type variable names mapped to an upper bound,
/// or `None` for an unconstrained variable (the surface `_`).
pub type Context = AHashMap<Arc<str>, Option<TypeExpr>>;

/// Check that `expr` is well-formed under `ctx`. Used both directly on
/// declared bounds and, by the desugarer, on a resolved bound cell.
pub fn well_formed_type(ctx: &Context, expr: &TypeExpr) -> Result<()> {
    match expr {
        TypeExpr::Any
        | TypeExpr::Bot
        | TypeExpr::Number
        | TypeExpr::Float64
        | TypeExpr::StringTy
        | TypeExpr::NameAny
        | TypeExpr::NamePrefix(_)
        | TypeExpr::Singleton(_) => Ok(()),
        TypeExpr::Var(v) => {
            if ctx.contains_key(v) {
                Ok(())
            } else {
                Err(Error::MalformedType(format!("unbound type variable {v}")))
            }
        }
        TypeExpr::Pair(a, b) => {
            well_formed_type(ctx, a)?;
            well_formed_type(ctx, b)
        }
        TypeExpr::Tuple(items) => {
            if items.len() < 3 {
                return Err(Error::MalformedType(
                    "tuple type requires at least 3 elements".into(),
                ));
            }
            items.iter().try_for_each(|t| well_formed_type(ctx, t))
        }
        TypeExpr::List(e) => well_formed_type(ctx, e),
        TypeExpr::Map(k, v) => {
            well_formed_type(ctx, k)?;
            well_formed_type(ctx, v)
        }
        TypeExpr::Struct(req, opt) => {
            let mut seen = HashSet::new();
            for (field, ty) in req.iter().chain(opt) {
                if !seen.insert(field) {
                    return Err(Error::MalformedType(format!(
                        "duplicate struct field {field}"
                    )));
                }
                well_formed_type(ctx, ty)?;
            }
            Ok(())
        }
        TypeExpr::Union(items) => {
            if items.is_empty() {
                return Err(Error::MalformedType("union type must be non-empty".into()));
            }
            items.iter().try_for_each(|t| well_formed_type(ctx, t))
        }
        TypeExpr::OptionTy(inner) => well_formed_type(ctx, inner),
        TypeExpr::Fun(res, args) => {
            let mut free = HashSet::new();
            res.free_vars(&mut free);
            let mut extended = ctx.clone();
            for v in &free {
                extended.entry(v.clone()).or_insert(Some(TypeExpr::Any));
            }
            let bound_by_args: HashSet<Arc<str>> = {
                let mut s = HashSet::new();
                for a in args {
                    a.free_vars(&mut s);
                }
                s
            };
            for v in &free {
                if !bound_by_args.contains(v) {
                    return Err(Error::MalformedType(format!(
                        "type variable {v} free in result but not bound by any argument"
                    )));
                }
            }
            for a in args {
                well_formed_type(&extended, a)?;
            }
            well_formed_type(&extended, res)
        }
        TypeExpr::Rel(args) => args.iter().try_for_each(|t| well_formed_type(ctx, t)),
    }
}

/// Check that a desugared bound-row cell is well-formed. An alias for
/// [`well_formed_type`] kept distinct because the desugarer calls it on
/// cells that, before resolution, may instead have been a bare predicate
/// name reference (handled in [`crate::desugar`], never reaching here).
pub fn well_formed_bound(ctx: &Context, expr: &TypeExpr) -> Result<()> {
    well_formed_type(ctx, expr)
}

/// Runtime membership check: does constant `c` satisfy type `t`?
pub fn has_type(t: &TypeExpr, c: &Constant) -> bool {
    match t {
        TypeExpr::Any => true,
        TypeExpr::Bot => false,
        TypeExpr::Number => matches!(c, Constant::Number(_)),
        TypeExpr::Float64 => matches!(c, Constant::Float(_)),
        TypeExpr::StringTy => matches!(c, Constant::String(_)),
        TypeExpr::NameAny => matches!(c, Constant::Name(_)),
        TypeExpr::NamePrefix(prefix) => {
            matches!(c, Constant::Name(n) if prefix.is_strict_prefix_of(n))
        }
        TypeExpr::Var(_) => false,
        TypeExpr::Pair(a, b) => c
            .pair_value()
            .map(|(l, r)| has_type(a, l) && has_type(b, r))
            .unwrap_or(false),
        TypeExpr::Tuple(items) => {
            let expanded = tuple_as_pairs(items);
            has_type(&expanded, c)
        }
        TypeExpr::List(elem) => match c {
            Constant::ListNil => true,
            Constant::ListCons(..) => {
                c.list_values(|item| {
                    if has_type(elem, item) {
                        std::ops::ControlFlow::Continue(())
                    } else {
                        std::ops::ControlFlow::Break(())
                    }
                })
                .is_none()
            }
            _ => false,
        },
        TypeExpr::Map(key, value) => match c {
            Constant::MapNil => true,
            Constant::MapCons(..) => {
                c.map_values(|k, v| {
                    if has_type(key, k) && has_type(value, v) {
                        std::ops::ControlFlow::Continue(())
                    } else {
                        std::ops::ControlFlow::Break(())
                    }
                })
                .is_none()
            }
            _ => false,
        },
        TypeExpr::Struct(required, optional) => match c {
            Constant::StructNil | Constant::StructCons(..) => {
                let mut seen: HashSet<Name> = HashSet::new();
                let all_ok = c
                    .struct_values(|field, value| {
                        seen.insert(field.clone());
                        let declared = required
                            .iter()
                            .chain(optional)
                            .find(|(f, _)| f == field)
                            .map(|(_, ty)| ty);
                        match declared {
                            Some(ty) if has_type(ty, value) => std::ops::ControlFlow::Continue(()),
                            _ => std::ops::ControlFlow::Break(()),
                        }
                    })
                    .is_none();
                all_ok && required.iter().all(|(field, _)| seen.contains(field))
            }
            _ => false,
        },
        TypeExpr::Union(items) => items.iter().any(|alt| has_type(alt, c)),
        TypeExpr::Singleton(expected) => c == expected,
        TypeExpr::OptionTy(_) => has_type(&t.expand_option(), c),
        TypeExpr::Fun(..) | TypeExpr::Rel(_) => false,
    }
}

fn tuple_as_pairs(items: &[TypeExpr]) -> TypeExpr {
    match items {
        [] => TypeExpr::Bot,
        [only] => only.clone(),
        [head, rest @ ..] => TypeExpr::Pair(Box::new(head.clone()), Box::new(tuple_as_pairs(rest))),
    }
}

/// Subtype judgement: does every value of `l` also satisfy `r`?
pub fn type_conforms(ctx: &Context, l: &TypeExpr, r: &TypeExpr) -> bool {
    if l == r {
        return true;
    }
    if matches!(r, TypeExpr::Any) {
        return true;
    }
    if matches!(l, TypeExpr::Bot) {
        return true;
    }
    if let TypeExpr::Var(v) = l {
        return match ctx.get(v) {
            Some(Some(bound)) => type_conforms(ctx, bound, r),
            _ => false,
        };
    }
    if let TypeExpr::Var(v) = r {
        return match ctx.get(v) {
            Some(Some(bound)) => type_conforms(ctx, l, bound),
            _ => false,
        };
    }
    if let TypeExpr::Union(items) = l {
        return items.iter().all(|alt| type_conforms(ctx, alt, r));
    }
    if let TypeExpr::Union(items) = r {
        return items.iter().any(|alt| type_conforms(ctx, l, alt));
    }
    match (l, r) {
        (TypeExpr::NamePrefix(_), TypeExpr::NameAny) => true,
        (TypeExpr::NamePrefix(ln), TypeExpr::NamePrefix(rn)) => rn.is_prefix_of_or_eq(ln),
        (TypeExpr::Pair(a1, b1), TypeExpr::Pair(a2, b2)) => {
            type_conforms(ctx, a1, a2) && type_conforms(ctx, b1, b2)
        }
        (TypeExpr::Tuple(xs), TypeExpr::Tuple(ys)) if xs.len() == ys.len() => xs
            .iter()
            .zip(ys)
            .all(|(x, y)| type_conforms(ctx, x, y)),
        (TypeExpr::List(a), TypeExpr::List(b)) => type_conforms(ctx, a, b),
        (TypeExpr::Map(k1, v1), TypeExpr::Map(k2, v2)) => {
            type_conforms(ctx, k2, k1) && type_conforms(ctx, v1, v2)
        }
        (TypeExpr::Struct(reql, optl), TypeExpr::Struct(reqr, optr)) => {
            let find = |field: &Name| -> Option<(&TypeExpr, bool)> {
                reql.iter()
                    .find(|(f, _)| f == field)
                    .map(|(_, t)| (t, true))
                    .or_else(|| optl.iter().find(|(f, _)| f == field).map(|(_, t)| (t, false)))
            };
            reqr.iter().all(|(field, rty)| {
                matches!(find(field), Some((lty, true)) if type_conforms(ctx, lty, rty))
            }) && optr.iter().all(|(field, rty)| match find(field) {
                Some((lty, _)) => type_conforms(ctx, lty, rty),
                None => false,
            })
        }
        (TypeExpr::Fun(res_l, args_l), TypeExpr::Fun(res_r, args_r))
            if args_l.len() == args_r.len() =>
        {
            type_conforms(ctx, res_l, res_r)
                && args_l
                    .iter()
                    .zip(args_r)
                    .all(|(al, ar)| type_conforms(ctx, ar, al))
        }
        (TypeExpr::Rel(xs), TypeExpr::Rel(ys)) if xs.len() == ys.len() => {
            xs.iter().zip(ys).all(|(x, y)| type_conforms(ctx, x, y))
        }
        (TypeExpr::Singleton(d), _) => has_type(r, d),
        (TypeExpr::OptionTy(_), _) => type_conforms(ctx, &l.expand_option(), r),
        (_, TypeExpr::OptionTy(_)) => type_conforms(ctx, l, &r.expand_option()),
        _ => false,
    }
}

/// Like [`type_conforms`], additionally treating `Rel` on both sides
/// pointwise and distributing a left-hand union — both already folded into
/// [`type_conforms`] directly, so this is the same judgement under the name
/// the lattice operations use.
pub fn set_conforms(ctx: &Context, l: &TypeExpr, r: &TypeExpr) -> bool {
    type_conforms(ctx, l, r)
}

fn flatten_union(items: &[TypeExpr], out: &mut Vec<TypeExpr>) {
    for item in items {
        match item {
            TypeExpr::Union(inner) => flatten_union(inner, out),
            other => out.push(other.clone()),
        }
    }
}

/// Least upper bound of `types` under `set_conforms`: flattens nested
/// unions, then greedily keeps only the maximal elements. Returns `/any` if
/// any input is `/any`; returns the empty union (bottom) for an empty
/// input.
pub fn upper_bound(ctx: &Context, types: &[TypeExpr]) -> TypeExpr {
    let mut flat = Vec::new();
    flatten_union(types, &mut flat);
    if flat.iter().any(|t| matches!(t, TypeExpr::Any)) {
        return TypeExpr::Any;
    }
    flat.sort();
    flat.dedup();
    let mut kept: Vec<TypeExpr> = Vec::new();
    for candidate in flat {
        if kept.iter().any(|k| set_conforms(ctx, &candidate, k)) {
            continue;
        }
        kept.retain(|k| !set_conforms(ctx, k, &candidate));
        kept.push(candidate);
    }
    kept.sort();
    match kept.len() {
        0 => TypeExpr::Union(vec![]),
        1 => kept.into_iter().next().unwrap(),
        _ => TypeExpr::Union(kept),
    }
}

fn is_bottom(t: &TypeExpr) -> bool {
    matches!(t, TypeExpr::Bot) || matches!(t, TypeExpr::Union(items) if items.is_empty())
}

fn intersect(ctx: &Context, a: &TypeExpr, b: &TypeExpr) -> TypeExpr {
    if type_conforms(ctx, a, b) {
        return a.clone();
    }
    if type_conforms(ctx, b, a) {
        return b.clone();
    }
    if let TypeExpr::Union(items) = a {
        let parts: Vec<TypeExpr> = items
            .iter()
            .map(|x| intersect(ctx, x, b))
            .filter(|t| !is_bottom(t))
            .collect();
        return match parts.len() {
            0 => TypeExpr::Union(vec![]),
            1 => parts.into_iter().next().unwrap(),
            _ => TypeExpr::Union(parts),
        };
    }
    if let TypeExpr::Union(items) = b {
        let parts: Vec<TypeExpr> = items
            .iter()
            .map(|y| intersect(ctx, a, y))
            .filter(|t| !is_bottom(t))
            .collect();
        return match parts.len() {
            0 => TypeExpr::Union(vec![]),
            1 => parts.into_iter().next().unwrap(),
            _ => TypeExpr::Union(parts),
        };
    }
    TypeExpr::Union(vec![])
}

/// Greatest lower bound of `types`, folded pairwise with [`intersect`].
/// Intersecting disjoint types yields the empty union (bottom). An empty
/// input returns `/any` (the intersection of no constraints is
/// unconstrained).
pub fn lower_bound(ctx: &Context, types: &[TypeExpr]) -> TypeExpr {
    let mut iter = types.iter();
    let Some(first) = iter.next() else {
        return TypeExpr::Any;
    };
    iter.fold(first.clone(), |acc, next| intersect(ctx, &acc, next))
}

/// Checks ground facts against their predicate's desugared declaration.
#[derive(Debug, Default)]
pub struct TypeChecker {
    decls: AHashMap<PredicateSym, Decl>,
}

impl TypeChecker {
    /// Build a checker from a map of fully desugared declarations.
    pub fn new(decls: AHashMap<PredicateSym, Decl>) -> Self {
        TypeChecker { decls }
    }

    /// Check a ground atom against its predicate's declaration: succeeds if
    /// some bound row's types all accept the corresponding argument.
    pub fn check(&self, fact: &Atom) -> Result<()> {
        let decl = self
            .decls
            .get(&fact.predicate)
            .ok_or_else(|| Error::UnknownSymbol(fact.predicate.symbol.to_string()))?;

        let mut reasons = Vec::new();
        for (row_idx, row) in decl.bounds.iter().enumerate() {
            let mut row_failures = Vec::new();
            for (j, (ty, arg)) in row.iter().zip(fact.args.iter()).enumerate() {
                let Some(c) = arg.as_constant() else {
                    row_failures.push(format!("argument {j} is not ground"));
                    continue;
                };
                if !has_type(ty, c) {
                    row_failures.push(format!("argument {j} ({c}) does not satisfy {ty}"));
                }
            }
            if row_failures.is_empty() {
                return Ok(());
            }
            reasons.push(format!("row {row_idx}: {}", row_failures.join("; ")));
        }

        Err(Error::TypeCheckFailure {
            predicate: fact.predicate.symbol.to_string(),
            reasons,
        })
    }
}
