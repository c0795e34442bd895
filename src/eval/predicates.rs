//! Built-in predicates: `decide`.

use super::eval_expr;
use crate::decl::Atom;
use crate::error::{Error, Result};
use crate::term::Constant;
use crate::unify::Substitution;

/// Fixed arities for every built-in predicate, used both to validate calls
/// and to answer [`super::is_builtin_predicate`].
const REGISTRY: &[(&str, i16)] = &[
    (":lt", 2),
    (":le", 2),
    (":gt", 2),
    (":ge", 2),
    (":within_distance", 3),
    (":match_pair", 3),
    (":match_cons", 3),
    (":match_nil", 1),
    (":match_entry", 3),
    (":match_field", 3),
    (":string:starts_with", 2),
    (":string:ends_with", 2),
    (":string:contains", 2),
    (":match_prefix", 2),
    (":list:member", 2),
    (":filter", 1),
];

/// Look up a predicate's declared arity, honoring the variadic (`-1`)
/// fallback. None of the current predicates are variadic, but the lookup
/// rule is shared with [`super::functions::lookup`] and
/// [`super::reducers::lookup`] for a consistent symbol-resolution story.
pub(super) fn lookup(symbol: &str, arity: usize) -> Option<i16> {
    REGISTRY.iter().find_map(|(name, declared)| {
        if *name == symbol && (*declared == -1 || *declared as usize == arity) {
            Some(*declared)
        } else {
            None
        }
    })
}

/// Evaluate a built-in predicate atom against `subst`.
///
/// Returns `(true, extensions)` on success, `(false, vec![])` on a clean
/// match failure (never an error for the structural `:match_*` family), and
/// an error for arity mismatches, unknown symbols, or a type mismatch in a
/// context where that is defined to be an error (numeric comparisons, a
/// non-string pattern argument to a `:string:*` predicate whose scrutinee
/// was itself a string — a non-string scrutinee instead yields a clean
/// `(false, vec![])`).
pub fn decide(atom: &Atom, subst: &Substitution) -> Result<(bool, Vec<Substitution>)> {
    let symbol = &atom.predicate;
    if lookup(&symbol.symbol, atom.args.len()).is_none() {
        if REGISTRY.iter().any(|(name, _)| *name == symbol.symbol.as_ref()) {
            return Err(Error::arity(symbol, atom.args.len()));
        }
        return Err(Error::UnknownSymbol(symbol.symbol.to_string()));
    }

    let args: Vec<Constant> = atom
        .args
        .iter()
        .map(|t| {
            eval_expr(t, subst)?
                .as_constant()
                .cloned()
                .ok_or_else(|| Error::TypeMismatch {
                    context: symbol.symbol.to_string(),
                    message: "argument did not evaluate to a ground constant".to_string(),
                })
        })
        .collect::<Result<_>>()?;

    match symbol.symbol.as_ref() {
        ":lt" => numeric_cmp(symbol.symbol.as_ref(), &args, |a, b| a < b, |a, b| a < b, subst),
        ":le" => numeric_cmp(symbol.symbol.as_ref(), &args, |a, b| a <= b, |a, b| a <= b, subst),
        ":gt" => numeric_cmp(symbol.symbol.as_ref(), &args, |a, b| a > b, |a, b| a > b, subst),
        ":ge" => numeric_cmp(symbol.symbol.as_ref(), &args, |a, b| a >= b, |a, b| a >= b, subst),
        ":within_distance" => within_distance(&args, subst),
        ":match_pair" => match_pair(&atom.args, subst),
        ":match_cons" => match_cons(&atom.args, subst),
        ":match_nil" => Ok(single_if(matches!(args[0], Constant::ListNil), subst)),
        ":match_entry" => match_entry(&atom.args, subst),
        ":match_field" => match_field(&atom.args, subst),
        ":string:starts_with" => string_predicate(symbol.symbol.as_ref(), &args, subst, |s, p| s.starts_with(p)),
        ":string:ends_with" => string_predicate(symbol.symbol.as_ref(), &args, subst, |s, p| s.ends_with(p)),
        ":string:contains" => string_predicate(symbol.symbol.as_ref(), &args, subst, |s, p| s.contains(p)),
        ":match_prefix" => match_prefix(&args, subst),
        ":list:member" => list_member(&atom.args, subst),
        ":filter" => Ok(single_if(args[0] == Constant::TRUE, subst)),
        other => Err(Error::UnknownSymbol(other.to_string())),
    }
}

fn single_if(cond: bool, subst: &Substitution) -> (bool, Vec<Substitution>) {
    if cond {
        (true, vec![subst.clone()])
    } else {
        (false, vec![])
    }
}

fn numeric_cmp(
    op: &str,
    args: &[Constant],
    int_cmp: impl Fn(i64, i64) -> bool,
    float_cmp: impl Fn(f64, f64) -> bool,
    subst: &Substitution,
) -> Result<(bool, Vec<Substitution>)> {
    let result = match (&args[0], &args[1]) {
        (Constant::Number(a), Constant::Number(b)) => int_cmp(*a, *b),
        (Constant::Float(a), Constant::Float(b)) => float_cmp(a.value(), b.value()),
        (Constant::Number(a), Constant::Float(b)) => float_cmp(*a as f64, b.value()),
        (Constant::Float(a), Constant::Number(b)) => float_cmp(a.value(), *b as f64),
        (a, b) => {
            return Err(Error::TypeMismatch {
                context: op.to_string(),
                message: format!("cannot compare {} with {}", a.kind_name(), b.kind_name()),
            })
        }
    };
    Ok(single_if(result, subst))
}

fn within_distance(args: &[Constant], subst: &Substitution) -> Result<(bool, Vec<Substitution>)> {
    let to_f64 = |c: &Constant| match c {
        Constant::Number(n) => Ok(*n as f64),
        Constant::Float(f) => Ok(f.value()),
        other => Err(Error::TypeMismatch {
            context: ":within_distance".to_string(),
            message: format!("expected a numeric value, got {}", other.kind_name()),
        }),
    };
    let a = to_f64(&args[0])?;
    let b = to_f64(&args[1])?;
    let d = to_f64(&args[2])?;
    Ok(single_if((a - b).abs() < d, subst))
}

fn bind_one(subst: &Substitution, var: &crate::term::Term, value: Constant) -> Option<Substitution> {
    let mut next = subst.clone();
    match next.unify_terms(var, &crate::term::Term::Constant(value)) {
        Ok(true) => Some(next),
        _ => None,
    }
}

fn match_pair(args: &std::sync::Arc<[crate::term::Term]>, subst: &Substitution) -> Result<(bool, Vec<Substitution>)> {
    let scrutinee = eval_expr(&args[0], subst)?;
    let Some(c) = scrutinee.as_constant() else {
        return Ok((false, vec![]));
    };
    let Ok((l, r)) = c.pair_value() else {
        return Ok((false, vec![]));
    };
    let (l, r) = (l.clone(), r.clone());
    let Some(next) = bind_one(subst, &args[1], l) else {
        return Ok((false, vec![]));
    };
    match bind_one(&next, &args[2], r) {
        Some(next2) => Ok((true, vec![next2])),
        None => Ok((false, vec![])),
    }
}

fn match_cons(args: &std::sync::Arc<[crate::term::Term]>, subst: &Substitution) -> Result<(bool, Vec<Substitution>)> {
    let scrutinee = eval_expr(&args[0], subst)?;
    let Some(c) = scrutinee.as_constant() else {
        return Ok((false, vec![]));
    };
    let Ok((h, t)) = c.cons_value() else {
        return Ok((false, vec![]));
    };
    let (h, t) = (h.clone(), t.clone());
    let Some(next) = bind_one(subst, &args[1], h) else {
        return Ok((false, vec![]));
    };
    match bind_one(&next, &args[2], t) {
        Some(next2) => Ok((true, vec![next2])),
        None => Ok((false, vec![])),
    }
}

fn match_entry(args: &std::sync::Arc<[crate::term::Term]>, subst: &Substitution) -> Result<(bool, Vec<Substitution>)> {
    let map = eval_expr(&args[0], subst)?;
    let key = eval_expr(&args[1], subst)?;
    let (Some(map_c), Some(key_c)) = (map.as_constant(), key.as_constant()) else {
        return Ok((false, vec![]));
    };
    let found = map_c.map_iter().find(|(k, _)| *k == key_c).map(|(_, v)| v.clone());
    match found {
        Some(value) => match bind_one(subst, &args[2], value) {
            Some(next) => Ok((true, vec![next])),
            None => Ok((false, vec![])),
        },
        None => Ok((false, vec![])),
    }
}

fn match_field(args: &std::sync::Arc<[crate::term::Term]>, subst: &Substitution) -> Result<(bool, Vec<Substitution>)> {
    let s = eval_expr(&args[0], subst)?;
    let field = eval_expr(&args[1], subst)?;
    let (Some(s_c), Some(Constant::Name(field_name))) = (s.as_constant(), field.as_constant()) else {
        return Ok((false, vec![]));
    };
    let found = s_c
        .struct_iter()
        .find(|(f, _)| *f == field_name)
        .map(|(_, v)| v.clone());
    match found {
        Some(value) => match bind_one(subst, &args[2], value) {
            Some(next) => Ok((true, vec![next])),
            None => Ok((false, vec![])),
        },
        None => Ok((false, vec![])),
    }
}

fn string_predicate(
    name: &str,
    args: &[Constant],
    subst: &Substitution,
    op: impl Fn(&str, &str) -> bool,
) -> Result<(bool, Vec<Substitution>)> {
    let Constant::String(scrutinee) = &args[0] else {
        return Ok((false, vec![]));
    };
    let Constant::String(pattern) = &args[1] else {
        return Err(Error::TypeMismatch {
            context: name.to_string(),
            message: format!("expected a string pattern argument, got {}", args[1].kind_name()),
        });
    };
    Ok(single_if(op(scrutinee, pattern), subst))
}

fn match_prefix(args: &[Constant], subst: &Substitution) -> Result<(bool, Vec<Substitution>)> {
    match (&args[0], &args[1]) {
        (Constant::Name(scrutinee), Constant::Name(prefix)) => {
            Ok(single_if(prefix.is_strict_prefix_of(scrutinee), subst))
        }
        _ => Ok((false, vec![])),
    }
}

fn list_member(args: &std::sync::Arc<[crate::term::Term]>, subst: &Substitution) -> Result<(bool, Vec<Substitution>)> {
    let elt = eval_expr(&args[0], subst)?;
    let list = eval_expr(&args[1], subst)?;
    let Some(list_c) = list.as_constant() else {
        return Err(Error::TypeMismatch {
            context: ":list:member".to_string(),
            message: "second argument must evaluate to a list".to_string(),
        });
    };

    if let Some(bound) = elt.as_constant() {
        let found = list_c.list_iter().any(|item| item == bound);
        return Ok(single_if(found, subst));
    }

    let mut extensions = Vec::new();
    for item in list_c.list_iter() {
        if let Some(next) = bind_one(subst, &args[0], item.clone()) {
            extensions.push(next);
        }
    }
    Ok((!extensions.is_empty(), extensions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Symbol, Term};

    fn atom(symbol: &str, args: Vec<Term>) -> Atom {
        Atom::new(Symbol::new(symbol, args.len() as i16), args)
    }

    fn num(n: i64) -> Term {
        Term::Constant(Constant::Number(n))
    }

    #[test]
    fn lt_on_numbers() {
        let subst = Substitution::new();
        let (truth, exts) = decide(&atom(":lt", vec![num(1), num(2)]), &subst).unwrap();
        assert!(truth);
        assert_eq!(exts, vec![subst]);
    }

    #[test]
    fn lt_type_mismatch_is_an_error() {
        let subst = Substitution::new();
        let a = atom(":lt", vec![Term::Constant(Constant::String("a".into())), num(2)]);
        assert!(decide(&a, &subst).is_err());
    }

    #[test]
    fn lt_wrong_arity_is_an_error() {
        let subst = Substitution::new();
        let a = atom(":lt", vec![num(1), num(2), num(3)]);
        assert!(matches!(decide(&a, &subst), Err(Error::ArityMismatch { .. })));
    }

    #[test]
    fn match_pair_binds_both_sides() {
        let subst = Substitution::new();
        let pair = Term::Constant(Constant::mk_pair(Constant::Number(1), Constant::Number(2)));
        let a = atom(":match_pair", vec![pair, Term::var("X"), Term::var("Y")]);
        let (truth, exts) = decide(&a, &subst).unwrap();
        assert!(truth);
        assert_eq!(exts.len(), 1);
        assert_eq!(exts[0].get("X"), Some(Constant::Number(1)));
        assert_eq!(exts[0].get("Y"), Some(Constant::Number(2)));
    }

    #[test]
    fn match_pair_shape_mismatch_is_false_not_error() {
        let subst = Substitution::new();
        let a = atom(":match_pair", vec![num(1), Term::var("X"), Term::var("Y")]);
        let (truth, exts) = decide(&a, &subst).unwrap();
        assert!(!truth);
        assert!(exts.is_empty());
    }

    #[test]
    fn string_starts_with_non_string_scrutinee_is_false_not_error() {
        let subst = Substitution::new();
        let a = atom(":string:starts_with", vec![num(1), Term::Constant(Constant::String("a".into()))]);
        let (truth, exts) = decide(&a, &subst).unwrap();
        assert!(!truth);
        assert!(exts.is_empty());
    }

    #[test]
    fn string_starts_with_non_string_pattern_is_a_type_mismatch() {
        let subst = Substitution::new();
        let a = atom(
            ":string:starts_with",
            vec![Term::Constant(Constant::String("abc".into())), num(5)],
        );
        assert!(matches!(decide(&a, &subst), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn list_member_enumerates_in_order() {
        let subst = Substitution::new();
        let list = Term::Constant(Constant::mk_list(vec![
            Constant::Number(1),
            Constant::Number(2),
            Constant::Number(3),
        ]));
        let a = atom(":list:member", vec![Term::var("X"), list]);
        let (truth, exts) = decide(&a, &subst).unwrap();
        assert!(truth);
        let values: Vec<_> = exts.iter().map(|s| s.get("X").unwrap()).collect();
        assert_eq!(
            values,
            vec![Constant::Number(1), Constant::Number(2), Constant::Number(3)]
        );
    }
}
