//! Reducer functions: `eval_reduce_fn`.
//!
//! Reducers fold over a stream of per-row substitutions (one row per
//! derivation of a rule body) rather than over a single `List` constant —
//! the row-oriented counterpart to the list-oriented aggregations in
//! [`super::functions`] that happen to share a few symbol names.

use super::eval_expr;
use crate::error::{Error, Result};
use crate::term::{Constant, FunctionSym, Term};
use crate::unify::Substitution;

const VARIADIC: &[&str] = &["fn:collect", "fn:collect_distinct"];
const UNARY: &[&str] = &[
    "fn:count",
    "fn:max",
    "fn:min",
    "fn:sum",
    "fn:float:max",
    "fn:float:min",
    "fn:float:sum",
    "fn:pick_any",
];

/// Look up whether `symbol` names a reducer, independent of declared arity
/// (reducer arity is the shape of its argument-term list, not the row
/// count it folds over).
pub(super) fn lookup(symbol: &str) -> Option<()> {
    if VARIADIC.contains(&symbol) || UNARY.contains(&symbol) || symbol == "fn:count" {
        Some(())
    } else {
        None
    }
}

fn row_value(op: &str, term: &Term, row: &Substitution) -> Result<Constant> {
    eval_expr(term, row)?.as_constant().cloned().ok_or_else(|| Error::TypeMismatch {
        context: op.to_string(),
        message: "row did not evaluate to a ground constant".to_string(),
    })
}

fn row_number(op: &str, term: &Term, row: &Substitution) -> Result<i64> {
    row_value(op, term, row)?.as_number().map_err(|_| Error::TypeMismatch {
        context: op.to_string(),
        message: "expected a number".to_string(),
    })
}

fn row_float(op: &str, term: &Term, row: &Substitution) -> Result<f64> {
    let c = row_value(op, term, row)?;
    match c {
        Constant::Number(n) => Ok(n as f64),
        Constant::Float(f) => Ok(f.value()),
        other => Err(Error::TypeMismatch {
            context: op.to_string(),
            message: format!("expected a number, got {}", other.kind_name()),
        }),
    }
}

/// Evaluate a reducer call. `args` is the reducer's own argument-term list
/// (e.g. the `X` in `fn:max(X)`, or the tuple components of
/// `fn:collect(A, B)`); `rows` is one substitution per matching derivation.
pub fn eval_reduce_fn(symbol: &FunctionSym, args: &[Term], rows: &[Substitution]) -> Result<Constant> {
    let name = symbol.symbol.as_ref();
    match name {
        "fn:collect" => Ok(Constant::mk_list(collect(name, args, rows, false)?)),
        "fn:collect_distinct" => Ok(Constant::mk_list(collect(name, args, rows, true)?)),
        "fn:count" => Ok(Constant::Number(rows.len() as i64)),
        "fn:max" => {
            reduce_unary(name, args, rows, i64::MIN, |acc, row| {
                row_number(name, &args[0], row).map(|n| acc.max(n))
            })
        }
        "fn:min" => {
            reduce_unary(name, args, rows, i64::MAX, |acc, row| {
                row_number(name, &args[0], row).map(|n| acc.min(n))
            })
        }
        "fn:sum" => {
            reduce_unary(name, args, rows, 0, |acc, row| {
                row_number(name, &args[0], row).map(|n| acc + n)
            })
        }
        "fn:float:max" => Ok(Constant::Float(crate::term::Float::new(reduce_unary_f(
            name,
            args,
            rows,
            f64::NEG_INFINITY,
            |acc, row| row_float(name, &args[0], row).map(|f| acc.max(f)),
        )?))),
        "fn:float:min" => Ok(Constant::Float(crate::term::Float::new(reduce_unary_f(
            name,
            args,
            rows,
            f64::INFINITY,
            |acc, row| row_float(name, &args[0], row).map(|f| acc.min(f)),
        )?))),
        "fn:float:sum" => Ok(Constant::Float(crate::term::Float::new(reduce_unary_f(
            name,
            args,
            rows,
            0.0,
            |acc, row| row_float(name, &args[0], row).map(|f| acc + f),
        )?))),
        "fn:pick_any" => {
            require_arity(name, args, 1)?;
            match rows.first() {
                Some(row) => row_value(name, &args[0], row),
                None => Err(Error::TypeMismatch {
                    context: name.to_string(),
                    message: "fn:pick_any called with no matching rows".to_string(),
                }),
            }
        }
        other => Err(Error::UnknownSymbol(other.to_string())),
    }
}

fn require_arity(op: &str, args: &[Term], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::ArityMismatch {
            symbol: op.to_string(),
            expected: expected as i16,
            actual: args.len(),
        });
    }
    Ok(())
}

fn reduce_unary(
    op: &str,
    args: &[Term],
    rows: &[Substitution],
    empty: i64,
    step: impl Fn(i64, &Substitution) -> Result<i64>,
) -> Result<Constant> {
    require_arity(op, args, 1)?;
    if rows.is_empty() {
        return Ok(Constant::Number(empty));
    }
    let mut acc = empty;
    for row in rows {
        acc = step(acc, row)?;
    }
    Ok(Constant::Number(acc))
}

fn reduce_unary_f(
    op: &str,
    args: &[Term],
    rows: &[Substitution],
    empty: f64,
    step: impl Fn(f64, &Substitution) -> Result<f64>,
) -> Result<f64> {
    require_arity(op, args, 1)?;
    if rows.is_empty() {
        return Ok(empty);
    }
    let mut acc = empty;
    for row in rows {
        acc = step(acc, row)?;
    }
    Ok(acc)
}

fn collect(op: &str, args: &[Term], rows: &[Substitution], distinct: bool) -> Result<Vec<Constant>> {
    let mut out: Vec<Constant> = Vec::new();
    for row in rows {
        let values: Result<Vec<Constant>> = args.iter().map(|t| row_value(op, t, row)).collect();
        let Ok(values) = values else {
            continue;
        };
        let tuple = if values.len() == 1 {
            values.into_iter().next().unwrap()
        } else if values.is_empty() {
            continue;
        } else {
            Constant::mk_tuple(values)
        };
        if distinct && out.contains(&tuple) {
            continue;
        }
        out.push(tuple);
    }
    Ok(out)
}
