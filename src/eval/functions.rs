//! Built-in functions: `eval_apply_fn`.

use crate::error::{Error, Result};
use crate::term::{Constant, FunctionSym, Name};

const FIXED: &[(&str, i16)] = &[
    ("fn:pair", 2),
    ("fn:cons", 2),
    ("fn:list:append", 2),
    ("fn:list:get", 2),
    ("fn:list:contains", 2),
    ("fn:list:len", 1),
    ("fn:map:get", 2),
    ("fn:struct:get", 2),
    ("fn:max", 1),
    ("fn:min", 1),
    ("fn:sum", 1),
    ("fn:float:max", 1),
    ("fn:float:min", 1),
    ("fn:float:sum", 1),
];

const VARIADIC: &[&str] = &["fn:list", "fn:tuple", "fn:map", "fn:struct", "fn:plus", "fn:minus", "fn:mult", "fn:div"];

/// Look up a function's declared arity: a fixed arity from [`FIXED`], or
/// `-1` for a symbol in [`VARIADIC`].
pub(super) fn lookup(symbol: &str, arity: usize) -> Option<i16> {
    if let Some((_, declared)) = FIXED.iter().find(|(name, _)| *name == symbol) {
        if *declared as usize == arity {
            return Some(*declared);
        }
        return None;
    }
    if VARIADIC.contains(&symbol) {
        return Some(-1);
    }
    None
}

/// Evaluate a built-in function application to a constant.
pub fn eval_apply_fn(symbol: &FunctionSym, args: &[Constant]) -> Result<Constant> {
    let name = symbol.symbol.as_ref();
    if lookup(name, args.len()).is_none() {
        if FIXED.iter().any(|(n, _)| *n == name) || VARIADIC.contains(&name) {
            return Err(Error::arity(symbol, args.len()));
        }
        return Err(Error::UnknownSymbol(name.to_string()));
    }

    match name {
        "fn:pair" => Ok(Constant::mk_pair(args[0].clone(), args[1].clone())),
        "fn:cons" => Ok(Constant::ListCons(
            std::sync::Arc::new(args[0].clone()),
            std::sync::Arc::new(args[1].clone()),
        )),
        "fn:list" => Ok(Constant::mk_list(args.to_vec())),
        "fn:tuple" => Ok(Constant::mk_tuple(args.to_vec())),
        "fn:map" => mk_map_from_flat(args),
        "fn:struct" => mk_struct_from_flat(args),
        "fn:list:append" => list_append(&args[0], &args[1]),
        "fn:list:get" => list_get(&args[0], &args[1]),
        "fn:list:contains" => Ok(Constant::Bool(list_contains(&args[0], &args[1])?)),
        "fn:list:len" => Ok(Constant::Number(args[0].list_len()? as i64)),
        "fn:map:get" => map_get(&args[0], &args[1]),
        "fn:struct:get" => struct_get(&args[0], &args[1]),
        "fn:plus" => fold_numeric(name, args, 0, |a, b| a.checked_add(b), |a, b| a + b),
        "fn:mult" => fold_numeric(name, args, 1, |a, b| a.checked_mul(b), |a, b| a * b),
        "fn:minus" => minus(name, args),
        "fn:div" => div(name, args),
        "fn:max" => list_fold_numeric(name, &args[0], i64::MIN, i64::max, f64::max),
        "fn:min" => list_fold_numeric(name, &args[0], i64::MAX, i64::min, f64::min),
        "fn:sum" => list_fold_numeric(name, &args[0], 0, |a, b| a.wrapping_add(b), |a, b| a + b),
        "fn:float:max" => list_fold_float(&args[0], f64::NEG_INFINITY, f64::max),
        "fn:float:min" => list_fold_float(&args[0], f64::INFINITY, f64::min),
        "fn:float:sum" => list_fold_float(&args[0], 0.0, |a, b| a + b),
        other => Err(Error::UnknownSymbol(other.to_string())),
    }
}

fn mk_map_from_flat(args: &[Constant]) -> Result<Constant> {
    if args.len() % 2 != 0 {
        return Err(Error::TypeMismatch {
            context: "fn:map".to_string(),
            message: "expected an even number of key/value arguments".to_string(),
        });
    }
    let entries = args.chunks(2).map(|pair| (pair[0].clone(), pair[1].clone())).collect();
    Ok(Constant::mk_map(entries))
}

fn mk_struct_from_flat(args: &[Constant]) -> Result<Constant> {
    if args.len() % 2 != 0 {
        return Err(Error::TypeMismatch {
            context: "fn:struct".to_string(),
            message: "expected an even number of field/value arguments".to_string(),
        });
    }
    let fields = args
        .chunks(2)
        .map(|pair| match &pair[0] {
            Constant::Name(n) => Ok((n.clone(), pair[1].clone())),
            other => Err(Error::TypeMismatch {
                context: "fn:struct".to_string(),
                message: format!("field name must be a name, got {}", other.kind_name()),
            }),
        })
        .collect::<Result<Vec<(Name, Constant)>>>()?;
    Ok(Constant::mk_struct(fields))
}

fn list_append(list: &Constant, item: &Constant) -> Result<Constant> {
    let mut items: Vec<Constant> = list
        .list_iter()
        .cloned()
        .collect::<Vec<_>>();
    if !matches!(list, Constant::ListNil | Constant::ListCons(..)) {
        return Err(Error::TypeMismatch {
            context: "fn:list:append".to_string(),
            message: format!("expected a list, got {}", list.kind_name()),
        });
    }
    items.push(item.clone());
    Ok(Constant::mk_list(items))
}

fn list_get(list: &Constant, index: &Constant) -> Result<Constant> {
    let idx = index.as_number()?;
    let items: Vec<&Constant> = list.list_iter().collect();
    if idx < 0 || idx as usize >= items.len() {
        return Err(Error::IndexOutOfBounds {
            index: idx,
            len: items.len(),
        });
    }
    Ok(items[idx as usize].clone())
}

fn list_contains(list: &Constant, item: &Constant) -> Result<bool> {
    if !matches!(list, Constant::ListNil | Constant::ListCons(..)) {
        return Err(Error::TypeMismatch {
            context: "fn:list:contains".to_string(),
            message: format!("expected a list, got {}", list.kind_name()),
        });
    }
    Ok(list.list_iter().any(|elem| elem == item))
}

fn map_get(map: &Constant, key: &Constant) -> Result<Constant> {
    map.map_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.clone())
        .ok_or_else(|| Error::KeyNotFound(key.to_string()))
}

fn struct_get(s: &Constant, field: &Constant) -> Result<Constant> {
    let field_name = field.as_name()?;
    s.struct_iter()
        .find(|(f, _)| *f == field_name)
        .map(|(_, v)| v.clone())
        .ok_or_else(|| Error::KeyNotFound(field.to_string()))
}

fn fold_numeric(
    op: &str,
    args: &[Constant],
    identity: i64,
    int_step: impl Fn(i64, i64) -> Option<i64>,
    float_step: impl Fn(f64, f64) -> f64,
) -> Result<Constant> {
    if args.iter().any(|a| matches!(a, Constant::Float(_))) {
        let mut acc = identity as f64;
        for a in args {
            acc = float_step(acc, numeric_as_f64(op, a)?);
        }
        return Ok(Constant::Float(crate::term::Float::new(acc)));
    }
    let mut acc = identity;
    for a in args {
        let n = a.as_number().map_err(|_| Error::TypeMismatch {
            context: op.to_string(),
            message: format!("expected a number, got {}", a.kind_name()),
        })?;
        acc = int_step(acc, n).ok_or_else(|| Error::TypeMismatch {
            context: op.to_string(),
            message: "integer overflow".to_string(),
        })?;
    }
    Ok(Constant::Number(acc))
}

fn numeric_as_f64(op: &str, c: &Constant) -> Result<f64> {
    match c {
        Constant::Number(n) => Ok(*n as f64),
        Constant::Float(f) => Ok(f.value()),
        other => Err(Error::TypeMismatch {
            context: op.to_string(),
            message: format!("expected a number, got {}", other.kind_name()),
        }),
    }
}

fn minus(op: &str, args: &[Constant]) -> Result<Constant> {
    if args.len() == 1 {
        return match &args[0] {
            Constant::Number(n) => n
                .checked_neg()
                .map(Constant::Number)
                .ok_or_else(|| Error::TypeMismatch {
                    context: op.to_string(),
                    message: "negation of i64::MIN overflows".to_string(),
                }),
            Constant::Float(f) => Ok(Constant::Float(crate::term::Float::new(-f.value()))),
            other => Err(Error::TypeMismatch {
                context: op.to_string(),
                message: format!("expected a number, got {}", other.kind_name()),
            }),
        };
    }
    if args.iter().any(|a| matches!(a, Constant::Float(_))) {
        let mut acc = numeric_as_f64(op, &args[0])?;
        for a in &args[1..] {
            acc -= numeric_as_f64(op, a)?;
        }
        return Ok(Constant::Float(crate::term::Float::new(acc)));
    }
    let mut acc = args[0].as_number().map_err(|_| Error::TypeMismatch {
        context: op.to_string(),
        message: format!("expected a number, got {}", args[0].kind_name()),
    })?;
    for a in &args[1..] {
        let n = a.as_number().map_err(|_| Error::TypeMismatch {
            context: op.to_string(),
            message: format!("expected a number, got {}", a.kind_name()),
        })?;
        acc = acc.checked_sub(n).ok_or_else(|| Error::TypeMismatch {
            context: op.to_string(),
            message: "integer overflow".to_string(),
        })?;
    }
    Ok(Constant::Number(acc))
}

/// `fn:div`'s single-argument form is documented as "1/x" but the source
/// ternary it was distilled from is truncating: zero is an error, one maps
/// to one, and every other value maps to zero. We keep that literal
/// behavior rather than the docstring's implied reciprocal.
fn div(op: &str, args: &[Constant]) -> Result<Constant> {
    if args.len() == 1 {
        let n = args[0].as_number().map_err(|_| Error::TypeMismatch {
            context: op.to_string(),
            message: format!("expected a number, got {}", args[0].kind_name()),
        })?;
        return match n {
            0 => Err(Error::DivisionByZero(op.to_string())),
            1 => Ok(Constant::Number(1)),
            _ => Ok(Constant::Number(0)),
        };
    }
    let mut acc = args[0].as_number().map_err(|_| Error::TypeMismatch {
        context: op.to_string(),
        message: format!("expected a number, got {}", args[0].kind_name()),
    })?;
    for a in &args[1..] {
        let n = a.as_number().map_err(|_| Error::TypeMismatch {
            context: op.to_string(),
            message: format!("expected a number, got {}", a.kind_name()),
        })?;
        if n == 0 {
            return Err(Error::DivisionByZero(op.to_string()));
        }
        acc = acc.wrapping_div(n);
    }
    Ok(Constant::Number(acc))
}

fn list_fold_numeric(
    op: &str,
    list: &Constant,
    empty: i64,
    int_step: impl Fn(i64, i64) -> i64,
    float_step: impl Fn(f64, f64) -> f64,
) -> Result<Constant> {
    if !matches!(list, Constant::ListNil | Constant::ListCons(..)) {
        return Err(Error::TypeMismatch {
            context: op.to_string(),
            message: format!("expected a list, got {}", list.kind_name()),
        });
    }
    let items: Vec<&Constant> = list.list_iter().collect();
    if items.is_empty() {
        return Ok(Constant::Number(empty));
    }
    if items.iter().any(|c| matches!(c, Constant::Float(_))) {
        let mut iter = items.iter();
        let mut acc = numeric_as_f64(op, iter.next().unwrap())?;
        for c in iter {
            acc = float_step(acc, numeric_as_f64(op, c)?);
        }
        return Ok(Constant::Float(crate::term::Float::new(acc)));
    }
    let mut iter = items.iter();
    let mut acc = iter.next().unwrap().as_number().map_err(|_| Error::TypeMismatch {
        context: op.to_string(),
        message: "expected a number".to_string(),
    })?;
    for c in iter {
        let n = c.as_number().map_err(|_| Error::TypeMismatch {
            context: op.to_string(),
            message: "expected a number".to_string(),
        })?;
        acc = int_step(acc, n);
    }
    Ok(Constant::Number(acc))
}

fn list_fold_float(list: &Constant, empty: f64, step: impl Fn(f64, f64) -> f64) -> Result<Constant> {
    if !matches!(list, Constant::ListNil | Constant::ListCons(..)) {
        return Err(Error::TypeMismatch {
            context: "fn:float".to_string(),
            message: format!("expected a list, got {}", list.kind_name()),
        });
    }
    let mut acc = empty;
    for c in list.list_iter() {
        acc = step(acc, numeric_as_f64("fn:float", c)?);
    }
    Ok(Constant::Float(crate::term::Float::new(acc)))
}
