//! End-to-end scenarios drawn directly from the evaluator's concrete
//! input/output contract.

use tessera_core::desugar::{desugar, predicate_ref_cell, RawCell, RawDecl};
use tessera_core::types::TypeExpr;
use tessera_core::{decide, eval_apply_fn, eval_reduce_fn, Atom, Constant, Error, Substitution, Symbol, Term};

fn num(n: i64) -> Term {
    Term::Constant(Constant::Number(n))
}

#[test]
fn lt_scenarios() {
    let subst = Substitution::new();
    let ok = Atom::new(Symbol::new(":lt", 2), vec![num(1), num(2)]);
    let (truth, exts) = decide(&ok, &subst).unwrap();
    assert!(truth);
    assert_eq!(exts, vec![subst.clone()]);

    let mismatched = Atom::new(
        Symbol::new(":lt", 2),
        vec![Term::Constant(Constant::String("a".into())), num(2)],
    );
    assert!(matches!(decide(&mismatched, &subst), Err(Error::TypeMismatch { .. })));

    let bad_arity = Atom::new(Symbol::new(":lt", 3), vec![num(1), num(2), num(3)]);
    assert!(matches!(decide(&bad_arity, &subst), Err(Error::ArityMismatch { .. })));
}

#[test]
fn match_pair_scenarios() {
    let subst = Substitution::new();
    let pair = Term::Constant(Constant::mk_pair(Constant::Number(1), Constant::Number(2)));
    let ok = Atom::new(
        Symbol::new(":match_pair", 3),
        vec![pair, Term::var("X"), Term::var("Y")],
    );
    let (truth, exts) = decide(&ok, &subst).unwrap();
    assert!(truth);
    assert_eq!(exts.len(), 1);
    assert_eq!(exts[0].get("X"), Some(Constant::Number(1)));
    assert_eq!(exts[0].get("Y"), Some(Constant::Number(2)));

    let shape_mismatch = Atom::new(
        Symbol::new(":match_pair", 3),
        vec![num(1), Term::var("X"), Term::var("Y")],
    );
    let (truth, exts) = decide(&shape_mismatch, &subst).unwrap();
    assert!(!truth);
    assert!(exts.is_empty());
}

#[test]
fn list_member_enumerates_exactly_three_substitutions_in_order() {
    let subst = Substitution::new();
    let list = Term::Constant(Constant::mk_list(vec![
        Constant::Number(1),
        Constant::Number(2),
        Constant::Number(3),
    ]));
    let atom = Atom::new(Symbol::new(":list:member", 2), vec![Term::var("X"), list]);
    let (truth, exts) = decide(&atom, &subst).unwrap();
    assert!(truth);
    assert_eq!(exts.len(), 3);
    let values: Vec<_> = exts.iter().map(|s| s.get("X").unwrap()).collect();
    assert_eq!(values, vec![Constant::Number(1), Constant::Number(2), Constant::Number(3)]);
}

#[test]
fn list_get_scenarios() {
    let list = Constant::mk_list(vec![
        Constant::String("a".into()),
        Constant::String("b".into()),
        Constant::String("c".into()),
    ]);
    let result = eval_apply_fn(&Symbol::new("fn:list:get", 2), &[list, Constant::Number(2)]).unwrap();
    assert_eq!(result, Constant::String("c".into()));

    let err = eval_apply_fn(&Symbol::new("fn:list:get", 2), &[Constant::ListNil, Constant::Number(0)]);
    assert!(matches!(err, Err(Error::IndexOutOfBounds { .. })));
}

#[test]
fn collect_distinct_dedups_preserving_first_occurrence() {
    let mut row1 = Substitution::new();
    row1.unify(&Term::var("X"), &num(1)).unwrap();
    let mut row2 = Substitution::new();
    row2.unify(&Term::var("X"), &num(1)).unwrap();
    let mut row3 = Substitution::new();
    row3.unify(&Term::var("X"), &num(3)).unwrap();

    let result = eval_reduce_fn(
        &Symbol::variadic("fn:collect_distinct"),
        &[Term::var("X")],
        &[row1, row2, row3],
    )
    .unwrap();
    assert_eq!(result, Constant::mk_list(vec![Constant::Number(1), Constant::Number(3)]));
}

#[test]
fn empty_reducer_sentinels() {
    let max_empty = eval_reduce_fn(&Symbol::new("fn:max", 1), &[Term::var("X")], &[]).unwrap();
    assert_eq!(max_empty, Constant::Number(i64::MIN));

    let float_min_empty = eval_reduce_fn(&Symbol::new("fn:float:min", 1), &[Term::var("X")], &[]).unwrap();
    assert_eq!(float_min_empty, Constant::Float(tessera_core::term::Float::new(f64::INFINITY)));
}

#[test]
fn struct_optional_field_type_checking() {
    use tessera_core::term::Name;
    use tessera_core::{has_type};

    let ty = TypeExpr::Struct(
        vec![(Name::new("/foo").unwrap(), TypeExpr::Number)],
        vec![(Name::new("/bar").unwrap(), TypeExpr::StringTy)],
    );
    let accepted = Constant::mk_struct(vec![(Name::new("/foo").unwrap(), Constant::Number(3))]);
    assert!(has_type(&ty, &accepted));

    let rejected = Constant::mk_struct(vec![
        (Name::new("/foo").unwrap(), Constant::Number(3)),
        (Name::new("/bar").unwrap(), Constant::Number(3)),
    ]);
    assert!(!has_type(&ty, &rejected));
}

#[test]
fn desugar_detects_cyclic_name_bound_dependency() {
    use ahash::AHashMap;

    let foo_sym = Symbol::new("foo", 1);
    let bar_sym = Symbol::new("bar", 1);
    let foo = RawDecl {
        declared_atom: Atom::new(foo_sym.clone(), vec![Term::var("X")]),
        descriptors: vec![],
        bounds: vec![vec![predicate_ref_cell("bar")]],
    };
    let bar = RawDecl {
        declared_atom: Atom::new(bar_sym.clone(), vec![Term::var("X")]),
        descriptors: vec![],
        bounds: vec![vec![predicate_ref_cell("foo")]],
    };
    let mut raw = AHashMap::new();
    raw.insert(foo_sym, foo);
    raw.insert(bar_sym, bar);

    let err = desugar(raw).unwrap_err();
    match err {
        Error::CyclicDependency { path } => {
            assert!(path.contains(&"foo".to_string()));
            assert!(path.contains(&"bar".to_string()));
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
}

#[test]
fn desugar_raw_cell_type_is_validated() {
    let _ = RawCell::Type(TypeExpr::Number);
}

#[test]
fn unification_trace_spans_are_emitted_under_a_subscriber() {
    let _ = tracing_subscriber::fmt().with_env_filter("tessera_core=trace").try_init();

    let mut subst = Substitution::new();
    subst.unify(&Term::var("X"), &Term::var("Y")).unwrap();
    subst.unify(&Term::var("Y"), &num(1)).unwrap();
    assert_eq!(subst.get("X"), Some(Constant::Number(1)));
}

#[test]
fn constant_round_trips_through_json() {
    let value = Constant::mk_struct(vec![(
        tessera_core::term::Name::new("/amount").unwrap(),
        Constant::mk_list(vec![num_const(1), num_const(2), num_const(3)]),
    )]);
    let encoded = serde_json::to_string(&value).unwrap();
    let decoded: Constant = serde_json::from_str(&encoded).unwrap();
    assert_eq!(value, decoded);
}

fn num_const(n: i64) -> Constant {
    Constant::Number(n)
}
