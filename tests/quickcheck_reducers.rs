//! Quickcheck coverage for reducer determinism.

use quickcheck::quickcheck;
use tessera_core::{eval_reduce_fn, Constant, Substitution, Symbol, Term};

fn rows_for(values: &[i64]) -> Vec<Substitution> {
    values
        .iter()
        .map(|v| {
            let mut subst = Substitution::new();
            subst.unify(&Term::var("X"), &Term::Constant(Constant::Number(*v))).unwrap();
            subst
        })
        .collect()
}

quickcheck! {
    /// Reducer determinism: `eval_reduce_fn` is a pure function of its
    /// symbol, argument terms and rows.
    fn fn_count_is_a_pure_function_of_its_rows(values: Vec<i64>) -> bool {
        let rows = rows_for(&values);
        let sym = Symbol::new("fn:count", 0);
        let a = eval_reduce_fn(&sym, &[], &rows).unwrap();
        let b = eval_reduce_fn(&sym, &[], &rows).unwrap();
        a == b && a == Constant::Number(values.len() as i64)
    }

    fn fn_collect_distinct_is_a_pure_function_of_its_rows(values: Vec<i64>) -> bool {
        let rows = rows_for(&values);
        let sym = Symbol::variadic("fn:collect_distinct");
        let a = eval_reduce_fn(&sym, &[Term::var("X")], &rows).unwrap();
        let b = eval_reduce_fn(&sym, &[Term::var("X")], &rows).unwrap();
        a == b
    }
}
