//! Throughput benchmarks for unification and built-in evaluation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera_core::{decide, eval_apply_fn, Constant, Substitution, Symbol, Term};

fn generate_chain_constants(n: usize) -> Vec<Constant> {
    (0..n as i64).map(Constant::Number).collect()
}

fn bench_unify_variable_chain(c: &mut Criterion) {
    c.bench_function("unify_1000_variable_chain", |b| {
        b.iter(|| {
            let mut subst = Substitution::new();
            for i in 0..1000 {
                let a = Term::var(format!("V{i}"));
                let b = Term::var(format!("V{}", i + 1));
                subst.unify(&a, &b).unwrap();
            }
            subst.unify(&Term::var("V1000"), &Term::Constant(Constant::Number(42))).unwrap();
            black_box(subst.get("V0"))
        })
    });
}

fn bench_list_member_enumeration(c: &mut Criterion) {
    let list = Term::Constant(Constant::mk_list(generate_chain_constants(200)));
    c.bench_function("list_member_enumerate_200", |b| {
        b.iter(|| {
            let atom = tessera_core::Atom::new(Symbol::new(":list:member", 2), vec![Term::var("X"), list.clone()]);
            let subst = Substitution::new();
            black_box(decide(&atom, &subst).unwrap())
        })
    });
}

fn bench_fn_plus_fold(c: &mut Criterion) {
    let args: Vec<Constant> = generate_chain_constants(500);
    c.bench_function("fn_plus_fold_500", |b| {
        b.iter(|| black_box(eval_apply_fn(&Symbol::variadic("fn:plus"), &args).unwrap()))
    });
}

criterion_group!(benches, bench_unify_variable_chain, bench_list_member_enumeration, bench_fn_plus_fold);
criterion_main!(benches);
