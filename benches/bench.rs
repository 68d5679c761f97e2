use criterion::{criterion_group, criterion_main, Criterion};
use prop_solver::logic::clause::to_clauses;
use prop_solver::logic::dpll::dpll;
use prop_solver::logic::normal_form::{to_nf, NormalForm};
use prop_solver::logic::parser::{parse_clause_set, parse_formula};
use std::hint::black_box;
use std::time::Duration;

fn bench_normal_form(c: &mut Criterion) {
    let formula = parse_formula("(a <-> b) ^ (c -> d && e) || !(a && !(d <-> e))")
        .expect("benchmark formula must parse");

    let mut group = c.benchmark_group("normal_form");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("to_cnf", |b| {
        b.iter(|| to_nf(black_box(&formula), NormalForm::Conjunctive));
    });
    group.bench_function("to_dnf", |b| {
        b.iter(|| to_nf(black_box(&formula), NormalForm::Disjunctive));
    });
    group.bench_function("to_clauses", |b| {
        b.iter(|| to_clauses(black_box(&formula)));
    });

    group.finish();
}

fn bench_dpll(c: &mut Criterion) {
    // Three pigeons into two holes: small but fully backtracking.
    let pigeonhole = parse_clause_set(
        "{p11, p12}{p21, p22}{p31, p32}\
         {!p11, !p21}{!p11, !p31}{!p21, !p31}\
         {!p12, !p22}{!p12, !p32}{!p22, !p32}",
    )
    .expect("benchmark clause set must parse");

    let satisfiable = parse_clause_set("{x, y}{!x, z}{!z, w}{!w, !y}{y, w}")
        .expect("benchmark clause set must parse");

    let mut group = c.benchmark_group("dpll");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("pigeonhole_3_2", |b| {
        b.iter(|| dpll(black_box(&pigeonhole)));
    });
    group.bench_function("implication_chain", |b| {
        b.iter(|| dpll(black_box(&satisfiable)));
    });

    group.finish();
}

criterion_group!(benches, bench_normal_form, bench_dpll);
criterion_main!(benches);
