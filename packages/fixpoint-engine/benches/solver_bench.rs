//! Solver benchmarks: copy chains and fan-out systems at a few sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fixpoint_engine::{Activation, AssignOp, FixpointSolver, KeySet};

fn build_chain(n: usize) -> FixpointSolver<KeySet> {
    let mut solver: FixpointSolver<KeySet> = FixpointSolver::new();
    let assign = solver.register_operator(AssignOp);
    let mut prev = solver.new_variable(KeySet::from_iter([0, 1, 2]));
    for _ in 0..n {
        let next = solver.new_variable(KeySet::new());
        solver
            .add_unary(next, assign, prev, Activation::Enqueue)
            .unwrap();
        prev = next;
    }
    solver
}

fn build_fan_out(n: usize) -> FixpointSolver<KeySet> {
    let mut solver: FixpointSolver<KeySet> = FixpointSolver::new();
    let assign = solver.register_operator(AssignOp);
    let source = solver.new_variable(KeySet::from_iter([0, 1, 2]));
    for _ in 0..n {
        let sink = solver.new_variable(KeySet::new());
        solver
            .add_unary(sink, assign, source, Activation::Enqueue)
            .unwrap();
    }
    solver
}

fn bench_solve_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_chain");
    for n in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || build_chain(n),
                |mut solver| black_box(solver.solve().unwrap()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_solve_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_fan_out");
    for n in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || build_fan_out(n),
                |mut solver| black_box(solver.solve().unwrap()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solve_chain, bench_solve_fan_out);
criterion_main!(benches);
