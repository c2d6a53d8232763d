use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use faer::{Col, Mat};
use lcqpanther_rs::{LcqProblem, Options, QpSolverKind};
use std::hint::black_box;

/// Builds an `n`-pair warm-up LCQP: `H = 2I`, `g = -2`, `S1`/`S2` each
/// selecting disjoint coordinate pairs, box bounds `[0, +inf)`.
fn build_problem(n_pairs: usize) -> LcqProblem {
    let n_v = 2 * n_pairs;
    let mut problem = LcqProblem::new(n_v, 0, n_pairs).unwrap();

    let h = Mat::from_fn(n_v, n_v, |i, j| if i == j { 2.0 } else { 0.0 });
    let g = Col::from_fn(n_v, |_| -2.0);
    let s1 = Mat::from_fn(n_pairs, n_v, |i, j| if j == 2 * i { 1.0 } else { 0.0 });
    let s2 = Mat::from_fn(n_pairs, n_v, |i, j| if j == 2 * i + 1 { 1.0 } else { 0.0 });
    let x0 = Col::from_fn(n_v, |_| 1.0);
    let lb = Col::from_fn(n_v, |_| 0.0);
    let ub = Col::from_fn(n_v, |_| f64::INFINITY);

    problem
        .load_lcqp_dense(
            h,
            g,
            None,
            s1,
            s2,
            None,
            None,
            None,
            None,
            None,
            None,
            Some(lb),
            Some(ub),
            Some(x0),
            None,
        )
        .unwrap();
    problem
}

fn benchmark_dense_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_active_set_solve");
    for n_pairs in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(n_pairs), &n_pairs, |b, &n_pairs| {
            b.iter(|| {
                let mut problem = build_problem(black_box(n_pairs));
                problem.solve().unwrap()
            })
        });
    }
    group.finish();
}

fn benchmark_sparse_operator_splitting(c: &mut Criterion) {
    let mut group = c.benchmark_group("operator_splitting_solve");
    for n_pairs in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(n_pairs), &n_pairs, |b, &n_pairs| {
            b.iter(|| {
                let mut problem = build_problem(black_box(n_pairs));
                let n_v = 2 * n_pairs;
                let lb = Col::from_fn(n_v, |_| f64::NEG_INFINITY);
                let ub = Col::from_fn(n_v, |_| f64::INFINITY);
                // OSQP backend rejects nontrivial box bounds; re-load without them.
                problem
                    .load_lcqp_dense(
                        Mat::from_fn(n_v, n_v, |i, j| if i == j { 2.0 } else { 0.0 }),
                        Col::from_fn(n_v, |_| -2.0),
                        None,
                        Mat::from_fn(n_pairs, n_v, |i, j| if j == 2 * i { 1.0 } else { 0.0 }),
                        Mat::from_fn(n_pairs, n_v, |i, j| if j == 2 * i + 1 { 1.0 } else { 0.0 }),
                        None,
                        None,
                        None,
                        None,
                        None,
                        None,
                        Some(lb),
                        Some(ub),
                        Some(Col::from_fn(n_v, |_| 1.0)),
                        None,
                    )
                    .unwrap();
                let mut options = Options::new();
                options.set_qp_solver(QpSolverKind::OsqpSparse);
                problem.set_options(options);
                problem.solve().unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_dense_solve, benchmark_sparse_operator_splitting);
criterion_main!(benches);
