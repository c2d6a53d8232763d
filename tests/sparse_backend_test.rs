use clarabel::algebra::CscMatrix;
use faer::Col;
use lcqpanther_rs::{AlgorithmStatus, LcqProblem, Options, QpSolverKind};

/// Same warm-up problem as the dense backend, loaded as CSC matrices and
/// solved with the operator-splitting backend, which cannot accept box
/// bounds directly (non-negativity here is already implied by S1x/S2x's
/// default `[0, +inf)` bounds).
#[test]
fn operator_splitting_backend_agrees_with_dense_backend() {
    let mut problem = LcqProblem::new(2, 0, 1).unwrap();

    let h = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![2.0, 2.0]);
    let g = Col::from_fn(2, |_| -2.0);
    let s1 = CscMatrix::new(1, 2, vec![0, 1, 1], vec![0], vec![1.0]);
    let s2 = CscMatrix::new(1, 2, vec![0, 0, 1], vec![0], vec![1.0]);
    let x0 = Col::from_fn(2, |_| 1.0);

    problem
        .load_lcqp_sparse(
            h, g, None, s1, s2, None, None, None, None, None, None, None, None, Some(x0), None,
        )
        .unwrap();

    let mut options = Options::new();
    options.set_qp_solver(QpSolverKind::OsqpSparse);
    problem.set_options(options);

    let status = problem.solve().expect("solve should succeed");
    assert!(matches!(
        status,
        AlgorithmStatus::StrongStationary
            | AlgorithmStatus::MordukhovichStationary
            | AlgorithmStatus::ClarkeStationary
            | AlgorithmStatus::WeakStationary
    ));

    assert_eq!(problem.get_number_of_duals(), 2, "OSQP layout has no leading box-dual block");

    let mut x = Col::zeros(2);
    problem.get_primal_solution(&mut x).unwrap();
    let complementarity = x[0] * x[1];
    assert!(
        complementarity.abs() < 1e-4,
        "complementarity product should vanish at the solution, got {complementarity}"
    );
}

#[test]
fn operator_splitting_rejects_nontrivial_box_bounds() {
    let mut problem = LcqProblem::new(2, 0, 1).unwrap();

    let h = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![2.0, 2.0]);
    let g = Col::from_fn(2, |_| -2.0);
    let s1 = CscMatrix::new(1, 2, vec![0, 1, 1], vec![0], vec![1.0]);
    let s2 = CscMatrix::new(1, 2, vec![0, 0, 1], vec![0], vec![1.0]);
    let ub = Col::from_fn(2, |_| 0.5);

    problem
        .load_lcqp_sparse(
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
            None,
            Some(ub),
            None,
            None,
        )
        .unwrap();

    let mut options = Options::new();
    options.set_qp_solver(QpSolverKind::OsqpSparse);
    problem.set_options(options);

    let result = problem.solve();
    assert!(matches!(
        result,
        Err(lcqpanther_rs::LcqpError::InvalidOperatorSplittingBoxConstraints)
    ));
}
