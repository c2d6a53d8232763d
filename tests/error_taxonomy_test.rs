use clarabel::algebra::CscMatrix;
use faer::{Col, Mat};
use lcqpanther_rs::{LcqProblem, LcqpError, Options, QpSolverKind};

#[test]
fn zero_complementarity_pairs_is_rejected_at_construction() {
    let result = LcqProblem::new(2, 0, 0);
    assert!(matches!(result, Err(LcqpError::InvalidDimensions { .. })));
}

#[test]
fn zero_primal_variables_is_rejected_at_construction() {
    let result = LcqProblem::new(0, 0, 1);
    assert!(matches!(result, Err(LcqpError::InvalidDimensions { .. })));
}

#[test]
fn mismatched_complementarity_matrix_shape_is_rejected() {
    let mut problem = LcqProblem::new(2, 0, 1).unwrap();
    let h = Mat::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 0.0 });
    let g = Col::zeros(2);
    let s1 = Mat::from_fn(2, 2, |_, _| 1.0); // wrong row count: should be nComp=1
    let s2 = Mat::from_fn(1, 2, |_, _| 1.0);
    let result = problem.load_lcqp_dense(h, g, None, s1, s2, None, None, None, None, None, None, None, None, None, None);
    assert!(matches!(result, Err(LcqpError::InvalidDimensions { .. })));
}

#[test]
fn out_of_range_option_values_are_rejected() {
    let mut options = Options::new();
    assert!(options.set_stationarity_tolerance(-1.0).is_err());
    assert!(options.set_complementarity_tolerance(0.0).is_err());
    assert!(options.set_initial_penalty_parameter(-0.5).is_err());
    assert!(options.set_penalty_update_factor(0.5).is_err());
    assert!(options.set_max_rho(1e-10).is_err());
    assert!(options.set_max_iterations(0).is_err());
    assert!(options.set_eta_dynamic_penalty(1.5).is_err());
}

#[test]
fn output_buffers_of_the_wrong_length_are_rejected() {
    let mut problem = LcqProblem::new(2, 0, 1).unwrap();
    let h = Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 0.0 });
    let g = Col::from_fn(2, |_| -2.0);
    let s1 = Mat::from_fn(1, 2, |_, j| if j == 0 { 1.0 } else { 0.0 });
    let s2 = Mat::from_fn(1, 2, |_, j| if j == 1 { 1.0 } else { 0.0 });
    problem
        .load_lcqp_dense(h, g, None, s1, s2, None, None, None, None, None, None, None, None, None, None)
        .unwrap();

    let mut too_short = Col::zeros(1);
    assert!(matches!(
        problem.get_primal_solution(&mut too_short),
        Err(LcqpError::IndexOutOfBounds(_))
    ));
}

#[test]
fn operator_splitting_backend_rejects_an_unset_s1_s2_pair() {
    // Even a dimensionally valid sparse load still requires S1/S2 to be
    // supplied; `load_lcqp_sparse` has no optional form for them.
    let mut problem = LcqProblem::new(2, 0, 1).unwrap();
    let h = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 1.0]);
    let g = Col::zeros(2);
    let s1 = CscMatrix::new(1, 2, vec![0, 1, 1], vec![0], vec![1.0]);
    let s2 = CscMatrix::new(1, 2, vec![0, 0, 1], vec![0], vec![1.0]);
    problem
        .load_lcqp_sparse(h, g, None, s1, s2, None, None, None, None, None, None, None, None, None, None)
        .unwrap();

    let mut options = Options::new();
    options.set_qp_solver(QpSolverKind::OsqpSparse);
    problem.set_options(options);

    // With no box bounds set (defaults are -inf/+inf, i.e. trivial), the
    // operator-splitting backend should accept the problem.
    assert!(problem.solve().is_ok());
}
