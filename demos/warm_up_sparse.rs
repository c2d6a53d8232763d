use clarabel::algebra::CscMatrix;
use faer::Col;
use lcqpanther_rs::{LcqProblem, Options, QpSolverKind};

/// The same two-variable warm-up as `warm_up_dense`, but loaded as CSC
/// matrices and solved with the operator-splitting backend. OSQP does not
/// accept box bounds directly, so the non-negativity of x1/x2 is omitted
/// here (it is already implied by the complementarity constraint's default
/// `[0, +inf)` bounds on S1x/S2x).
fn main() -> lcqpanther_rs::Result<()> {
    let mut problem = LcqProblem::new(2, 0, 1)?;

    let h = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![2.0, 2.0]);
    let g = Col::from_fn(2, |_| -2.0);
    let s1 = CscMatrix::new(1, 2, vec![0, 1, 1], vec![0], vec![1.0]);
    let s2 = CscMatrix::new(1, 2, vec![0, 0, 1], vec![0], vec![1.0]);
    let x0 = Col::from_fn(2, |_| 1.0);

    problem.load_lcqp_sparse(
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
        None,
        Some(x0),
        None,
    )?;

    let mut options = Options::new();
    options.set_qp_solver(QpSolverKind::OsqpSparse);
    problem.set_options(options);

    let status = problem.solve()?;
    println!("status: {status:?}");
    println!("nDuals = {}", problem.get_number_of_duals());

    let mut x = Col::zeros(problem.get_number_of_primals());
    problem.get_primal_solution(&mut x)?;
    println!("x* = ({}, {})", x[0], x[1]);
    Ok(())
}
