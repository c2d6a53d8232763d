use faer::{Col, Mat};
use lcqpanther_rs::LcqProblem;

/// Two-variable warm-up on the dense active-set backend: minimize
/// x1^2 + x2^2 - 2x1 - 2x2 subject to 0 <= x1 _|_ x2 >= 0. The unconstrained
/// minimum (1, 1) violates complementarity, so the solver must settle on
/// (1, 0) or (0, 1).
fn main() -> lcqpanther_rs::Result<()> {
    let mut problem = LcqProblem::new(2, 0, 1)?;

    let h = Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 0.0 });
    let g = Col::from_fn(2, |_| -2.0);
    let s1 = Mat::from_fn(1, 2, |_, j| if j == 0 { 1.0 } else { 0.0 });
    let s2 = Mat::from_fn(1, 2, |_, j| if j == 1 { 1.0 } else { 0.0 });
    let x0 = Col::from_fn(2, |_| 1.0);
    let lb = Col::from_fn(2, |_| 0.0);
    let ub = Col::from_fn(2, |_| f64::INFINITY);

    problem.load_lcqp_dense(
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
    )?;

    let status = problem.solve()?;
    println!("status: {status:?}");

    let mut x = Col::zeros(problem.get_number_of_primals());
    problem.get_primal_solution(&mut x)?;
    println!("x* = ({}, {})", x[0], x[1]);

    let stats = problem.get_output_statistics();
    println!(
        "outer iterations: {}, total iterations: {}, terminal rho: {}",
        stats.outer_iter(),
        stats.total_iter(),
        stats.terminal_rho()
    );
    Ok(())
}
