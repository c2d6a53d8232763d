use faer::Col;
use lcqpanther_rs::LcqProblem;
use std::path::Path;

/// Loads a larger constrained problem from plain-text fixture files and
/// solves it with default options.
fn main() -> lcqpanther_rs::Result<()> {
    let mut problem = LcqProblem::new(3, 2, 2)?;
    problem.load_lcqp_file(Path::new("demos/data/one_ivocp_example"))?;

    let status = problem.solve()?;
    println!("status: {status:?}");

    let mut x = Col::zeros(problem.get_number_of_primals());
    problem.get_primal_solution(&mut x)?;
    println!("x* = ({}, {}, {})", x[0], x[1], x[2]);
    Ok(())
}
