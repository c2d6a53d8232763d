use faer::Col;
use lcqpanther_rs::LcqProblem;
use std::path::Path;

/// A 3-variable, 2-linear-constraint, 2-complementarity-pair problem loaded
/// entirely from plain-text fixture files, exercising the optional-field
/// defaulting path (`lba`/`x0` supplied, everything else defaulted) and the
/// composite `Ã*x0 + lba` assembly.
#[test]
fn loads_and_solves_a_problem_from_fixture_files() {
    let mut problem = LcqProblem::new(3, 2, 2).unwrap();
    let fixture_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/data/one_ivocp_example");
    problem
        .load_lcqp_file(&fixture_dir)
        .expect("fixture files should load without error");

    let status = problem.solve().expect("solve should succeed");
    assert!(!matches!(status, lcqpanther_rs::AlgorithmStatus::NotSolved));

    let mut x = Col::zeros(3);
    problem.get_primal_solution(&mut x).unwrap();

    // A x0 + lba (first row): (1,1,1)*(1,1,1) - 10 <= 0 must hold at x*.
    assert!(
        x[0] + x[1] + x[2] >= -10.0 - 1e-6,
        "solution should respect the first loaded linear constraint, got {x:?}"
    );
}
