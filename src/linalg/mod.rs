//! Linear algebra kernel: dense (`faer::Mat`/`Col`) and sparse
//! (`clarabel::algebra::CscMatrix`) primitives used throughout the solver.

pub mod dense;
pub mod sparse;
