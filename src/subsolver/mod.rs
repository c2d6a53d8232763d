//! QP subsolver abstraction: a uniform contract over a dense active-set
//! backend, a sparse active-set backend, and a sparse operator-splitting
//! backend.

pub mod dense_active_set;
pub mod operator_splitting;
pub mod sparse_active_set;

use crate::error::Result;
use crate::types::PrintLevel;
use faer::Col;

/// Outcome of a single `Subsolver::solve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsolverStatus {
    Success,
    Failure,
}

/// A subsolver's report of one `solve` call: whether it succeeded, the
/// backend-specific exit flag (preserved in [`crate::statistics::OutputStatistics`]
/// for diagnostics), and how many subproblem iterations it took.
#[derive(Debug, Clone, Copy)]
pub struct SubsolverReport {
    pub status: SubsolverStatus,
    pub exit_flag: i32,
    pub n_iter: usize,
}

impl SubsolverReport {
    pub fn is_success(&self) -> bool {
        self.status == SubsolverStatus::Success
    }
}

/// Uniform contract over the three concrete QP backends.
///
/// `solve` with `initial = true` performs a full factorization/setup from
/// the initial guess; `initial = false` hotstarts from the previous
/// solution, updating only `g`, `lbA`, `ubA`. Dual layout on
/// [`Subsolver::get_solution`] is `[box (nV) | linear (nC) | S1 (nComp) |
/// S2 (nComp)]` for the active-set backends, with the leading `nV` block
/// absent for the operator-splitting backend.
pub trait Subsolver {
    #[allow(clippy::too_many_arguments)]
    fn solve(
        &mut self,
        initial: bool,
        g: &Col<f64>,
        lba: &Col<f64>,
        uba: &Col<f64>,
        lb: &Col<f64>,
        ub: &Col<f64>,
        x0: &Col<f64>,
        y0: &Col<f64>,
    ) -> Result<SubsolverReport>;

    /// Writes the last primal and dual solution into the given buffers.
    fn get_solution(&self, x_out: &mut Col<f64>, y_out: &mut Col<f64>);

    fn set_print_level(&mut self, level: PrintLevel);

    fn set_options(&mut self, max_iterations: usize, feasibility_tolerance: f64);

    /// Number of dual variables this backend produces for its bound problem.
    fn n_duals(&self) -> usize;

    /// Whether this backend accepts nontrivial box bounds directly.
    fn accepts_box_bounds(&self) -> bool;
}

/// `true` iff every entry of `lb`/`ub` is the trivial (infinite) bound,
/// i.e. the caller is not actually imposing box constraints.
pub(crate) fn box_bounds_are_trivial(lb: &Col<f64>, ub: &Col<f64>) -> bool {
    (0..lb.nrows()).all(|i| lb[i] == f64::NEG_INFINITY) && (0..ub.nrows()).all(|i| ub[i] == f64::INFINITY)
}
