//! Sparse active-set QP backend, standing in for a qpOASES-style sparse
//! solver. Accepts `Q`/`A` in CSC form (the representation the rest of the
//! sparse-mode pipeline works in) and densifies them once per `solve` call
//! before delegating to the same working-set method as
//! [`crate::subsolver::dense_active_set::DenseActiveSetSolver`] — a
//! deliberate simplification documented alongside the dense backend: a
//! genuine sparse KKT factorization is out of scope for a from-scratch
//! solver, while the working-set *algorithm* itself is unchanged by the
//! storage format.

use crate::error::Result;
use crate::linalg::sparse::csc_to_dns;
use crate::subsolver::dense_active_set::DenseActiveSetSolver;
use crate::subsolver::{Subsolver, SubsolverReport};
use crate::types::PrintLevel;
use clarabel::algebra::CscMatrix;
use faer::Col;

pub struct SparseActiveSetSolver {
    inner: DenseActiveSetSolver,
}

impl SparseActiveSetSolver {
    pub fn new(q: &CscMatrix<f64>, a: &CscMatrix<f64>) -> Result<Self> {
        let q_dense = csc_to_dns(q)?;
        let a_dense = csc_to_dns(a)?;
        Ok(Self {
            inner: DenseActiveSetSolver::new(q_dense, a_dense),
        })
    }

}

impl Subsolver for SparseActiveSetSolver {
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
    ) -> Result<SubsolverReport> {
        self.inner.solve(initial, g, lba, uba, lb, ub, x0, y0)
    }

    fn get_solution(&self, x_out: &mut Col<f64>, y_out: &mut Col<f64>) {
        self.inner.get_solution(x_out, y_out);
    }

    fn set_print_level(&mut self, level: PrintLevel) {
        self.inner.set_print_level(level);
    }

    fn set_options(&mut self, max_iterations: usize, feasibility_tolerance: f64) {
        self.inner.set_options(max_iterations, feasibility_tolerance);
    }

    fn n_duals(&self) -> usize {
        self.inner.n_duals()
    }

    fn accepts_box_bounds(&self) -> bool {
        self.inner.accepts_box_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::sparse::csc_from_triplets;

    fn col(data: &[f64]) -> Col<f64> {
        Col::from_fn(data.len(), |i| data[i])
    }

    #[test]
    fn matches_dense_backend_on_box_only_problem() {
        let q = csc_from_triplets(&[(0, 0, 2.0), (1, 1, 2.0)], 2, 2);
        let a = csc_from_triplets(&[], 0, 2);
        let mut solver = SparseActiveSetSolver::new(&q, &a).unwrap();
        let g = col(&[0.0, 0.0]);
        let empty = Col::<f64>::zeros(0);
        let lb = col(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        let ub = col(&[f64::INFINITY, f64::INFINITY]);
        let x0 = col(&[4.0, -2.0]);
        let report = solver
            .solve(true, &g, &empty, &empty, &lb, &ub, &x0, &Col::zeros(2))
            .unwrap();
        assert!(report.is_success());
        let mut x_out = Col::zeros(2);
        let mut y_out = Col::zeros(2);
        solver.get_solution(&mut x_out, &mut y_out);
        assert!(x_out[0].abs() < 1e-6);
        assert!(x_out[1].abs() < 1e-6);
    }
}
