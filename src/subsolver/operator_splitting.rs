//! Sparse operator-splitting QP backend, standing in for an OSQP-style
//! solver. Unlike the two active-set backends this one delegates to a
//! genuine external solver, `clarabel::solver::DefaultSolver`, a conic
//! interior-point/ADMM-hybrid solver. Range constraints `lbA <= A x <= ubA`
//! are split into up to two `NonnegativeConeT` rows each; this backend does
//! not accept nontrivial box bounds (it has no cone type for them without
//! doubling the variable block).

use crate::error::{LcqpError, Result};
use crate::subsolver::{box_bounds_are_trivial, Subsolver, SubsolverReport, SubsolverStatus};
use crate::types::PrintLevel;
use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use faer::Col;

pub struct OperatorSplittingSolver {
    q: CscMatrix<f64>,
    a: CscMatrix<f64>,
    n_v: usize,
    n_rows: usize,
    max_iterations: usize,
    feasibility_tolerance: f64,
    print_level: PrintLevel,
    x: Col<f64>,
    y: Col<f64>,
}

impl OperatorSplittingSolver {
    pub fn new(q: &CscMatrix<f64>, a: &CscMatrix<f64>) -> Self {
        let n_v = q.n;
        let n_rows = a.m;
        Self {
            q: q.clone(),
            a: a.clone(),
            n_v,
            n_rows,
            max_iterations: 4000,
            feasibility_tolerance: 1e-8,
            print_level: PrintLevel::None,
            x: Col::zeros(n_v),
            y: Col::zeros(n_rows),
        }
    }

    fn upper_triangular(q: &CscMatrix<f64>) -> CscMatrix<f64> {
        let mut triplets = Vec::new();
        for col in 0..q.n {
            for idx in q.colptr[col]..q.colptr[col + 1] {
                let row = q.rowval[idx];
                if row <= col {
                    triplets.push((row, col, q.nzval[idx]));
                }
            }
        }
        crate::linalg::sparse::csc_from_triplets(&triplets, q.m, q.n)
    }

    fn row_entries(a: &CscMatrix<f64>) -> Vec<Vec<(usize, f64)>> {
        let mut rows = vec![Vec::new(); a.m];
        for col in 0..a.n {
            for idx in a.colptr[col]..a.colptr[col + 1] {
                rows[a.rowval[idx]].push((col, a.nzval[idx]));
            }
        }
        rows
    }

    /// Splits `lbA <= A x <= ubA` into `NonnegativeConeT` rows, returning
    /// the stacked constraint matrix, its `b` vector, and for each original
    /// row the index of its lower-split and upper-split row in the stack
    /// (`None` if that side is infinite and therefore omitted).
    fn split_constraints(
        a: &CscMatrix<f64>,
        lba: &Col<f64>,
        uba: &Col<f64>,
    ) -> (CscMatrix<f64>, Vec<f64>, Vec<(Option<usize>, Option<usize>)>) {
        let rows = Self::row_entries(a);
        let mut triplets = Vec::new();
        let mut b = Vec::new();
        let mut slots = Vec::with_capacity(a.m);
        let mut cursor = 0usize;

        for i in 0..a.m {
            let mut lower_slot = None;
            let mut upper_slot = None;
            if uba[i].is_finite() {
                for &(col, val) in &rows[i] {
                    triplets.push((cursor, col, val));
                }
                b.push(uba[i]);
                upper_slot = Some(cursor);
                cursor += 1;
            }
            if lba[i].is_finite() {
                for &(col, val) in &rows[i] {
                    triplets.push((cursor, col, -val));
                }
                b.push(-lba[i]);
                lower_slot = Some(cursor);
                cursor += 1;
            }
            slots.push((lower_slot, upper_slot));
        }

        let stacked = crate::linalg::sparse::csc_from_triplets(&triplets, cursor, a.n);
        (stacked, b, slots)
    }
}

impl Subsolver for OperatorSplittingSolver {
    fn solve(
        &mut self,
        _initial: bool,
        g: &Col<f64>,
        lba: &Col<f64>,
        uba: &Col<f64>,
        lb: &Col<f64>,
        ub: &Col<f64>,
        _x0: &Col<f64>,
        _y0: &Col<f64>,
    ) -> Result<SubsolverReport> {
        if !box_bounds_are_trivial(lb, ub) {
            return Err(LcqpError::InvalidOperatorSplittingBoxConstraints);
        }

        let p = Self::upper_triangular(&self.q);
        let q_vec: Vec<f64> = (0..g.nrows()).map(|i| g[i]).collect();
        let (stacked, b, slots) = Self::split_constraints(&self.a, lba, uba);
        let n_cone_rows = stacked.m;
        let cones = if n_cone_rows > 0 {
            vec![SupportedConeT::NonnegativeConeT(n_cone_rows)]
        } else {
            vec![]
        };

        let settings = DefaultSettings::<f64> {
            verbose: !matches!(self.print_level, PrintLevel::None),
            max_iter: self.max_iterations as u32,
            tol_feas: self.feasibility_tolerance,
            tol_gap_abs: self.feasibility_tolerance,
            tol_gap_rel: self.feasibility_tolerance,
            ..Default::default()
        };

        let mut solver = DefaultSolver::new(&p, &q_vec, &stacked, &b, &cones, settings)
            .map_err(|_| LcqpError::SubsolverFailed { exit_flag: -2 })?;
        solver.solve();

        let status = solver.solution.status;
        let exit_flag = match status {
            SolverStatus::Solved => 0,
            SolverStatus::AlmostSolved => 1,
            SolverStatus::MaxIterations => 2,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => 3,
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => 4,
            _ => -1,
        };
        let succeeded = matches!(status, SolverStatus::Solved | SolverStatus::AlmostSolved);

        self.x = Col::from_fn(self.n_v, |i| solver.solution.x[i]);
        self.y = Col::from_fn(self.n_rows, |i| {
            let (lower_slot, upper_slot) = slots[i];
            let mut y = 0.0;
            if let Some(s) = lower_slot {
                y += solver.solution.z[s];
            }
            if let Some(s) = upper_slot {
                y -= solver.solution.z[s];
            }
            y
        });

        Ok(SubsolverReport {
            status: if succeeded {
                SubsolverStatus::Success
            } else {
                SubsolverStatus::Failure
            },
            exit_flag,
            n_iter: solver.info.iterations as usize,
        })
    }

    fn get_solution(&self, x_out: &mut Col<f64>, y_out: &mut Col<f64>) {
        for i in 0..self.n_v {
            x_out[i] = self.x[i];
        }
        for i in 0..self.n_rows {
            y_out[i] = self.y[i];
        }
    }

    fn set_print_level(&mut self, level: PrintLevel) {
        self.print_level = level;
    }

    fn set_options(&mut self, max_iterations: usize, feasibility_tolerance: f64) {
        self.max_iterations = max_iterations;
        self.feasibility_tolerance = feasibility_tolerance;
    }

    fn n_duals(&self) -> usize {
        self.n_rows
    }

    fn accepts_box_bounds(&self) -> bool {
        false
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
    fn rejects_nontrivial_box_bounds() {
        let q = csc_from_triplets(&[(0, 0, 2.0), (1, 1, 2.0)], 2, 2);
        let a = csc_from_triplets(&[], 0, 2);
        let mut solver = OperatorSplittingSolver::new(&q, &a);
        let g = col(&[0.0, 0.0]);
        let empty = Col::<f64>::zeros(0);
        let lb = col(&[0.0, f64::NEG_INFINITY]);
        let ub = col(&[f64::INFINITY, f64::INFINITY]);
        let x0 = col(&[0.0, 0.0]);
        let result = solver.solve(true, &g, &empty, &empty, &lb, &ub, &x0, &Col::zeros(0));
        assert!(matches!(result, Err(LcqpError::InvalidOperatorSplittingBoxConstraints)));
    }

    #[test]
    fn solves_simple_inequality_constrained_qp() {
        // min x1^2+x2^2 s.t. x1+x2 >= 2 -> x* = (1,1)
        let q = csc_from_triplets(&[(0, 0, 2.0), (1, 1, 2.0)], 2, 2);
        let a = csc_from_triplets(&[(0, 0, 1.0), (0, 1, 1.0)], 1, 2);
        let mut solver = OperatorSplittingSolver::new(&q, &a);
        let g = col(&[0.0, 0.0]);
        let lba = col(&[2.0]);
        let uba = col(&[f64::INFINITY]);
        let lb = col(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        let ub = col(&[f64::INFINITY, f64::INFINITY]);
        let x0 = col(&[1.0, 1.0]);
        let report = solver
            .solve(true, &g, &lba, &uba, &lb, &ub, &x0, &Col::zeros(0))
            .unwrap();
        assert!(report.is_success());
        let mut x_out = Col::zeros(2);
        let mut y_out = Col::zeros(1);
        solver.get_solution(&mut x_out, &mut y_out);
        assert!((x_out[0] - 1.0).abs() < 1e-4);
        assert!((x_out[1] - 1.0).abs() < 1e-4);
    }
}
