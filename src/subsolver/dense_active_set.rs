//! Primal active-set QP backend over dense `faer` matrices, standing in for
//! a qpOASES-style dense solver: the concrete solver library itself is out
//! of scope, only its operational contract is. Implements the textbook
//! active-set method for box + two-sided linear inequality constraints
//! (Nocedal & Wright, *Numerical Optimization*, Algorithm 16.3): at each
//! iterate it solves the equality-constrained QP defined by the current
//! working set, takes a ratio-tested step, and swaps one constraint in or
//! out of the working set per iteration.

use crate::error::{LcqpError, Result};
use crate::subsolver::{Subsolver, SubsolverReport, SubsolverStatus};
use crate::types::PrintLevel;
use faer::{Col, Mat};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Lower,
    Upper,
}

#[derive(Clone, Copy)]
enum ConstraintRef {
    Box(usize),
    Linear(usize),
}

struct RowSpec {
    coeffs: Col<f64>,
    lower: f64,
    upper: f64,
    source: ConstraintRef,
}

/// Active-set QP solver operating directly on dense `Q` (Hessian) and `A`
/// (composite constraint matrix, stacked `[A; S1; S2]` at the problem
/// level). Assumes the caller supplies a starting point that already
/// satisfies the linear constraints (the outer penalty-homotopy loop never
/// relaxes the original linear constraints, only complementarity), so the
/// working-set ratio test only needs to guard against the step leaving the
/// feasible region, not recover from starting outside it.
pub struct DenseActiveSetSolver {
    q: Mat<f64>,
    a: Mat<f64>,
    n_v: usize,
    n_rows: usize,
    max_iterations: usize,
    feasibility_tolerance: f64,
    print_level: PrintLevel,
    x: Col<f64>,
    y: Col<f64>,
    last_report: Option<SubsolverReport>,
    /// Working set from the previous `solve` call, reused as the starting
    /// working set on a hotstart (`initial == false`) instead of rebuilding
    /// it from `x0`'s bound activity.
    working: Option<Vec<(usize, Side)>>,
}

impl DenseActiveSetSolver {
    pub fn new(q: Mat<f64>, a: Mat<f64>) -> Self {
        let n_v = q.nrows();
        let n_rows = a.nrows();
        Self {
            q,
            a,
            n_v,
            n_rows,
            max_iterations: 200,
            feasibility_tolerance: 1e-8,
            print_level: PrintLevel::None,
            x: Col::zeros(n_v),
            y: Col::zeros(n_v + n_rows),
            last_report: None,
            working: None,
        }
    }

    fn build_rows(&self, lba: &Col<f64>, uba: &Col<f64>, lb: &Col<f64>, ub: &Col<f64>) -> Vec<RowSpec> {
        let mut rows = Vec::with_capacity(self.n_v + self.n_rows);
        for i in 0..self.n_v {
            rows.push(RowSpec {
                coeffs: Col::from_fn(self.n_v, |k| if k == i { 1.0 } else { 0.0 }),
                lower: lb[i],
                upper: ub[i],
                source: ConstraintRef::Box(i),
            });
        }
        for i in 0..self.n_rows {
            rows.push(RowSpec {
                coeffs: Col::from_fn(self.n_v, |k| self.a[(i, k)]),
                lower: lba[i],
                upper: uba[i],
                source: ConstraintRef::Linear(i),
            });
        }
        rows
    }

    fn eval(row: &RowSpec, x: &Col<f64>) -> f64 {
        let mut acc = 0.0;
        for k in 0..x.nrows() {
            acc += row.coeffs[k] * x[k];
        }
        acc
    }

    fn row_index(source: ConstraintRef, n_v: usize) -> usize {
        match source {
            ConstraintRef::Box(i) => i,
            ConstraintRef::Linear(i) => n_v + i,
        }
    }

    fn run(
        &mut self,
        initial: bool,
        g: &Col<f64>,
        lba: &Col<f64>,
        uba: &Col<f64>,
        lb: &Col<f64>,
        ub: &Col<f64>,
        x0: &Col<f64>,
    ) -> (Col<f64>, Col<f64>, SubsolverReport) {
        let tol = self.feasibility_tolerance;
        let rows = self.build_rows(lba, uba, lb, ub);

        let mut x = Col::from_fn(self.n_v, |i| x0[i].clamp(lb[i], ub[i]));
        // Hotstart: reuse the working set the previous solve converged to
        // instead of rediscovering it from `x`'s bound activity.
        let mut working: Vec<(usize, Side)> = match (initial, &self.working) {
            (false, Some(prev)) => prev.clone(),
            _ => {
                let mut w = Vec::new();
                for (idx, row) in rows.iter().enumerate() {
                    let val = Self::eval(row, &x);
                    if (val - row.lower).abs() <= tol {
                        w.push((idx, Side::Lower));
                    } else if row.upper.is_finite() && (val - row.upper).abs() <= tol {
                        w.push((idx, Side::Upper));
                    }
                }
                w
            }
        };

        let mut n_iter = 0usize;
        let mut status = SubsolverStatus::Success;

        loop {
            if n_iter >= self.max_iterations {
                status = SubsolverStatus::Failure;
                break;
            }
            n_iter += 1;

            let gk = crate::linalg::dense::aff(1.0, &self.q, &x, g);
            let k = working.len();
            let dim = self.n_v + k;
            let mut sys = Mat::<f64>::zeros(dim, dim);
            let mut rhs = Col::<f64>::zeros(dim);
            for i in 0..self.n_v {
                for j in 0..self.n_v {
                    sys[(i, j)] = self.q[(i, j)];
                }
                rhs[i] = -gk[i];
            }
            for (wi, &(ridx, side)) in working.iter().enumerate() {
                let sign = if side == Side::Lower { 1.0 } else { -1.0 };
                for j in 0..self.n_v {
                    let v = sign * rows[ridx].coeffs[j];
                    sys[(self.n_v + wi, j)] = v;
                    sys[(j, self.n_v + wi)] = v;
                }
            }

            let sol = match solve_linear_system(&sys, &rhs) {
                Some(s) => s,
                None => {
                    status = SubsolverStatus::Failure;
                    break;
                }
            };
            if sol.nrows() > 0 && sol[0].is_nan() {
                status = SubsolverStatus::Failure;
                break;
            }

            let p = Col::from_fn(self.n_v, |i| sol[i]);
            let lambdas: Vec<f64> = (0..k).map(|i| sol[self.n_v + i]).collect();

            let p_norm = crate::linalg::dense::maxabs(&p);
            if p_norm <= tol {
                if k == 0 {
                    break;
                }
                let mut worst_idx = None;
                let mut worst_val = -tol;
                for (wi, &lam) in lambdas.iter().enumerate() {
                    let (_, side) = working[wi];
                    // lb == ub equality rows must stay active regardless of sign.
                    let ridx = working[wi].0;
                    if (rows[ridx].upper - rows[ridx].lower).abs() <= tol {
                        continue;
                    }
                    let _ = side;
                    if lam < worst_val {
                        worst_val = lam;
                        worst_idx = Some(wi);
                    }
                }
                match worst_idx {
                    Some(wi) => {
                        working.remove(wi);
                        continue;
                    }
                    None => break,
                }
            }

            let mut alpha = 1.0_f64;
            let mut blocking: Option<(usize, Side)> = None;
            for (idx, row) in rows.iter().enumerate() {
                if working.iter().any(|&(w, _)| w == idx) {
                    continue;
                }
                let mut denom = 0.0;
                for j in 0..self.n_v {
                    denom += row.coeffs[j] * p[j];
                }
                if denom < -tol && row.lower.is_finite() {
                    let r = Self::eval(row, &x);
                    let cand = (row.lower - r) / denom;
                    if cand < alpha {
                        alpha = cand.max(0.0);
                        blocking = Some((idx, Side::Lower));
                    }
                } else if denom > tol && row.upper.is_finite() {
                    let r = Self::eval(row, &x);
                    let cand = (row.upper - r) / denom;
                    if cand < alpha {
                        alpha = cand.max(0.0);
                        blocking = Some((idx, Side::Upper));
                    }
                }
            }

            x = crate::linalg::dense::wadd_vec(1.0, &x, alpha, &p);
            if alpha < 1.0 - tol {
                if let Some(b) = blocking {
                    if !working.iter().any(|&(w, _)| w == b.0) {
                        working.push(b);
                    }
                }
            }
        }

        let mut y = Col::<f64>::zeros(self.n_v + self.n_rows);
        let gk = crate::linalg::dense::aff(1.0, &self.q, &x, g);
        let k = working.len();
        if k > 0 {
            let dim = self.n_v + k;
            let mut sys = Mat::<f64>::zeros(dim, dim);
            let mut rhs = Col::<f64>::zeros(dim);
            for i in 0..self.n_v {
                for j in 0..self.n_v {
                    sys[(i, j)] = self.q[(i, j)];
                }
                rhs[i] = -gk[i];
            }
            for (wi, &(ridx, side)) in working.iter().enumerate() {
                let sign = if side == Side::Lower { 1.0 } else { -1.0 };
                for j in 0..self.n_v {
                    let v = sign * rows[ridx].coeffs[j];
                    sys[(self.n_v + wi, j)] = v;
                    sys[(j, self.n_v + wi)] = v;
                }
            }
            if let Some(sol) = solve_linear_system(&sys, &rhs) {
                for (wi, &(ridx, side)) in working.iter().enumerate() {
                    let lam = sol[self.n_v + wi];
                    let dual_idx = Self::row_index(rows[ridx].source, self.n_v);
                    y[dual_idx] = if side == Side::Lower { lam } else { -lam };
                }
            }
        }

        let report = SubsolverReport {
            status,
            exit_flag: if status == SubsolverStatus::Success { 0 } else { -1 },
            n_iter,
        };
        self.working = Some(working);
        (x, y, report)
    }
}

/// Gauss-Jordan elimination with partial pivoting. Returns `None` if the
/// system is numerically singular.
fn solve_linear_system(a: &Mat<f64>, b: &Col<f64>) -> Option<Col<f64>> {
    let n = a.nrows();
    if n == 0 {
        return Some(Col::zeros(0));
    }
    let mut m = vec![vec![0.0_f64; n + 1]; n];
    for i in 0..n {
        for j in 0..n {
            m[i][j] = a[(i, j)];
        }
        m[i][n] = b[i];
    }
    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_val = m[col][col].abs();
        for row in (col + 1)..n {
            if m[row][col].abs() > pivot_val {
                pivot_val = m[row][col].abs();
                pivot_row = row;
            }
        }
        if pivot_val < 1e-12 {
            return None;
        }
        m.swap(col, pivot_row);
        let pivot = m[col][col];
        for j in col..=n {
            m[col][j] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..=n {
                m[row][j] -= factor * m[col][j];
            }
        }
    }
    Some(Col::from_fn(n, |i| m[i][n]))
}

impl Subsolver for DenseActiveSetSolver {
    fn solve(
        &mut self,
        initial: bool,
        g: &Col<f64>,
        lba: &Col<f64>,
        uba: &Col<f64>,
        lb: &Col<f64>,
        ub: &Col<f64>,
        x0: &Col<f64>,
        _y0: &Col<f64>,
    ) -> Result<SubsolverReport> {
        if lba.nrows() != self.n_rows || uba.nrows() != self.n_rows {
            return Err(LcqpError::IndexOutOfBounds(
                "lba/uba length does not match the constraint matrix row count".into(),
            ));
        }
        let (x, y, report) = self.run(initial, g, lba, uba, lb, ub, x0);
        self.x = x;
        self.y = y;
        self.last_report = Some(report);
        Ok(report)
    }

    fn get_solution(&self, x_out: &mut Col<f64>, y_out: &mut Col<f64>) {
        for i in 0..self.n_v {
            x_out[i] = self.x[i];
        }
        for i in 0..self.y.nrows() {
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
        self.n_v + self.n_rows
    }

    fn accepts_box_bounds(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(data: &[f64]) -> Col<f64> {
        Col::from_fn(data.len(), |i| data[i])
    }

    #[test]
    fn unconstrained_minimum_of_simple_quadratic() {
        // min x1^2 + x2^2 -> x* = (0, 0)
        let q = Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 0.0 });
        let a = Mat::zeros(0, 2);
        let mut solver = DenseActiveSetSolver::new(q, a);
        let g = col(&[0.0, 0.0]);
        let inf = col(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        let pinf = col(&[f64::INFINITY, f64::INFINITY]);
        let empty = Col::<f64>::zeros(0);
        let x0 = col(&[5.0, -3.0]);
        let report = solver
            .solve(true, &g, &empty, &empty, &inf, &pinf, &x0, &Col::zeros(2))
            .unwrap();
        assert!(report.is_success());
        let mut x_out = Col::zeros(2);
        let mut y_out = Col::zeros(2);
        solver.get_solution(&mut x_out, &mut y_out);
        assert!(x_out[0].abs() < 1e-6);
        assert!(x_out[1].abs() < 1e-6);
    }

    #[test]
    fn box_bound_clamps_active_coordinate() {
        // min (x-3)^2 + (y-3)^2 s.t. 0<=x<=1, 0<=y<=1 -> x*=(1,1)
        let q = Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 0.0 });
        let g = col(&[-6.0, -6.0]);
        let a = Mat::zeros(0, 2);
        let mut solver = DenseActiveSetSolver::new(q, a);
        let lb = col(&[0.0, 0.0]);
        let ub = col(&[1.0, 1.0]);
        let empty = Col::<f64>::zeros(0);
        let x0 = col(&[0.2, 0.2]);
        let report = solver
            .solve(true, &g, &empty, &empty, &lb, &ub, &x0, &Col::zeros(2))
            .unwrap();
        assert!(report.is_success());
        let mut x_out = Col::zeros(2);
        let mut y_out = Col::zeros(2);
        solver.get_solution(&mut x_out, &mut y_out);
        assert!((x_out[0] - 1.0).abs() < 1e-5);
        assert!((x_out[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn linear_constraint_is_respected_at_optimum() {
        // min x1^2+x2^2 s.t. x1+x2 >= 2 -> x* = (1,1)
        let q = Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 0.0 });
        let g = col(&[0.0, 0.0]);
        let a = Mat::from_fn(1, 2, |_, _| 1.0);
        let mut solver = DenseActiveSetSolver::new(q, a);
        let lba = col(&[2.0]);
        let uba = col(&[f64::INFINITY]);
        let lb = col(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        let ub = col(&[f64::INFINITY, f64::INFINITY]);
        let x0 = col(&[1.0, 1.0]);
        let report = solver
            .solve(true, &g, &lba, &uba, &lb, &ub, &x0, &Col::zeros(3))
            .unwrap();
        assert!(report.is_success());
        let mut x_out = Col::zeros(2);
        let mut y_out = Col::zeros(3);
        solver.get_solution(&mut x_out, &mut y_out);
        assert!((x_out[0] - 1.0).abs() < 1e-5);
        assert!((x_out[1] - 1.0).abs() < 1e-5);
    }
}
