//! Problem state & setup: [`LcqProblem`] owns dimensions, the matrix
//! representation, bounds, iterate buffers, statistics, and the bound
//! subsolver backend.

pub mod io;
pub mod matrix_repr;

use crate::error::{LcqpError, Result};
use crate::options::Options;
use crate::statistics::OutputStatistics;
use crate::subsolver::dense_active_set::DenseActiveSetSolver;
use crate::subsolver::operator_splitting::OperatorSplittingSolver;
use crate::subsolver::sparse_active_set::SparseActiveSetSolver;
use crate::subsolver::{box_bounds_are_trivial, Subsolver};
use crate::types::{AlgorithmStatus, ProblemDims, QpSolverKind};
use clarabel::algebra::CscMatrix;
use faer::{Col, Mat};
use matrix_repr::{assemble_composite_bounds, assemble_dense, assemble_sparse, Bounds, MatrixRepr, QkState};
use std::path::Path;

pub struct LcqProblem {
    pub(crate) dims: ProblemDims,
    pub(crate) repr: Option<MatrixRepr>,
    pub(crate) bounds: Option<Bounds>,
    pub(crate) lb_tmp: Col<f64>,
    pub(crate) ub_tmp: Col<f64>,
    pub(crate) g: Col<f64>,
    pub(crate) x0: Col<f64>,
    pub(crate) y0: Col<f64>,
    pub(crate) sparse_solver: bool,
    pub(crate) options: Options,
    pub(crate) stats: OutputStatistics,
    pub(crate) subsolver: Option<Box<dyn Subsolver>>,
    pub(crate) qk: Option<QkState>,
    pub(crate) rho: f64,
    pub(crate) x_k: Col<f64>,
    pub(crate) y_k: Col<f64>,
    pub(crate) algo_stat: AlgorithmStatus,
}

impl LcqProblem {
    pub fn new(n_v: usize, n_c: usize, n_comp: usize) -> Result<Self> {
        let dims = ProblemDims::new(n_v, n_c, n_comp)?;
        Ok(Self {
            dims,
            repr: None,
            bounds: None,
            lb_tmp: Col::zeros(n_v),
            ub_tmp: Col::zeros(n_v),
            g: Col::zeros(n_v),
            x0: Col::zeros(n_v),
            y0: Col::zeros(0),
            sparse_solver: false,
            options: Options::default(),
            stats: OutputStatistics::new(),
            subsolver: None,
            qk: None,
            rho: 0.0,
            x_k: Col::zeros(n_v),
            y_k: Col::zeros(0),
            algo_stat: AlgorithmStatus::NotSolved,
        })
    }

    pub fn dims(&self) -> ProblemDims {
        self.dims
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    #[allow(clippy::too_many_arguments)]
    pub fn load_lcqp_dense(
        &mut self,
        h: Mat<f64>,
        g: Col<f64>,
        a: Option<Mat<f64>>,
        s1: Mat<f64>,
        s2: Mat<f64>,
        lba: Option<Col<f64>>,
        uba: Option<Col<f64>>,
        lb_s1: Option<Col<f64>>,
        ub_s1: Option<Col<f64>>,
        lb_s2: Option<Col<f64>>,
        ub_s2: Option<Col<f64>>,
        lb: Option<Col<f64>>,
        ub: Option<Col<f64>>,
        x0: Option<Col<f64>>,
        y0: Option<Col<f64>>,
    ) -> Result<()> {
        let (n_v, n_c, n_comp) = (self.dims.n_v, self.dims.n_c, self.dims.n_comp);
        self.check_dims(h.nrows() == n_v && h.ncols() == n_v)?;
        self.check_dims(g.nrows() == n_v)?;
        self.check_dims(s1.nrows() == n_comp && s1.ncols() == n_v)?;
        self.check_dims(s2.nrows() == n_comp && s2.ncols() == n_v)?;
        let a = match a {
            Some(a) => {
                self.check_dims(a.nrows() == n_c && a.ncols() == n_v)?;
                a
            }
            None => Mat::zeros(n_c, n_v),
        };
        let lba = check_or_default(lba, n_c, f64::NEG_INFINITY, &self)?;
        let uba = check_or_default(uba, n_c, f64::INFINITY, &self)?;
        let lb_s1 = check_or_default(lb_s1, n_comp, 0.0, &self)?;
        let ub_s1 = check_or_default(ub_s1, n_comp, f64::INFINITY, &self)?;
        let lb_s2 = check_or_default(lb_s2, n_comp, 0.0, &self)?;
        let ub_s2 = check_or_default(ub_s2, n_comp, f64::INFINITY, &self)?;
        let lb = check_or_default(lb, n_v, f64::NEG_INFINITY, &self)?;
        let ub = check_or_default(ub, n_v, f64::INFINITY, &self)?;
        let x0 = check_or_default(x0, n_v, 0.0, &self)?;
        let n_duals_max = n_v + self.dims.n_rows_composite();
        let y0 = check_or_default(y0, n_duals_max, 0.0, &self)?;

        let bounds = assemble_composite_bounds(self.dims, &lba, &uba, &lb_s1, &ub_s1, &lb_s2, &ub_s2);
        let dm = assemble_dense(h, &a, s1, s2);

        self.g = g;
        self.lb_tmp = lb;
        self.ub_tmp = ub;
        self.bounds = Some(bounds);
        self.repr = Some(MatrixRepr::Dense(dm));
        self.sparse_solver = false;
        self.x0 = x0.clone();
        self.y0 = y0.clone();
        self.reset_iterate_state(x0, y0);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn load_lcqp_sparse(
        &mut self,
        h: CscMatrix<f64>,
        g: Col<f64>,
        a: Option<CscMatrix<f64>>,
        s1: CscMatrix<f64>,
        s2: CscMatrix<f64>,
        lba: Option<Col<f64>>,
        uba: Option<Col<f64>>,
        lb_s1: Option<Col<f64>>,
        ub_s1: Option<Col<f64>>,
        lb_s2: Option<Col<f64>>,
        ub_s2: Option<Col<f64>>,
        lb: Option<Col<f64>>,
        ub: Option<Col<f64>>,
        x0: Option<Col<f64>>,
        y0: Option<Col<f64>>,
    ) -> Result<()> {
        let (n_v, n_c, n_comp) = (self.dims.n_v, self.dims.n_c, self.dims.n_comp);
        self.check_dims(h.n == n_v && h.m == n_v)?;
        self.check_dims(g.nrows() == n_v)?;
        self.check_dims(s1.m == n_comp && s1.n == n_v)?;
        self.check_dims(s2.m == n_comp && s2.n == n_v)?;
        let a = match a {
            Some(a) => {
                self.check_dims(a.m == n_c && a.n == n_v)?;
                a
            }
            None => CscMatrix::new(n_c, n_v, vec![0; n_v + 1], vec![], vec![]),
        };
        let lba = check_or_default(lba, n_c, f64::NEG_INFINITY, &self)?;
        let uba = check_or_default(uba, n_c, f64::INFINITY, &self)?;
        let lb_s1 = check_or_default(lb_s1, n_comp, 0.0, &self)?;
        let ub_s1 = check_or_default(ub_s1, n_comp, f64::INFINITY, &self)?;
        let lb_s2 = check_or_default(lb_s2, n_comp, 0.0, &self)?;
        let ub_s2 = check_or_default(ub_s2, n_comp, f64::INFINITY, &self)?;
        let lb = check_or_default(lb, n_v, f64::NEG_INFINITY, &self)?;
        let ub = check_or_default(ub, n_v, f64::INFINITY, &self)?;
        let x0 = check_or_default(x0, n_v, 0.0, &self)?;
        let n_duals_max = n_v + self.dims.n_rows_composite();
        let y0 = check_or_default(y0, n_duals_max, 0.0, &self)?;

        let bounds = assemble_composite_bounds(self.dims, &lba, &uba, &lb_s1, &ub_s1, &lb_s2, &ub_s2);
        let sm = assemble_sparse(h, &a, s1, s2)?;

        self.g = g;
        self.lb_tmp = lb;
        self.ub_tmp = ub;
        self.bounds = Some(bounds);
        self.repr = Some(MatrixRepr::Sparse(sm));
        self.sparse_solver = true;
        self.x0 = x0.clone();
        self.y0 = y0.clone();
        self.reset_iterate_state(x0, y0);
        Ok(())
    }

    /// Loads all problem data from plain-text files in `dir`, one file per
    /// field (`h.txt`, `g.txt`, `s1.txt`, `s2.txt` required; `a.txt`,
    /// `lba.txt`, `uba.txt`, `lb_s1.txt`, `ub_s1.txt`, `lb_s2.txt`,
    /// `ub_s2.txt`, `lb.txt`, `ub.txt`, `x0.txt`, `y0.txt` optional,
    /// defaulting as in [`LcqProblem::load_lcqp_dense`] when absent).
    pub fn load_lcqp_file(&mut self, dir: &Path) -> Result<()> {
        let (n_v, n_c, n_comp) = (self.dims.n_v, self.dims.n_c, self.dims.n_comp);

        let h = io::read_dense_matrix(&dir.join("h.txt"), n_v, n_v)?;
        let g = io::read_vector(&dir.join("g.txt"), n_v)?;
        let s1 = io::read_dense_matrix(&dir.join("s1.txt"), n_comp, n_v)?;
        let s2 = io::read_dense_matrix(&dir.join("s2.txt"), n_comp, n_v)?;

        let a = optional_matrix(&dir.join("a.txt"), n_c, n_v)?;
        let lba = optional_vector(&dir.join("lba.txt"), n_c)?;
        let uba = optional_vector(&dir.join("uba.txt"), n_c)?;
        let lb_s1 = optional_vector(&dir.join("lb_s1.txt"), n_comp)?;
        let ub_s1 = optional_vector(&dir.join("ub_s1.txt"), n_comp)?;
        let lb_s2 = optional_vector(&dir.join("lb_s2.txt"), n_comp)?;
        let ub_s2 = optional_vector(&dir.join("ub_s2.txt"), n_comp)?;
        let lb = optional_vector(&dir.join("lb.txt"), n_v)?;
        let ub = optional_vector(&dir.join("ub.txt"), n_v)?;
        let x0 = optional_vector(&dir.join("x0.txt"), n_v)?;
        let y0 = optional_vector(&dir.join("y0.txt"), n_v + self.dims.n_rows_composite())?;

        self.load_lcqp_dense(h, g, a, s1, s2, lba, uba, lb_s1, ub_s1, lb_s2, ub_s2, lb, ub, x0, y0)
    }

    fn check_dims(&self, ok: bool) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(LcqpError::InvalidDimensions {
                n_v: self.dims.n_v,
                n_c: self.dims.n_c,
                n_comp: self.dims.n_comp,
            })
        }
    }

    fn reset_iterate_state(&mut self, x0: Col<f64>, y0: Col<f64>) {
        self.stats = OutputStatistics::new();
        self.subsolver = None;
        self.qk = None;
        self.rho = 0.0;
        self.x_k = x0;
        self.y_k = y0;
        self.algo_stat = AlgorithmStatus::NotSolved;
    }

    pub(crate) fn loaded(&self) -> Result<(&MatrixRepr, &Bounds)> {
        match (&self.repr, &self.bounds) {
            (Some(r), Some(b)) => Ok((r, b)),
            _ => Err(LcqpError::MissingComplementarityMatrix),
        }
    }

    /// Dense/sparse mode switch and box-bound acceptance check.
    pub(crate) fn initialize_solver(&mut self) -> Result<()> {
        let want_sparse = self.options.qp_solver().is_sparse();
        if want_sparse != self.sparse_solver {
            let (repr, _) = self.loaded()?;
            let switched = matrix_repr::switch_mode(repr)?;
            self.repr = Some(switched);
            self.sparse_solver = want_sparse;
        }
        if matches!(self.options.qp_solver(), QpSolverKind::OsqpSparse)
            && !box_bounds_are_trivial(&self.lb_tmp, &self.ub_tmp)
        {
            return Err(LcqpError::InvalidOperatorSplittingBoxConstraints);
        }
        Ok(())
    }

    pub(crate) fn rebuild_qk(&mut self, rho: f64) -> Result<()> {
        let (repr, _) = self.loaded()?;
        self.qk = Some(QkState::rebuild(repr, rho));
        self.rho = rho;
        Ok(())
    }

    pub(crate) fn escalate_qk(&mut self, rho_new: f64) -> Result<()> {
        let repr = self.repr.as_ref().ok_or(LcqpError::MissingComplementarityMatrix)?;
        let qk = self.qk.as_mut().ok_or(LcqpError::MissingComplementarityMatrix)?;
        qk.escalate(repr, self.rho, rho_new);
        self.rho = rho_new;
        Ok(())
    }

    pub(crate) fn rebuild_subsolver(&mut self) -> Result<()> {
        let repr = self.repr.as_ref().ok_or(LcqpError::MissingComplementarityMatrix)?;
        let qk = self.qk.as_ref().ok_or(LcqpError::MissingComplementarityMatrix)?;
        let kind = self.options.qp_solver();
        let mut solver: Box<dyn Subsolver> = match (qk, repr, kind) {
            (QkState::Dense(q), MatrixRepr::Dense(dm), QpSolverKind::QpoasesDense) => {
                Box::new(DenseActiveSetSolver::new(q.clone(), dm.a_tilde.clone()))
            }
            (QkState::Sparse { qk, .. }, MatrixRepr::Sparse(sm), QpSolverKind::QpoasesSparse) => {
                Box::new(SparseActiveSetSolver::new(qk, &sm.a_tilde)?)
            }
            (QkState::Sparse { qk, .. }, MatrixRepr::Sparse(sm), QpSolverKind::OsqpSparse) => {
                Box::new(OperatorSplittingSolver::new(qk, &sm.a_tilde))
            }
            _ => return Err(LcqpError::DenseSparseMismatch),
        };
        solver.set_print_level(self.options.print_level());
        solver.set_options(self.options.max_iterations(), self.options.stationarity_tolerance());
        self.subsolver = Some(solver);
        Ok(())
    }

    pub fn solve(&mut self) -> Result<AlgorithmStatus> {
        self.initialize_solver()?;
        crate::engine::run(self)
    }

    pub fn get_primal_solution(&self, x_out: &mut Col<f64>) -> Result<()> {
        if x_out.nrows() != self.dims.n_v {
            return Err(LcqpError::IndexOutOfBounds(format!(
                "expected primal output of length {}, got {}",
                self.dims.n_v,
                x_out.nrows()
            )));
        }
        for i in 0..self.dims.n_v {
            x_out[i] = self.x_k[i];
        }
        Ok(())
    }

    pub fn get_dual_solution(&self, y_out: &mut Col<f64>) -> Result<()> {
        let n_duals = self.get_number_of_duals();
        if y_out.nrows() != n_duals {
            return Err(LcqpError::IndexOutOfBounds(format!(
                "expected dual output of length {n_duals}, got {}",
                y_out.nrows()
            )));
        }
        for i in 0..n_duals {
            y_out[i] = self.y_k[i];
        }
        Ok(())
    }

    pub fn get_number_of_primals(&self) -> usize {
        self.dims.n_v
    }

    pub fn get_number_of_duals(&self) -> usize {
        self.options.qp_solver().n_duals(self.dims)
    }

    pub fn get_output_statistics(&self) -> &OutputStatistics {
        &self.stats
    }

    pub fn algorithm_status(&self) -> AlgorithmStatus {
        self.algo_stat
    }
}

fn check_or_default(v: Option<Col<f64>>, len: usize, default: f64, problem: &LcqProblem) -> Result<Col<f64>> {
    match v {
        Some(v) => {
            problem.check_dims(v.nrows() == len)?;
            Ok(v)
        }
        None => Ok(Col::from_fn(len, |_| default)),
    }
}

fn optional_vector(path: &Path, len: usize) -> Result<Option<Col<f64>>> {
    if len > 0 && path.exists() {
        Ok(Some(io::read_vector(path, len)?))
    } else {
        Ok(None)
    }
}

fn optional_matrix(path: &Path, rows: usize, cols: usize) -> Result<Option<Mat<f64>>> {
    if rows > 0 && path.exists() {
        Ok(Some(io::read_dense_matrix(path, rows, cols)?))
    } else {
        Ok(None)
    }
}
