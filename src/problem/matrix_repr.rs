//! Dense/sparse matrix representation for an [`super::LcqProblem`]: a tagged
//! enum holding `H`, the composite constraint matrix `Ã = [A; S1; S2]`,
//! `S1`, `S2`, and the complementarity matrix `C = S1^T S2 + S2^T S1` all in
//! one representation at a time, with mode-dispatched top-level operations
//! rather than per-op virtual dispatch.

use crate::error::Result;
use crate::linalg::{dense, sparse};
use crate::types::ProblemDims;
use clarabel::algebra::CscMatrix;
use faer::{Col, Mat};

#[derive(Clone)]
pub struct DenseMatrices {
    pub h: Mat<f64>,
    pub a_tilde: Mat<f64>,
    pub s1: Mat<f64>,
    pub s2: Mat<f64>,
    pub c: Mat<f64>,
}

#[derive(Clone)]
pub struct SparseMatrices {
    pub h: CscMatrix<f64>,
    pub a_tilde: CscMatrix<f64>,
    pub s1: CscMatrix<f64>,
    pub s2: CscMatrix<f64>,
    pub c: CscMatrix<f64>,
}

#[derive(Clone)]
pub enum MatrixRepr {
    Dense(DenseMatrices),
    Sparse(SparseMatrices),
}

impl MatrixRepr {
    pub fn is_sparse(&self) -> bool {
        matches!(self, MatrixRepr::Sparse(_))
    }
}

/// Composite bound vectors of length `nC + 2*nComp`.
#[derive(Clone)]
pub struct Bounds {
    pub lba_tilde: Col<f64>,
    pub uba_tilde: Col<f64>,
}

pub fn assemble_composite_bounds(
    dims: ProblemDims,
    lba: &Col<f64>,
    uba: &Col<f64>,
    lb_s1: &Col<f64>,
    ub_s1: &Col<f64>,
    lb_s2: &Col<f64>,
    ub_s2: &Col<f64>,
) -> Bounds {
    let n = dims.n_rows_composite();
    let lba_tilde = Col::from_fn(n, |i| {
        if i < dims.n_c {
            lba[i]
        } else if i < dims.n_c + dims.n_comp {
            lb_s1[i - dims.n_c]
        } else {
            lb_s2[i - dims.n_c - dims.n_comp]
        }
    });
    let uba_tilde = Col::from_fn(n, |i| {
        if i < dims.n_c {
            uba[i]
        } else if i < dims.n_c + dims.n_comp {
            ub_s1[i - dims.n_c]
        } else {
            ub_s2[i - dims.n_c - dims.n_comp]
        }
    });
    Bounds { lba_tilde, uba_tilde }
}

/// Stacks `A`, `S1`, `S2` vertically into `Ã`, and computes `C`.
pub fn assemble_dense(h: Mat<f64>, a: &Mat<f64>, s1: Mat<f64>, s2: Mat<f64>) -> DenseMatrices {
    let n_v = h.nrows();
    let n_c = a.nrows();
    let n_comp = s1.nrows();
    let a_tilde = Mat::from_fn(n_c + 2 * n_comp, n_v, |i, j| {
        if i < n_c {
            a[(i, j)]
        } else if i < n_c + n_comp {
            s1[(i - n_c, j)]
        } else {
            s2[(i - n_c - n_comp, j)]
        }
    });
    let c = dense::sym_product(&s1, &s2);
    DenseMatrices { h, a_tilde, s1, s2, c }
}

/// Stacks `A`, `S1`, `S2` vertically into `Ã` in CSC form — row lists within
/// each block are already ascending (the source matrices are built via
/// [`sparse::csc_from_triplets`]), and the blocks occupy disjoint,
/// increasing row ranges, so straight concatenation per column already
/// yields ascending row order overall, matching the composite assembly
/// rule. Also computes `C` and its `Qk_indices_of_C` side table against
/// the given initial `rho`, assuming `Qk` is built by appending
/// `C`'s structural nonzeros after `H`'s in each shared column — the
/// concrete index mapping is recomputed by the engine whenever `Qk` itself
/// is rebuilt from scratch, but is seeded here against `H` alone.
pub fn assemble_sparse(
    h: CscMatrix<f64>,
    a: &CscMatrix<f64>,
    s1: CscMatrix<f64>,
    s2: CscMatrix<f64>,
) -> Result<SparseMatrices> {
    let n_v = h.n;
    let n_c = a.m;
    let n_comp = s1.m;
    let a_tilde = sparse::csc_from_triplets(
        &collect_vstack_triplets(&[(a, 0), (&s1, n_c), (&s2, n_c + n_comp)]),
        n_c + 2 * n_comp,
        n_v,
    );
    let c = sparse::csc_sym_product(&s1, &s2)?;
    Ok(SparseMatrices { h, a_tilde, s1, s2, c })
}

/// Converts every matrix in a [`MatrixRepr`] to the opposite representation.
/// Fails with
/// [`crate::error::LcqpError::DenseSparseMismatch`] if any conversion
/// produces a structurally invalid result.
pub fn switch_mode(repr: &MatrixRepr) -> Result<MatrixRepr> {
    match repr {
        MatrixRepr::Dense(dm) => Ok(MatrixRepr::Sparse(SparseMatrices {
            h: sparse::dns_to_csc(&dm.h),
            a_tilde: sparse::dns_to_csc(&dm.a_tilde),
            s1: sparse::dns_to_csc(&dm.s1),
            s2: sparse::dns_to_csc(&dm.s2),
            c: sparse::dns_to_csc(&dm.c),
        })),
        MatrixRepr::Sparse(sm) => {
            let to_dense = |m: &CscMatrix<f64>| {
                sparse::csc_to_dns(m).map_err(|_| crate::error::LcqpError::DenseSparseMismatch)
            };
            Ok(MatrixRepr::Dense(DenseMatrices {
                h: to_dense(&sm.h)?,
                a_tilde: to_dense(&sm.a_tilde)?,
                s1: to_dense(&sm.s1)?,
                s2: to_dense(&sm.s2)?,
                c: to_dense(&sm.c)?,
            }))
        }
    }
}

fn collect_vstack_triplets(blocks: &[(&CscMatrix<f64>, usize)]) -> Vec<(usize, usize, f64)> {
    let mut triplets = Vec::new();
    for &(m, row_offset) in blocks {
        for col in 0..m.n {
            for idx in m.colptr[col]..m.colptr[col + 1] {
                triplets.push((m.rowval[idx] + row_offset, col, m.nzval[idx]));
            }
        }
    }
    triplets
}

/// Builds `Qk = H + rho*C` in CSC form, recording the position of each of
/// `C`'s nonzeros in `Qk`'s `nzval` for later `O(nnz(C))` updates.
pub fn build_qk_sparse(h: &CscMatrix<f64>, c: &CscMatrix<f64>, rho: f64) -> (CscMatrix<f64>, Vec<usize>) {
    let n = h.n;
    let mut by_col: Vec<std::collections::BTreeMap<usize, f64>> = vec![std::collections::BTreeMap::new(); n];
    for col in 0..h.n {
        for idx in h.colptr[col]..h.colptr[col + 1] {
            *by_col[col].entry(h.rowval[idx]).or_insert(0.0) += h.nzval[idx];
        }
    }
    for col in 0..c.n {
        for idx in c.colptr[col]..c.colptr[col + 1] {
            *by_col[col].entry(c.rowval[idx]).or_insert(0.0) += rho * c.nzval[idx];
        }
    }

    let mut colptr = vec![0usize];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    for col_map in &by_col {
        for (&row, &val) in col_map {
            rowval.push(row);
            nzval.push(val);
        }
        colptr.push(rowval.len());
    }
    let qk = CscMatrix::new(n, n, colptr.clone(), rowval.clone(), nzval);

    // Map each nonzero of C to its position in Qk's value array.
    let mut qk_indices_of_c = Vec::with_capacity(c.nzval.len());
    for col in 0..c.n {
        let qk_start = colptr[col];
        let qk_end = colptr[col + 1];
        for idx in c.colptr[col]..c.colptr[col + 1] {
            let row = c.rowval[idx];
            let pos = (qk_start..qk_end)
                .find(|&p| rowval[p] == row)
                .expect("Qk column built from H ∪ C must contain every C row");
            qk_indices_of_c.push(pos);
        }
    }
    (qk, qk_indices_of_c)
}

/// Dense counterpart: `Qk = H + rho*C`, recomputed wholesale each time
/// (dense mode has no sparsity structure to preserve incrementally).
pub fn build_qk_dense(h: &Mat<f64>, c: &Mat<f64>, rho: f64) -> Mat<f64> {
    dense::wadd(1.0, h, rho, c)
}

/// Current penalty-augmented Hessian `Qk = H + rho*C`, in whichever
/// representation the problem is running.
pub enum QkState {
    Dense(Mat<f64>),
    Sparse { qk: CscMatrix<f64>, indices_of_c: Vec<usize> },
}

impl QkState {
    pub fn rebuild(repr: &MatrixRepr, rho: f64) -> Self {
        match repr {
            MatrixRepr::Dense(dm) => QkState::Dense(build_qk_dense(&dm.h, &dm.c, rho)),
            MatrixRepr::Sparse(sm) => {
                let (qk, indices_of_c) = build_qk_sparse(&sm.h, &sm.c, rho);
                QkState::Sparse { qk, indices_of_c }
            }
        }
    }

    /// Incremental update for a penalty escalation `rho_old -> rho_new`: in
    /// sparse mode, applies `Qk.nzval[indices_of_c[j]] += delta*C.nzval[j]`;
    /// dense mode has no sparsity structure worth preserving and is
    /// rebuilt wholesale.
    pub fn escalate(&mut self, repr: &MatrixRepr, rho_old: f64, rho_new: f64) {
        match (self, repr) {
            (QkState::Sparse { qk, indices_of_c }, MatrixRepr::Sparse(sm)) => {
                let delta = rho_new - rho_old;
                for (j, &pos) in indices_of_c.iter().enumerate() {
                    qk.nzval[pos] += delta * sm.c.nzval[j];
                }
            }
            (QkState::Dense(qk), MatrixRepr::Dense(dm)) => {
                *qk = build_qk_dense(&dm.h, &dm.c, rho_new);
            }
            _ => unreachable!("QkState and MatrixRepr must share a mode"),
        }
    }

    pub fn matvec(&self, x: &Col<f64>) -> Col<f64> {
        match self {
            QkState::Dense(qk) => dense::matvec(qk, x),
            QkState::Sparse { qk, .. } => sparse::csc_matvec(qk, x),
        }
    }

    pub fn qform(&self, p: &Col<f64>) -> f64 {
        match self {
            QkState::Dense(qk) => dense::qform(qk, p),
            QkState::Sparse { qk, .. } => sparse::csc_qform(qk, p),
        }
    }
}

/// `Ã * x`, mode-dispatched.
pub fn matvec_a_tilde(repr: &MatrixRepr, x: &Col<f64>) -> Col<f64> {
    match repr {
        MatrixRepr::Dense(dm) => dense::matvec(&dm.a_tilde, x),
        MatrixRepr::Sparse(sm) => sparse::csc_matvec(&sm.a_tilde, x),
    }
}

/// `Ã^T * y`, mode-dispatched.
pub fn matvec_t_a_tilde(repr: &MatrixRepr, y: &Col<f64>) -> Col<f64> {
    match repr {
        MatrixRepr::Dense(dm) => dense::matvec_t(&dm.a_tilde, y),
        MatrixRepr::Sparse(sm) => sparse::csc_matvec_t(&sm.a_tilde, y),
    }
}

/// `S1 * x`, mode-dispatched.
pub fn matvec_s1(repr: &MatrixRepr, x: &Col<f64>) -> Col<f64> {
    match repr {
        MatrixRepr::Dense(dm) => dense::matvec(&dm.s1, x),
        MatrixRepr::Sparse(sm) => sparse::csc_matvec(&sm.s1, x),
    }
}

/// `S2 * x`, mode-dispatched.
pub fn matvec_s2(repr: &MatrixRepr, x: &Col<f64>) -> Col<f64> {
    match repr {
        MatrixRepr::Dense(dm) => dense::matvec(&dm.s2, x),
        MatrixRepr::Sparse(sm) => sparse::csc_matvec(&sm.s2, x),
    }
}

/// `S1^T * x`, mode-dispatched.
pub fn matvec_t_s1(repr: &MatrixRepr, x: &Col<f64>) -> Col<f64> {
    match repr {
        MatrixRepr::Dense(dm) => dense::matvec_t(&dm.s1, x),
        MatrixRepr::Sparse(sm) => sparse::csc_matvec_t(&sm.s1, x),
    }
}

/// `S2^T * x`, mode-dispatched.
pub fn matvec_t_s2(repr: &MatrixRepr, x: &Col<f64>) -> Col<f64> {
    match repr {
        MatrixRepr::Dense(dm) => dense::matvec_t(&dm.s2, x),
        MatrixRepr::Sparse(sm) => sparse::csc_matvec_t(&sm.s2, x),
    }
}

/// `C * x`, mode-dispatched.
pub fn matvec_c(repr: &MatrixRepr, x: &Col<f64>) -> Col<f64> {
    match repr {
        MatrixRepr::Dense(dm) => dense::matvec(&dm.c, x),
        MatrixRepr::Sparse(sm) => sparse::csc_matvec(&sm.c, x),
    }
}

/// `x^T H x`, mode-dispatched.
pub fn qform_h(repr: &MatrixRepr, x: &Col<f64>) -> f64 {
    match repr {
        MatrixRepr::Dense(dm) => dense::qform(&dm.h, x),
        MatrixRepr::Sparse(sm) => sparse::csc_qform(&sm.h, x),
    }
}

pub fn n_v(repr: &MatrixRepr) -> usize {
    match repr {
        MatrixRepr::Dense(dm) => dm.h.nrows(),
        MatrixRepr::Sparse(sm) => sm.h.n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_vstack_matches_manual_rows() {
        let h = Mat::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 0.0 });
        let a = Mat::from_fn(1, 2, |_, _| 3.0);
        let s1 = Mat::from_fn(1, 2, |_, j| (j + 1) as f64);
        let s2 = Mat::from_fn(1, 2, |_, j| (j + 2) as f64);
        let dm = assemble_dense(h, &a, s1, s2);
        assert_eq!(dm.a_tilde.nrows(), 3);
        assert_eq!(dm.a_tilde[(0, 0)], 3.0);
        assert_eq!(dm.a_tilde[(1, 0)], 1.0);
        assert_eq!(dm.a_tilde[(2, 0)], 2.0);
    }

    #[test]
    fn sparse_vstack_row_offsets_match_dense() {
        let h = sparse::csc_from_triplets(&[(0, 0, 1.0), (1, 1, 1.0)], 2, 2);
        let a = sparse::csc_from_triplets(&[(0, 0, 3.0), (0, 1, 3.0)], 1, 2);
        let s1 = sparse::csc_from_triplets(&[(0, 0, 1.0), (0, 1, 2.0)], 1, 2);
        let s2 = sparse::csc_from_triplets(&[(0, 0, 2.0), (0, 1, 3.0)], 1, 2);
        let sm = assemble_sparse(h, &a, s1, s2).unwrap();
        let dense = sparse::csc_to_dns(&sm.a_tilde).unwrap();
        assert_eq!(dense[(0, 0)], 3.0);
        assert_eq!(dense[(1, 0)], 1.0);
        assert_eq!(dense[(2, 0)], 2.0);
    }

    #[test]
    fn qk_sparse_matches_dense_after_build() {
        let h = sparse::csc_from_triplets(&[(0, 0, 2.0), (1, 1, 2.0)], 2, 2);
        let c = sparse::csc_from_triplets(&[(0, 0, 1.0), (0, 1, 0.5), (1, 0, 0.5), (1, 1, 1.0)], 2, 2);
        let (qk, indices) = build_qk_sparse(&h, &c, 2.0);
        let dense_qk = sparse::csc_to_dns(&qk).unwrap();
        assert_eq!(dense_qk[(0, 0)], 4.0);
        assert_eq!(dense_qk[(0, 1)], 1.0);
        assert_eq!(indices.len(), c.nzval.len());
    }

    #[test]
    fn composite_bounds_default_to_complementarity_ranges() {
        let dims = ProblemDims::new(2, 1, 1).unwrap();
        let lba = Col::from_fn(1, |_| -1.0);
        let uba = Col::from_fn(1, |_| 1.0);
        let lb_s1 = Col::from_fn(1, |_| 0.0);
        let ub_s1 = Col::from_fn(1, |_| f64::INFINITY);
        let lb_s2 = Col::from_fn(1, |_| 0.0);
        let ub_s2 = Col::from_fn(1, |_| f64::INFINITY);
        let bounds = assemble_composite_bounds(dims, &lba, &uba, &lb_s1, &ub_s1, &lb_s2, &ub_s2);
        assert_eq!(bounds.lba_tilde[0], -1.0);
        assert_eq!(bounds.lba_tilde[1], 0.0);
        assert_eq!(bounds.uba_tilde[2], f64::INFINITY);
    }
}
