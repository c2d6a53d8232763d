//! Sparse (CSC) linear algebra primitives, operating on
//! `clarabel::algebra::CscMatrix<f64>` — the same CSC type the adapted
//! teacher already builds by hand in its constraint-assembly helpers.

use crate::error::{LcqpError, Result};
use clarabel::algebra::CscMatrix;
use faer::{Col, Mat};

/// Builds a CSC matrix from `(row, col, value)` triplets, sorting by column
/// then row. Mirrors the triplet-to-CSC technique used throughout the
/// teacher's constraint-assembly code.
pub fn csc_from_triplets(
    triplets: &[(usize, usize, f64)],
    n_rows: usize,
    n_cols: usize,
) -> CscMatrix<f64> {
    let mut sorted = triplets.to_vec();
    sorted.sort_by_key(|&(r, c, _)| (c, r));

    let mut colptr = vec![0usize];
    let mut rowval = Vec::with_capacity(sorted.len());
    let mut nzval = Vec::with_capacity(sorted.len());
    let mut current_col = 0usize;

    for &(row, col, val) in &sorted {
        while current_col < col {
            colptr.push(rowval.len());
            current_col += 1;
        }
        rowval.push(row);
        nzval.push(val);
    }
    while current_col < n_cols {
        colptr.push(rowval.len());
        current_col += 1;
    }

    CscMatrix::new(n_rows, n_cols, colptr, rowval, nzval)
}

/// Structural deep copy of a CSC matrix.
pub fn csc_copy(m: &CscMatrix<f64>) -> CscMatrix<f64> {
    CscMatrix::new(
        m.m,
        m.n,
        m.colptr.clone(),
        m.rowval.clone(),
        m.nzval.clone(),
    )
}

/// `y = A * x` for a CSC matrix `A`.
pub fn csc_matvec(a: &CscMatrix<f64>, x: &Col<f64>) -> Col<f64> {
    debug_assert_eq!(a.n, x.nrows());
    let mut y = Col::<f64>::zeros(a.m);
    for col in 0..a.n {
        let start = a.colptr[col];
        let end = a.colptr[col + 1];
        let xc = x[col];
        for idx in start..end {
            y[a.rowval[idx]] += a.nzval[idx] * xc;
        }
    }
    y
}

/// `y = A^T * x` for a CSC matrix `A`.
pub fn csc_matvec_t(a: &CscMatrix<f64>, x: &Col<f64>) -> Col<f64> {
    debug_assert_eq!(a.m, x.nrows());
    let mut y = Col::<f64>::zeros(a.n);
    for col in 0..a.n {
        let start = a.colptr[col];
        let end = a.colptr[col + 1];
        let mut acc = 0.0;
        for idx in start..end {
            acc += a.nzval[idx] * x[a.rowval[idx]];
        }
        y[col] = acc;
    }
    y
}

/// `d = alpha * A * b + c` for a CSC matrix `A`.
pub fn csc_aff(alpha: f64, a: &CscMatrix<f64>, b: &Col<f64>, c: &Col<f64>) -> Col<f64> {
    let ab = csc_matvec(a, b);
    Col::from_fn(c.nrows(), |i| alpha * ab[i] + c[i])
}

/// Quadratic form `p^T Q p` for a CSC (symmetric, fully-stored) matrix `Q`.
pub fn csc_qform(q: &CscMatrix<f64>, p: &Col<f64>) -> f64 {
    let qp = csc_matvec(q, p);
    let mut acc = 0.0;
    for i in 0..p.nrows() {
        acc += p[i] * qp[i];
    }
    acc
}

/// Symmetrization `C = S1^T S2 + S2^T S1`. Building a parallel index table
/// into the penalty-augmented Hessian is left to `crate::problem`; this
/// produces the structurally summed matrix with duplicate `(row, col)`
/// entries merged.
pub fn csc_sym_product(s1: &CscMatrix<f64>, s2: &CscMatrix<f64>) -> Result<CscMatrix<f64>> {
    if s1.m != s2.m {
        return Err(LcqpError::SymmetrizationFailed);
    }
    let n = s1.n;
    let mut acc: std::collections::BTreeMap<(usize, usize), f64> = std::collections::BTreeMap::new();

    let accumulate = |acc: &mut std::collections::BTreeMap<(usize, usize), f64>,
                       left: &CscMatrix<f64>,
                       right: &CscMatrix<f64>| {
        // (left^T * right)[i, j] = sum_k left[k, i] * right[k, j]
        for jcol in 0..right.n {
            let jstart = right.colptr[jcol];
            let jend = right.colptr[jcol + 1];
            for jidx in jstart..jend {
                let k = right.rowval[jidx];
                let rval = right.nzval[jidx];
                for icol in 0..left.n {
                    let istart = left.colptr[icol];
                    let iend = left.colptr[icol + 1];
                    // binary-search-free linear scan is fine: these columns are short
                    for iidx in istart..iend {
                        if left.rowval[iidx] == k {
                            *acc.entry((icol, jcol)).or_insert(0.0) += left.nzval[iidx] * rval;
                        }
                    }
                }
            }
        }
    };

    accumulate(&mut acc, s1, s2);
    accumulate(&mut acc, s2, s1);

    let triplets: Vec<(usize, usize, f64)> = acc
        .into_iter()
        .filter(|&(_, v)| v != 0.0)
        .map(|((r, c), v)| (r, c, v))
        .collect();
    Ok(csc_from_triplets(&triplets, n, n))
}

/// Converts a dense matrix to CSC, dropping exact-zero values, scanned in
/// column-major order.
pub fn dns_to_csc(m: &Mat<f64>) -> CscMatrix<f64> {
    let (rows, cols) = (m.nrows(), m.ncols());
    let mut colptr = vec![0usize];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    for col in 0..cols {
        for row in 0..rows {
            let v = m[(row, col)];
            if v != 0.0 {
                rowval.push(row);
                nzval.push(v);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(rows, cols, colptr, rowval, nzval)
}

/// Converts a CSC matrix to dense, rejecting malformed index arrays.
pub fn csc_to_dns(m: &CscMatrix<f64>) -> Result<Mat<f64>> {
    if m.colptr.len() != m.n + 1 {
        return Err(LcqpError::IndexOutOfBounds(format!(
            "colptr length {} does not match n+1={}",
            m.colptr.len(),
            m.n + 1
        )));
    }
    for &row in &m.rowval {
        if row >= m.m {
            return Err(LcqpError::IndexOutOfBounds(format!(
                "row index {row} out of bounds for {} rows",
                m.m
            )));
        }
    }
    let mut dense = Mat::<f64>::zeros(m.m, m.n);
    for col in 0..m.n {
        let start = m.colptr[col];
        let end = m.colptr[col + 1];
        if start > end || end > m.rowval.len() {
            return Err(LcqpError::IndexOutOfBounds(format!(
                "colptr range [{start}, {end}) invalid for column {col}"
            )));
        }
        for idx in start..end {
            dense[(m.rowval[idx], col)] = m.nzval[idx];
        }
    }
    Ok(dense)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_csc_round_trip() {
        let m = Mat::from_fn(3, 2, |i, j| if (i + j) % 2 == 0 { (i + 2 * j) as f64 } else { 0.0 });
        let csc = dns_to_csc(&m);
        let back = csc_to_dns(&csc).unwrap();
        for i in 0..3 {
            for j in 0..2 {
                assert_eq!(m[(i, j)], back[(i, j)]);
            }
        }
    }

    #[test]
    fn csc_to_dns_rejects_bad_row_index() {
        let bad = CscMatrix::new(2, 1, vec![0, 1], vec![5], vec![1.0]);
        assert!(csc_to_dns(&bad).is_err());
    }

    #[test]
    fn csc_matvec_matches_dense() {
        let m = Mat::from_fn(2, 2, |i, j| (i + j) as f64 + 1.0);
        let csc = dns_to_csc(&m);
        let x = Col::from_fn(2, |i| (i + 1) as f64);
        let dense_y = crate::linalg::dense::matvec(&m, &x);
        let sparse_y = csc_matvec(&csc, &x);
        for i in 0..2 {
            assert_eq!(dense_y[i], sparse_y[i]);
        }
    }

    #[test]
    fn sym_product_is_symmetric() {
        let s1 = csc_from_triplets(&[(0, 0, 1.0), (1, 1, 1.0)], 2, 2);
        let s2 = csc_from_triplets(&[(0, 1, 1.0), (1, 0, 1.0)], 2, 2);
        let c = csc_sym_product(&s1, &s2).unwrap();
        let dense = csc_to_dns(&c).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(dense[(i, j)], dense[(j, i)]);
            }
        }
    }
}
