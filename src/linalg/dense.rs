//! Dense linear algebra primitives, operating on `faer::Mat<f64>`
//! / `faer::Col<f64>`.

use faer::{Col, Mat};

/// `C = A * B`, with `A` of shape `(m, n)` and `B` of shape `(n, p)`.
pub fn matmul(a: &Mat<f64>, b: &Mat<f64>) -> Mat<f64> {
    let (m, n) = (a.nrows(), a.ncols());
    let p = b.ncols();
    debug_assert_eq!(n, b.nrows());
    Mat::from_fn(m, p, |i, j| {
        let mut acc = 0.0;
        for k in 0..n {
            acc += a[(i, k)] * b[(k, j)];
        }
        acc
    })
}

/// `C = A^T * B`, with `A` of shape `(m, n)` and `B` of shape `(m, p)`.
pub fn matmul_t(a: &Mat<f64>, b: &Mat<f64>) -> Mat<f64> {
    let (m, n) = (a.nrows(), a.ncols());
    let p = b.ncols();
    debug_assert_eq!(m, b.nrows());
    Mat::from_fn(n, p, |i, j| {
        let mut acc = 0.0;
        for k in 0..m {
            acc += a[(k, i)] * b[(k, j)];
        }
        acc
    })
}

/// Symmetric product `C = A^T B + B^T A`, for `A`, `B` of shape `(m, n)`.
pub fn sym_product(a: &Mat<f64>, b: &Mat<f64>) -> Mat<f64> {
    let at_b = matmul_t(a, b);
    let bt_a = matmul_t(b, a);
    wadd(1.0, &at_b, 1.0, &bt_a)
}

/// Affine transform `d = alpha * A * b + c`.
pub fn aff(alpha: f64, a: &Mat<f64>, b: &Col<f64>, c: &Col<f64>) -> Col<f64> {
    let m = a.nrows();
    let n = a.ncols();
    debug_assert_eq!(n, b.nrows());
    debug_assert_eq!(m, c.nrows());
    Col::from_fn(m, |i| {
        let mut acc = 0.0;
        for k in 0..n {
            acc += a[(i, k)] * b[k];
        }
        alpha * acc + c[i]
    })
}

/// Weighted matrix sum `C = alpha*A + beta*B`. `A` and `B` must share shape.
pub fn wadd(alpha: f64, a: &Mat<f64>, beta: f64, b: &Mat<f64>) -> Mat<f64> {
    debug_assert_eq!(a.nrows(), b.nrows());
    debug_assert_eq!(a.ncols(), b.ncols());
    Mat::from_fn(a.nrows(), a.ncols(), |i, j| alpha * a[(i, j)] + beta * b[(i, j)])
}

/// Weighted vector sum `c = alpha*a + beta*b`.
pub fn wadd_vec(alpha: f64, a: &Col<f64>, beta: f64, b: &Col<f64>) -> Col<f64> {
    debug_assert_eq!(a.nrows(), b.nrows());
    Col::from_fn(a.nrows(), |i| alpha * a[i] + beta * b[i])
}

/// Quadratic form `p^T Q p`.
pub fn qform(q: &Mat<f64>, p: &Col<f64>) -> f64 {
    let m = q.nrows();
    debug_assert_eq!(m, q.ncols());
    debug_assert_eq!(m, p.nrows());
    let mut acc = 0.0;
    for i in 0..m {
        let mut row_sum = 0.0;
        for j in 0..m {
            row_sum += q[(i, j)] * p[j];
        }
        acc += p[i] * row_sum;
    }
    acc
}

/// Dot product of two column vectors of equal length.
pub fn dot(a: &Col<f64>, b: &Col<f64>) -> f64 {
    debug_assert_eq!(a.nrows(), b.nrows());
    let mut acc = 0.0;
    for i in 0..a.nrows() {
        acc += a[i] * b[i];
    }
    acc
}

/// Infinity norm (largest absolute entry).
pub fn maxabs(a: &Col<f64>) -> f64 {
    let mut m = 0.0_f64;
    for i in 0..a.nrows() {
        m = m.max(a[i].abs());
    }
    m
}

/// `y = A * x`, for `A` of shape `(m, n)`.
pub fn matvec(a: &Mat<f64>, x: &Col<f64>) -> Col<f64> {
    let (m, n) = (a.nrows(), a.ncols());
    debug_assert_eq!(n, x.nrows());
    Col::from_fn(m, |i| {
        let mut acc = 0.0;
        for j in 0..n {
            acc += a[(i, j)] * x[j];
        }
        acc
    })
}

/// `y = A^T * x`, for `A` of shape `(m, n)`.
pub fn matvec_t(a: &Mat<f64>, x: &Col<f64>) -> Col<f64> {
    let (m, n) = (a.nrows(), a.ncols());
    debug_assert_eq!(m, x.nrows());
    Col::from_fn(n, |j| {
        let mut acc = 0.0;
        for i in 0..m {
            acc += a[(i, j)] * x[i];
        }
        acc
    })
}
