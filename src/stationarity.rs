//! Dual transform and W/C/M/S stationarity classification.

use crate::problem::matrix_repr::{self, MatrixRepr};
use crate::types::{AlgorithmStatus, ProblemDims};
use faer::Col;

/// The current dual iterate split into its four semantic blocks. Built from
/// whichever layout the active subsolver produces (`[box | linear | S1 |
/// S2]`, with the leading `box` block absent for the operator-splitting
/// backend).
pub struct DualBlocks {
    pub y_box: Col<f64>,
    pub y_linear: Col<f64>,
    pub y_s1: Col<f64>,
    pub y_s2: Col<f64>,
}

pub fn split_duals(y: &Col<f64>, dims: ProblemDims, has_box: bool) -> DualBlocks {
    let base = if has_box { dims.n_v } else { 0 };
    let y_box = if has_box {
        Col::from_fn(dims.n_v, |i| y[i])
    } else {
        Col::zeros(dims.n_v)
    };
    let y_linear = Col::from_fn(dims.n_c, |i| y[base + i]);
    let y_s1 = Col::from_fn(dims.n_comp, |i| y[base + dims.n_c + i]);
    let y_s2 = Col::from_fn(dims.n_comp, |i| y[base + dims.n_c + dims.n_comp + i]);
    DualBlocks {
        y_box,
        y_linear,
        y_s1,
        y_s2,
    }
}

/// Reassembles `[box | linear | S1 | S2]` (or, without box duals,
/// `[linear | S1 | S2]`) back into a single composite dual vector matching
/// the subsolver's native layout.
pub fn join_duals(blocks: &DualBlocks, has_box: bool) -> Col<f64> {
    let n_v = blocks.y_box.nrows();
    let n_c = blocks.y_linear.nrows();
    let n_comp = blocks.y_s1.nrows();
    let base = if has_box { n_v } else { 0 };
    Col::from_fn(base + n_c + 2 * n_comp, |i| {
        if has_box && i < n_v {
            blocks.y_box[i]
        } else {
            let j = i - base;
            if j < n_c {
                blocks.y_linear[j]
            } else if j < n_c + n_comp {
                blocks.y_s1[j - n_c]
            } else {
                blocks.y_s2[j - n_c - n_comp]
            }
        }
    })
}

/// `Ã^T y_Ã`, the trailing `nC + 2*nComp` block of `y` stacked back into the
/// composite layout `matrix_repr::matvec_t_a_tilde` expects.
pub fn y_a_tilde(blocks: &DualBlocks) -> Col<f64> {
    let n_c = blocks.y_linear.nrows();
    let n_comp = blocks.y_s1.nrows();
    Col::from_fn(n_c + 2 * n_comp, |i| {
        if i < n_c {
            blocks.y_linear[i]
        } else if i < n_c + n_comp {
            blocks.y_s1[i - n_c]
        } else {
            blocks.y_s2[i - n_c - n_comp]
        }
    })
}

/// Converts penalty-form duals to LCQP duals: `y_S1 -= rho*S2*x_k`,
/// `y_S2 -= rho*S1*x_k`. Box and linear-constraint duals are unchanged.
pub fn transform_duals(blocks: &mut DualBlocks, repr: &MatrixRepr, x_k: &Col<f64>, rho: f64) {
    let s2x = matrix_repr::matvec_s2(repr, x_k);
    let s1x = matrix_repr::matvec_s1(repr, x_k);
    for i in 0..blocks.y_s1.nrows() {
        blocks.y_s1[i] -= rho * s2x[i];
    }
    for i in 0..blocks.y_s2.nrows() {
        blocks.y_s2[i] -= rho * s1x[i];
    }
}

/// Classifies a converged iterate as W/C/M/S-stationary, given
/// *already-transformed* duals. Evaluates the strongest condition (S) first
/// and falls through to weaker ones, returning the strongest that holds.
pub fn classify(blocks: &DualBlocks, repr: &MatrixRepr, x_k: &Col<f64>, compl_tol: f64) -> AlgorithmStatus {
    let s1x = matrix_repr::matvec_s1(repr, x_k);
    let s2x = matrix_repr::matvec_s2(repr, x_k);
    let n_comp = blocks.y_s1.nrows();
    let weakly_active: Vec<usize> = (0..n_comp)
        .filter(|&i| s1x[i] <= compl_tol && s2x[i] <= compl_tol)
        .collect();

    let is_s = weakly_active
        .iter()
        .all(|&i| blocks.y_s1[i].min(blocks.y_s2[i]) >= 0.0);
    if is_s {
        return AlgorithmStatus::StrongStationary;
    }

    let is_m = weakly_active.iter().all(|&i| {
        let min_i = blocks.y_s1[i].min(blocks.y_s2[i]);
        min_i > 0.0 || blocks.y_s1[i] * blocks.y_s2[i] <= compl_tol
    });
    if is_m {
        return AlgorithmStatus::MordukhovichStationary;
    }

    let is_c = weakly_active.iter().all(|&i| {
        let min_i = blocks.y_s1[i].min(blocks.y_s2[i]);
        min_i >= 0.0 || blocks.y_s1[i] * blocks.y_s2[i] >= -compl_tol
    });
    if is_c {
        return AlgorithmStatus::ClarkeStationary;
    }

    AlgorithmStatus::WeakStationary
}
