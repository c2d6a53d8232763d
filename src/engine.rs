//! Penalty-homotopy outer/inner loop: reduces an LCQP to a sequence of
//! convex QP subproblems with a progressively stiffened penalty on the
//! complementarity violation.

use crate::error::{LcqpError, Result};
use crate::linalg::dense;
use crate::problem::matrix_repr::{self, MatrixRepr, QkState};
use crate::problem::LcqProblem;
use crate::rng::SeededPerturbation;
use crate::statistics::IterationRecord;
use crate::stationarity::{self, DualBlocks};
use crate::subsolver::SubsolverReport;
use crate::types::AlgorithmStatus;
use faer::Col;
use std::collections::VecDeque;

/// Perturbation magnitude applied to a fresh primal iterate to break ties on
/// degenerate complementarity faces.
const PERTURB_EPS: f64 = 10.0 * f64::EPSILON;

fn g_tilde_of(g: &Col<f64>, g_phi: &Col<f64>, rho: f64) -> Col<f64> {
    Col::from_fn(g.nrows(), |i| g[i] + rho * g_phi[i])
}

fn phi_of(repr: &MatrixRepr, g_phi: &Col<f64>, phi_const: f64, x: &Col<f64>) -> f64 {
    let cx = matrix_repr::matvec_c(repr, x);
    0.5 * dense::dot(x, &cx) + dense::dot(g_phi, x) + phi_const
}

fn g_k_of(repr: &MatrixRepr, g: &Col<f64>, g_phi: &Col<f64>, rho: f64, x: &Col<f64>) -> Col<f64> {
    let gt = g_tilde_of(g, g_phi, rho);
    let cx = matrix_repr::matvec_c(repr, x);
    Col::from_fn(g.nrows(), |i| gt[i] + rho * cx[i])
}

/// `alpha_k = min(-l/q, 1)` if `q > 0` and `l < 0` (convex descent along
/// `p_k`); `alpha_k = 1` otherwise.
fn step_length(qk: &QkState, x_k: &Col<f64>, p_k: &Col<f64>, g_tilde: &Col<f64>) -> f64 {
    let qk_x = qk.matvec(x_k);
    let q = qk.qform(p_k);
    let l = dense::dot(p_k, &Col::from_fn(qk_x.nrows(), |i| qk_x[i] + g_tilde[i]));
    if q > 0.0 && l < 0.0 {
        (-l / q).min(1.0)
    } else {
        1.0
    }
}

pub(crate) fn run(problem: &mut LcqProblem) -> Result<AlgorithmStatus> {
    let dims = problem.dims;
    let has_box = problem.options.qp_solver().has_box_duals();
    let n_c = dims.n_c;
    let n_comp = dims.n_comp;

    let (repr, bounds) = problem.loaded()?;
    let repr: MatrixRepr = repr.clone();
    let lba_tilde: Col<f64> = bounds.lba_tilde.clone();
    let uba_tilde: Col<f64> = bounds.uba_tilde.clone();
    let g: Col<f64> = problem.g.clone();
    let lb: Col<f64> = problem.lb_tmp.clone();
    let ub: Col<f64> = problem.ub_tmp.clone();
    let x0: Col<f64> = problem.x0.clone();
    let y0: Col<f64> = problem.y0.clone();

    let lb_s1 = Col::from_fn(n_comp, |i| lba_tilde[n_c + i]);
    let lb_s2 = Col::from_fn(n_comp, |i| lba_tilde[n_c + n_comp + i]);
    let g_phi = {
        let t1 = matrix_repr::matvec_t_s2(&repr, &lb_s1);
        let t2 = matrix_repr::matvec_t_s1(&repr, &lb_s2);
        Col::from_fn(dims.n_v, |i| -(t1[i] + t2[i]))
    };
    let phi_const = dense::dot(&lb_s1, &lb_s2);

    let mut rho = problem.options.initial_penalty_parameter();
    let stationarity_tol = problem.options.stationarity_tolerance();
    let compl_tol = problem.options.complementarity_tolerance();
    let penalty_factor = problem.options.penalty_update_factor();
    let max_rho = problem.options.max_rho();
    let max_iterations = problem.options.max_iterations();
    let n_dynamic = problem.options.n_dynamic_penalty();
    let eta_dynamic = problem.options.eta_dynamic_penalty();
    let store_steps = problem.options.store_steps();
    let perturb_step = problem.options.perturb_step();
    let solve_zero_first = problem.options.solve_zero_penalty_first();
    let n_duals = problem.options.qp_solver().n_duals(dims);

    let mut perturbation = SeededPerturbation::new(problem.options.perturbation_seed());

    let initial_qk_rho = if solve_zero_first { 0.0 } else { rho };
    problem.rebuild_qk(initial_qk_rho)?;
    problem.rebuild_subsolver()?;

    let first_g_k = if solve_zero_first {
        g.clone()
    } else {
        g_k_of(&repr, &g, &g_phi, rho, &x0)
    };

    let (mut x_new, mut y_k, report) =
        solve_subproblem(problem, true, &first_g_k, &lba_tilde, &uba_tilde, &lb, &ub, &x0, &y0, n_duals)?;
    problem.stats.add_subproblem_iter(report.n_iter);
    problem.stats.bump_outer_iter();

    if solve_zero_first {
        problem.rebuild_qk(rho)?;
    }

    let mut x_k = x0;
    let mut p_k = Col::from_fn(dims.n_v, |i| x_new[i] - x_k[i]);
    let mut alpha_k = 1.0_f64;
    let mut leyffer_window: VecDeque<f64> = VecDeque::with_capacity(n_dynamic.max(1));
    let mut inner_iter = 0usize;
    let mut total_iter = 0usize;

    loop {
        x_k = Col::from_fn(dims.n_v, |i| x_k[i] + alpha_k * p_k[i]);
        problem.x_k = x_k.clone();
        problem.y_k = y_k.clone();

        let blocks = stationarity::split_duals(&y_k, dims, has_box);
        let y_a = stationarity::y_a_tilde(&blocks);
        let gt = g_tilde_of(&g, &g_phi, rho);
        let stat_k = {
            let qk = problem.qk.as_ref().ok_or(LcqpError::MissingComplementarityMatrix)?;
            let qkx = qk.matvec(&x_k);
            let at_ya = matrix_repr::matvec_t_a_tilde(&repr, &y_a);
            Col::from_fn(dims.n_v, |i| qkx[i] + gt[i] - at_ya[i] - blocks.y_box[i])
        };
        let stat_norm = dense::maxabs(&stat_k);

        inner_iter += 1;
        total_iter += 1;
        problem.stats.bump_total_iter(1)?;

        let phi_val = phi_of(&repr, &g_phi, phi_const, &x_k);
        let compl_satisfied = phi_val < compl_tol;

        let leyffer_triggers = n_dynamic > 0
            && !compl_satisfied
            && leyffer_window.len() == n_dynamic
            && leyffer_window.iter().any(|&h| !(phi_val < eta_dynamic * h));

        let mut escalated_this_iter = false;
        if leyffer_triggers {
            rho = escalate(problem, rho, penalty_factor)?;
            inner_iter = 0;
            leyffer_window.clear();
            escalated_this_iter = true;
        }

        if stat_norm < stationarity_tol && compl_satisfied {
            return finish(problem, &repr, x_k, y_k, rho);
        }

        if stat_norm < stationarity_tol && !compl_satisfied {
            rho = escalate(problem, rho, penalty_factor)?;
            inner_iter = 0;
            leyffer_window.clear();
            escalated_this_iter = true;
        }

        if total_iter > max_iterations {
            return Err(LcqpError::MaxIterationsReached);
        }
        if rho > max_rho {
            return Err(LcqpError::MaxPenaltyReached);
        }

        if !escalated_this_iter && n_dynamic > 0 {
            if leyffer_window.len() == n_dynamic {
                leyffer_window.pop_front();
            }
            leyffer_window.push_back(phi_val);
        }

        let gk_new = g_k_of(&repr, &g, &g_phi, rho, &x_k);
        let (xn, yn, rep) =
            solve_subproblem(problem, false, &gk_new, &lba_tilde, &uba_tilde, &lb, &ub, &x_k, &y_k, n_duals)?;
        problem.stats.add_subproblem_iter(rep.n_iter);

        let mut x_perturbed = xn;
        if perturb_step {
            crate::rng::perturb(&mut x_perturbed, PERTURB_EPS, &mut perturbation);
        }
        x_new = x_perturbed;
        y_k = yn;
        p_k = Col::from_fn(dims.n_v, |i| x_new[i] - x_k[i]);

        let gt_new = g_tilde_of(&g, &g_phi, rho);
        alpha_k = {
            let qk = problem.qk.as_ref().ok_or(LcqpError::MissingComplementarityMatrix)?;
            step_length(qk, &x_k, &p_k, &gt_new)
        };

        if store_steps {
            let objective = 0.5 * matrix_repr::qform_h(&repr, &x_k) + dense::dot(&g, &x_k);
            let merit = {
                let qk = problem.qk.as_ref().ok_or(LcqpError::MissingComplementarityMatrix)?;
                dense::dot(&g, &x_k) + 0.5 * qk.qform(&x_k)
            };
            problem.stats.push_step(IterationRecord {
                inner_iter,
                qp_iter: rep.n_iter,
                alpha: alpha_k,
                step_inf_norm: dense::maxabs(&p_k),
                stat_inf_norm: stat_norm,
                objective,
                phi: phi_val,
                merit,
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_subproblem(
    problem: &mut LcqProblem,
    initial: bool,
    g: &Col<f64>,
    lba: &Col<f64>,
    uba: &Col<f64>,
    lb: &Col<f64>,
    ub: &Col<f64>,
    x0: &Col<f64>,
    y0: &Col<f64>,
    n_duals: usize,
) -> Result<(Col<f64>, Col<f64>, SubsolverReport)> {
    let n_v = x0.nrows();
    let subsolver = problem
        .subsolver
        .as_mut()
        .ok_or(LcqpError::MissingComplementarityMatrix)?;
    let report = subsolver.solve(initial, g, lba, uba, lb, ub, x0, y0)?;
    let mut x_out = Col::<f64>::zeros(n_v);
    let mut y_out = Col::<f64>::zeros(n_duals);
    subsolver.get_solution(&mut x_out, &mut y_out);
    problem.stats.set_last_subsolver_exit_flag(report.exit_flag);
    if !report.is_success() {
        return Err(LcqpError::SubsolverFailed {
            exit_flag: report.exit_flag,
        });
    }
    Ok((x_out, y_out, report))
}

/// Penalty escalation: bump `rho`, incrementally update `Qk`, and rebuild
/// the bound subsolver against the new Hessian.
fn escalate(problem: &mut LcqProblem, rho: f64, penalty_factor: f64) -> Result<f64> {
    let rho_new = rho * penalty_factor;
    problem.escalate_qk(rho_new)?;
    problem.rebuild_subsolver()?;
    problem.stats.bump_outer_iter();
    problem.stats.set_terminal_rho(rho_new)?;
    Ok(rho_new)
}

fn finish(
    problem: &mut LcqProblem,
    repr: &MatrixRepr,
    x_k: Col<f64>,
    y_k: Col<f64>,
    rho: f64,
) -> Result<AlgorithmStatus> {
    let has_box = problem.options.qp_solver().has_box_duals();
    let mut blocks: DualBlocks = stationarity::split_duals(&y_k, problem.dims, has_box);
    stationarity::transform_duals(&mut blocks, repr, &x_k, rho);
    let status = stationarity::classify(&blocks, repr, &x_k, problem.options.complementarity_tolerance());
    let y_final = stationarity::join_duals(&blocks, has_box);

    problem.x_k = x_k;
    problem.y_k = y_final;
    problem.algo_stat = status;
    problem.stats.set_status(status);
    problem.stats.set_terminal_rho(rho)?;
    Ok(status)
}
