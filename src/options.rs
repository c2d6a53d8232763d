//! Solver configuration, validated at the setter boundary rather than
//! during `solve`.

use crate::error::{LcqpError, Result};
use crate::types::{PrintLevel, QpSolverKind};

const MACHINE_EPS: f64 = f64::EPSILON;

/// Validated configuration record for [`crate::problem::LcqProblem::solve`].
#[derive(Debug, Clone)]
pub struct Options {
    stationarity_tolerance: f64,
    complementarity_tolerance: f64,
    initial_penalty_parameter: f64,
    penalty_update_factor: f64,
    max_rho: f64,
    max_iterations: usize,
    solve_zero_penalty_first: bool,
    perturb_step: bool,
    n_dynamic_penalty: usize,
    eta_dynamic_penalty: f64,
    qp_solver: QpSolverKind,
    print_level: PrintLevel,
    store_steps: bool,
    perturbation_seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            stationarity_tolerance: 1e3 * MACHINE_EPS,
            complementarity_tolerance: 1e3 * MACHINE_EPS,
            initial_penalty_parameter: 0.01,
            penalty_update_factor: 2.0,
            max_rho: 1e7,
            max_iterations: 1000,
            solve_zero_penalty_first: true,
            perturb_step: true,
            n_dynamic_penalty: 3,
            eta_dynamic_penalty: 0.9,
            qp_solver: QpSolverKind::QpoasesDense,
            print_level: PrintLevel::None,
            store_steps: false,
            perturbation_seed: 0x4c43_5150, // "LCQP" as a fixed, reproducible default
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stationarity_tolerance(&self) -> f64 {
        self.stationarity_tolerance
    }

    pub fn set_stationarity_tolerance(&mut self, value: f64) -> Result<()> {
        if value < MACHINE_EPS {
            return Err(LcqpError::InvalidOptionValue {
                field: "stationarityTolerance",
                reason: "must be >= machine epsilon".into(),
            });
        }
        self.stationarity_tolerance = value;
        Ok(())
    }

    pub fn complementarity_tolerance(&self) -> f64 {
        self.complementarity_tolerance
    }

    pub fn set_complementarity_tolerance(&mut self, value: f64) -> Result<()> {
        if value < MACHINE_EPS {
            return Err(LcqpError::InvalidOptionValue {
                field: "complementarityTolerance",
                reason: "must be >= machine epsilon".into(),
            });
        }
        self.complementarity_tolerance = value;
        Ok(())
    }

    pub fn initial_penalty_parameter(&self) -> f64 {
        self.initial_penalty_parameter
    }

    pub fn set_initial_penalty_parameter(&mut self, value: f64) -> Result<()> {
        if value <= 0.0 {
            return Err(LcqpError::InvalidOptionValue {
                field: "initialPenaltyParameter",
                reason: "must be > 0".into(),
            });
        }
        if value > self.max_rho {
            return Err(LcqpError::InvalidOptionValue {
                field: "initialPenaltyParameter",
                reason: "must not exceed maxRho".into(),
            });
        }
        self.initial_penalty_parameter = value;
        Ok(())
    }

    pub fn penalty_update_factor(&self) -> f64 {
        self.penalty_update_factor
    }

    pub fn set_penalty_update_factor(&mut self, value: f64) -> Result<()> {
        if value <= 1.0 {
            return Err(LcqpError::InvalidOptionValue {
                field: "penaltyUpdateFactor",
                reason: "must be > 1".into(),
            });
        }
        self.penalty_update_factor = value;
        Ok(())
    }

    pub fn max_rho(&self) -> f64 {
        self.max_rho
    }

    pub fn set_max_rho(&mut self, value: f64) -> Result<()> {
        if value <= self.initial_penalty_parameter {
            return Err(LcqpError::InvalidOptionValue {
                field: "maxRho",
                reason: "must be > initialPenaltyParameter".into(),
            });
        }
        self.max_rho = value;
        Ok(())
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, value: usize) -> Result<()> {
        if value == 0 {
            return Err(LcqpError::InvalidOptionValue {
                field: "maxIterations",
                reason: "must be > 0".into(),
            });
        }
        self.max_iterations = value;
        Ok(())
    }

    pub fn solve_zero_penalty_first(&self) -> bool {
        self.solve_zero_penalty_first
    }

    pub fn set_solve_zero_penalty_first(&mut self, value: bool) {
        self.solve_zero_penalty_first = value;
    }

    pub fn perturb_step(&self) -> bool {
        self.perturb_step
    }

    pub fn set_perturb_step(&mut self, value: bool) {
        self.perturb_step = value;
    }

    pub fn n_dynamic_penalty(&self) -> usize {
        self.n_dynamic_penalty
    }

    /// `0` disables the Leyffer safeguard.
    pub fn set_n_dynamic_penalty(&mut self, value: usize) {
        self.n_dynamic_penalty = value;
    }

    pub fn eta_dynamic_penalty(&self) -> f64 {
        self.eta_dynamic_penalty
    }

    pub fn set_eta_dynamic_penalty(&mut self, value: f64) -> Result<()> {
        if !(value > 0.0 && value < 1.0) {
            return Err(LcqpError::InvalidOptionValue {
                field: "etaDynamicPenalty",
                reason: "must lie in (0, 1)".into(),
            });
        }
        self.eta_dynamic_penalty = value;
        Ok(())
    }

    pub fn qp_solver(&self) -> QpSolverKind {
        self.qp_solver
    }

    pub fn set_qp_solver(&mut self, value: QpSolverKind) {
        self.qp_solver = value;
    }

    pub fn print_level(&self) -> PrintLevel {
        self.print_level
    }

    pub fn set_print_level(&mut self, value: PrintLevel) {
        self.print_level = value;
    }

    pub fn store_steps(&self) -> bool {
        self.store_steps
    }

    pub fn set_store_steps(&mut self, value: bool) {
        self.store_steps = value;
    }

    pub fn perturbation_seed(&self) -> u64 {
        self.perturbation_seed
    }

    pub fn set_perturbation_seed(&mut self, value: u64) {
        self.perturbation_seed = value;
    }
}
