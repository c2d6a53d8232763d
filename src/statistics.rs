//! Output statistics accumulated over a `solve` call.

use crate::error::{LcqpError, Result};
use crate::types::AlgorithmStatus;

/// Per-inner-iteration snapshot, recorded only when `Options::store_steps`
/// is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    pub inner_iter: usize,
    pub qp_iter: usize,
    pub alpha: f64,
    pub step_inf_norm: f64,
    pub stat_inf_norm: f64,
    pub objective: f64,
    pub phi: f64,
    pub merit: f64,
}

/// Monotonic counters and terminal state of a `solve` call.
#[derive(Debug, Clone, Default)]
pub struct OutputStatistics {
    total_iter: usize,
    outer_iter: usize,
    subproblem_iter: usize,
    terminal_rho: f64,
    status: AlgorithmStatus,
    last_subsolver_exit_flag: i32,
    steps: Vec<IterationRecord>,
}

impl OutputStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_iter(&self) -> usize {
        self.total_iter
    }

    pub fn outer_iter(&self) -> usize {
        self.outer_iter
    }

    pub fn subproblem_iter(&self) -> usize {
        self.subproblem_iter
    }

    pub fn terminal_rho(&self) -> f64 {
        self.terminal_rho
    }

    pub fn status(&self) -> AlgorithmStatus {
        self.status
    }

    pub fn last_subsolver_exit_flag(&self) -> i32 {
        self.last_subsolver_exit_flag
    }

    pub fn steps(&self) -> &[IterationRecord] {
        &self.steps
    }

    /// Advances the total-iteration counter by `delta`, rejecting any
    /// attempt to move it backwards.
    pub fn bump_total_iter(&mut self, delta: usize) -> Result<()> {
        if delta == 0 {
            return Err(LcqpError::InvalidStatisticsUpdate(
                "total_iter delta must be positive".into(),
            ));
        }
        self.total_iter += delta;
        Ok(())
    }

    pub fn bump_outer_iter(&mut self) {
        self.outer_iter += 1;
    }

    pub fn add_subproblem_iter(&mut self, count: usize) {
        self.subproblem_iter += count;
    }

    pub fn set_terminal_rho(&mut self, rho: f64) -> Result<()> {
        if rho < 0.0 {
            return Err(LcqpError::InvalidStatisticsUpdate(
                "terminal rho must be non-negative".into(),
            ));
        }
        self.terminal_rho = rho;
        Ok(())
    }

    pub fn set_status(&mut self, status: AlgorithmStatus) {
        self.status = status;
    }

    pub fn set_last_subsolver_exit_flag(&mut self, flag: i32) {
        self.last_subsolver_exit_flag = flag;
    }

    pub fn push_step(&mut self, record: IterationRecord) {
        self.steps.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let s = OutputStatistics::new();
        assert_eq!(s.total_iter(), 0);
        assert_eq!(s.outer_iter(), 0);
        assert_eq!(s.subproblem_iter(), 0);
        assert_eq!(s.status(), AlgorithmStatus::NotSolved);
        assert!(s.steps().is_empty());
    }

    #[test]
    fn rejects_zero_delta_and_negative_rho() {
        let mut s = OutputStatistics::new();
        assert!(s.bump_total_iter(0).is_err());
        assert!(s.set_terminal_rho(-1.0).is_err());
    }

    #[test]
    fn accumulates_monotonically() {
        let mut s = OutputStatistics::new();
        s.bump_total_iter(3).unwrap();
        s.bump_total_iter(2).unwrap();
        assert_eq!(s.total_iter(), 5);
        s.bump_outer_iter();
        s.bump_outer_iter();
        assert_eq!(s.outer_iter(), 2);
        s.add_subproblem_iter(4);
        s.add_subproblem_iter(6);
        assert_eq!(s.subproblem_iter(), 10);
    }

    #[test]
    fn stores_steps_when_pushed() {
        let mut s = OutputStatistics::new();
        s.push_step(IterationRecord {
            inner_iter: 0,
            qp_iter: 1,
            alpha: 1.0,
            step_inf_norm: 0.1,
            stat_inf_norm: 0.01,
            objective: -2.0,
            phi: 0.0,
            merit: -2.0,
        });
        assert_eq!(s.steps().len(), 1);
    }
}
