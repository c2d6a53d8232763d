//! Deterministic perturbation source used to nudge primal iterates off
//! degenerate complementarity faces.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A pluggable source of per-coordinate perturbations in `{-1, 0, +1}`.
pub trait PerturbationSource {
    /// Returns the next perturbation sign.
    fn next_sign(&mut self) -> i8;
}

/// Seedable perturbation source backed by [`rand::rngs::StdRng`], matching
/// the `StdRng`/`SeedableRng` pairing already used elsewhere in this crate's
/// ancestry for reproducible randomized computation.
pub struct SeededPerturbation {
    rng: StdRng,
}

impl SeededPerturbation {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PerturbationSource for SeededPerturbation {
    fn next_sign(&mut self) -> i8 {
        match self.rng.gen_range(0..3) {
            0 => -1,
            1 => 0,
            _ => 1,
        }
    }
}

/// Applies `eps * sign` to every coordinate of `x` using `source`.
pub fn perturb(x: &mut faer::Col<f64>, eps: f64, source: &mut dyn PerturbationSource) {
    for i in 0..x.nrows() {
        let sign = source.next_sign() as f64;
        x[i] += eps * sign;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_given_same_seed() {
        let mut a = SeededPerturbation::new(42);
        let mut b = SeededPerturbation::new(42);
        let seq_a: Vec<i8> = (0..50).map(|_| a.next_sign()).collect();
        let seq_b: Vec<i8> = (0..50).map(|_| b.next_sign()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn signs_are_in_range() {
        let mut src = SeededPerturbation::new(7);
        for _ in 0..200 {
            let s = src.next_sign();
            assert!(s == -1 || s == 0 || s == 1);
        }
    }

    #[test]
    fn perturb_applies_eps_scaled_sign() {
        let mut x = faer::Col::<f64>::zeros(5);
        let mut src = SeededPerturbation::new(1);
        perturb(&mut x, 1e-10, &mut src);
        for i in 0..5 {
            assert!(x[i].abs() <= 1e-10 + f64::EPSILON);
        }
    }
}
