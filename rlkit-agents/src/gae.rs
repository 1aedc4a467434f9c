//! Generalized Advantage Estimation

use ndarray::Array1;

/// λ-weighted advantage estimator over one-step TD errors.
///
/// Implements the GAE-λ recurrence: traversing the batch in reverse temporal
/// order with an accumulator `A`, each step computes `A ← δ_t + γλ·g_t·A`
/// where `g_t` is the step's non-terminal gate. The gate keeps an episode's
/// accumulator from leaking into the episode that precedes it inside the same
/// horizon batch.
#[derive(Debug, Clone, Copy)]
pub struct AdvantageEstimator {
    gamma: f32,
    lambda: f32,
}

impl AdvantageEstimator {
    /// Create an estimator with discount `gamma` and trace decay `lambda`
    #[must_use]
    pub fn new(gamma: f32, lambda: f32) -> Self {
        Self { gamma, lambda }
    }

    /// Compute per-step advantages from TD errors.
    ///
    /// `td_errors` must be in forward temporal order; `non_terminal` carries
    /// 0.0 where the step ended its episode and 1.0 otherwise. The output is
    /// in forward temporal order and always has the input's length; the last
    /// step's advantage equals its own TD error.
    #[must_use]
    pub fn advantages(&self, td_errors: &Array1<f32>, non_terminal: &Array1<f32>) -> Array1<f32> {
        debug_assert_eq!(td_errors.len(), non_terminal.len());

        let n = td_errors.len();
        let mut advantages = Array1::zeros(n);
        let mut acc = 0.0_f32;

        for t in (0..n).rev() {
            acc = td_errors[t] + self.gamma * self.lambda * non_terminal[t] * acc;
            advantages[t] = acc;
        }

        advantages
    }
}
