//! First-order optimizer for flattened parameter vectors

use rlkit_core::{RLError, Result};

/// Adam optimizer state over a flat parameter vector.
///
/// Moment buffers are allocated lazily on the first step and must keep the
/// same length for the optimizer's lifetime.
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    momentum: Vec<f32>,
    velocity: Vec<f32>,
    t: i32,
}

impl Adam {
    /// Create an optimizer with the given learning rate and default betas
    #[must_use]
    pub fn new(lr: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            momentum: Vec::new(),
            velocity: Vec::new(),
            t: 0,
        }
    }

    /// Apply one bias-corrected update to `params` in place
    pub fn step(&mut self, params: &mut [f32], grads: &[f32]) -> Result<()> {
        if grads.len() != params.len() {
            return Err(RLError::DimensionMismatch {
                expected: params.len(),
                actual: grads.len(),
            });
        }
        if self.momentum.is_empty() {
            self.momentum = vec![0.0; params.len()];
            self.velocity = vec![0.0; params.len()];
        }
        if self.momentum.len() != params.len() {
            return Err(RLError::DimensionMismatch {
                expected: self.momentum.len(),
                actual: params.len(),
            });
        }

        self.t += 1;
        let bias1 = 1.0 - self.beta1.powi(self.t);
        let bias2 = 1.0 - self.beta2.powi(self.t);

        for i in 0..params.len() {
            self.momentum[i] = self.beta1 * self.momentum[i] + (1.0 - self.beta1) * grads[i];
            self.velocity[i] = self.beta2 * self.velocity[i] + (1.0 - self.beta2) * grads[i] * grads[i];

            let m_hat = self.momentum[i] / bias1;
            let v_hat = self.velocity[i] / bias2;

            params[i] -= self.lr * m_hat / (v_hat.sqrt() + self.epsilon);
        }

        Ok(())
    }
}
