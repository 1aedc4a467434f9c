//! Transition records collected during rollout

use serde::{Deserialize, Serialize};

/// A single environment step as recorded by the rollout loop.
///
/// Transitions are immutable once recorded. `prob` is the probability mass
/// the sampling policy assigned to `action` at collection time, kept so the
/// optimizer can later measure how far the policy has drifted from the one
/// that generated the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    /// State feature vector at the start of the step
    pub state: Vec<f64>,
    /// Index of the action taken
    pub action: usize,
    /// Reward received for the step
    pub reward: f64,
    /// State feature vector after the step
    pub next_state: Vec<f64>,
    /// Probability the sampling policy assigned to `action`, in (0, 1]
    pub prob: f64,
    /// Whether this step ended the episode
    pub done: bool,
}

impl Transition {
    /// Create a new transition record
    #[must_use]
    pub fn new(
        state: Vec<f64>,
        action: usize,
        reward: f64,
        next_state: Vec<f64>,
        prob: f64,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            prob,
            done,
        }
    }
}
