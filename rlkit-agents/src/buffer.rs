//! Rollout storage for on-policy training

use ndarray::{Array1, Array2};

use rlkit_core::{RLError, Result, Transition};

/// One horizon's worth of transitions, materialized as parallel sequences.
///
/// Row `i` of every field refers to the same time step; all fields share the
/// same length. A batch is produced once per horizon by
/// [`RolloutBuffer::make_batch`], consumed by every optimization epoch over
/// that horizon, then dropped.
#[derive(Debug, Clone)]
pub struct Batch {
    /// States, one row per step
    pub states: Array2<f32>,
    /// Indices of the actions taken
    pub actions: Array1<usize>,
    /// Per-step rewards
    pub rewards: Array1<f32>,
    /// Successor states, one row per step
    pub next_states: Array2<f32>,
    /// Bootstrap gate: 0.0 where the step ended the episode, 1.0 otherwise
    pub done_mask: Array1<f32>,
    /// Probability the sampling policy assigned to each taken action
    pub old_probs: Array1<f32>,
}

impl Batch {
    fn empty() -> Self {
        Self {
            states: Array2::zeros((0, 0)),
            actions: Array1::from_vec(Vec::new()),
            rewards: Array1::zeros(0),
            next_states: Array2::zeros((0, 0)),
            done_mask: Array1::zeros(0),
            old_probs: Array1::zeros(0),
        }
    }

    /// Number of steps in the batch
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the batch holds no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Check the batch against the model's input contract.
    ///
    /// Rejects state rows of the wrong width and out-of-range action indices
    /// before any optimization pass runs over the data.
    pub fn validate(&self, obs_dim: usize, num_actions: usize) -> Result<()> {
        let n = self.len();
        if self.states.nrows() != n
            || self.next_states.nrows() != n
            || self.rewards.len() != n
            || self.done_mask.len() != n
            || self.old_probs.len() != n
        {
            return Err(RLError::DimensionMismatch {
                expected: n,
                actual: self.states.nrows(),
            });
        }
        if self.states.ncols() != obs_dim {
            return Err(RLError::DimensionMismatch {
                expected: obs_dim,
                actual: self.states.ncols(),
            });
        }
        if self.next_states.ncols() != obs_dim {
            return Err(RLError::DimensionMismatch {
                expected: obs_dim,
                actual: self.next_states.ncols(),
            });
        }
        if let Some(&bad) = self.actions.iter().find(|&&a| a >= num_actions) {
            return Err(RLError::InvalidAction(format!(
                "action index {bad} outside 0..{num_actions}"
            )));
        }
        Ok(())
    }
}

/// Ordered transition storage that is drained on materialization.
///
/// The buffer alternates between two phases: it accumulates transitions in
/// temporal order during rollout, and it is emptied in a single
/// [`make_batch`](Self::make_batch) call when a training update begins. The
/// drain guarantees at most one live batch at a time: no transition is ever
/// read into two batches, and no batch is ever rebuilt from stale data.
#[derive(Debug, Default)]
pub struct RolloutBuffer {
    transitions: Vec<Transition>,
}

impl RolloutBuffer {
    /// Create a new empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Append a transition in temporal order
    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Number of buffered transitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Materialize the accumulated transitions into a [`Batch`].
    ///
    /// This is a consuming read: the buffer is reset to empty whether or not
    /// materialization succeeds, so a malformed horizon is discarded rather
    /// than re-read. An empty buffer yields an empty batch.
    pub fn make_batch(&mut self) -> Result<Batch> {
        let transitions = std::mem::take(&mut self.transitions);
        let n = transitions.len();
        if n == 0 {
            return Ok(Batch::empty());
        }

        let obs_dim = transitions[0].state.len();
        let mut states = Array2::zeros((n, obs_dim));
        let mut next_states = Array2::zeros((n, obs_dim));
        let mut actions = Vec::with_capacity(n);
        let mut rewards = Array1::zeros(n);
        let mut done_mask = Array1::zeros(n);
        let mut old_probs = Array1::zeros(n);

        for (i, t) in transitions.iter().enumerate() {
            if t.state.len() != obs_dim {
                return Err(RLError::DimensionMismatch {
                    expected: obs_dim,
                    actual: t.state.len(),
                });
            }
            if t.next_state.len() != obs_dim {
                return Err(RLError::DimensionMismatch {
                    expected: obs_dim,
                    actual: t.next_state.len(),
                });
            }
            for (j, &x) in t.state.iter().enumerate() {
                states[[i, j]] = x as f32;
            }
            for (j, &x) in t.next_state.iter().enumerate() {
                next_states[[i, j]] = x as f32;
            }
            actions.push(t.action);
            rewards[i] = t.reward as f32;
            done_mask[i] = if t.done { 0.0 } else { 1.0 };
            old_probs[i] = t.prob as f32;
        }

        Ok(Batch {
            states,
            actions: Array1::from_vec(actions),
            rewards,
            next_states,
            done_mask,
            old_probs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(state: Vec<f64>, action: usize, reward: f64, done: bool) -> Transition {
        let next_state = state.iter().map(|x| x + 0.1).collect();
        Transition::new(state, action, reward, next_state, 0.25, done)
    }

    #[test]
    fn batch_preserves_temporal_order() {
        let mut buffer = RolloutBuffer::new();
        buffer.push(transition(vec![0.0, 1.0], 0, 1.0, false));
        buffer.push(transition(vec![2.0, 3.0], 1, 0.0, false));
        buffer.push(transition(vec![4.0, 5.0], 0, -1.0, true));

        let batch = buffer.make_batch().unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.states[[0, 0]], 0.0);
        assert_eq!(batch.states[[2, 1]], 5.0);
        assert_eq!(batch.actions.to_vec(), vec![0, 1, 0]);
        assert_eq!(batch.rewards.to_vec(), vec![1.0, 0.0, -1.0]);
        assert_eq!(batch.done_mask.to_vec(), vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn make_batch_is_a_consuming_read() {
        let mut buffer = RolloutBuffer::new();
        buffer.push(transition(vec![0.5], 0, 1.0, false));

        let first = buffer.make_batch().unwrap();
        assert_eq!(first.len(), 1);
        assert!(buffer.is_empty());

        let second = buffer.make_batch().unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn mismatched_state_widths_are_rejected() {
        let mut buffer = RolloutBuffer::new();
        buffer.push(transition(vec![0.0, 1.0], 0, 1.0, false));
        buffer.push(transition(vec![2.0], 1, 0.0, false));

        let err = buffer.make_batch().unwrap_err();
        assert!(matches!(err, RLError::DimensionMismatch { expected: 2, actual: 1 }));
        // the malformed horizon is discarded, not kept for a retry
        assert!(buffer.is_empty());
    }

    #[test]
    fn validate_flags_out_of_range_actions() {
        let mut buffer = RolloutBuffer::new();
        buffer.push(transition(vec![0.0], 3, 1.0, false));

        let batch = buffer.make_batch().unwrap();
        assert!(batch.validate(1, 2).is_err());
        assert!(batch.validate(1, 4).is_ok());
    }
}
