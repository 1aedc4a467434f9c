//! Actor-critic network with a shared trunk and two heads

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;

use rlkit_core::{RLError, Result};

/// Two-headed policy/value network.
///
/// A single ReLU trunk feeds an action-logit head and a scalar value head.
/// The policy queries return categorical distributions (non-negative, summing
/// to one per distribution); the value query returns the value head's
/// projected scalar, one per input row. Parameters are only ever rewritten
/// through [`set_parameters`](Self::set_parameters).
#[derive(Debug, Clone)]
pub struct ActorCritic {
    w1: Array2<f32>,
    b1: Array1<f32>,
    w_pi: Array2<f32>,
    b_pi: Array1<f32>,
    w_v: Array1<f32>,
    b_v: f32,
    obs_dim: usize,
    num_actions: usize,
}

/// Intermediate activations kept for the backward pass
#[derive(Debug)]
pub(crate) struct ForwardCache {
    /// Trunk pre-activations, N×H
    pub(crate) pre: Array2<f32>,
    /// Trunk activations, N×H
    pub(crate) hidden: Array2<f32>,
    /// Row-wise action distributions, N×A
    pub(crate) probs: Array2<f32>,
    /// Value estimates, N
    pub(crate) values: Array1<f32>,
}

/// Per-parameter gradients, laid out like the network's parameters
#[derive(Debug)]
pub(crate) struct Gradients {
    pub(crate) w1: Array2<f32>,
    pub(crate) b1: Array1<f32>,
    pub(crate) w_pi: Array2<f32>,
    pub(crate) b_pi: Array1<f32>,
    pub(crate) w_v: Array1<f32>,
    pub(crate) b_v: f32,
}

impl Gradients {
    /// Flatten in the same order as [`ActorCritic::parameters`]
    pub(crate) fn into_flat(self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(
            self.w1.len() + self.b1.len() + self.w_pi.len() + self.b_pi.len() + self.w_v.len() + 1,
        );
        flat.extend(self.w1.iter().copied());
        flat.extend(self.b1.iter().copied());
        flat.extend(self.w_pi.iter().copied());
        flat.extend(self.b_pi.iter().copied());
        flat.extend(self.w_v.iter().copied());
        flat.push(self.b_v);
        flat
    }
}

impl ActorCritic {
    /// Create a network with Xavier-initialized weights and zero biases
    pub fn new(obs_dim: usize, hidden_dim: usize, num_actions: usize, rng: &mut impl Rng) -> Self {
        Self {
            w1: xavier_init(obs_dim, hidden_dim, rng),
            b1: Array1::zeros(hidden_dim),
            w_pi: xavier_init(hidden_dim, num_actions, rng),
            b_pi: Array1::zeros(num_actions),
            w_v: xavier_init(hidden_dim, 1, rng).index_axis(Axis(1), 0).to_owned(),
            b_v: 0.0,
            obs_dim,
            num_actions,
        }
    }

    /// Input dimension of the network
    #[must_use]
    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    /// Size of the action distribution
    #[must_use]
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Action distribution for a single state, normalized over its only axis
    #[must_use]
    pub fn policy_step(&self, state: &ArrayView1<f32>) -> Array1<f32> {
        let hidden = (state.dot(&self.w1) + &self.b1).mapv(relu);
        let logits = hidden.dot(&self.w_pi) + &self.b_pi;
        softmax_1d(&logits)
    }

    /// Action distributions for a batch of states, normalized per row
    #[must_use]
    pub fn policy_batch(&self, states: &ArrayView2<f32>) -> Array2<f32> {
        let (_, hidden) = self.trunk(states);
        let logits = hidden.dot(&self.w_pi) + &self.b_pi;
        softmax_rows(logits)
    }

    /// Value estimate per input row, from the value head's projection
    #[must_use]
    pub fn value_batch(&self, states: &ArrayView2<f32>) -> Array1<f32> {
        let (_, hidden) = self.trunk(states);
        hidden.dot(&self.w_v) + self.b_v
    }

    /// Forward pass that keeps the activations needed to backpropagate
    pub(crate) fn forward_train(&self, states: &ArrayView2<f32>) -> ForwardCache {
        let (pre, hidden) = self.trunk(states);
        let logits = hidden.dot(&self.w_pi) + &self.b_pi;
        let probs = softmax_rows(logits);
        let values = hidden.dot(&self.w_v) + self.b_v;
        ForwardCache {
            pre,
            hidden,
            probs,
            values,
        }
    }

    /// Backpropagate loss gradients through both heads and the shared trunk.
    ///
    /// `grad_logits` is ∂loss/∂logits (N×A) and `grad_values` is
    /// ∂loss/∂value (N), both already reduced by the batch mean.
    pub(crate) fn backward(
        &self,
        states: &ArrayView2<f32>,
        cache: &ForwardCache,
        grad_logits: &Array2<f32>,
        grad_values: &Array1<f32>,
    ) -> Gradients {
        let d_w_pi = cache.hidden.t().dot(grad_logits);
        let d_b_pi = grad_logits.sum_axis(Axis(0));
        let d_w_v = cache.hidden.t().dot(grad_values);
        let d_b_v = grad_values.sum();

        // gradient flowing back into the shared trunk from both heads
        let gv = grad_values.view().insert_axis(Axis(1));
        let wv = self.w_v.view().insert_axis(Axis(0));
        let d_hidden = grad_logits.dot(&self.w_pi.t()) + gv.dot(&wv);
        let d_pre = d_hidden * cache.pre.mapv(|x| if x > 0.0 { 1.0 } else { 0.0 });

        let d_w1 = states.t().dot(&d_pre);
        let d_b1 = d_pre.sum_axis(Axis(0));

        Gradients {
            w1: d_w1,
            b1: d_b1,
            w_pi: d_w_pi,
            b_pi: d_b_pi,
            w_v: d_w_v,
            b_v: d_b_v,
        }
    }

    /// Total number of scalar parameters
    #[must_use]
    pub fn num_parameters(&self) -> usize {
        self.w1.len() + self.b1.len() + self.w_pi.len() + self.b_pi.len() + self.w_v.len() + 1
    }

    /// Flatten all parameters into a single vector
    #[must_use]
    pub fn parameters(&self) -> Vec<f32> {
        let mut params = Vec::with_capacity(self.num_parameters());
        params.extend(self.w1.iter().copied());
        params.extend(self.b1.iter().copied());
        params.extend(self.w_pi.iter().copied());
        params.extend(self.b_pi.iter().copied());
        params.extend(self.w_v.iter().copied());
        params.push(self.b_v);
        params
    }

    /// Restore all parameters from a flattened vector
    pub fn set_parameters(&mut self, params: &[f32]) -> Result<()> {
        if params.len() != self.num_parameters() {
            return Err(RLError::DimensionMismatch {
                expected: self.num_parameters(),
                actual: params.len(),
            });
        }

        let (chunk, params) = params.split_at(self.w1.len());
        for (dst, src) in self.w1.iter_mut().zip(chunk) {
            *dst = *src;
        }
        let (chunk, params) = params.split_at(self.b1.len());
        for (dst, src) in self.b1.iter_mut().zip(chunk) {
            *dst = *src;
        }
        let (chunk, params) = params.split_at(self.w_pi.len());
        for (dst, src) in self.w_pi.iter_mut().zip(chunk) {
            *dst = *src;
        }
        let (chunk, params) = params.split_at(self.b_pi.len());
        for (dst, src) in self.b_pi.iter_mut().zip(chunk) {
            *dst = *src;
        }
        let (chunk, params) = params.split_at(self.w_v.len());
        for (dst, src) in self.w_v.iter_mut().zip(chunk) {
            *dst = *src;
        }
        self.b_v = params[0];
        Ok(())
    }

    fn trunk(&self, states: &ArrayView2<f32>) -> (Array2<f32>, Array2<f32>) {
        let pre = states.dot(&self.w1) + &self.b1;
        let hidden = pre.mapv(relu);
        (pre, hidden)
    }
}

fn relu(x: f32) -> f32 {
    x.max(0.0)
}

fn xavier_init(in_dim: usize, out_dim: usize, rng: &mut impl Rng) -> Array2<f32> {
    let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
    Array2::from_shape_fn((in_dim, out_dim), |_| rng.gen_range(-limit..limit))
}

fn softmax_1d(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp = logits.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

fn softmax_rows(logits: Array2<f32>) -> Array2<f32> {
    let mut probs = logits;
    for mut row in probs.rows_mut() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|x| (x - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|x| x / sum);
    }
    probs
}
