//! Reinforcement learning agents for rlkit
//!
//! This crate provides the on-policy training machinery built around
//! Proximal Policy Optimization: rollout buffering, generalized advantage
//! estimation, an actor-critic network, and the clipped-surrogate update
//! engine, together with the episode loop that drives them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod driver;
pub mod gae;
pub mod model;
pub mod optim;
pub mod ppo;
pub mod random;

// Re-export agents and training machinery
pub use buffer::{Batch, RolloutBuffer};
pub use driver::{DriverConfig, DriverReport, RolloutDriver};
pub use gae::AdvantageEstimator;
pub use model::ActorCritic;
pub use optim::Adam;
pub use ppo::{PpoAgent, PpoConfig, PpoUpdateEngine, TrainStats};
pub use random::RandomAgent;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AdvantageEstimator, DriverConfig, PpoAgent, PpoConfig, PpoUpdateEngine, RandomAgent,
        RolloutBuffer, RolloutDriver, TrainStats,
    };
    pub use rlkit_core::prelude::*;
}
