//! Reinforcement learning environments for rlkit
//!
//! This crate provides simulation environments implementing the
//! `rlkit_core::Environment` trait, starting with classic control tasks.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classic;

// Re-export environments
pub use classic::CartPoleEnv;

// Re-export core types
pub use rlkit_core::{
    Action, ActionSpace, Environment, EnvironmentConfig, Observation, ObservationSpace, Reward,
    Step,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::CartPoleEnv;
    pub use rlkit_core::prelude::*;
}
