//! Agent traits

use async_trait::async_trait;

use crate::{Action, Observation};

/// Core agent trait
#[async_trait]
pub trait Agent: Send + Sync {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;

    /// Select an action given an observation
    async fn act(&self, observation: &Self::Observation) -> crate::Result<Self::Action>;

    /// Save the agent
    async fn save(&self, path: &std::path::Path) -> crate::Result<()>;

    /// Load the agent
    async fn load(&mut self, path: &std::path::Path) -> crate::Result<()>;
}
