//! Random agent for baseline comparisons

use async_trait::async_trait;

use rlkit_core::{ActionSpace, Agent, Result, VectorObservation};

/// Agent that selects actions uniformly at random from an action space
pub struct RandomAgent<A> {
    action_space: A,
}

impl<A> RandomAgent<A> {
    /// Create a new random agent
    pub fn new(action_space: A) -> Self {
        Self { action_space }
    }
}

#[async_trait]
impl<A> Agent for RandomAgent<A>
where
    A: ActionSpace + Send + Sync,
    A::Action: Send,
{
    type Observation = VectorObservation;
    type Action = A::Action;

    async fn act(&self, _observation: &Self::Observation) -> Result<Self::Action> {
        Ok(self.action_space.sample())
    }

    async fn save(&self, _path: &std::path::Path) -> Result<()> {
        // no learned state to persist
        Ok(())
    }

    async fn load(&mut self, _path: &std::path::Path) -> Result<()> {
        Ok(())
    }
}
