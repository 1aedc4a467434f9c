//! Episode loop driving rollout collection and updates

use serde::{Deserialize, Serialize};
use tracing::info;

use rlkit_core::{
    DiscreteAction, Environment, Episode, Result, Transition, VectorObservation,
};

use crate::ppo::PpoAgent;

/// Configuration for the rollout driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Number of episodes to run
    pub episodes: usize,
    /// Log the running average score every this many episodes
    pub print_interval: usize,
    /// Scale applied to rewards before they enter the rollout buffer
    pub reward_scale: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            print_interval: 20,
            reward_scale: 1.0,
        }
    }
}

/// Summary of a completed training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverReport {
    /// Episodes completed
    pub episodes: usize,
    /// Environment steps taken across all episodes
    pub total_steps: usize,
    /// Mean unscaled episode score over the whole run
    pub mean_score: f64,
}

/// Alternates rollout collection and optimization, strictly in sequence.
///
/// Each episode is collected in segments of at most the agent's horizon; one
/// `train_step` runs after every segment, so experience collection and
/// parameter updates never overlap.
pub struct RolloutDriver<E> {
    env: E,
    agent: PpoAgent,
    config: DriverConfig,
}

impl<E> RolloutDriver<E>
where
    E: Environment<Observation = VectorObservation, Action = DiscreteAction>,
{
    /// Create a driver over an environment and agent
    pub fn new(env: E, agent: PpoAgent, config: DriverConfig) -> Self {
        Self { env, agent, config }
    }

    /// The driven agent
    #[must_use]
    pub fn agent(&self) -> &PpoAgent {
        &self.agent
    }

    /// Take the agent back out of the driver
    #[must_use]
    pub fn into_agent(self) -> PpoAgent {
        self.agent
    }

    /// Run the configured number of episodes
    pub async fn run(&mut self) -> Result<DriverReport> {
        let horizon = self.agent.horizon();
        let interval = self.config.print_interval.max(1);

        let mut window_score = 0.0;
        let mut total_score = 0.0;
        let mut total_steps = 0_usize;

        for episode_index in 0..self.config.episodes {
            let (mut observation, _info) = self.env.reset().await?;
            let mut episode = Episode::begin();
            let mut done = false;
            let mut truncated = false;

            while !done {
                for _ in 0..horizon {
                    let (action, prob) = self.agent.act_with_prob(&observation)?;
                    let step = self.env.step(action).await?;
                    let reward = step.reward;
                    let terminal = step.done || step.truncated;

                    self.agent.remember(Transition::new(
                        observation.data.clone(),
                        action.0,
                        reward.0 * self.config.reward_scale,
                        step.observation.data.clone(),
                        prob,
                        terminal,
                    ));
                    episode.record_step(reward);
                    if terminal {
                        truncated = step.truncated;
                        done = true;
                        break;
                    }
                    observation = step.observation;
                }
                self.agent.train_step()?;
            }

            episode.finish(truncated);
            window_score += episode.total_reward;
            total_score += episode.total_reward;
            total_steps += episode.steps;

            if (episode_index + 1) % interval == 0 {
                info!(
                    episode = episode_index + 1,
                    avg_score = window_score / interval as f64,
                    "training progress"
                );
                window_score = 0.0;
            }
        }

        let mean_score = if self.config.episodes > 0 {
            total_score / self.config.episodes as f64
        } else {
            0.0
        };
        Ok(DriverReport {
            episodes: self.config.episodes,
            total_steps,
            mean_score,
        })
    }
}
