//! Example: train a PPO agent on CartPole

use rlkit_agents::{DriverConfig, PpoAgent, PpoConfig, RolloutDriver};
use rlkit_core::{Environment, EnvironmentConfig};
use rlkit_envs::CartPoleEnv;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create the environment
    let env = CartPoleEnv::new(EnvironmentConfig {
        seed: Some(0),
        ..EnvironmentConfig::default()
    })?;
    let obs_dim = env.observation_space().shape()[0];
    let num_actions = 2;

    // Create the PPO agent
    let agent = PpoAgent::new(
        PpoConfig {
            hidden_dim: 64,
            ..PpoConfig::default()
        },
        obs_dim,
        num_actions,
        Some(0),
    )?;

    // Run the training loop
    let mut driver = RolloutDriver::new(
        env,
        agent,
        DriverConfig {
            episodes: 500,
            print_interval: 20,
            reward_scale: 0.01,
        },
    );
    let report = driver.run().await?;

    println!(
        "Trained {} episodes over {} steps, mean score {:.2}",
        report.episodes, report.total_steps, report.mean_score
    );

    Ok(())
}
