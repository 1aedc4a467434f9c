//! End-to-end training against the CartPole environment

use rlkit_agents::{DriverConfig, PpoAgent, PpoConfig, RandomAgent, RolloutDriver};
use rlkit_core::{Agent, DiscreteSpace, Environment, EnvironmentConfig, Observation};
use rlkit_envs::CartPoleEnv;

#[tokio::test]
async fn random_baseline_completes_an_episode() {
    let mut env = CartPoleEnv::new(EnvironmentConfig {
        seed: Some(1),
        ..EnvironmentConfig::default()
    })
    .unwrap();
    let agent = RandomAgent::new(DiscreteSpace::new(2));

    let (mut obs, _info) = env.reset().await.unwrap();
    assert_eq!(obs.shape(), vec![4]);

    let mut steps = 0;
    loop {
        let action = agent.act(&obs).await.unwrap();
        let step = env.step(action).await.unwrap();
        steps += 1;
        if step.done || step.truncated {
            break;
        }
        obs = step.observation;
    }
    assert!(steps > 0 && steps <= 500);
}

#[tokio::test]
async fn ppo_training_run_completes() {
    let env = CartPoleEnv::new(EnvironmentConfig {
        seed: Some(2),
        ..EnvironmentConfig::default()
    })
    .unwrap();

    let agent = PpoAgent::new(
        PpoConfig {
            learning_rate: 1e-3,
            hidden_dim: 16,
            horizon: 16,
            ..PpoConfig::default()
        },
        4,
        2,
        Some(2),
    )
    .unwrap();

    let mut driver = RolloutDriver::new(
        env,
        agent,
        DriverConfig {
            episodes: 3,
            print_interval: 1,
            reward_scale: 0.01,
        },
    );
    let report = driver.run().await.unwrap();

    assert_eq!(report.episodes, 3);
    assert!(report.total_steps > 0);
    assert!(report.mean_score > 0.0);
    // every collected segment was consumed by an update
    assert_eq!(driver.agent().buffered_steps(), 0);
}
