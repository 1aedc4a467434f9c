//! Classic control environments

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rlkit_core::{
    ActionSpace, BoxObservationSpace, DiscreteAction, DiscreteSpace, Environment,
    EnvironmentConfig, ObservationSpace, Result, Reward, Step, StepInfo, VectorObservation,
};

/// Cart-pole balancing environment.
///
/// A pole is hinged to a cart moving along a frictionless track; each action
/// pushes the cart left or right. The episode ends when the pole tips past
/// the angle threshold or the cart leaves the track, and is truncated at the
/// step limit. Every surviving step is worth a reward of 1.
pub struct CartPoleEnv {
    state: CartPoleState,
    config: CartPoleConfig,
    steps: usize,
    rng: StdRng,
}

#[derive(Debug, Clone)]
struct CartPoleState {
    x: f64,         // cart position
    x_dot: f64,     // cart velocity
    theta: f64,     // pole angle
    theta_dot: f64, // pole angular velocity
}

#[derive(Debug, Clone)]
struct CartPoleConfig {
    gravity: f64,
    mass_cart: f64,
    mass_pole: f64,
    length: f64,
    force_mag: f64,
    max_steps: usize,
    x_threshold: f64,
    theta_threshold: f64,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length: 0.5,
            force_mag: 10.0,
            max_steps: 500,
            x_threshold: 2.4,
            theta_threshold: 0.209, // ~12 degrees
        }
    }
}

impl CartPoleEnv {
    /// Create a new cart-pole environment
    pub fn new(config: EnvironmentConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut physics = CartPoleConfig::default();
        if let Some(max_steps) = config.max_steps {
            physics.max_steps = max_steps;
        }
        Ok(Self {
            state: CartPoleState {
                x: 0.0,
                x_dot: 0.0,
                theta: 0.0,
                theta_dot: 0.0,
            },
            config: physics,
            steps: 0,
            rng,
        })
    }

    fn get_observation(&self) -> VectorObservation {
        VectorObservation {
            data: vec![
                self.state.x,
                self.state.x_dot,
                self.state.theta,
                self.state.theta_dot,
            ],
        }
    }

    fn is_failed(&self) -> bool {
        self.state.x.abs() > self.config.x_threshold
            || self.state.theta.abs() > self.config.theta_threshold
    }
}

#[async_trait]
impl Environment for CartPoleEnv {
    type Observation = VectorObservation;
    type Action = DiscreteAction;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        let high = vec![
            self.config.x_threshold * 2.0,
            10.0,
            self.config.theta_threshold * 2.0,
            10.0,
        ];
        let low = high.iter().map(|&x| -x).collect();

        Box::new(BoxObservationSpace::new(low, high, vec![4]).unwrap())
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        Box::new(DiscreteSpace::new(2)) // 0: push left, 1: push right
    }

    async fn reset(&mut self) -> Result<(Self::Observation, StepInfo)> {
        self.state = CartPoleState {
            x: self.rng.gen_range(-0.05..0.05),
            x_dot: self.rng.gen_range(-0.05..0.05),
            theta: self.rng.gen_range(-0.05..0.05),
            theta_dot: self.rng.gen_range(-0.05..0.05),
        };
        self.steps = 0;

        Ok((self.get_observation(), StepInfo::default()))
    }

    async fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>> {
        let force = if action.0 == 1 {
            self.config.force_mag
        } else {
            -self.config.force_mag
        };

        let cos_theta = self.state.theta.cos();
        let sin_theta = self.state.theta.sin();

        let total_mass = self.config.mass_cart + self.config.mass_pole;
        let pole_mass_length = self.config.mass_pole * self.config.length;

        let temp =
            (force + pole_mass_length * self.state.theta_dot.powi(2) * sin_theta) / total_mass;
        let theta_acc = (self.config.gravity * sin_theta - cos_theta * temp)
            / (self.config.length
                * (4.0 / 3.0 - self.config.mass_pole * cos_theta.powi(2) / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        let dt = 0.02;
        self.state.x += dt * self.state.x_dot;
        self.state.x_dot += dt * x_acc;
        self.state.theta += dt * self.state.theta_dot;
        self.state.theta_dot += dt * theta_acc;

        self.steps += 1;

        let done = self.is_failed();
        let truncated = !done && self.steps >= self.config.max_steps;

        Ok(Step {
            observation: self.get_observation(),
            reward: Reward(1.0), // 1 for each step survived
            done,
            truncated,
            info: StepInfo::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlkit_core::Observation;

    #[tokio::test]
    async fn reset_produces_a_small_four_dim_state() {
        let mut env = CartPoleEnv::new(EnvironmentConfig::default()).unwrap();
        let (obs, _info) = env.reset().await.unwrap();

        assert_eq!(obs.shape(), vec![4]);
        assert!(obs.to_vec().iter().all(|x| x.abs() < 0.05));
    }

    #[tokio::test]
    async fn seeded_resets_are_reproducible() {
        let config = EnvironmentConfig {
            seed: Some(17),
            ..EnvironmentConfig::default()
        };
        let mut a = CartPoleEnv::new(config.clone()).unwrap();
        let mut b = CartPoleEnv::new(config).unwrap();

        let (obs_a, _) = a.reset().await.unwrap();
        let (obs_b, _) = b.reset().await.unwrap();
        assert_eq!(obs_a, obs_b);
    }

    #[tokio::test]
    async fn constant_push_topples_the_pole() {
        let mut env = CartPoleEnv::new(EnvironmentConfig {
            seed: Some(3),
            ..EnvironmentConfig::default()
        })
        .unwrap();
        env.reset().await.unwrap();

        let mut terminated = false;
        for _ in 0..500 {
            let step = env.step(DiscreteAction(1)).await.unwrap();
            assert!((step.reward.0 - 1.0).abs() < f64::EPSILON);
            if step.done || step.truncated {
                terminated = step.done;
                break;
            }
        }
        assert!(terminated, "pole should fall under a constant push");
    }

    #[tokio::test]
    async fn step_limit_truncates_the_episode() {
        let mut env = CartPoleEnv::new(EnvironmentConfig {
            seed: Some(5),
            max_steps: Some(3),
            ..EnvironmentConfig::default()
        })
        .unwrap();
        env.reset().await.unwrap();

        let mut last = None;
        for i in 0..3 {
            // alternate pushes to keep the pole up long enough
            let step = env.step(DiscreteAction(i % 2)).await.unwrap();
            last = Some(step);
        }
        let last = last.unwrap();
        assert!(last.truncated);
        assert!(!last.done);
    }
}
