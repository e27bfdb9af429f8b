use std::fmt;

use log::{debug, info};
use rand::Rng;

use super::difficulty::{DifficultyLevel, LEVEL_COUNT};

/// Hyper-parameters of the offline Q-learning run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub episodes: usize,
    pub max_steps: usize,
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Probability of taking a random action instead of the greedy one.
    pub epsilon: f64,
    /// Probability that the synthetic reward is 1 rather than 0.
    pub reward_probability: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_steps: 100,
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.1,
            reward_probability: 0.7,
        }
    }
}

/// Expected-return estimates indexed by `(state, action)`, both difficulty levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    values: [[f64; LEVEL_COUNT]; LEVEL_COUNT],
}

impl QTable {
    #[cfg(test)]
    pub fn from_rows(values: [[f64; LEVEL_COUNT]; LEVEL_COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, state: DifficultyLevel, action: DifficultyLevel) -> f64 {
        self.values[state.index()][action.index()]
    }

    pub fn row(&self, state: DifficultyLevel) -> &[f64; LEVEL_COUNT] {
        &self.values[state.index()]
    }

    pub fn entries(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().copied()
    }

    /// Greedy action for `state`. Ties go to the lowest-indexed action.
    pub fn best_action(&self, state: DifficultyLevel) -> DifficultyLevel {
        let index = first_argmax(self.row(state));
        DifficultyLevel::ALL[index]
    }

    fn best_value(&self, state: DifficultyLevel) -> f64 {
        self.row(state).iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

impl fmt::Display for QTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for action in DifficultyLevel::ALL {
            write!(f, "{:>9}", action.to_string())?;
        }
        for state in DifficultyLevel::ALL {
            write!(f, "\n{:>8}", state.to_string())?;
            for value in self.row(state) {
                write!(f, "{:>9.4}", value)?;
            }
        }
        Ok(())
    }
}

fn first_argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (i, value) in row.iter().enumerate().skip(1) {
        // Strictly greater, so equal values keep the earlier index
        if *value > row[best] {
            best = i;
        }
    }
    best
}

/// Trains the difficulty policy with epsilon-greedy tabular Q-learning.
///
/// The environment is synthetic: the reward is a biased coin flip that knows
/// nothing about real answers, and taking action `a` always lands in state `a`.
pub fn train<R: Rng>(config: &TrainingConfig, rng: &mut R) -> QTable {
    let mut table = QTable::default();

    for episode in 0..config.episodes {
        let mut state = DifficultyLevel::ALL[rng.gen_range(0..LEVEL_COUNT)];

        for _ in 0..config.max_steps {
            let action = if rng.gen::<f64>() < config.epsilon {
                DifficultyLevel::ALL[rng.gen_range(0..LEVEL_COUNT)]
            } else {
                table.best_action(state)
            };

            let reward = if rng.gen_bool(config.reward_probability) {
                1.0
            } else {
                0.0
            };
            let next_state = action;

            let current = table.get(state, action);
            let target = reward + config.gamma * table.best_value(next_state);
            table.values[state.index()][action.index()] =
                current + config.alpha * (target - current);

            state = next_state;
        }

        if (episode + 1) % 250 == 0 {
            debug!("Trained {} of {} episodes", episode + 1, config.episodes);
        }
    }

    info!("Difficulty policy trained over {} episodes", config.episodes);
    table
}
