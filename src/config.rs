//! Runtime settings read from the environment (and `.env`, loaded in `main`).

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::quiz::policy::TrainingConfig;
use crate::quiz::trivia::DEFAULT_API_URL;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub training: TrainingConfig,
    /// Fixed seed for training; `None` draws one from the OS.
    pub seed: Option<u64>,
    pub max_questions: u32,
    pub trivia_url: String,
    pub trivia_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            training: TrainingConfig::default(),
            seed: None,
            max_questions: 20,
            trivia_url: DEFAULT_API_URL.to_string(),
            trivia_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let training = TrainingConfig {
            episodes: parse_or(&lookup, "TUTOR_EPISODES", defaults.training.episodes)?,
            max_steps: parse_or(&lookup, "TUTOR_MAX_STEPS", defaults.training.max_steps)?,
            alpha: parse_or(&lookup, "TUTOR_ALPHA", defaults.training.alpha)?,
            gamma: parse_or(&lookup, "TUTOR_GAMMA", defaults.training.gamma)?,
            epsilon: parse_or(&lookup, "TUTOR_EPSILON", defaults.training.epsilon)?,
            ..defaults.training
        };

        let seed = match lookup("TUTOR_SEED") {
            Some(value) => Some(parse("TUTOR_SEED", value)?),
            None => None,
        };
        let timeout_secs = parse_or(
            &lookup,
            "TRIVIA_TIMEOUT_SECS",
            defaults.trivia_timeout.as_secs(),
        )?;

        let config = Self {
            training,
            seed,
            max_questions: parse_or(&lookup, "TUTOR_MAX_QUESTIONS", defaults.max_questions)?,
            trivia_url: lookup("TRIVIA_API_URL").unwrap_or(defaults.trivia_url),
            trivia_timeout: Duration::from_secs(timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.training;
        check(t.episodes > 0, "TUTOR_EPISODES", "positive", t.episodes)?;
        check(t.max_steps > 0, "TUTOR_MAX_STEPS", "positive", t.max_steps)?;
        check(t.alpha > 0.0 && t.alpha <= 1.0, "TUTOR_ALPHA", "in (0, 1]", t.alpha)?;
        check((0.0..1.0).contains(&t.gamma), "TUTOR_GAMMA", "in [0, 1)", t.gamma)?;
        check((0.0..=1.0).contains(&t.epsilon), "TUTOR_EPSILON", "in [0, 1]", t.epsilon)?;
        check(self.max_questions > 0, "TUTOR_MAX_QUESTIONS", "positive", self.max_questions)?;
        Ok(())
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => parse(name, value),
        None => Ok(default),
    }
}

fn check(
    ok: bool,
    name: &'static str,
    expected: &'static str,
    value: impl ToString,
) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            expected,
            value: value.to_string(),
        })
    }
}
