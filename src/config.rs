use std::time::Duration;

use chatgpt::config::ChatGPTEngine;
use thiserror::Error;

use crate::quiz::MIN_QUESTIONS;

pub const API_KEY_VAR: &str = "CHATGPT_API_KEY";
const MODEL_VAR: &str = "QUIZ_MODEL";
const TIMEOUT_VAR: &str = "QUIZ_REQUEST_TIMEOUT_SECS";
const SHUFFLE_VAR: &str = "QUIZ_SHUFFLE_OPTIONS";
const COUNT_VAR: &str = "QUIZ_QUESTION_COUNT";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CHATGPT_API_KEY is not set")]
    MissingApiKey,

    #[error("unknown model {0:?}, expected one of gpt-3.5-turbo, gpt-4, gpt-4-32k")]
    UnknownModel(String),

    #[error("{key} must be a positive whole number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be true or false, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },

    #[error("QUIZ_QUESTION_COUNT must be at least 10, got {0}")]
    TooFewQuestions(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    #[default]
    Gpt35Turbo,
    Gpt4,
    Gpt4_32k,
}

impl Model {
    fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gpt-3.5-turbo" => Ok(Model::Gpt35Turbo),
            "gpt-4" => Ok(Model::Gpt4),
            "gpt-4-32k" => Ok(Model::Gpt4_32k),
            _ => Err(ConfigError::UnknownModel(name.to_string())),
        }
    }

    pub fn engine(&self) -> ChatGPTEngine {
        match self {
            Model::Gpt35Turbo => ChatGPTEngine::Gpt35Turbo,
            Model::Gpt4 => ChatGPTEngine::Gpt4,
            Model::Gpt4_32k => ChatGPTEngine::Gpt4_32k,
        }
    }
}

/// Settings read from `.env` and the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    api_key: Option<String>,
    pub model: Model,
    pub request_timeout: Duration,
    pub shuffle_options: bool,
    pub question_count: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR).filter(|key| !key.trim().is_empty());

        let model = match lookup(MODEL_VAR) {
            Some(name) => Model::parse(&name)?,
            None => Model::default(),
        };

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(value) => parse_positive(TIMEOUT_VAR, &value)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let shuffle_options = match lookup(SHUFFLE_VAR) {
            Some(value) => parse_flag(SHUFFLE_VAR, &value)?,
            None => true,
        };

        let question_count = match lookup(COUNT_VAR) {
            Some(value) => parse_positive(COUNT_VAR, &value)? as usize,
            None => MIN_QUESTIONS,
        };
        if question_count < MIN_QUESTIONS {
            return Err(ConfigError::TooFewQuestions(question_count));
        }

        Ok(Self {
            api_key,
            model,
            request_timeout: Duration::from_secs(timeout_secs),
            shuffle_options,
            question_count,
        })
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[(API_KEY_VAR, "sk-test")]).unwrap();
        assert_eq!(config.api_key(), Ok("sk-test"));
        assert_eq!(config.model, Model::Gpt35Turbo);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(config.shuffle_options);
        assert_eq!(config.question_count, 10);
    }

    #[test]
    fn missing_or_blank_key_is_reported_lazily() {
        let missing = config(&[]).unwrap();
        assert_eq!(missing.api_key(), Err(ConfigError::MissingApiKey));

        let blank = config(&[(API_KEY_VAR, "  ")]).unwrap();
        assert_eq!(blank.api_key(), Err(ConfigError::MissingApiKey));
        assert_eq!(
            ConfigError::MissingApiKey.to_string(),
            "CHATGPT_API_KEY is not set"
        );
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            (MODEL_VAR, "GPT-4"),
            (TIMEOUT_VAR, "30"),
            (SHUFFLE_VAR, "false"),
            (COUNT_VAR, "15"),
        ])
        .unwrap();
        assert_eq!(config.model, Model::Gpt4);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.shuffle_options);
        assert_eq!(config.question_count, 15);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            config(&[(MODEL_VAR, "davinci")]),
            Err(ConfigError::UnknownModel("davinci".into()))
        );
        assert!(matches!(
            config(&[(TIMEOUT_VAR, "0")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            config(&[(TIMEOUT_VAR, "soon")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            config(&[(SHUFFLE_VAR, "maybe")]),
            Err(ConfigError::InvalidFlag { .. })
        ));
        assert_eq!(
            config(&[(COUNT_VAR, "7")]),
            Err(ConfigError::TooFewQuestions(7))
        );
    }
}
