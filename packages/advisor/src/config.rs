/// Configuration for the Anthropic advisor client
use crate::error::AdvisorError;
use serde::{Deserialize, Serialize};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Messages API endpoint
    pub api_url: String,

    /// API key, normally taken from ANTHROPIC_API_KEY
    pub api_key: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Response token cap
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AdvisorConfig {
    /// Build a config from the environment (ANTHROPIC_API_KEY required,
    /// TEAMBOARD_ADVISOR_MODEL optional override)
    pub fn from_env() -> Result<Self, AdvisorError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AdvisorError::ConfigError("ANTHROPIC_API_KEY is not set".to_string()))?;

        let mut config = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(model) = std::env::var("TEAMBOARD_ADVISOR_MODEL") {
            config.model = model;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), AdvisorError> {
        if self.api_key.is_empty() {
            return Err(AdvisorError::ConfigError(
                "api_key cannot be empty".to_string(),
            ));
        }
        if self.api_url.is_empty() {
            return Err(AdvisorError::ConfigError(
                "api_url cannot be empty".to_string(),
            ));
        }
        if self.model.is_empty() {
            return Err(AdvisorError::ConfigError(
                "model cannot be empty".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(AdvisorError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdvisorConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.max_tokens, 1024);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AdvisorConfig {
            api_key: "sk-test".to_string(),
            ..AdvisorConfig::default()
        };
        assert!(config.validate().is_ok());

        config.api_key = String::new();
        assert!(config.validate().is_err());

        config.api_key = "sk-test".to_string();
        config.max_tokens = 0;
        assert!(config.validate().is_err());

        config.max_tokens = 1024;
        config.model = String::new();
        assert!(config.validate().is_err());
    }
}
