// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Widget configuration.
//
// A small YAML file mirrors what the storefront embeds as inline
// config: where the backend lives, which prompt profile to use, and
// the welcome copy. Everything except the endpoint has a default.

use serde::Deserialize;
use std::path::Path;

/// All errors that can occur during config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct WidgetConfig {
    /// Base URL of the chat backend.
    pub endpoint: String,

    /// Shop identifier sent with every chat request.
    #[serde(default = "default_shop_id")]
    pub shop_id: String,

    /// Prompt profile the backend should answer with.
    #[serde(default = "default_prompt_type")]
    pub prompt_type: String,

    /// First assistant line of a fresh conversation.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    #[serde(default)]
    pub polling: PollingConfig,
}

/// Token-polling schedule for the auth popup flow.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Delay before the first token-status check.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,

    /// Fixed interval between subsequent checks.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Polling gives up silently after this many attempts.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay(),
            interval_secs: default_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_shop_id() -> String {
    "default-shop-id".to_string()
}

fn default_prompt_type() -> String {
    "standardAssistant".to_string()
}

fn default_welcome_message() -> String {
    "👋 Hi there! How can I help you today?".to_string()
}

fn default_initial_delay() -> u64 {
    2
}

fn default_interval() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    30
}

impl WidgetConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: WidgetConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration pointing at the given endpoint.
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            shop_id: default_shop_id(),
            prompt_type: default_prompt_type(),
            welcome_message: default_welcome_message(),
            polling: PollingConfig::default(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation("endpoint must not be empty".into()));
        }
        if self.polling.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "polling.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: WidgetConfig =
            serde_yaml::from_str("endpoint: https://chat.example\n").unwrap();
        assert_eq!(config.endpoint, "https://chat.example");
        assert_eq!(config.shop_id, "default-shop-id");
        assert_eq!(config.prompt_type, "standardAssistant");
        assert_eq!(config.polling.initial_delay_secs, 2);
        assert_eq!(config.polling.interval_secs, 10);
        assert_eq!(config.polling.max_attempts, 30);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "endpoint: https://chat.example\nshop_id: shop-7\npolling:\n  interval_secs: 3"
        )
        .unwrap();

        let config = WidgetConfig::load(file.path()).unwrap();
        assert_eq!(config.shop_id, "shop-7");
        assert_eq!(config.polling.interval_secs, 3);
        // Unspecified polling fields still default
        assert_eq!(config.polling.max_attempts, 30);
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint: \"\"").unwrap();
        match WidgetConfig::load(file.path()) {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("endpoint")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        match WidgetConfig::load("/does/not/exist.yaml") {
            Err(ConfigError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
