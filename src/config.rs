//! Subscription store configuration
//!
//! Capability switches and limits applied at subscribe time, following the
//! broker configuration conventions: serde-friendly, `with_*` builders and an
//! explicit `validate()`.

use crate::constants::limits::MAX_TOPIC_LEVELS;
use crate::error::{Result, SubscriptionError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Subscription store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct StoreConfig {
    /// Shared subscription available
    pub shared_subscription_available: bool,

    /// Wildcard subscription available
    pub wildcard_subscription_available: bool,

    /// Subscription identifiers available
    pub subscription_identifier_available: bool,

    /// Maximum subscriptions a single client may hold (0 = unlimited)
    pub max_subscriptions_per_client: usize,

    /// Maximum number of levels in a topic filter (0 = unlimited)
    pub max_topic_levels: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shared_subscription_available: true,
            wildcard_subscription_available: true,
            subscription_identifier_available: true,
            max_subscriptions_per_client: 0,
            max_topic_levels: 0,
        }
    }
}

impl StoreConfig {
    /// Creates a new store configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables shared subscriptions
    #[must_use]
    pub fn with_shared_subscription_available(mut self, available: bool) -> Self {
        self.shared_subscription_available = available;
        self
    }

    /// Enables or disables wildcard subscriptions
    #[must_use]
    pub fn with_wildcard_subscription_available(mut self, available: bool) -> Self {
        self.wildcard_subscription_available = available;
        self
    }

    /// Enables or disables subscription identifiers
    #[must_use]
    pub fn with_subscription_identifier_available(mut self, available: bool) -> Self {
        self.subscription_identifier_available = available;
        self
    }

    /// Sets the per-client subscription cap
    #[must_use]
    pub fn with_max_subscriptions_per_client(mut self, max: usize) -> Self {
        self.max_subscriptions_per_client = max;
        self
    }

    /// Sets the maximum filter depth
    #[must_use]
    pub fn with_max_topic_levels(mut self, max: usize) -> Self {
        self.max_topic_levels = max;
        self
    }

    /// Loads the configuration from a TOML (`.toml`) or JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubscriptionError::Io(format!("Failed to read config file: {e}")))?;

        let config: Self = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&content).map_err(|e| {
                SubscriptionError::Configuration(format!("Invalid TOML config: {e}"))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                SubscriptionError::Configuration(format!("Invalid JSON config: {e}"))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn validate(&self) -> Result<&Self> {
        if self.max_topic_levels > MAX_TOPIC_LEVELS {
            return Err(SubscriptionError::Configuration(format!(
                "max_topic_levels must not exceed {MAX_TOPIC_LEVELS}"
            )));
        }

        Ok(self)
    }
}
