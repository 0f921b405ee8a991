//! Settings for the bidder adapters.
//!
//! Settings are read from TOML and merged with environment variables prefixed
//! with `CRITEO_BIDDER__`. For example,
//! `CRITEO_BIDDER__ADAPTERS__CRITEO__ENDPOINT` overrides
//! `adapters.criteo.endpoint`.

use std::collections::HashMap;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::error::BidderError;

/// Prefix of environment variables that override TOML values.
pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "CRITEO_BIDDER";

/// Separator between path segments in environment variable names.
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";

/// Implemented by every adapter's config section.
pub trait AdapterConfig {
    /// Whether the adapter should be registered.
    fn is_enabled(&self) -> bool;
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Raw adapter sections keyed by bidder name, e.g. `[adapters.criteo]`.
    #[serde(default)]
    pub adapters: HashMap<String, JsonValue>,
}

impl Settings {
    /// Parse settings from a TOML string and merge environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or cannot be deserialized.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<BidderError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR)
            .try_parsing(true);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(BidderError::Configuration {
                message: "Failed to build configuration".to_string(),
            })?;

        config
            .try_deserialize()
            .change_context(BidderError::Configuration {
                message: "Failed to deserialize configuration".to_string(),
            })
    }

    /// Read and validate the config section of one adapter.
    ///
    /// Returns `Ok(None)` when the section is missing or the adapter is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the section cannot be deserialized or fails validation.
    pub fn adapter_config<T>(&self, bidder: &str) -> Result<Option<T>, Report<BidderError>>
    where
        T: DeserializeOwned + Validate + AdapterConfig,
    {
        let Some(raw) = self.adapters.get(bidder) else {
            return Ok(None);
        };

        let config: T = serde_json::from_value(raw.clone()).change_context(
            BidderError::Configuration {
                message: format!("Invalid configuration for adapter '{bidder}'"),
            },
        )?;

        config
            .validate()
            .change_context(BidderError::Configuration {
                message: format!("Configuration for adapter '{bidder}' failed validation"),
            })?;

        Ok(config.is_enabled().then_some(config))
    }
}
