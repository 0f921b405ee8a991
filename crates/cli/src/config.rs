//! Settings loading for the CLI.
//!
//! Settings are loaded from TOML files and merged with environment variables
//! prefixed with `CRITEO_BIDDER__`. For example,
//! `CRITEO_BIDDER__ADAPTERS__CRITEO__ENDPOINT` overrides
//! `adapters.criteo.endpoint` in the TOML file.

use std::fs;
use std::path::Path;

use criteo_bidder_common::adapters::criteo::{CriteoAdapter, CriteoConfig, BIDDER_NAME};
use criteo_bidder_common::settings::Settings;

use crate::error::CliError;

/// Load settings from a TOML file and merge environment overrides.
pub(crate) fn load_settings(file: &Path, verbose: bool) -> Result<Settings, CliError> {
    let content = fs::read_to_string(file)?;

    if verbose {
        println!("Loading config from: {}", file.display());
        println!("Environment variables with CRITEO_BIDDER__ prefix will be merged");
    }

    Settings::from_toml(&content)
        .map_err(|e| CliError::Config(format!("Failed to parse and merge config: {:?}", e)))
}

/// Read and validate the Criteo section of the settings.
fn criteo_config(settings: &Settings) -> Result<CriteoConfig, CliError> {
    settings
        .adapter_config::<CriteoConfig>(BIDDER_NAME)
        .map_err(|e| CliError::Config(format!("Invalid Criteo settings: {:?}", e)))?
        .ok_or_else(|| {
            CliError::Config("Criteo adapter is missing or disabled in the settings".to_string())
        })
}

/// Build the Criteo adapter from a settings file, or with defaults when none is given.
pub(crate) fn criteo_adapter(file: Option<&Path>, verbose: bool) -> Result<CriteoAdapter, CliError> {
    let config = match file {
        Some(file) => criteo_config(&load_settings(file, verbose)?)?,
        None => CriteoConfig::default(),
    };

    log::debug!("Using Criteo endpoint {}", config.endpoint);

    Ok(CriteoAdapter::new(config))
}

/// Validate a settings file.
pub fn validate(file: &Path, verbose: bool) -> Result<(), CliError> {
    let settings = load_settings(file, verbose)?;
    let config = criteo_config(&settings)?;

    println!("Configuration is valid");
    println!("  File: {}", file.display());
    println!("  Criteo endpoint: {}", config.endpoint);

    Ok(())
}
