//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use bastion::{BastionError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for BastionError {
    fn from(err: ConfigError) -> Self {
        BastionError::Io(io::Error::other(err.to_string()))
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (bastion/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, BastionError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("bastion/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "bastion", "bastion") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, BastionError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<AppConfig, BastionError> {
    toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [defaults]
            zone = "External"

            [results]
            relation = "violates"
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults().zone(), "External");
        assert_eq!(config.defaults().level(), "Open");
        assert_eq!(config.results().relation(), "violates");
        assert_eq!(config.template().assets_anchor(), "// ASSETS_HERE");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.checker().output(), "output.xml");
    }

    #[test]
    fn test_checker_section() {
        let config = parse_config(
            r#"
            [checker]
            program = "alloy-check"
            args = ["--out", "{output}", "{spec}"]
            "#,
        )
        .unwrap();

        assert_eq!(config.checker().program(), "alloy-check");
        assert_eq!(config.checker().args(), ["--out", "{output}", "{spec}"]);
        assert_eq!(config.checker().output(), "output.xml");
    }

    #[test]
    fn test_invalid_toml() {
        let err = parse_config("[defaults\nzone = ").unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML configuration"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = load_config(Some("/nonexistent/bastion.toml")).unwrap_err();
        assert!(err.to_string().contains("Missing configuration file"));
    }
}
