//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ParcelConfig;
use std::path::Path;

/// Name of the configuration file inside a project directory.
pub const CONFIG_FILE: &str = "parcel.toml";

/// Loads and validates `parcel.toml` from a project directory.
///
/// Relative roots are resolved against `project_dir`.
pub fn load_config(project_dir: &Path) -> Result<ParcelConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    Ok(load_config_from_str(&content)?.resolve_paths(project_dir))
}

/// Parses and validates a `parcel.toml` configuration from a string.
///
/// Paths are returned as written; see [`ParcelConfig::resolve_paths`].
pub fn load_config_from_str(content: &str) -> Result<ParcelConfig, ConfigError> {
    let config: ParcelConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ParcelConfig) -> Result<(), ConfigError> {
    let roots = [
        ("units", &config.roots.units),
        ("archives", &config.roots.archives),
        ("cache", &config.roots.cache),
    ];
    for (root, path) in roots {
        if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::EmptyRoot { root });
        }
    }
    if config.package.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::EmptyOutputDir);
    }
    if let Some(index) = config
        .package
        .platform_prefixes
        .iter()
        .position(String::is_empty)
    {
        return Err(ConfigError::EmptyPlatformPrefix { index });
    }
    Ok(())
}
