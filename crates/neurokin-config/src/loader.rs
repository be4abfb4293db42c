// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, NeurokinConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "neurokin.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "NEUROKIN_CONFIG_PATH";

/// Find the neurokin configuration file
///
/// Search order:
/// 1. `NEUROKIN_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurokin.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Parse configuration from TOML text, without applying any overrides
pub fn parse_config(content: &str) -> ConfigResult<NeurokinConfig> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, cannot be read, or contains invalid TOML.
/// Validation is separate; see [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurokinConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config = parse_config(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

fn parse_timestep(source: &str, value: &str) -> ConfigResult<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        ConfigError::InvalidValue(format!(
            "{} must be a whole number of microseconds, got '{}'",
            source, value
        ))
    })
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROKIN_TIMESTEP_US` -> `simulation.timestep_us`
/// - `NEUROKIN_LOG_LEVEL` -> `logging.level`
/// - `NEUROKIN_OUTPUT_DIR` -> `output.directory`
pub fn apply_environment_overrides(config: &mut NeurokinConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("NEUROKIN_TIMESTEP_US") {
        config.simulation.timestep_us = parse_timestep("NEUROKIN_TIMESTEP_US", &value)?;
    }
    if let Ok(value) = env::var("NEUROKIN_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("NEUROKIN_OUTPUT_DIR") {
        config.output.directory = PathBuf::from(value);
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// Keys are dotted section paths, e.g.
/// `{"simulation.timestep_us": "100", "output.directory": "out"}`.
pub fn apply_cli_overrides(config: &mut NeurokinConfig, cli_args: &HashMap<String, String>) -> ConfigResult<()> {
    if let Some(value) = cli_args.get("simulation.timestep_us") {
        config.simulation.timestep_us = parse_timestep("simulation.timestep_us", value)?;
    }
    if let Some(value) = cli_args.get("logging.level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("output.directory") {
        config.output.directory = PathBuf::from(value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_an_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        env::set_var(CONFIG_PATH_ENV, dir.path().join("absent.toml"));
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = NeurokinConfig::default();

        env::set_var("NEUROKIN_TIMESTEP_US", "100");
        env::set_var("NEUROKIN_LOG_LEVEL", "debug");
        let result = apply_environment_overrides(&mut config);
        env::remove_var("NEUROKIN_TIMESTEP_US");
        env::remove_var("NEUROKIN_LOG_LEVEL");

        result.unwrap();
        assert_eq!(config.simulation.timestep_us, 100);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unparseable_override_rejected() {
        let mut config = NeurokinConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.timestep_us".to_string(), "fast".to_string());
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli_args),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "timestep_us = 1000").unwrap();
        writeln!(file, "[output]").unwrap();
        writeln!(file, "directory = \"file-dir\"").unwrap();

        env::set_var("NEUROKIN_TIMESTEP_US", "500");
        env::set_var("NEUROKIN_OUTPUT_DIR", "env-dir");

        let mut cli_args = HashMap::new();
        cli_args.insert("output.directory".to_string(), "cli-dir".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args));

        env::remove_var("NEUROKIN_TIMESTEP_US");
        env::remove_var("NEUROKIN_OUTPUT_DIR");

        // CLI wins for the directory, env wins for the timestep
        let config = config.unwrap();
        assert_eq!(config.output.directory, PathBuf::from("cli-dir"));
        assert_eq!(config.simulation.timestep_us, 500);
    }
}
