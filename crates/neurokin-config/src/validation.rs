// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Catches configurations that would fail, or silently misbehave, once a
//! model is built from them. Every problem is collected before reporting.

use crate::{ConfigError, ConfigResult, NeurokinConfig, PopulationConfig};
use std::collections::HashSet;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    Duplicate { field: String, name: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::Duplicate { field, name } => {
                write!(f, "Duplicate name '{}' in {}", name, field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Collect every validation problem without failing
pub fn collect_validation_errors(config: &NeurokinConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    validate_global(config, &mut errors);

    let mut names = HashSet::new();
    for (index, population) in config.populations.iter().enumerate() {
        let field = format!("populations[{}]", index);
        if population.name.is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: format!("{}.name", field),
            });
        } else if !names.insert(population.name.as_str()) {
            errors.push(ConfigValidationError::Duplicate {
                field: "populations".to_string(),
                name: population.name.clone(),
            });
        }
        validate_population(&field, population, &mut errors);
    }

    errors
}

/// Validate the complete configuration
///
/// Checks for:
/// - A positive timestep and a known log level
/// - Unique population and channel names
/// - Channel kinetics that can be normalized
/// - Weight bounds, weight-scale counts and weight-term counts
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &NeurokinConfig) -> ConfigResult<()> {
    let errors = collect_validation_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

fn validate_global(config: &NeurokinConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.simulation.timestep_us == 0 {
        errors.push(invalid("simulation.timestep_us", "must be positive"));
    }
    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(invalid(
            "logging.level",
            format!("must be one of {}", LOG_LEVELS.join(", ")),
        ));
    }
}

fn validate_population(field: &str, population: &PopulationConfig, errors: &mut Vec<ConfigValidationError>) {
    if population.n_neurons == 0 {
        errors.push(invalid(format!("{}.n_neurons", field), "must be positive"));
    }
    if population.max_atoms_per_core == 0 {
        errors.push(invalid(format!("{}.max_atoms_per_core", field), "must be positive"));
    }

    if population.channels.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: format!("{}.channels", field),
        });
    }

    let mut channel_names = HashSet::new();
    for (index, channel) in population.channels.iter().enumerate() {
        let channel_field = format!("{}.channels[{}]", field, index);
        if !channel_names.insert(channel.name.as_str()) {
            errors.push(ConfigValidationError::Duplicate {
                field: format!("{}.channels", field),
                name: channel.name.clone(),
            });
        }
        for (component, tau) in [("a", channel.a.tau), ("b", channel.b.tau)] {
            if !(tau.is_finite() && tau > 0.0) {
                errors.push(invalid(
                    format!("{}.{}.tau", channel_field, component),
                    "must be positive",
                ));
            }
        }
        if channel.a.tau == channel.b.tau {
            errors.push(invalid(
                format!("{}.b.tau", channel_field),
                "a and b time constants must differ",
            ));
        }
        if channel.a_sign() * channel.b_sign() >= 0.0 {
            errors.push(invalid(
                format!("{}.b.sign", channel_field),
                "a and b signs must be non-zero and opposite",
            ));
        }
    }

    if !population.weight_scales.is_empty() && population.weight_scales.len() != population.channels.len() {
        errors.push(invalid(
            format!("{}.weight_scales", field),
            format!(
                "has {} entries but there are {} channels",
                population.weight_scales.len(),
                population.channels.len()
            ),
        ));
    }
    if population.weight_scales.iter().any(|scale| !scale.is_finite()) {
        errors.push(invalid(format!("{}.weight_scales", field), "must be finite"));
    }

    if let Some(dependence) = &population.weight_dependence {
        let dep_field = format!("{}.weight_dependence", field);
        if dependence.w_min > dependence.w_max {
            errors.push(invalid(
                format!("{}.w_min", dep_field),
                format!("{} exceeds w_max {}", dependence.w_min, dependence.w_max),
            ));
        }
        if dependence.n_weight_terms != 1 {
            errors.push(invalid(
                format!("{}.n_weight_terms", dep_field),
                "only a single weight term is supported",
            ));
        }
    }
}
