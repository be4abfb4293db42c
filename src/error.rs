// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Umbrella error type

use neurokin_config::ConfigError;
use neurokin_model::ModelError;
use neurokin_serialization::SerializationError;
use thiserror::Error;

/// Result type for umbrella operations
pub type NeurokinResult<T> = Result<T, NeurokinError>;

#[derive(Error, Debug)]
pub enum NeurokinError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Population '{population}': {source}")]
    Population {
        population: String,
        #[source]
        source: Box<NeurokinError>,
    },
}

impl NeurokinError {
    /// Attach the population name to an error raised while building it
    pub fn in_population(self, population: impl Into<String>) -> Self {
        NeurokinError::Population {
            population: population.into(),
            source: Box::new(self),
        }
    }

    /// Innermost model error, looking through population and serializer wrappers
    pub fn model_error(&self) -> Option<&ModelError> {
        match self {
            NeurokinError::Model(err) => Some(err),
            NeurokinError::Serialization(err) => err.model_error(),
            NeurokinError::Population { source, .. } => source.model_error(),
            _ => None,
        }
    }
}
