// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for parameter image layout

use neurokin_model::ModelError;
use thiserror::Error;

/// Result type for serialization operations
pub type SerializationResult<T> = Result<T, SerializationError>;

/// Error types for serialization operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializationError {
    #[error("Only {supported} weight term(s) can be written, {requested} requested")]
    UnsupportedTermCount { requested: usize, supported: usize },

    #[error("Expected {expected} weight scales (one per synapse channel), got {actual}")]
    ChannelScaleMismatch { expected: usize, actual: usize },

    #[error("Channel '{channel}' breaks the fixed-stride layout: {reason}")]
    NonUniformChannelBlock { channel: String, reason: String },

    #[error("Image already has a '{0}' section")]
    DuplicateSection(String),

    #[error("Image is {actual} bytes, expected {expected}")]
    ImageSizeMismatch { expected: usize, actual: usize },

    #[error("Cannot encode field '{field}': {source}")]
    FieldEncoding {
        field: String,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl SerializationError {
    /// Underlying model error, whether wrapped with field context or not
    pub fn model_error(&self) -> Option<&ModelError> {
        match self {
            SerializationError::FieldEncoding { source, .. } => Some(source),
            SerializationError::Model(err) => Some(err),
            _ => None,
        }
    }
}
