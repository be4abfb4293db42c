// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for model construction, quantization and field access

use crate::fixed_point::FixedPointFormat;
use crate::fragment::FragmentRole;
use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for model operations
///
/// Every variant is raised synchronously at the point of violation. Nothing in
/// this crate clamps, wraps or lets a NaN through in place of one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Value {value} does not fit the {format} fixed-point format")]
    OutOfRange { value: f64, format: FixedPointFormat },

    #[error("Invalid kinetics (tau_a = {tau_a}, tau_b = {tau_b}): {reason}")]
    InvalidKinetics {
        tau_a: f64,
        tau_b: f64,
        reason: String,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Field declared twice: {0}")]
    DuplicateField(String),

    #[error("Channel declared twice: {0}")]
    DuplicateChannel(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Fragment '{model}' has role {actual:?}, expected {expected:?}")]
    FragmentRoleMismatch {
        model: String,
        expected: FragmentRole,
        actual: FragmentRole,
    },
}

impl ModelError {
    pub(crate) fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
