// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Per-Timestep Decay Precomputation
//!
//! Converts a continuous time constant into the per-step multipliers the
//! runtime applies every tick:
//!
//! ```text
//! decay = exp(-dt/τ)                      (U0.32)
//! init  = (dt/τ) · (1 - exp(-dt/τ))       (S16.15, optional)
//! ```
//!
//! Both are pure functions of `(τ, dt)`; callers recompute them whenever either
//! input changes instead of caching them.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Machine timestep shared by every fragment serialized together
///
/// Stored in microseconds, as the runtime loader receives it. Time constants
/// elsewhere in this crate are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestep {
    micros: u32,
}

impl Timestep {
    /// One millisecond, the usual machine timestep
    pub const DEFAULT_MICROS: u32 = 1000;

    /// Create a timestep from whole microseconds
    pub fn from_micros(micros: u32) -> ModelResult<Self> {
        if micros == 0 {
            return Err(ModelError::invalid_parameter(
                "timestep",
                "timestep must be at least one microsecond",
            ));
        }
        Ok(Self { micros })
    }

    /// Create a timestep from milliseconds, rounded to whole microseconds
    pub fn from_millis(millis: f64) -> ModelResult<Self> {
        if !millis.is_finite() || millis <= 0.0 {
            return Err(ModelError::invalid_parameter(
                "timestep",
                format!("timestep must be positive, got {} ms", millis),
            ));
        }
        let micros = (millis * 1000.0).round();
        if micros < 1.0 || micros > u32::MAX as f64 {
            return Err(ModelError::invalid_parameter(
                "timestep",
                format!("{} ms is not representable in microseconds", millis),
            ));
        }
        Self::from_micros(micros as u32)
    }

    #[inline]
    pub fn as_micros(&self) -> u32 {
        self.micros
    }

    /// Step duration in milliseconds (`dt` in every formula of this crate)
    #[inline]
    pub fn as_millis(&self) -> f64 {
        self.micros as f64 / 1000.0
    }
}

impl Default for Timestep {
    fn default() -> Self {
        Self {
            micros: Self::DEFAULT_MICROS,
        }
    }
}

/// Per-step multipliers derived from one time constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayFactors {
    /// `exp(-dt/τ)`, strictly inside (0, 1)
    pub decay: f64,
    /// `(dt/τ) · (1 - exp(-dt/τ))`
    pub init: f64,
}

/// Derive the decay and initial-kick terms for time constant `tau` (ms)
///
/// # Errors
/// [`ModelError::InvalidParameter`] if `tau` is not strictly positive and
/// finite, or if `dt/τ` is so small or so large that the decay is no longer
/// strictly between 0 and 1 in double precision.
///
/// # Example
/// ```
/// use neurokin_model::decay::{decay_factors, Timestep};
///
/// let factors = decay_factors(5.0, Timestep::default()).unwrap();
/// assert!((factors.decay - (-0.2f64).exp()).abs() < 1e-15);
/// ```
pub fn decay_factors(tau: f64, timestep: Timestep) -> ModelResult<DecayFactors> {
    decay_factors_ms(tau, timestep.as_millis())
}

/// Same as [`decay_factors`] with `dt` given directly in milliseconds
pub fn decay_factors_ms(tau: f64, dt: f64) -> ModelResult<DecayFactors> {
    if !tau.is_finite() || tau <= 0.0 {
        return Err(ModelError::invalid_parameter(
            "tau",
            format!("time constant must be positive, got {}", tau),
        ));
    }
    if !dt.is_finite() || dt <= 0.0 {
        return Err(ModelError::invalid_parameter(
            "timestep",
            format!("step duration must be positive, got {}", dt),
        ));
    }

    let ratio = dt / tau;
    let decay = (-ratio).exp();
    if !(decay > 0.0 && decay < 1.0) {
        return Err(ModelError::invalid_parameter(
            "tau",
            format!(
                "dt/tau = {} gives a decay of {}, outside (0, 1)",
                ratio, decay
            ),
        ));
    }

    Ok(DecayFactors {
        decay,
        init: ratio * (1.0 - decay),
    })
}
