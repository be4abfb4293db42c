// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Weight Dependence
//!
//! Additive weight dependence with a boost term for plastic synapses.
//!
//! ```text
//! Per synapse type, six INT32 words:
//!     w_min · w                   (weight units, w = weight scale)
//!     w_max · w
//!     scale · w_max · w           (learning-rate-like)
//!     boost · w_max · w
//!     boost_thresh                (S16.15 raw)
//!     causal                      (0 or 1)
//! ```
//!
//! `boost` and `scale` are independent fields; the runtime decides how they
//! combine.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Words written per synapse type
pub const WORDS_PER_SYNAPSE_TYPE: usize = 6;

/// Weight terms this dependence can emit
pub const SUPPORTED_WEIGHT_TERMS: usize = 1;

/// Weight bounds, scale and boost of a plastic projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightDependence {
    pub w_min: f64,
    pub w_max: f64,
    pub scale: f64,
    pub boost: f64,
    /// Runtime state value at which the boost engages
    pub boost_thresh: f64,
    pub causal: bool,
}

impl Default for WeightDependence {
    fn default() -> Self {
        Self {
            w_min: 0.0,
            w_max: 1.0,
            scale: 1.0,
            boost: 0.0,
            boost_thresh: 1000.0,
            causal: true,
        }
    }
}

impl WeightDependence {
    pub fn new(w_min: f64, w_max: f64) -> ModelResult<Self> {
        let dependence = Self {
            w_min,
            w_max,
            ..Self::default()
        };
        dependence.validate()?;
        Ok(dependence)
    }

    pub fn with_boost(mut self, boost: f64, boost_thresh: f64) -> Self {
        self.boost = boost;
        self.boost_thresh = boost_thresh;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_causal(mut self, causal: bool) -> Self {
        self.causal = causal;
        self
    }

    /// Check that every value is finite and the bounds are ordered
    pub fn validate(&self) -> ModelResult<()> {
        for (name, value) in [
            ("w_min", self.w_min),
            ("w_max", self.w_max),
            ("scale", self.scale),
            ("boost", self.boost),
            ("boost_thresh", self.boost_thresh),
        ] {
            if !value.is_finite() {
                return Err(ModelError::invalid_parameter(name, "value must be finite"));
            }
        }
        if self.w_min > self.w_max {
            return Err(ModelError::invalid_parameter(
                "w_min",
                format!("w_min ({}) exceeds w_max ({})", self.w_min, self.w_max),
            ));
        }
        Ok(())
    }

    /// True when both would emit the same block for every weight scale
    ///
    /// Causality is not compared.
    pub fn is_same_as(&self, other: &WeightDependence) -> bool {
        self.w_min == other.w_min
            && self.w_max == other.w_max
            && self.scale == other.scale
            && self.boost == other.boost
            && self.boost_thresh == other.boost_thresh
    }

    /// Real values of the six words for one synapse type, before quantization
    pub fn words_for(&self, weight_scale: f64) -> [f64; WORDS_PER_SYNAPSE_TYPE] {
        [
            self.w_min * weight_scale,
            self.w_max * weight_scale,
            self.scale * self.w_max * weight_scale,
            self.boost * self.w_max * weight_scale,
            self.boost_thresh,
            if self.causal { 1.0 } else { 0.0 },
        ]
    }
}
