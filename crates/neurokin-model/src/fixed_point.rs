// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Fixed-Point Codec
//!
//! Quantizes real values into the 32-bit words consumed by the embedded
//! runtime and back again.
//!
//! ```text
//! S16.15  signed    1 sign + 16 integer + 15 fraction bits   raw = round(v × 2^15)
//! U0.32   unsigned  32 fraction bits, v ∈ [0, 1)              raw = round(v × 2^32)
//! INT32   signed    plain integer                             raw = round(v)
//! ```
//!
//! Rounding is always half away from zero (`f64::round`), independent of any
//! platform rounding mode. A value whose rounded raw integer does not fit the
//! format is rejected with [`ModelError::OutOfRange`]; nothing saturates.

use crate::error::{ModelError, ModelResult};
use core::fmt;
use serde::{Deserialize, Serialize};

const S1615_SCALE: f64 = 32_768.0; // 2^15
const U032_SCALE: f64 = 4_294_967_296.0; // 2^32

/// Wire format of a single 32-bit parameter word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedPointFormat {
    /// Signed Q16.15 (the runtime's `REAL`/`input_t`)
    S1615,
    /// Unsigned Q0.32 fraction (the runtime's `decay_t`)
    U032,
    /// Plain signed 32-bit integer
    Int32,
}

impl FixedPointFormat {
    /// Every format occupies one 32-bit word on the wire
    pub const WORD_BYTES: usize = 4;

    /// Size of one encoded value in bytes
    #[inline]
    pub const fn byte_size(self) -> usize {
        Self::WORD_BYTES
    }

    /// Multiplier applied before rounding
    #[inline]
    pub const fn scale(self) -> f64 {
        match self {
            FixedPointFormat::S1615 => S1615_SCALE,
            FixedPointFormat::U032 => U032_SCALE,
            FixedPointFormat::Int32 => 1.0,
        }
    }

    /// Real-valued size of one unit in the last place
    #[inline]
    pub fn resolution(self) -> f64 {
        1.0 / self.scale()
    }

    /// Smallest representable raw integer
    pub const fn min_raw(self) -> i64 {
        match self {
            FixedPointFormat::S1615 | FixedPointFormat::Int32 => i32::MIN as i64,
            FixedPointFormat::U032 => 0,
        }
    }

    /// Largest representable raw integer
    pub const fn max_raw(self) -> i64 {
        match self {
            FixedPointFormat::S1615 | FixedPointFormat::Int32 => i32::MAX as i64,
            FixedPointFormat::U032 => u32::MAX as i64,
        }
    }

    /// Quantize `value` into this format's raw integer
    ///
    /// # Errors
    /// [`ModelError::OutOfRange`] if `value` is not finite, lies outside
    /// `[0, 1)` for U0.32, or rounds to an integer the format cannot hold.
    ///
    /// # Example
    /// ```
    /// use neurokin_model::FixedPointFormat;
    ///
    /// assert_eq!(FixedPointFormat::S1615.encode(1.0).unwrap(), 32_768);
    /// assert_eq!(FixedPointFormat::S1615.encode(-0.5).unwrap(), -16_384);
    /// assert_eq!(FixedPointFormat::U032.encode(0.5).unwrap(), 1 << 31);
    /// assert!(FixedPointFormat::U032.encode(1.0).is_err());
    /// ```
    pub fn encode(self, value: f64) -> ModelResult<i64> {
        let out_of_range = || ModelError::OutOfRange {
            value,
            format: self,
        };

        if !value.is_finite() {
            return Err(out_of_range());
        }
        if self == FixedPointFormat::U032 && !(0.0..1.0).contains(&value) {
            return Err(out_of_range());
        }

        let raw = (value * self.scale()).round();
        if raw < self.min_raw() as f64 || raw > self.max_raw() as f64 {
            return Err(out_of_range());
        }
        Ok(raw as i64)
    }

    /// Convert a raw integer back to its real value
    #[inline]
    pub fn decode(self, raw: i64) -> f64 {
        raw as f64 / self.scale()
    }

    /// Quantize `value` straight to the 32-bit word written on the wire
    pub fn encode_word(self, value: f64) -> ModelResult<u32> {
        let raw = self.encode(value)?;
        Ok(match self {
            FixedPointFormat::S1615 | FixedPointFormat::Int32 => raw as i32 as u32,
            FixedPointFormat::U032 => raw as u32,
        })
    }

    /// Interpret a wire word as this format's raw integer
    #[inline]
    pub fn raw_from_word(self, word: u32) -> i64 {
        match self {
            FixedPointFormat::S1615 | FixedPointFormat::Int32 => word as i32 as i64,
            FixedPointFormat::U032 => word as i64,
        }
    }

    /// Decode a wire word back to its real value
    #[inline]
    pub fn decode_word(self, word: u32) -> f64 {
        self.decode(self.raw_from_word(word))
    }
}

impl fmt::Display for FixedPointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixedPointFormat::S1615 => write!(f, "S16.15"),
            FixedPointFormat::U032 => write!(f, "U0.32"),
            FixedPointFormat::Int32 => write!(f, "INT32"),
        }
    }
}

/// Quantize `value` into `format` (see [`FixedPointFormat::encode`])
#[inline]
pub fn encode(value: f64, format: FixedPointFormat) -> ModelResult<i64> {
    format.encode(value)
}

/// Convert `raw` from `format` back to a real value
#[inline]
pub fn decode(raw: i64, format: FixedPointFormat) -> f64 {
    format.decode(raw)
}
