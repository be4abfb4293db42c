// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Kinetics Normalizer
//!
//! Closed-form peak normalization of a double-exponential synaptic kernel.
//!
//! ```text
//! kernel(t) = A·exp(-t/τa) + B·exp(-t/τb)          A > 0 > B (or A < 0 < B)
//!
//! t_rise = ln((A·τb) / (-B·τa)) · (τa·τb) / (τb - τa)
//! sf     = 1 / (exp(-t_rise/τa) - exp(-t_rise/τb))
//!
//! a_amp = sf,  b_amp = -sf
//! ```
//!
//! With these amplitudes the kernel peaks at exactly 1 at `t_rise`, whatever
//! the chosen time constants, so every channel's response is comparable once
//! it reaches the runtime.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Amplitude of the `a` component used when none is configured
pub const UNIT_AMPLITUDE_A: f64 = 1.0;
/// Amplitude of the `b` component used when none is configured
pub const UNIT_AMPLITUDE_B: f64 = -1.0;

/// Normalization constants derived for one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAmplitudes {
    /// Amplitude written for the `a` component (`sf`)
    pub a: f64,
    /// Amplitude written for the `b` component (`-sf`)
    pub b: f64,
    /// Time of the kernel's peak, same unit as the time constants
    pub rise_time: f64,
    /// Peak-normalizing scalar `sf`
    pub scalar: f64,
}

fn invalid(tau_a: f64, tau_b: f64, reason: &str) -> ModelError {
    ModelError::InvalidKinetics {
        tau_a,
        tau_b,
        reason: reason.to_string(),
    }
}

fn check_pair(tau_a: f64, tau_b: f64, amp_a: f64, amp_b: f64) -> ModelResult<()> {
    if !(tau_a.is_finite() && tau_b.is_finite()) || tau_a <= 0.0 || tau_b <= 0.0 {
        return Err(invalid(
            tau_a,
            tau_b,
            "time constants must be positive and finite",
        ));
    }
    if tau_a == tau_b {
        return Err(invalid(tau_a, tau_b, "time constants must differ"));
    }
    if !(amp_a.is_finite() && amp_b.is_finite()) || amp_a * amp_b >= 0.0 {
        return Err(invalid(
            tau_a,
            tau_b,
            "component amplitudes must be non-zero and of opposite sign",
        ));
    }
    Ok(())
}

/// Time at which `A·exp(-t/τa) + B·exp(-t/τb)` peaks
///
/// # Errors
/// [`ModelError::InvalidKinetics`] if the time constants are equal or not
/// strictly positive, or if `amp_a` and `amp_b` are not of opposite sign.
pub fn rise_time(tau_a: f64, tau_b: f64, amp_a: f64, amp_b: f64) -> ModelResult<f64> {
    check_pair(tau_a, tau_b, amp_a, amp_b)?;

    let log_ratio = ((amp_a * tau_b) / (-amp_b * tau_a)).ln();
    let t_rise = log_ratio * (tau_a * tau_b) / (tau_b - tau_a);
    if !t_rise.is_finite() {
        return Err(invalid(tau_a, tau_b, "rise time is not finite"));
    }
    Ok(t_rise)
}

/// Peak-normalizing amplitudes for a channel with unit component amplitudes
///
/// # Example
/// ```
/// use neurokin_model::kinetics::normalize;
///
/// let amps = normalize(5.0, 1.0).unwrap();
/// assert!(amps.a > 0.0 && amps.b < 0.0);
/// assert_eq!(amps.a, -amps.b);
/// assert!(normalize(1.0, 1.0).is_err());
/// ```
pub fn normalize(tau_a: f64, tau_b: f64) -> ModelResult<NormalizedAmplitudes> {
    normalize_with_amplitudes(tau_a, tau_b, UNIT_AMPLITUDE_A, UNIT_AMPLITUDE_B)
}

/// Peak-normalizing amplitudes for explicitly signed component amplitudes
///
/// The configured amplitudes only steer the rise-time derivation; the
/// returned amplitudes are always `sf` and `-sf`.
pub fn normalize_with_amplitudes(
    tau_a: f64,
    tau_b: f64,
    amp_a: f64,
    amp_b: f64,
) -> ModelResult<NormalizedAmplitudes> {
    let t_rise = rise_time(tau_a, tau_b, amp_a, amp_b)?;
    let denominator = (-t_rise / tau_a).exp() - (-t_rise / tau_b).exp();
    let scalar = 1.0 / denominator;
    if !scalar.is_finite() || scalar == 0.0 {
        return Err(invalid(
            tau_a,
            tau_b,
            "time constants too close to normalize the kernel peak",
        ));
    }

    Ok(NormalizedAmplitudes {
        a: scalar,
        b: -scalar,
        rise_time: t_rise,
        scalar,
    })
}

/// Kernel value `a·exp(-t/τa) + b·exp(-t/τb)` for already-derived amplitudes
#[inline]
pub fn kernel_response(amplitudes: &NormalizedAmplitudes, tau_a: f64, tau_b: f64, t: f64) -> f64 {
    amplitudes.a * (-t / tau_a).exp() + amplitudes.b * (-t / tau_b).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rise_time_reference_pair() {
        // ln(1/5) · 5 / (1 - 5) = ln(5) · 5/4
        let t = rise_time(5.0, 1.0, 1.0, -1.0).unwrap();
        assert!((t - 5.0_f64.ln() * 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_rise_time_is_symmetric_in_ordering() {
        let forward = rise_time(5.0, 1.0, 1.0, -1.0).unwrap();
        let swapped = rise_time(1.0, 5.0, 1.0, -1.0).unwrap();
        assert!((forward - swapped).abs() < 1e-12);
    }

    #[test]
    fn test_unit_peak() {
        for &(ta, tb) in &[(5.0, 1.0), (50.0, 1.0), (5.0, 10.0), (0.5, 20.0)] {
            let amps = normalize(ta, tb).unwrap();
            let peak = kernel_response(&amps, ta, tb, amps.rise_time);
            assert!((peak - 1.0).abs() < 1e-9, "peak {} for ({}, {})", peak, ta, tb);

            // Peak really is the maximum
            let before = kernel_response(&amps, ta, tb, amps.rise_time * 0.9);
            let after = kernel_response(&amps, ta, tb, amps.rise_time * 1.1);
            assert!(before < peak && after < peak);
        }
    }

    #[test]
    fn test_slow_b_component_flips_sign() {
        let amps = normalize(1.0, 5.0).unwrap();
        assert!(amps.a < 0.0);
        assert!(amps.b > 0.0);
    }

    #[test]
    fn test_degenerate_pairs_rejected() {
        assert!(matches!(
            normalize(1.0, 1.0),
            Err(ModelError::InvalidKinetics { .. })
        ));
        assert!(normalize(0.0, 1.0).is_err());
        assert!(normalize(-5.0, 1.0).is_err());
        assert!(normalize(f64::NAN, 1.0).is_err());
        assert!(normalize_with_amplitudes(5.0, 1.0, 1.0, 1.0).is_err());
        assert!(normalize_with_amplitudes(5.0, 1.0, -1.0, -1.0).is_err());
        assert!(normalize_with_amplitudes(5.0, 1.0, 0.0, -1.0).is_err());
    }

    #[test]
    fn test_signed_amplitudes_shift_rise_time() {
        let unit = normalize(5.0, 1.0).unwrap();
        let weighted = normalize_with_amplitudes(5.0, 1.0, 2.0, -1.0).unwrap();
        assert!(weighted.rise_time != unit.rise_time);
        assert_eq!(weighted.a, -weighted.b);
    }
}
