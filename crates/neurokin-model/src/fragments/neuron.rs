// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neuron Dynamics Fragments
//!
//! ## Izhikevich
//!
//! ```text
//! dv/dt = 0.04v² + 5v + 140 - u + I
//! du/dt = a(bv - u)
//! if v ≥ 30 mV: v ← c, u ← u + d
//!
//! Wire block: a, b, c, d, v, u, i_offset, this_h
//! ```
//!
//! ## Leaky Integrate-and-Fire
//!
//! ```text
//! τm·dV/dt = -(V - V_rest) + R·I        R = τm / cm
//!
//! Wire block: v, v_rest, r_membrane, exp(-dt/τm), i_offset,
//!             refract_timer, v_reset, tau_refrac (in steps)
//! ```

use crate::error::ModelResult;
use crate::fixed_point::FixedPointFormat;
use crate::fragment::{FragmentRole, ModelFragment};
use crate::registry::{FieldSpec, FieldValues, ParameterRegistry, WireEncoding};
use serde::{Deserialize, Serialize};

/// Runtime cycles per neuron for one Izhikevich update
pub const IZHIKEVICH_CYCLES_PER_NEURON: usize = 150;
/// Runtime cycles per neuron for one LIF update
pub const LIF_CYCLES_PER_NEURON: usize = 80;

/// Izhikevich model parameters and initial state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IzhikevichParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub i_offset: f64,
    /// Initial membrane potential (mV)
    pub v: f64,
    /// Initial recovery variable
    pub u: f64,
}

impl Default for IzhikevichParameters {
    fn default() -> Self {
        Self {
            a: 0.02,
            b: 0.2,
            c: -65.0,
            d: 2.0,
            i_offset: 0.0,
            v: -70.0,
            u: -14.0,
        }
    }
}

/// Izhikevich neuron dynamics
#[derive(Debug, Clone)]
pub struct IzhikevichNeuron {
    registry: ParameterRegistry,
}

impl IzhikevichNeuron {
    pub fn new(params: &IzhikevichParameters) -> ModelResult<Self> {
        let mut registry = ParameterRegistry::new();
        registry.declare(FieldSpec::parameter("a", "ms", params.a))?;
        registry.declare(FieldSpec::parameter("b", "ms", params.b))?;
        registry.declare(FieldSpec::parameter("c", "mV", params.c))?;
        registry.declare(FieldSpec::parameter("d", "mV/ms", params.d))?;
        registry.declare(FieldSpec::state("v", "mV", params.v))?;
        registry.declare(FieldSpec::state("u", "mV/ms", params.u))?;
        registry.declare(FieldSpec::parameter("i_offset", "nA", params.i_offset))?;
        // Integration step carried between ticks; the runtime starts it at dt
        registry.declare(FieldSpec::state("this_h", "ms", 0.0).encoding(WireEncoding::StepMillis))?;
        Ok(Self { registry })
    }
}

impl ModelFragment for IzhikevichNeuron {
    fn role(&self) -> FragmentRole {
        FragmentRole::NeuronDynamics
    }

    fn model_name(&self) -> &str {
        "izk"
    }

    fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    fn values_mut(&mut self) -> FieldValues<'_> {
        FieldValues::new(&mut self.registry)
    }

    fn n_cpu_cycles(&self, n_neurons: usize) -> usize {
        IZHIKEVICH_CYCLES_PER_NEURON * n_neurons
    }
}

/// Leaky integrate-and-fire parameters and initial state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifParameters {
    /// Membrane time constant (ms)
    pub tau_m: f64,
    /// Membrane capacitance (nF)
    pub cm: f64,
    pub v_rest: f64,
    pub v_reset: f64,
    /// Refractory period (ms)
    pub tau_refrac: f64,
    pub i_offset: f64,
    /// Initial membrane potential (mV)
    pub v: f64,
}

impl Default for LifParameters {
    fn default() -> Self {
        Self {
            tau_m: 20.0,
            cm: 1.0,
            v_rest: -65.0,
            v_reset: -65.0,
            tau_refrac: 0.1,
            i_offset: 0.0,
            v: -65.0,
        }
    }
}

/// Leaky integrate-and-fire neuron dynamics
#[derive(Debug, Clone)]
pub struct LeakyIntegrateFireNeuron {
    registry: ParameterRegistry,
}

impl LeakyIntegrateFireNeuron {
    pub fn new(params: &LifParameters) -> ModelResult<Self> {
        let mut registry = ParameterRegistry::new();
        registry.declare(FieldSpec::state("v", "mV", params.v))?;
        registry.declare(FieldSpec::parameter("v_rest", "mV", params.v_rest))?;
        registry.declare(FieldSpec::parameter("r_membrane", "MOhm", 0.0))?;
        registry.declare(
            FieldSpec::parameter("tau_m", "ms", params.tau_m)
                .format(FixedPointFormat::U032)
                .encoding(WireEncoding::StepDecay),
        )?;
        registry.declare(FieldSpec::parameter("i_offset", "nA", params.i_offset))?;
        registry.declare(FieldSpec::state("refract_timer", "steps", 0.0).format(FixedPointFormat::Int32))?;
        registry.declare(FieldSpec::parameter("v_reset", "mV", params.v_reset))?;
        registry.declare(
            FieldSpec::parameter("tau_refrac", "ms", params.tau_refrac)
                .format(FixedPointFormat::Int32)
                .encoding(WireEncoding::StepCount),
        )?;
        registry.declare(FieldSpec::parameter("cm", "nF", params.cm).hidden())?;
        registry.derive_ratio("tau_m", "cm", "r_membrane")?;
        Ok(Self { registry })
    }
}

impl ModelFragment for LeakyIntegrateFireNeuron {
    fn role(&self) -> FragmentRole {
        FragmentRole::NeuronDynamics
    }

    fn model_name(&self) -> &str {
        "lif"
    }

    fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    fn values_mut(&mut self) -> FieldValues<'_> {
        FieldValues::new(&mut self.registry)
    }

    fn n_cpu_cycles(&self, n_neurons: usize) -> usize {
        LIF_CYCLES_PER_NEURON * n_neurons
    }
}
