// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Input-coupling and threshold fragments

use crate::error::ModelResult;
use crate::fragment::{FragmentRole, ModelFragment};
use crate::registry::{FieldSpec, FieldValues, ParameterRegistry};
use serde::{Deserialize, Serialize};

/// Runtime cycles per neuron for current-based input
pub const CURRENT_INPUT_CYCLES_PER_NEURON: usize = 10;
/// Runtime cycles per neuron for conductance-based input
pub const CONDUCTANCE_INPUT_CYCLES_PER_NEURON: usize = 20;
/// Runtime cycles per neuron for a static threshold check
pub const STATIC_THRESHOLD_CYCLES_PER_NEURON: usize = 10;

/// Synaptic response is injected as current; nothing to configure
#[derive(Debug, Clone, Default)]
pub struct CurrentInput {
    registry: ParameterRegistry,
}

impl CurrentInput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelFragment for CurrentInput {
    fn role(&self) -> FragmentRole {
        FragmentRole::InputCoupling
    }

    fn model_name(&self) -> &str {
        "curr"
    }

    fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    fn values_mut(&mut self) -> FieldValues<'_> {
        FieldValues::new(&mut self.registry)
    }

    fn n_cpu_cycles(&self, n_neurons: usize) -> usize {
        CURRENT_INPUT_CYCLES_PER_NEURON * n_neurons
    }
}

/// Reversal potentials for conductance-based input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductanceParameters {
    pub e_rev_e: f64,
    pub e_rev_i: f64,
}

impl Default for ConductanceParameters {
    fn default() -> Self {
        Self {
            e_rev_e: 0.0,
            e_rev_i: -70.0,
        }
    }
}

/// Synaptic response scales a conductance against reversal potentials
#[derive(Debug, Clone)]
pub struct ConductanceInput {
    registry: ParameterRegistry,
}

impl ConductanceInput {
    pub fn new(params: &ConductanceParameters) -> ModelResult<Self> {
        let mut registry = ParameterRegistry::new();
        registry.declare(FieldSpec::parameter("e_rev_E", "mV", params.e_rev_e))?;
        registry.declare(FieldSpec::parameter("e_rev_I", "mV", params.e_rev_i))?;
        Ok(Self { registry })
    }
}

impl ModelFragment for ConductanceInput {
    fn role(&self) -> FragmentRole {
        FragmentRole::InputCoupling
    }

    fn model_name(&self) -> &str {
        "cond"
    }

    fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    fn values_mut(&mut self) -> FieldValues<'_> {
        FieldValues::new(&mut self.registry)
    }

    fn n_cpu_cycles(&self, n_neurons: usize) -> usize {
        CONDUCTANCE_INPUT_CYCLES_PER_NEURON * n_neurons
    }
}

/// Fixed firing threshold
#[derive(Debug, Clone)]
pub struct StaticThreshold {
    registry: ParameterRegistry,
}

impl StaticThreshold {
    pub fn new(v_thresh: f64) -> ModelResult<Self> {
        let mut registry = ParameterRegistry::new();
        registry.declare(FieldSpec::parameter("v_thresh", "mV", v_thresh))?;
        Ok(Self { registry })
    }
}

impl ModelFragment for StaticThreshold {
    fn role(&self) -> FragmentRole {
        FragmentRole::Threshold
    }

    fn model_name(&self) -> &str {
        "static"
    }

    fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    fn values_mut(&mut self) -> FieldValues<'_> {
        FieldValues::new(&mut self.registry)
    }

    fn n_cpu_cycles(&self, n_neurons: usize) -> usize {
        STATIC_THRESHOLD_CYCLES_PER_NEURON * n_neurons
    }
}
