// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Model Fragment Contract
//!
//! Every piece of a model (neuron dynamics, synapse kinetics, input coupling,
//! threshold rule) is a value implementing [`ModelFragment`]. A fragment owns
//! a [`ParameterRegistry`]; the generic accessors below are all routed
//! through it, so a fragment only has to declare its fields once.
//!
//! ## Adding a New Fragment
//!
//! 1. Create `src/fragments/your_fragment.rs`
//! 2. Declare its fields (in wire order) into a `ParameterRegistry`
//! 3. Implement `ModelFragment` (role, name, registry, CPU cost)
//! 4. Add tests and export it from `fragments/mod.rs`

use crate::error::ModelResult;
use crate::registry::{ChannelId, FieldValues, ParameterRegistry};
use core::fmt::Debug;
use serde::{Deserialize, Serialize};

/// Slot a fragment fills inside a model descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentRole {
    NeuronDynamics,
    SynapseKinetics,
    InputCoupling,
    Threshold,
}

impl FragmentRole {
    /// Order in which sections are laid out in a parameter image
    pub const IMAGE_ORDER: [FragmentRole; 4] = [
        FragmentRole::NeuronDynamics,
        FragmentRole::InputCoupling,
        FragmentRole::Threshold,
        FragmentRole::SynapseKinetics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentRole::NeuronDynamics => "neuron",
            FragmentRole::SynapseKinetics => "synapse",
            FragmentRole::InputCoupling => "input",
            FragmentRole::Threshold => "threshold",
        }
    }
}

/// Capability contract shared by all model fragments
///
/// Fragments never reach into each other: all cross-fragment figures (total
/// channel count, total CPU cost) are sums over independent fragments.
pub trait ModelFragment: Debug + Send + Sync {
    /// Which descriptor slot this fragment fills
    fn role(&self) -> FragmentRole;

    /// Short model name, e.g. `"izk"` or `"comb_exp_2E2I"`
    fn model_name(&self) -> &str;

    fn registry(&self) -> &ParameterRegistry;

    /// Value-only access; the fragment's shape is fixed once built
    fn values_mut(&mut self) -> FieldValues<'_>;

    /// Estimated runtime cycles per step for `n_neurons` neurons
    fn n_cpu_cycles(&self, n_neurons: usize) -> usize;

    fn value_of(&self, name: &str) -> ModelResult<f64> {
        self.registry().value_of(name)
    }

    fn set_value(&mut self, name: &str, value: f64) -> ModelResult<()> {
        self.values_mut().set_value(name, value)
    }

    fn unit_of(&self, name: &str) -> ModelResult<&str> {
        self.registry().unit_of(name)
    }

    fn has_field(&self, name: &str) -> bool {
        self.registry().has_field(name)
    }

    /// Synapse channels this fragment contributes to the runtime
    fn n_channels(&self) -> usize {
        self.registry().channel_count()
    }

    fn channel_id_for(&self, target: &str) -> Option<ChannelId> {
        self.registry().channel_id_for(target)
    }

    /// Bytes this fragment occupies in a parameter image
    fn byte_size(&self) -> usize {
        self.registry().byte_size()
    }
}
