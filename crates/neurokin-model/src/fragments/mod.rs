// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Fragment Catalogue
//!
//! Concrete [`ModelFragment`](crate::ModelFragment) implementations, one per
//! role family.

pub mod coupling;
pub mod neuron;
pub mod synapse;

pub use coupling::{ConductanceInput, ConductanceParameters, CurrentInput, StaticThreshold};
pub use neuron::{IzhikevichNeuron, IzhikevichParameters, LeakyIntegrateFireNeuron, LifParameters};
pub use synapse::{standard_channels, ChannelConfig, CombinedExponentialSynapse, ComponentConfig};
