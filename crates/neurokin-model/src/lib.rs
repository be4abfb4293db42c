// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurokin Model Layer
//!
//! Turns biologically parameterized neuron and synapse kinetics into values
//! ready for a fixed-point embedded runtime:
//! - **Fixed-point codec**: S16.15, U0.32 and INT32 words with strict range checks
//! - **Kinetics**: peak normalization of double-exponential synaptic kernels
//! - **Decay**: per-timestep decay and initial-kick factors
//! - **Registry**: ordered, named parameter/state fields per fragment
//! - **Fragments**: neuron, synapse, input and threshold building blocks
//! - **Descriptor**: four fragments composed into one model
//! - **Plasticity**: weight-dependence descriptor
//!
//! Byte layout lives in `neurokin-serialization`.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod builds;
pub mod decay;
pub mod descriptor;
pub mod error;
pub mod fixed_point;
pub mod fragment;
pub mod fragments;
pub mod kinetics;
pub mod plasticity;
pub mod registry;

pub use decay::{decay_factors, DecayFactors, Timestep};
pub use descriptor::{ModelDescriptor, DEFAULT_MAX_ATOMS_PER_CORE};
pub use error::{ModelError, ModelResult};
pub use fixed_point::FixedPointFormat;
pub use fragment::{FragmentRole, ModelFragment};
pub use kinetics::{normalize, NormalizedAmplitudes};
pub use plasticity::WeightDependence;
pub use registry::{ChannelId, Field, FieldKind, FieldSpec, FieldValues, ParameterRegistry, WireEncoding, WireSlot};
