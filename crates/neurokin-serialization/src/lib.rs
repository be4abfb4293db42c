// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurokin Serialization
//!
//! Lays model fragments out as little-endian 32-bit words for the embedded
//! runtime loader:
//! - **Blocks**: one fragment, fixed per-channel stride, state read-back
//! - **Plasticity**: weight-dependence block, one entry per synapse type
//! - **Image**: a whole descriptor with its section table
//!
//! All sizes are computable from the declared fields alone, so callers can
//! allocate destination memory before any value is known.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod block;
pub mod error;
pub mod image;
pub mod plasticity;

pub use block::{channel_block_size, fragment_byte_size, read_back_state, serialize_fragment, write_fragment_into};
pub use error::{SerializationError, SerializationResult};
pub use image::{
    descriptor_byte_size, image_byte_size, serialize_descriptor, ImageSection, ParameterImage,
    WEIGHT_DEPENDENCE_SECTION,
};
pub use plasticity::{weight_dependence_byte_size, write_weight_dependence, BYTES_PER_SYNAPSE_TYPE};
