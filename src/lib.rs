// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurokin
//!
//! Builds fixed-point parameter images for neuron models whose synapses are
//! any number of named combined-exponential channels. A model is composed
//! from four fragments (neuron dynamics, input coupling, threshold, synapse
//! kinetics); each fragment declares its fields once and the serializer lays
//! them out for the embedded runtime.
//!
//! ## Quick Start
//!
//! ```rust
//! use neurokin::model::builds::izk_curr_comb_exp;
//! use neurokin::model::fragments::{standard_channels, IzhikevichParameters};
//! use neurokin::model::Timestep;
//! use neurokin::serialization::serialize_descriptor;
//!
//! let model = izk_curr_comb_exp(&IzhikevichParameters::default(), &standard_channels(2, 2))?;
//! let image = serialize_descriptor(&model, &[1.0; 4], Timestep::from_micros(1000)?)?;
//! assert_eq!(image.len(), model.byte_size());
//! # Ok::<(), neurokin::NeurokinError>(())
//! ```
//!
//! ## From a configuration file
//!
//! ```rust,no_run
//! use neurokin::config::{load_config, validate_config};
//! use neurokin::build_population_images;
//!
//! let config = load_config(None, None)?;
//! validate_config(&config)?;
//! for built in build_population_images(&config)? {
//!     println!("{}: {} bytes", built.population, built.image.len());
//! }
//! # Ok::<(), neurokin::NeurokinError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  neurokin-model                                         │
//! │  (codec, kinetics, registry, fragments, descriptors)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  neurokin-serialization                                 │
//! │  (fragment blocks, weight dependence, parameter images) │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  neurokin (this crate)                                  │
//! │  (config → descriptor assembly, parallel builds)        │
//! └─────────────────────────────────────────────────────────┘
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use neurokin_config as config;
pub use neurokin_model as model;
pub use neurokin_observability as observability;
pub use neurokin_serialization as serialization;

pub mod assembly;
pub mod build;
pub mod error;

pub use assembly::assemble_descriptor;
pub use build::{build_population_image, build_population_images, write_population_images, PopulationImage};
pub use error::{NeurokinError, NeurokinResult};

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::model::fragments::{standard_channels, ChannelConfig};
    pub use crate::model::{
        FixedPointFormat, FragmentRole, ModelDescriptor, ModelFragment, Timestep, WeightDependence,
    };
    pub use crate::serialization::{serialize_descriptor, ParameterImage};
    pub use crate::{assemble_descriptor, build_population_images, NeurokinError, NeurokinResult};
}
