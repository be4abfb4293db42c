// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Parameter Image
//!
//! The full byte image of one model descriptor:
//!
//! ```text
//! | neuron | input | threshold | synapse (N × stride) | weight dependence (optional) |
//! ```
//!
//! Every section records its offset and length so the loader can place it.
//! An image is regenerated on every build and never patched in place.

use crate::block::write_fragment_into;
use crate::error::{SerializationError, SerializationResult};
use crate::plasticity::{weight_dependence_byte_size, write_weight_dependence};
use neurokin_model::{ModelDescriptor, Timestep, WeightDependence};
use serde::Serialize;

/// Name of the section holding the weight-dependence block
pub const WEIGHT_DEPENDENCE_SECTION: &str = "weight_dependence";

/// Location of one section inside an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSection {
    pub name: String,
    pub offset: usize,
    pub length: usize,
}

/// Bytes of one descriptor plus their section table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterImage {
    model_name: String,
    binary_name: String,
    timestep_us: u32,
    n_synapse_types: usize,
    sections: Vec<ImageSection>,
    #[serde(skip)]
    bytes: Vec<u8>,
}

impl ParameterImage {
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    pub fn timestep(&self) -> u32 {
        self.timestep_us
    }

    pub fn n_synapse_types(&self) -> usize {
        self.n_synapse_types
    }

    pub fn sections(&self) -> &[ImageSection] {
        &self.sections
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes of a named section
    pub fn section(&self, name: &str) -> Option<&[u8]> {
        self.sections
            .iter()
            .find(|section| section.name == name)
            .map(|section| &self.bytes[section.offset..section.offset + section.length])
    }

    /// Append a weight-dependence block covering every synapse type
    ///
    /// An image carries at most one such block; a second append fails with
    /// [`SerializationError::DuplicateSection`] and leaves the image as is.
    pub fn append_weight_dependence(
        &mut self,
        dependence: &WeightDependence,
        weight_scales: &[f64],
        n_weight_terms: usize,
    ) -> SerializationResult<()> {
        if self.section(WEIGHT_DEPENDENCE_SECTION).is_some() {
            return Err(SerializationError::DuplicateSection(WEIGHT_DEPENDENCE_SECTION.to_string()));
        }
        if weight_scales.len() != self.n_synapse_types {
            return Err(SerializationError::ChannelScaleMismatch {
                expected: self.n_synapse_types,
                actual: weight_scales.len(),
            });
        }
        let block = write_weight_dependence(dependence, weight_scales, n_weight_terms)?;
        self.sections.push(ImageSection {
            name: WEIGHT_DEPENDENCE_SECTION.to_string(),
            offset: self.bytes.len(),
            length: block.len(),
        });
        self.bytes.extend_from_slice(&block);
        Ok(())
    }

    /// JSON description of the section table (bytes omitted)
    pub fn describe(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Size of a descriptor's image without weight dependence
pub fn descriptor_byte_size(descriptor: &ModelDescriptor) -> usize {
    descriptor.byte_size()
}

/// Size of a descriptor's image, optionally with a weight-dependence block
pub fn image_byte_size(descriptor: &ModelDescriptor, n_weight_terms: Option<usize>) -> SerializationResult<usize> {
    let plasticity = match n_weight_terms {
        Some(terms) => weight_dependence_byte_size(descriptor.n_synapse_types(), terms)?,
        None => 0,
    };
    Ok(descriptor_byte_size(descriptor) + plasticity)
}

/// Serialize every fragment of a descriptor into one image
///
/// `weight_scales` holds one entry per synapse type of the descriptor, in
/// synapse-type order; each fragment receives the slice for its channels.
pub fn serialize_descriptor(
    descriptor: &ModelDescriptor,
    weight_scales: &[f64],
    timestep: Timestep,
) -> SerializationResult<ParameterImage> {
    let n_synapse_types = descriptor.n_synapse_types();
    if weight_scales.len() != n_synapse_types {
        return Err(SerializationError::ChannelScaleMismatch {
            expected: n_synapse_types,
            actual: weight_scales.len(),
        });
    }

    let total = descriptor_byte_size(descriptor);
    let mut bytes = vec![0u8; total];
    let mut sections = Vec::with_capacity(4);
    let mut offset = 0;
    let mut channel_offset = 0;

    for fragment in descriptor.fragments() {
        let length = fragment.byte_size();
        let n_channels = fragment.n_channels();
        write_fragment_into(
            fragment,
            &weight_scales[channel_offset..channel_offset + n_channels],
            timestep,
            &mut bytes[offset..offset + length],
        )?;
        tracing::debug!(
            section = fragment.role().as_str(),
            offset,
            length,
            "placed image section"
        );
        sections.push(ImageSection {
            name: fragment.role().as_str().to_string(),
            offset,
            length,
        });
        offset += length;
        channel_offset += n_channels;
    }

    tracing::info!(
        model = descriptor.model_name(),
        bytes = total,
        synapse_types = n_synapse_types,
        "built parameter image"
    );

    Ok(ParameterImage {
        model_name: descriptor.model_name().to_string(),
        binary_name: descriptor.binary_name().to_string(),
        timestep_us: timestep.as_micros(),
        n_synapse_types,
        sections,
        bytes,
    })
}
