// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Weight-Dependence Block
//!
//! ```text
//! per synapse type (24 bytes):
//!   i32 w_min·w | i32 w_max·w | i32 scale·w_max·w | i32 boost·w_max·w | S16.15 boost_thresh | i32 causal
//! ```

use crate::error::{SerializationError, SerializationResult};
use byteorder::{ByteOrder, LittleEndian};
use neurokin_model::plasticity::{SUPPORTED_WEIGHT_TERMS, WORDS_PER_SYNAPSE_TYPE};
use neurokin_model::{FixedPointFormat, WeightDependence};

/// Bytes written per synapse type
pub const BYTES_PER_SYNAPSE_TYPE: usize = WORDS_PER_SYNAPSE_TYPE * FixedPointFormat::WORD_BYTES;

const WORD_FORMATS: [(&str, FixedPointFormat); WORDS_PER_SYNAPSE_TYPE] = [
    ("w_min", FixedPointFormat::Int32),
    ("w_max", FixedPointFormat::Int32),
    ("scale", FixedPointFormat::Int32),
    ("boost", FixedPointFormat::Int32),
    ("boost_thresh", FixedPointFormat::S1615),
    ("causal", FixedPointFormat::Int32),
];

fn check_terms(n_weight_terms: usize) -> SerializationResult<()> {
    if n_weight_terms != SUPPORTED_WEIGHT_TERMS {
        return Err(SerializationError::UnsupportedTermCount {
            requested: n_weight_terms,
            supported: SUPPORTED_WEIGHT_TERMS,
        });
    }
    Ok(())
}

/// Size of the block for `n_synapse_types`, known before any value is
///
/// # Errors
/// [`SerializationError::UnsupportedTermCount`] unless exactly one weight
/// term is requested.
pub fn weight_dependence_byte_size(n_synapse_types: usize, n_weight_terms: usize) -> SerializationResult<usize> {
    check_terms(n_weight_terms)?;
    Ok(BYTES_PER_SYNAPSE_TYPE * n_synapse_types)
}

/// Write one block per synapse type, using that type's weight scale
///
/// # Example
/// ```
/// use neurokin_model::WeightDependence;
/// use neurokin_serialization::write_weight_dependence;
///
/// let dep = WeightDependence::new(0.0, 1.0).unwrap();
/// assert_eq!(write_weight_dependence(&dep, &[1.0], 1).unwrap().len(), 24);
/// assert_eq!(write_weight_dependence(&dep, &[1.0, 2.0], 1).unwrap().len(), 48);
/// assert!(write_weight_dependence(&dep, &[1.0], 2).is_err());
/// ```
pub fn write_weight_dependence(
    dependence: &WeightDependence,
    weight_scales: &[f64],
    n_weight_terms: usize,
) -> SerializationResult<Vec<u8>> {
    let size = weight_dependence_byte_size(weight_scales.len(), n_weight_terms)?;
    dependence.validate()?;

    let mut bytes = vec![0u8; size];
    for (synapse_type, &scale) in weight_scales.iter().enumerate() {
        let block = &mut bytes[synapse_type * BYTES_PER_SYNAPSE_TYPE..(synapse_type + 1) * BYTES_PER_SYNAPSE_TYPE];
        for (word_index, value) in dependence.words_for(scale).into_iter().enumerate() {
            let (name, format) = WORD_FORMATS[word_index];
            let word = format
                .encode_word(value)
                .map_err(|source| SerializationError::FieldEncoding {
                    field: format!("{}[{}]", name, synapse_type),
                    source,
                })?;
            let offset = word_index * FixedPointFormat::WORD_BYTES;
            LittleEndian::write_u32(&mut block[offset..offset + FixedPointFormat::WORD_BYTES], word);
        }
    }

    tracing::debug!(synapse_types = weight_scales.len(), bytes = size, "wrote weight dependence");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(bytes: &[u8]) -> Vec<i32> {
        bytes.chunks_exact(4).map(LittleEndian::read_i32).collect()
    }

    #[test]
    fn test_word_order_for_single_type() {
        let dep = WeightDependence::new(0.0, 1.0).unwrap().with_boost(0.5, 1000.0);
        let bytes = write_weight_dependence(&dep, &[100.0], 1).unwrap();
        assert_eq!(words(&bytes), vec![0, 100, 100, 50, 1000 * 32_768, 1]);
    }

    #[test]
    fn test_each_type_uses_its_own_scale() {
        let dep = WeightDependence::new(0.5, 2.0).unwrap().with_causal(false);
        let bytes = write_weight_dependence(&dep, &[10.0, 20.0], 1).unwrap();
        let words = words(&bytes);
        assert_eq!(&words[0..4], &[5, 20, 20, 0]);
        assert_eq!(&words[6..10], &[10, 40, 40, 0]);
        assert_eq!(words[11], 0);
    }

    #[test]
    fn test_term_count_enforced() {
        assert_eq!(weight_dependence_byte_size(2, 1).unwrap(), 48);
        assert_eq!(
            weight_dependence_byte_size(2, 2),
            Err(SerializationError::UnsupportedTermCount {
                requested: 2,
                supported: 1
            })
        );
        assert!(weight_dependence_byte_size(1, 0).is_err());
    }

    #[test]
    fn test_oversized_bound_reports_field() {
        let dep = WeightDependence::new(0.0, 1.0).unwrap();
        let err = write_weight_dependence(&dep, &[1.0e12], 1).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::FieldEncoding { ref field, .. } if field == "w_max[0]"
        ));
    }
}
