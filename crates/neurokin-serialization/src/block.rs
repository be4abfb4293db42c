// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Fragment Blocks
//!
//! Writes one fragment's wire slots, in declaration order, as little-endian
//! 32-bit words.
//!
//! ```text
//! | non-channel slots | channel 0 block | channel 1 block | ... | channel N-1 block |
//!                     |<---- stride --->|
//! ```
//!
//! Channel-bound slots must form one contiguous run, grouped by channel in
//! channel order, with every channel block the same size. The size of a
//! block depends only on the declared slots, never on their values.

use crate::error::{SerializationError, SerializationResult};
use byteorder::{ByteOrder, LittleEndian};
use neurokin_model::{ChannelId, FieldKind, ModelFragment, ParameterRegistry, Timestep, WireEncoding};

const WORD: usize = 4;

fn non_uniform(registry: &ParameterRegistry, channel: ChannelId, reason: impl Into<String>) -> SerializationError {
    SerializationError::NonUniformChannelBlock {
        channel: registry.channel_name(channel).unwrap_or("<undeclared>").to_string(),
        reason: reason.into(),
    }
}

/// Bytes one channel occupies, `None` for a fragment without channels
///
/// # Errors
/// [`SerializationError::NonUniformChannelBlock`] if channel blocks are
/// interleaved, out of order, missing or of different sizes.
pub fn channel_block_size(fragment: &dyn ModelFragment) -> SerializationResult<Option<usize>> {
    let registry = fragment.registry();
    let n_channels = registry.channel_count();
    if n_channels == 0 {
        return Ok(None);
    }

    let mut sizes = vec![0usize; n_channels];
    let mut last: Option<ChannelId> = None;
    let mut run_ended = false;

    for slot in registry.wire_slots() {
        let Some(channel) = slot.channel() else {
            run_ended |= last.is_some();
            continue;
        };
        if run_ended {
            return Err(non_uniform(registry, channel, "channel fields are not contiguous"));
        }
        let in_order = match last {
            None => channel == 0,
            Some(previous) => channel == previous || channel == previous + 1,
        };
        if !in_order {
            return Err(non_uniform(registry, channel, "channel blocks are out of declaration order"));
        }
        last = Some(channel);
        sizes[channel] += slot.byte_size();
    }

    if last != Some(n_channels - 1) {
        let missing = last.map(|c| c + 1).unwrap_or(0);
        return Err(non_uniform(registry, missing, "channel has no wire fields"));
    }

    let stride = sizes[0];
    if let Some((channel, size)) = sizes.iter().enumerate().find(|&(_, &size)| size != stride) {
        return Err(non_uniform(
            registry,
            channel,
            format!("block is {} bytes, first channel's is {}", size, stride),
        ));
    }
    Ok(Some(stride))
}

/// Bytes the fragment occupies; needs no field values
pub fn fragment_byte_size(fragment: &dyn ModelFragment) -> usize {
    fragment.registry().byte_size()
}

fn check_scales(fragment: &dyn ModelFragment, weight_scales: &[f64]) -> SerializationResult<()> {
    let expected = fragment.n_channels();
    if weight_scales.len() != expected {
        return Err(SerializationError::ChannelScaleMismatch {
            expected,
            actual: weight_scales.len(),
        });
    }
    if expected > 0 && weight_scales.iter().all(|&scale| scale == 0.0) {
        tracing::warn!(
            model = fragment.model_name(),
            "all weight scales are zero; every weight-scaled field will be written as 0"
        );
    }
    Ok(())
}

/// Write a fragment into a pre-sized destination slice
///
/// `destination` must be exactly [`fragment_byte_size`] bytes long.
pub fn write_fragment_into(
    fragment: &dyn ModelFragment,
    weight_scales: &[f64],
    timestep: Timestep,
    destination: &mut [u8],
) -> SerializationResult<()> {
    check_scales(fragment, weight_scales)?;
    channel_block_size(fragment)?;

    let registry = fragment.registry();
    let expected = registry.byte_size();
    if destination.len() != expected {
        return Err(SerializationError::ImageSizeMismatch {
            expected,
            actual: destination.len(),
        });
    }

    for (index, slot) in registry.wire_slots().iter().enumerate() {
        let scale = slot.channel().map(|channel| weight_scales[channel]).unwrap_or(1.0);
        let encoding_error = |source| SerializationError::FieldEncoding {
            field: slot.label().to_string(),
            source,
        };
        let value = registry
            .resolve_slot(slot, timestep, scale)
            .map_err(encoding_error)?;
        let word = slot.format().encode_word(value).map_err(encoding_error)?;
        LittleEndian::write_u32(&mut destination[index * WORD..(index + 1) * WORD], word);
    }

    tracing::debug!(
        model = fragment.model_name(),
        slots = registry.wire_slots().len(),
        bytes = expected,
        "serialized fragment"
    );
    Ok(())
}

/// Serialize one fragment into a fresh byte vector
///
/// `weight_scales` holds one entry per channel of the fragment (empty for
/// fragments without channels). Every call re-derives and re-encodes every
/// field; nothing is cached between calls.
pub fn serialize_fragment(
    fragment: &dyn ModelFragment,
    weight_scales: &[f64],
    timestep: Timestep,
) -> SerializationResult<Vec<u8>> {
    let mut bytes = vec![0u8; fragment_byte_size(fragment)];
    write_fragment_into(fragment, weight_scales, timestep, &mut bytes)?;
    Ok(bytes)
}

/// Copy state fields back from a block produced by the runtime
///
/// Only state fields written as-is are read back; parameters and derived
/// words are left alone. Returns the number of fields updated.
pub fn read_back_state(fragment: &mut dyn ModelFragment, bytes: &[u8]) -> SerializationResult<usize> {
    let expected = fragment_byte_size(fragment);
    if bytes.len() != expected {
        return Err(SerializationError::ImageSizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    let updates: Vec<(String, f64)> = {
        let registry = fragment.registry();
        let fields = registry.fields();
        registry
            .wire_slots()
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.encoding() == WireEncoding::Direct && fields[slot.field_index()].kind() == FieldKind::State
            })
            .map(|(index, slot)| {
                let word = LittleEndian::read_u32(&bytes[index * WORD..(index + 1) * WORD]);
                (fields[slot.field_index()].name().to_string(), slot.format().decode_word(word))
            })
            .collect()
    };

    let mut values = fragment.values_mut();
    for (name, value) in &updates {
        values.set_value(name, *value)?;
    }
    tracing::debug!(fields = updates.len(), "read back state fields");
    Ok(updates.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurokin_model::fragments::{
        ChannelConfig, CombinedExponentialSynapse, IzhikevichNeuron, IzhikevichParameters,
    };
    use neurokin_model::{FieldSpec, FieldValues, FixedPointFormat, FragmentRole, ModelError};

    /// Fragment with an arbitrary registry, for layout checks
    #[derive(Debug)]
    struct RawFragment(ParameterRegistry);

    impl ModelFragment for RawFragment {
        fn role(&self) -> FragmentRole {
            FragmentRole::SynapseKinetics
        }
        fn model_name(&self) -> &str {
            "raw"
        }
        fn registry(&self) -> &ParameterRegistry {
            &self.0
        }
        fn values_mut(&mut self) -> FieldValues<'_> {
            FieldValues::new(&mut self.0)
        }
        fn n_cpu_cycles(&self, _n_neurons: usize) -> usize {
            0
        }
    }

    fn word(bytes: &[u8], index: usize) -> u32 {
        LittleEndian::read_u32(&bytes[index * 4..index * 4 + 4])
    }

    #[test]
    fn test_channel_block_field_order() {
        let synapse = CombinedExponentialSynapse::new(&[ChannelConfig::new("excitatory", 5.0, 1.0)
            .with_responses(0.5, -0.25)])
        .unwrap();
        let bytes = serialize_fragment(&synapse, &[2.0], Timestep::default()).unwrap();
        assert_eq!(bytes.len(), 24);

        let s1615 = FixedPointFormat::S1615;
        let u032 = FixedPointFormat::U032;
        let (a, b) = synapse.amplitudes("excitatory").unwrap();
        assert_eq!(word(&bytes, 0), s1615.encode_word(0.5).unwrap());
        assert_eq!(word(&bytes, 1), s1615.encode_word(a * 2.0).unwrap());
        assert_eq!(word(&bytes, 2), u032.encode_word((-0.2f64).exp()).unwrap());
        assert_eq!(word(&bytes, 3), s1615.encode_word(-0.25).unwrap());
        assert_eq!(word(&bytes, 4), s1615.encode_word(b * 2.0).unwrap());
        assert_eq!(word(&bytes, 5), u032.encode_word((-1.0f64).exp()).unwrap());
    }

    #[test]
    fn test_scale_count_must_match_channels() {
        let synapse = CombinedExponentialSynapse::standard(2, 2).unwrap();
        let result = serialize_fragment(&synapse, &[1.0, 1.0], Timestep::default());
        assert_eq!(
            result,
            Err(SerializationError::ChannelScaleMismatch {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn test_mixed_init_terms_rejected() {
        let synapse = CombinedExponentialSynapse::new(&[
            ChannelConfig::new("excitatory", 5.0, 1.0).with_init(),
            ChannelConfig::new("inhibitory", 5.0, 10.0),
        ])
        .unwrap();
        assert!(matches!(
            channel_block_size(&synapse),
            Err(SerializationError::NonUniformChannelBlock { .. })
        ));
        assert!(serialize_fragment(&synapse, &[1.0, 1.0], Timestep::default()).is_err());
    }

    #[test]
    fn test_interleaved_channels_rejected() {
        let mut registry = ParameterRegistry::new();
        let first = registry.declare_channel("first").unwrap();
        let second = registry.declare_channel("second").unwrap();
        registry.declare(FieldSpec::parameter("x0", "", 0.0).channel(first)).unwrap();
        registry.declare(FieldSpec::parameter("x1", "", 0.0).channel(second)).unwrap();
        registry.declare(FieldSpec::parameter("y0", "", 0.0).channel(first)).unwrap();
        let fragment = RawFragment(registry);
        assert!(matches!(
            channel_block_size(&fragment),
            Err(SerializationError::NonUniformChannelBlock { channel, .. }) if channel == "first"
        ));
    }

    #[test]
    fn test_out_of_range_amplitude_reports_field() {
        let synapse = CombinedExponentialSynapse::new(&[ChannelConfig::new("excitatory", 5.0, 1.0)]).unwrap();
        let err = serialize_fragment(&synapse, &[1.0e6], Timestep::default()).unwrap_err();
        match err {
            SerializationError::FieldEncoding { field, source } => {
                assert_eq!(field, "excitatory_a_A");
                assert!(matches!(source, ModelError::OutOfRange { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_timestep_changes_decay_words() {
        let synapse = CombinedExponentialSynapse::standard(1, 0).unwrap();
        let fast = serialize_fragment(&synapse, &[1.0], Timestep::from_micros(100).unwrap()).unwrap();
        let slow = serialize_fragment(&synapse, &[1.0], Timestep::default()).unwrap();
        assert_eq!(fast.len(), slow.len());
        assert_ne!(word(&fast, 2), word(&slow, 2));
        assert_eq!(word(&fast, 1), word(&slow, 1));
    }

    #[test]
    fn test_izhikevich_step_word_and_read_back() {
        let mut neuron = IzhikevichNeuron::new(&IzhikevichParameters::default()).unwrap();
        let ts = Timestep::from_micros(500).unwrap();
        let mut bytes = serialize_fragment(&neuron, &[], ts).unwrap();
        assert_eq!(word(&bytes, 7), FixedPointFormat::S1615.encode_word(0.5).unwrap());

        // Runtime advanced v and u, and scribbled over a parameter
        let s1615 = FixedPointFormat::S1615;
        LittleEndian::write_u32(&mut bytes[16..20], s1615.encode_word(-60.0).unwrap());
        LittleEndian::write_u32(&mut bytes[20..24], s1615.encode_word(-12.5).unwrap());
        LittleEndian::write_u32(&mut bytes[0..4], s1615.encode_word(9.0).unwrap());

        let updated = read_back_state(&mut neuron, &bytes).unwrap();
        assert_eq!(updated, 2);
        assert_eq!(neuron.value_of("v").unwrap(), -60.0);
        assert_eq!(neuron.value_of("u").unwrap(), -12.5);
        assert_eq!(neuron.value_of("a").unwrap(), 0.02);

        assert!(matches!(
            read_back_state(&mut neuron, &bytes[..8]),
            Err(SerializationError::ImageSizeMismatch { expected: 32, actual: 8 })
        ));
    }
}
