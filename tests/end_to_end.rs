// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration in, parameter images out

use neurokin::config::{parse_config, validate_config, NeurokinConfig};
use neurokin::model::{FixedPointFormat, ModelError};
use neurokin::serialization::WEIGHT_DEPENDENCE_SECTION;
use neurokin::{assemble_descriptor, build_population_images, NeurokinError};

fn two_channel_config(excitatory: (f64, f64)) -> NeurokinConfig {
    parse_config(&format!(
        r#"
        [[populations]]
        name = "pair"

        [[populations.channels]]
        name = "excitatory"
        a = {{ tau = {} }}
        b = {{ tau = {} }}

        [[populations.channels]]
        name = "inhibitory"
        a = {{ tau = 5.0 }}
        b = {{ tau = 10.0 }}
        "#,
        excitatory.0, excitatory.1
    ))
    .unwrap()
}

fn words(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[test]
fn test_degenerate_pair_raises_invalid_kinetics() {
    let config = two_channel_config((1.0, 1.0));
    assert!(validate_config(&config).is_err());

    let err = build_population_images(&config).unwrap_err();
    assert!(matches!(err, NeurokinError::Population { .. }));
    assert!(matches!(err.model_error(), Some(ModelError::InvalidKinetics { .. })));
}

#[test]
fn test_valid_pair_has_balanced_amplitudes() {
    let config = two_channel_config((5.0, 1.0));
    validate_config(&config).unwrap();

    let descriptor = assemble_descriptor(&config.populations[0]).unwrap();
    let a_amp = descriptor.value_of("excitatory_a_A").unwrap();
    let b_amp = descriptor.value_of("excitatory_b_B").unwrap();
    assert!(a_amp > 0.0);
    assert!(b_amp < 0.0);
    assert!((a_amp.abs() - b_amp.abs()).abs() < 1e-12);

    assert_eq!(descriptor.synapse_id_by_target("excitatory"), Some(0));
    assert_eq!(descriptor.synapse_id_by_target("inhibitory"), Some(1));
    assert_eq!(descriptor.synapse_id_by_target("modulatory"), None);
}

#[test]
fn test_weight_dependence_words() {
    let mut config = two_channel_config((5.0, 1.0));
    config.populations[0].weight_dependence = Some(neurokin::config::WeightDependenceConfig {
        w_min: 0.0,
        w_max: 1.0,
        boost_thresh: 1000.0,
        ..Default::default()
    });

    let images = build_population_images(&config).unwrap();
    let block = images[0].image.section(WEIGHT_DEPENDENCE_SECTION).unwrap();

    // two synapse types
    assert_eq!(block.len(), 48);
    let boost_thresh = FixedPointFormat::S1615.encode(1000.0).unwrap() as i32;
    assert_eq!(&words(block)[..6], &[0, 1, 1, 0, boost_thresh, 1]);
    assert_eq!(&words(block)[6..], &words(block)[..6]);

    config.populations[0].channels.truncate(1);
    let images = build_population_images(&config).unwrap();
    assert_eq!(images[0].image.section(WEIGHT_DEPENDENCE_SECTION).unwrap().len(), 24);
}

#[test]
fn test_section_order_and_size() {
    let config = two_channel_config((5.0, 1.0));
    let images = build_population_images(&config).unwrap();
    let image = &images[0].image;

    let names: Vec<&str> = image.sections().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["neuron", "input", "threshold", "synapse"]);

    let descriptor = assemble_descriptor(&config.populations[0]).unwrap();
    assert_eq!(image.len(), descriptor.byte_size());

    let mut offset = 0;
    for section in image.sections() {
        assert_eq!(section.offset, offset);
        offset += section.length;
    }
    assert_eq!(offset, image.len());
}

#[test]
fn test_synapse_block_scales_with_channel_count() {
    let synapse_bytes = |n_channels: usize| {
        let mut config = two_channel_config((5.0, 1.0));
        let template = config.populations[0].channels[0].clone();
        config.populations[0].channels = (0..n_channels)
            .map(|i| {
                let mut channel = template.clone();
                channel.name = format!("receptor{}", i);
                channel
            })
            .collect();
        let images = build_population_images(&config).unwrap();
        images[0].image.section("synapse").unwrap().len()
    };

    let single = synapse_bytes(1);
    for n in [2, 4, 8] {
        assert_eq!(synapse_bytes(n), n * single);
    }
}

#[test]
fn test_weight_scales_reach_amplitude_words() {
    let mut config = two_channel_config((5.0, 1.0));
    let unscaled = build_population_images(&config).unwrap();

    config.populations[0].weight_scales = vec![2.0, 1.0];
    let scaled = build_population_images(&config).unwrap();

    let before = unscaled[0].image.section("synapse").unwrap();
    let after = scaled[0].image.section("synapse").unwrap();
    assert_eq!(before.len(), after.len());
    // only the excitatory block changes
    let half = before.len() / 2;
    assert_ne!(&before[..half], &after[..half]);
    assert_eq!(&before[half..], &after[half..]);
}
