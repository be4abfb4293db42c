// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Population configuration → model descriptor
//!
//! Model names read `{NEURON}_{input}_{synapse}`, e.g.
//! `IZK_curr_comb_exp_4E4I` or `LIF_cond_comb_exp_1E1I`, and match the
//! ready-made builds in [`neurokin_model::builds`] for the same fragments.

use neurokin_config::{ChannelSettings, InputConfig, NeuronConfig, PopulationConfig};
use neurokin_model::builds::BINARY_EXTENSION;
use neurokin_model::fragments::{
    ChannelConfig, CombinedExponentialSynapse, ConductanceInput, CurrentInput, IzhikevichNeuron,
    LeakyIntegrateFireNeuron, StaticThreshold,
};
use neurokin_model::{ModelDescriptor, ModelFragment, ModelResult};

fn neuron_fragment(neuron: &NeuronConfig) -> ModelResult<Box<dyn ModelFragment>> {
    Ok(match neuron {
        NeuronConfig::Izhikevich(params) => Box::new(IzhikevichNeuron::new(params)?),
        NeuronConfig::Lif(params) => Box::new(LeakyIntegrateFireNeuron::new(params)?),
    })
}

fn input_fragment(input: &InputConfig) -> ModelResult<Box<dyn ModelFragment>> {
    Ok(match input {
        InputConfig::Current => Box::new(CurrentInput::new()),
        InputConfig::Conductance(params) => Box::new(ConductanceInput::new(params)?),
    })
}

/// Build the descriptor a population describes
///
/// # Errors
/// Any [`neurokin_model::ModelError`] raised by a fragment, e.g.
/// `InvalidKinetics` for a channel with equal time constants.
pub fn assemble_descriptor(population: &PopulationConfig) -> ModelResult<ModelDescriptor> {
    let channels: Vec<ChannelConfig> = population
        .channels
        .iter()
        .map(ChannelSettings::to_channel_config)
        .collect();

    let neuron = neuron_fragment(&population.neuron)?;
    let input = input_fragment(&population.input)?;
    let synapse = CombinedExponentialSynapse::new(&channels)?;
    let threshold = StaticThreshold::new(population.v_thresh())?;

    let model_name = format!(
        "{}_{}_{}",
        neuron.model_name().to_uppercase(),
        input.model_name(),
        synapse.model_name()
    );
    let binary_name = format!("{}{}", model_name, BINARY_EXTENSION);
    tracing::debug!(
        population = %population.name,
        model = %model_name,
        channels = channels.len(),
        "assembling population model"
    );

    let descriptor = ModelDescriptor::new(
        model_name,
        binary_name,
        neuron,
        Box::new(synapse),
        input,
        Box::new(threshold),
    )?;
    Ok(descriptor.with_max_atoms_per_core(population.max_atoms_per_core))
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurokin_config::parse_config;
    use neurokin_model::builds::izk_curr_comb_exp;
    use neurokin_model::fragments::{standard_channels, IzhikevichParameters};
    use neurokin_model::{FragmentRole, ModelError};

    fn population(toml: &str) -> PopulationConfig {
        parse_config(toml).unwrap().populations.remove(0)
    }

    const IZK_2E2I: &str = r#"
        [[populations]]
        name = "cortex"

        [[populations.channels]]
        name = "excitatory"
        a = { tau = 50.0 }
        b = { tau = 1.0 }

        [[populations.channels]]
        name = "excitatory2"
        a = { tau = 50.0 }
        b = { tau = 1.0 }

        [[populations.channels]]
        name = "inhibitory"
        a = { tau = 5.0 }
        b = { tau = 10.0 }

        [[populations.channels]]
        name = "inhibitory2"
        a = { tau = 5.0 }
        b = { tau = 10.0 }
    "#;

    #[test]
    fn test_matches_ready_made_build() {
        let assembled = assemble_descriptor(&population(IZK_2E2I)).unwrap();
        let built = izk_curr_comb_exp(&IzhikevichParameters::default(), &standard_channels(2, 2)).unwrap();

        assert_eq!(assembled.model_name(), "IZK_curr_comb_exp_2E2I");
        assert_eq!(assembled.model_name(), built.model_name());
        assert_eq!(assembled.binary_name(), built.binary_name());
        assert_eq!(assembled.byte_size(), built.byte_size());
        assert_eq!(assembled.synapse_target_names(), built.synapse_target_names());
        assert_eq!(assembled.value_of("v_thresh").unwrap(), 30.0);
    }

    #[test]
    fn test_conductance_lif_population() {
        let descriptor = assemble_descriptor(&population(
            r#"
            [[populations]]
            name = "motor"
            max_atoms_per_core = 32
            neuron = { kind = "lif" }
            input = { kind = "conductance", e_rev_i = -80.0 }

            [[populations.channels]]
            name = "excitatory"
            a = { tau = 5.0 }
            b = { tau = 1.0 }
            "#,
        ))
        .unwrap();

        assert_eq!(descriptor.model_name(), "LIF_cond_comb_exp_1E0I");
        assert_eq!(descriptor.max_atoms_per_core(), 32);
        assert_eq!(descriptor.value_of("e_rev_I").unwrap(), -80.0);
        assert_eq!(descriptor.value_of("v_thresh").unwrap(), -50.0);
        assert_eq!(descriptor.fragment(FragmentRole::InputCoupling).model_name(), "cond");
    }

    #[test]
    fn test_degenerate_channel_is_reported() {
        let mut config = population(IZK_2E2I);
        config.channels[1].b.tau = 50.0;
        assert!(matches!(
            assemble_descriptor(&config),
            Err(ModelError::InvalidKinetics { .. })
        ));
    }
}
