// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ready-made descriptors for the common fragment combinations

use crate::descriptor::ModelDescriptor;
use crate::error::ModelResult;
use crate::fragment::ModelFragment;
use crate::fragments::{
    ChannelConfig, CombinedExponentialSynapse, CurrentInput, IzhikevichNeuron, IzhikevichParameters,
    LeakyIntegrateFireNeuron, LifParameters, StaticThreshold,
};

/// Spike threshold used with Izhikevich dynamics (mV)
pub const IZK_THRESHOLD: f64 = 30.0;

/// Suffix appended to a model name to form the runtime binary name
pub const BINARY_EXTENSION: &str = ".aplx";

fn assemble(
    prefix: &str,
    neuron: Box<dyn ModelFragment>,
    synapse: CombinedExponentialSynapse,
    v_thresh: f64,
) -> ModelResult<ModelDescriptor> {
    let model_name = format!("{}_curr_{}", prefix, synapse.model_name());
    let binary_name = format!("{}{}", model_name, BINARY_EXTENSION);
    ModelDescriptor::new(
        model_name,
        binary_name,
        neuron,
        Box::new(synapse),
        Box::new(CurrentInput::new()),
        Box::new(StaticThreshold::new(v_thresh)?),
    )
}

/// Izhikevich neuron, current input, combined-exponential synapses
///
/// # Example
/// ```
/// use neurokin_model::builds::izk_curr_comb_exp;
/// use neurokin_model::fragments::{standard_channels, IzhikevichParameters};
///
/// let model = izk_curr_comb_exp(&IzhikevichParameters::default(), &standard_channels(4, 4)).unwrap();
/// assert_eq!(model.model_name(), "IZK_curr_comb_exp_4E4I");
/// assert_eq!(model.binary_name(), "IZK_curr_comb_exp_4E4I.aplx");
/// assert_eq!(model.n_synapse_types(), 8);
/// ```
pub fn izk_curr_comb_exp(params: &IzhikevichParameters, channels: &[ChannelConfig]) -> ModelResult<ModelDescriptor> {
    assemble(
        "IZK",
        Box::new(IzhikevichNeuron::new(params)?),
        CombinedExponentialSynapse::new(channels)?,
        IZK_THRESHOLD,
    )
}

/// Leaky integrate-and-fire neuron, current input, combined-exponential synapses
pub fn lif_curr_comb_exp(
    params: &LifParameters,
    v_thresh: f64,
    channels: &[ChannelConfig],
) -> ModelResult<ModelDescriptor> {
    assemble(
        "LIF",
        Box::new(LeakyIntegrateFireNeuron::new(params)?),
        CombinedExponentialSynapse::new(channels)?,
        v_thresh,
    )
}
