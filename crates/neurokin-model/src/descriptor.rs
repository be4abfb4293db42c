// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Composable Model Descriptor
//!
//! A descriptor holds exactly four fragments, one per [`FragmentRole`].
//! Field names must be unique across all four so that `value_of`/`set_value`
//! on the descriptor can route a name to its single owner. The shape
//! (fragments, channels, fields) is fixed at construction; only values change.

use crate::error::{ModelError, ModelResult};
use crate::fragment::{FragmentRole, ModelFragment};
use crate::registry::ChannelId;
use ahash::AHashMap;

/// Atoms placed on one core when the configuration does not say otherwise
pub const DEFAULT_MAX_ATOMS_PER_CORE: usize = 64;

/// One neuron, synapse, input and threshold fragment composed into a model
#[derive(Debug)]
pub struct ModelDescriptor {
    model_name: String,
    binary_name: String,
    max_atoms_per_core: usize,
    neuron: Box<dyn ModelFragment>,
    synapse: Box<dyn ModelFragment>,
    input: Box<dyn ModelFragment>,
    threshold: Box<dyn ModelFragment>,
    owners: AHashMap<String, FragmentRole>,
}

fn check_role(fragment: &dyn ModelFragment, expected: FragmentRole) -> ModelResult<()> {
    if fragment.role() != expected {
        return Err(ModelError::FragmentRoleMismatch {
            model: fragment.model_name().to_string(),
            expected,
            actual: fragment.role(),
        });
    }
    Ok(())
}

impl ModelDescriptor {
    /// Compose four fragments into a descriptor
    ///
    /// # Errors
    /// - [`ModelError::FragmentRoleMismatch`] if a fragment sits in the wrong slot
    /// - [`ModelError::DuplicateField`] if two fragments declare the same name
    pub fn new(
        model_name: impl Into<String>,
        binary_name: impl Into<String>,
        neuron: Box<dyn ModelFragment>,
        synapse: Box<dyn ModelFragment>,
        input: Box<dyn ModelFragment>,
        threshold: Box<dyn ModelFragment>,
    ) -> ModelResult<Self> {
        check_role(neuron.as_ref(), FragmentRole::NeuronDynamics)?;
        check_role(synapse.as_ref(), FragmentRole::SynapseKinetics)?;
        check_role(input.as_ref(), FragmentRole::InputCoupling)?;
        check_role(threshold.as_ref(), FragmentRole::Threshold)?;

        let mut owners = AHashMap::new();
        for fragment in [&neuron, &synapse, &input, &threshold] {
            for field in fragment.registry().fields() {
                if owners.insert(field.name().to_string(), fragment.role()).is_some() {
                    return Err(ModelError::DuplicateField(field.name().to_string()));
                }
            }
        }

        let descriptor = Self {
            model_name: model_name.into(),
            binary_name: binary_name.into(),
            max_atoms_per_core: DEFAULT_MAX_ATOMS_PER_CORE,
            neuron,
            synapse,
            input,
            threshold,
            owners,
        };
        tracing::debug!(
            model = %descriptor.model_name,
            synapse_types = descriptor.n_synapse_types(),
            bytes = descriptor.byte_size(),
            "composed model descriptor"
        );
        Ok(descriptor)
    }

    pub fn with_max_atoms_per_core(mut self, max_atoms: usize) -> Self {
        self.max_atoms_per_core = max_atoms;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    pub fn max_atoms_per_core(&self) -> usize {
        self.max_atoms_per_core
    }

    pub fn fragment(&self, role: FragmentRole) -> &dyn ModelFragment {
        match role {
            FragmentRole::NeuronDynamics => self.neuron.as_ref(),
            FragmentRole::SynapseKinetics => self.synapse.as_ref(),
            FragmentRole::InputCoupling => self.input.as_ref(),
            FragmentRole::Threshold => self.threshold.as_ref(),
        }
    }

    fn fragment_mut(&mut self, role: FragmentRole) -> &mut dyn ModelFragment {
        match role {
            FragmentRole::NeuronDynamics => self.neuron.as_mut(),
            FragmentRole::SynapseKinetics => self.synapse.as_mut(),
            FragmentRole::InputCoupling => self.input.as_mut(),
            FragmentRole::Threshold => self.threshold.as_mut(),
        }
    }

    /// Fragments in parameter-image order
    pub fn fragments(&self) -> impl Iterator<Item = &dyn ModelFragment> {
        FragmentRole::IMAGE_ORDER.into_iter().map(move |role| self.fragment(role))
    }

    fn owner_of(&self, name: &str) -> ModelResult<FragmentRole> {
        self.owners
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownField(name.to_string()))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    pub fn value_of(&self, name: &str) -> ModelResult<f64> {
        self.fragment(self.owner_of(name)?).value_of(name)
    }

    pub fn unit_of(&self, name: &str) -> ModelResult<&str> {
        self.fragment(self.owner_of(name)?).unit_of(name)
    }

    /// Set a field on whichever fragment owns it; other fragments are untouched
    pub fn set_value(&mut self, name: &str, value: f64) -> ModelResult<()> {
        let role = self.owner_of(name)?;
        self.fragment_mut(role).set_value(name, value)
    }

    /// Synapse types reported to the runtime loader
    pub fn n_synapse_types(&self) -> usize {
        self.fragments().map(|fragment| fragment.n_channels()).sum()
    }

    /// Synapse type index for a target name, `None` if no fragment declares it
    pub fn synapse_id_by_target(&self, target: &str) -> Option<ChannelId> {
        let mut offset = 0;
        for fragment in self.fragments() {
            if let Some(id) = fragment.channel_id_for(target) {
                return Some(offset + id);
            }
            offset += fragment.n_channels();
        }
        None
    }

    /// Names of all synapse types, in synapse-type index order
    pub fn synapse_target_names(&self) -> Vec<String> {
        self.fragments()
            .flat_map(|fragment| fragment.registry().channel_names().to_vec())
            .collect()
    }

    pub fn n_cpu_cycles(&self, n_neurons: usize) -> usize {
        self.fragments().map(|fragment| fragment.n_cpu_cycles(n_neurons)).sum()
    }

    /// Bytes of the full parameter image, known before any value is
    pub fn byte_size(&self) -> usize {
        self.fragments().map(|fragment| fragment.byte_size()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::{
        CombinedExponentialSynapse, CurrentInput, IzhikevichNeuron, IzhikevichParameters, StaticThreshold,
    };

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor::new(
            "test_model",
            "test_model.aplx",
            Box::new(IzhikevichNeuron::new(&IzhikevichParameters::default()).unwrap()),
            Box::new(CombinedExponentialSynapse::standard(2, 2).unwrap()),
            Box::new(CurrentInput::new()),
            Box::new(StaticThreshold::new(30.0).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_synapse_types_summed_from_fragments() {
        let model = descriptor();
        assert_eq!(model.n_synapse_types(), 4);
        assert_eq!(model.synapse_id_by_target("inhibitory"), Some(2));
        assert_eq!(model.synapse_id_by_target("unknown"), None);
        assert_eq!(
            model.synapse_target_names(),
            ["excitatory", "excitatory2", "inhibitory", "inhibitory2"]
        );
    }

    #[test]
    fn test_value_routing() {
        let mut model = descriptor();
        assert_eq!(model.value_of("v_thresh").unwrap(), 30.0);
        model.set_value("a", 0.1).unwrap();
        assert_eq!(model.value_of("a").unwrap(), 0.1);
        assert_eq!(model.fragment(FragmentRole::NeuronDynamics).value_of("a").unwrap(), 0.1);
        assert!(matches!(
            model.set_value("missing", 1.0),
            Err(ModelError::UnknownField(_))
        ));
    }

    #[test]
    fn test_shape_fixed_after_construction() {
        let mut model = descriptor();
        let size = model.byte_size();
        let names = model.synapse_target_names();

        // fragments only hand out value access
        let mut values = model.fragment_mut(FragmentRole::Threshold).values_mut();
        assert!(matches!(values.set_value("extra", 1.0), Err(ModelError::UnknownField(_))));
        assert!(matches!(values.set_value("a", 1.0), Err(ModelError::UnknownField(_))));

        model.set_value("excitatory_a_tau", 8.0).unwrap();
        model.set_value("v_thresh", 25.0).unwrap();
        assert_eq!(model.byte_size(), size);
        assert_eq!(model.synapse_target_names(), names);
        assert!(!model.has_field("extra"));
    }

    #[test]
    fn test_amplitudes_follow_time_constants_only() {
        let mut model = descriptor();
        let a_amp = model.value_of("excitatory_a_A").unwrap();
        assert!(matches!(
            model.set_value("excitatory_a_A", 3.0),
            Err(ModelError::InvalidParameter { .. })
        ));
        assert_eq!(model.value_of("excitatory_a_A").unwrap(), a_amp);
        assert_eq!(
            model.value_of("excitatory_a_A").unwrap().abs(),
            model.value_of("excitatory_b_B").unwrap().abs()
        );
    }

    #[test]
    fn test_role_mismatch_rejected() {
        let result = ModelDescriptor::new(
            "bad",
            "bad.aplx",
            Box::new(StaticThreshold::new(30.0).unwrap()),
            Box::new(CombinedExponentialSynapse::standard(1, 1).unwrap()),
            Box::new(CurrentInput::new()),
            Box::new(StaticThreshold::new(30.0).unwrap()),
        );
        assert!(matches!(
            result,
            Err(ModelError::FragmentRoleMismatch {
                expected: FragmentRole::NeuronDynamics,
                ..
            })
        ));
    }

    #[test]
    fn test_sizes_and_costs_are_sums() {
        let model = descriptor();
        let by_fragment: usize = FragmentRole::IMAGE_ORDER
            .iter()
            .map(|&role| model.fragment(role).byte_size())
            .sum();
        assert_eq!(model.byte_size(), by_fragment);
        assert_eq!(model.byte_size(), 32 + 4 + 4 * 24);
        assert_eq!(model.n_cpu_cycles(0), 0);
        assert!(model.n_cpu_cycles(10) > model.n_cpu_cycles(1));
        assert_eq!(model.max_atoms_per_core(), DEFAULT_MAX_ATOMS_PER_CORE);
    }
}
