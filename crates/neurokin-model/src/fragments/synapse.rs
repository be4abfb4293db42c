// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Combined-Exponential Synapse Kinetics
//!
//! One fragment type for any number of named channels. Each channel is a
//! double-exponential kernel with a fast and a slow component:
//!
//! ```text
//! Per-channel wire block (declaration order):
//!     a_response   state      S16.15
//!     a_A          parameter  S16.15   sf × weight_scale[channel]
//!     a_decay      parameter  U0.32    exp(-dt/τa)
//!     (a_init      parameter  S16.15   (dt/τa)(1 - exp(-dt/τa)), optional)
//!     b_response   state      S16.15
//!     b_B          parameter  S16.15   -sf × weight_scale[channel]
//!     b_decay      parameter  U0.32    exp(-dt/τb)
//!     (b_init      parameter  S16.15   optional)
//! ```
//!
//! `a_A` and `b_B` are derived from the two time constants and are
//! recomputed whenever either of them is set.

use crate::error::{ModelError, ModelResult};
use crate::fixed_point::FixedPointFormat;
use crate::fragment::{FragmentRole, ModelFragment};
use crate::registry::{ChannelId, FieldSpec, FieldValues, ParameterRegistry, WireEncoding};
use serde::{Deserialize, Serialize};

/// Runtime cycles per channel per neuron for one synaptic update
pub const CYCLES_PER_CHANNEL: usize = 13;

/// Base name of the excitatory channel family
pub const EXCITATORY: &str = "excitatory";
/// Base name of the inhibitory channel family
pub const INHIBITORY: &str = "inhibitory";

/// One exponential component of a channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Initial response (state), nA
    pub response: f64,
    /// Time constant, ms
    pub tau: f64,
    /// Sign of the component's unit amplitude
    pub sign: f64,
}

impl ComponentConfig {
    pub fn new(tau: f64, sign: f64) -> Self {
        Self {
            response: 0.0,
            tau,
            sign,
        }
    }
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Configuration of one named channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub a: ComponentConfig,
    pub b: ComponentConfig,
    /// Emit the initial-kick terms after each decay
    #[serde(default)]
    pub include_init: bool,
}

impl ChannelConfig {
    /// Channel with unit amplitudes `+1` on `a` and `-1` on `b`
    pub fn new(name: impl Into<String>, tau_a: f64, tau_b: f64) -> Self {
        Self {
            name: name.into(),
            a: ComponentConfig::new(tau_a, 1.0),
            b: ComponentConfig::new(tau_b, -1.0),
            include_init: false,
        }
    }

    pub fn with_init(mut self) -> Self {
        self.include_init = true;
        self
    }

    pub fn with_responses(mut self, a_response: f64, b_response: f64) -> Self {
        self.a.response = a_response;
        self.b.response = b_response;
        self
    }

    fn field(&self, component: &str, suffix: &str) -> String {
        format!("{}_{}_{}", self.name, component, suffix)
    }
}

fn family_name(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{}{}", base, index + 1)
    }
}

/// `n_exc` excitatory then `n_inh` inhibitory channels with the usual defaults
///
/// Names follow `excitatory, excitatory2, …, inhibitory, inhibitory2, …`.
/// Excitatory channels rise fast and decay slowly (τa = 50 ms, τb = 1 ms);
/// inhibitory ones use τa = 5 ms, τb = 10 ms.
///
/// # Example
/// ```
/// use neurokin_model::fragments::standard_channels;
///
/// let channels = standard_channels(2, 1);
/// let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
/// assert_eq!(names, ["excitatory", "excitatory2", "inhibitory"]);
/// ```
pub fn standard_channels(n_exc: usize, n_inh: usize) -> Vec<ChannelConfig> {
    let excitatory = (0..n_exc).map(|i| ChannelConfig::new(family_name(EXCITATORY, i), 50.0, 1.0));
    let inhibitory = (0..n_inh).map(|i| ChannelConfig::new(family_name(INHIBITORY, i), 5.0, 10.0));
    excitatory.chain(inhibitory).collect()
}

/// N-channel double-exponential synapse kinetics
#[derive(Debug, Clone)]
pub struct CombinedExponentialSynapse {
    name: String,
    registry: ParameterRegistry,
}

impl CombinedExponentialSynapse {
    /// Build the fragment from an ordered list of channels
    ///
    /// # Errors
    /// - [`ModelError::DuplicateChannel`] if two channels share a name
    /// - [`ModelError::InvalidKinetics`] if a channel's time constants are
    ///   equal or its component signs are not opposite
    /// - [`ModelError::InvalidParameter`] for an empty channel list
    pub fn new(channels: &[ChannelConfig]) -> ModelResult<Self> {
        if channels.is_empty() {
            return Err(ModelError::invalid_parameter(
                "channels",
                "at least one synapse channel is required",
            ));
        }

        let mut registry = ParameterRegistry::new();
        for channel in channels {
            let id = registry.declare_channel(channel.name.clone())?;
            declare_channel_fields(&mut registry, channel, id)?;
        }

        tracing::debug!(
            channels = channels.len(),
            bytes = registry.byte_size(),
            "built combined-exponential synapse fragment"
        );

        Ok(Self {
            name: model_name_for(channels),
            registry,
        })
    }

    /// Fragment with `n_exc` excitatory and `n_inh` inhibitory default channels
    pub fn standard(n_exc: usize, n_inh: usize) -> ModelResult<Self> {
        Self::new(&standard_channels(n_exc, n_inh))
    }

    pub fn channel_names(&self) -> &[String] {
        self.registry.channel_names()
    }

    /// Channel id, or [`ModelError::UnknownChannel`] where a match is required
    pub fn require_channel(&self, target: &str) -> ModelResult<ChannelId> {
        self.registry
            .channel_id_for(target)
            .ok_or_else(|| ModelError::UnknownChannel(target.to_string()))
    }

    /// Set one of a channel's time constants (`component` is `"a"` or `"b"`)
    pub fn set_tau(&mut self, channel: &str, component: &str, tau: f64) -> ModelResult<()> {
        self.require_channel(channel)?;
        self.registry
            .set_value(&format!("{}_{}_tau", channel, component), tau)
    }

    /// Current `(a_A, b_B)` amplitudes of a channel
    pub fn amplitudes(&self, channel: &str) -> ModelResult<(f64, f64)> {
        self.require_channel(channel)?;
        Ok((
            self.registry.value_of(&format!("{}_a_A", channel))?,
            self.registry.value_of(&format!("{}_b_B", channel))?,
        ))
    }
}

fn declare_channel_fields(
    registry: &mut ParameterRegistry,
    channel: &ChannelConfig,
    id: ChannelId,
) -> ModelResult<()> {
    for (component, amp_suffix, config) in [("a", "A", &channel.a), ("b", "B", &channel.b)] {
        registry.declare(
            FieldSpec::state(channel.field(component, "response"), "nA", config.response).channel(id),
        )?;
        registry.declare(
            FieldSpec::parameter(channel.field(component, amp_suffix), "", config.sign)
                .encoding(WireEncoding::WeightScaled)
                .channel(id),
        )?;
        let tau = channel.field(component, "tau");
        registry.declare(
            FieldSpec::parameter(tau.clone(), "ms", config.tau)
                .format(FixedPointFormat::U032)
                .encoding(WireEncoding::StepDecay)
                .channel(id),
        )?;
        if channel.include_init {
            registry.declare_wire_alias(
                &channel.field(component, "init"),
                &tau,
                FixedPointFormat::S1615,
                WireEncoding::StepInit,
            )?;
        }
    }

    registry.derive_peak_normalization(
        &channel.field("a", "tau"),
        &channel.field("b", "tau"),
        &channel.field("a", "A"),
        &channel.field("b", "B"),
        (channel.a.sign, channel.b.sign),
    )
}

fn model_name_for(channels: &[ChannelConfig]) -> String {
    let in_family = |base: &str, name: &str| {
        name.strip_prefix(base)
            .map(|rest| rest.is_empty() || rest.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    };
    let n_exc = channels.iter().filter(|c| in_family(EXCITATORY, &c.name)).count();
    let n_inh = channels.iter().filter(|c| in_family(INHIBITORY, &c.name)).count();

    if n_exc + n_inh == channels.len() {
        format!("comb_exp_{}E{}I", n_exc, n_inh)
    } else {
        format!("comb_exp_{}ch", channels.len())
    }
}

impl ModelFragment for CombinedExponentialSynapse {
    fn role(&self) -> FragmentRole {
        FragmentRole::SynapseKinetics
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    fn values_mut(&mut self) -> FieldValues<'_> {
        FieldValues::new(&mut self.registry)
    }

    fn n_cpu_cycles(&self, n_neurons: usize) -> usize {
        CYCLES_PER_CHANNEL * self.n_channels() * n_neurons
    }
}
