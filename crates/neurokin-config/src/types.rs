// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Every struct maps to a section of `neurokin.toml`. Missing keys fall back
//! to the defaults below.

use neurokin_model::fragments::{
    ChannelConfig, ComponentConfig, ConductanceParameters, IzhikevichParameters, LifParameters,
};
use neurokin_model::{WeightDependence, DEFAULT_MAX_ATOMS_PER_CORE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NeurokinConfig {
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub populations: Vec<PopulationConfig>,
}

/// Settings shared by every population built together
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Machine timestep in microseconds
    pub timestep_us: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { timestep_us: 1000 }
    }
}

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Where images are written
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("param_images"),
        }
    }
}

/// Neuron dynamics of a population
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NeuronConfig {
    Izhikevich(IzhikevichParameters),
    Lif(LifParameters),
}

impl Default for NeuronConfig {
    fn default() -> Self {
        NeuronConfig::Izhikevich(IzhikevichParameters::default())
    }
}

/// Input coupling of a population
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InputConfig {
    #[default]
    Current,
    Conductance(ConductanceParameters),
}

/// Threshold rule of a population
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ThresholdConfig {
    Static { v_thresh: f64 },
}

/// One exponential component of a channel
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComponentSettings {
    /// Time constant in ms
    pub tau: f64,
    /// Initial response
    #[serde(default)]
    pub response: f64,
    /// Unit amplitude sign; `+1` for `a` and `-1` for `b` when omitted
    #[serde(default)]
    pub sign: Option<f64>,
}

impl ComponentSettings {
    fn to_component(&self, default_sign: f64) -> ComponentConfig {
        ComponentConfig {
            response: self.response,
            tau: self.tau,
            sign: self.sign.unwrap_or(default_sign),
        }
    }
}

/// One named synapse channel
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelSettings {
    pub name: String,
    pub a: ComponentSettings,
    pub b: ComponentSettings,
    #[serde(default)]
    pub include_init: bool,
}

impl ChannelSettings {
    pub fn a_sign(&self) -> f64 {
        self.a.sign.unwrap_or(1.0)
    }

    pub fn b_sign(&self) -> f64 {
        self.b.sign.unwrap_or(-1.0)
    }

    /// Channel as understood by the synapse fragment
    pub fn to_channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            name: self.name.clone(),
            a: self.a.to_component(1.0),
            b: self.b.to_component(-1.0),
            include_init: self.include_init,
        }
    }
}

/// Weight dependence of a plastic population
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeightDependenceConfig {
    pub w_min: f64,
    pub w_max: f64,
    pub scale: f64,
    pub boost: f64,
    pub boost_thresh: f64,
    pub causal: bool,
    pub n_weight_terms: usize,
}

impl Default for WeightDependenceConfig {
    fn default() -> Self {
        let dependence = WeightDependence::default();
        Self {
            w_min: dependence.w_min,
            w_max: dependence.w_max,
            scale: dependence.scale,
            boost: dependence.boost,
            boost_thresh: dependence.boost_thresh,
            causal: dependence.causal,
            n_weight_terms: 1,
        }
    }
}

impl WeightDependenceConfig {
    pub fn to_dependence(&self) -> WeightDependence {
        WeightDependence {
            w_min: self.w_min,
            w_max: self.w_max,
            scale: self.scale,
            boost: self.boost,
            boost_thresh: self.boost_thresh,
            causal: self.causal,
        }
    }
}

/// One neuron population and its model
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PopulationConfig {
    pub name: String,
    #[serde(default = "default_n_neurons")]
    pub n_neurons: usize,
    #[serde(default = "default_max_atoms_per_core")]
    pub max_atoms_per_core: usize,
    /// One per channel; empty means 1.0 for every channel
    #[serde(default)]
    pub weight_scales: Vec<f64>,
    #[serde(default)]
    pub neuron: NeuronConfig,
    #[serde(default)]
    pub input: InputConfig,
    /// Defaults to 30 mV for Izhikevich and -50 mV for LIF dynamics
    #[serde(default)]
    pub threshold: Option<ThresholdConfig>,
    #[serde(default)]
    pub channels: Vec<ChannelSettings>,
    #[serde(default)]
    pub weight_dependence: Option<WeightDependenceConfig>,
}

fn default_n_neurons() -> usize {
    1
}

fn default_max_atoms_per_core() -> usize {
    DEFAULT_MAX_ATOMS_PER_CORE
}

impl PopulationConfig {
    /// Firing threshold, falling back to the neuron model's usual value
    pub fn v_thresh(&self) -> f64 {
        match (&self.threshold, &self.neuron) {
            (Some(ThresholdConfig::Static { v_thresh }), _) => *v_thresh,
            (None, NeuronConfig::Izhikevich(_)) => 30.0,
            (None, NeuronConfig::Lif(_)) => -50.0,
        }
    }

    /// Weight scales with the empty-means-unit rule applied
    pub fn resolved_weight_scales(&self) -> Vec<f64> {
        if self.weight_scales.is_empty() {
            vec![1.0; self.channels.len()]
        } else {
            self.weight_scales.clone()
        }
    }
}
