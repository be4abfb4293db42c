// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Parameter Descriptor Registry
//!
//! Ordered, named storage for the fields of one model fragment.
//!
//! The registry keeps three things side by side:
//!
//! - **Fields**: named values with a kind (parameter or state), a unit and an
//!   optional owning channel. This is what `value_of`/`set_value` operate on.
//! - **Wire slots**: the on-wire order. Declaring a field appends its slot, so
//!   declaration order *is* the binary layout. A slot says how its field turns
//!   into a word (as-is, weight-scaled, as a per-step decay, ...).
//! - **Derivation rules**: fields computed from other fields. A `set_value`
//!   on a rule input recomputes the outputs before it returns.
//!
//! Channel names map to wire indices in declaration order.

use crate::decay::{decay_factors, Timestep};
use crate::error::{ModelError, ModelResult};
use crate::fixed_point::FixedPointFormat;
use crate::kinetics;
use ahash::AHashMap;
use serde::Serialize;

/// Wire index of a channel within its fragment
pub type ChannelId = usize;

/// Whether a field is fixed for a run or evolves on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Fixed for a run; may be weight-scaled or transformed on emission
    Parameter,
    /// Mutated every step by the runtime; only round-tripped here
    State,
}

/// How a field's stored value becomes the real value that gets quantized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEncoding {
    /// Stored value as-is
    Direct,
    /// Stored value × the owning channel's weight scale
    WeightScaled,
    /// Time constant emitted as `exp(-dt/τ)`
    StepDecay,
    /// Time constant emitted as `(dt/τ)·(1 - exp(-dt/τ))`
    StepInit,
    /// Duration emitted as a whole number of steps, `ceil(value/dt)`
    StepCount,
    /// The step duration itself in milliseconds
    StepMillis,
}

/// One named value inside a fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    name: String,
    kind: FieldKind,
    unit: String,
    value: f64,
    channel: Option<ChannelId>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    pub fn is_state(&self) -> bool {
        self.kind == FieldKind::State
    }
}

/// One word of the fragment's binary block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireSlot {
    label: String,
    field: usize,
    format: FixedPointFormat,
    encoding: WireEncoding,
    channel: Option<ChannelId>,
}

impl WireSlot {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Index of the backing field in [`ParameterRegistry::fields`]
    pub fn field_index(&self) -> usize {
        self.field
    }

    pub fn format(&self) -> FixedPointFormat {
        self.format
    }

    pub fn encoding(&self) -> WireEncoding {
        self.encoding
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    pub fn byte_size(&self) -> usize {
        self.format.byte_size()
    }
}

/// Declaration of a field, built fluently and handed to [`ParameterRegistry::declare`]
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    unit: String,
    value: f64,
    format: FixedPointFormat,
    encoding: Option<WireEncoding>,
    channel: Option<ChannelId>,
}

impl FieldSpec {
    /// A parameter emitted as-is in S16.15
    pub fn parameter(name: impl Into<String>, unit: impl Into<String>, value: f64) -> Self {
        Self::new(name.into(), FieldKind::Parameter, unit.into(), value)
    }

    /// A state variable emitted as-is in S16.15
    pub fn state(name: impl Into<String>, unit: impl Into<String>, value: f64) -> Self {
        Self::new(name.into(), FieldKind::State, unit.into(), value)
    }

    fn new(name: String, kind: FieldKind, unit: String, value: f64) -> Self {
        Self {
            name,
            kind,
            unit,
            value,
            format: FixedPointFormat::S1615,
            encoding: Some(WireEncoding::Direct),
            channel: None,
        }
    }

    pub fn format(mut self, format: FixedPointFormat) -> Self {
        self.format = format;
        self
    }

    pub fn encoding(mut self, encoding: WireEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Keep the field in the registry without giving it a wire slot
    pub fn hidden(mut self) -> Self {
        self.encoding = None;
        self
    }

    pub fn channel(mut self, channel: ChannelId) -> Self {
        self.channel = Some(channel);
        self
    }
}

/// Field derived from other fields, recomputed synchronously on every set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DerivationRule {
    /// Double-exponential peak normalization: `(τa, τb) → (sf, -sf)`
    PeakNormalization {
        tau_a: usize,
        tau_b: usize,
        amp_a: usize,
        amp_b: usize,
        sign_a: f64,
        sign_b: f64,
    },
    /// `output = numerator / denominator`
    Ratio {
        numerator: usize,
        denominator: usize,
        output: usize,
    },
}

impl DerivationRule {
    fn depends_on(&self, index: usize) -> bool {
        match *self {
            DerivationRule::PeakNormalization { tau_a, tau_b, .. } => index == tau_a || index == tau_b,
            DerivationRule::Ratio {
                numerator,
                denominator,
                ..
            } => index == numerator || index == denominator,
        }
    }

    fn produces(&self, index: usize) -> bool {
        match *self {
            DerivationRule::PeakNormalization { amp_a, amp_b, .. } => index == amp_a || index == amp_b,
            DerivationRule::Ratio { output, .. } => index == output,
        }
    }

    fn compute(&self, fields: &[Field]) -> ModelResult<Vec<(usize, f64)>> {
        match *self {
            DerivationRule::PeakNormalization {
                tau_a,
                tau_b,
                amp_a,
                amp_b,
                sign_a,
                sign_b,
            } => {
                let amps = kinetics::normalize_with_amplitudes(
                    fields[tau_a].value,
                    fields[tau_b].value,
                    sign_a,
                    sign_b,
                )?;
                Ok(vec![(amp_a, amps.a), (amp_b, amps.b)])
            }
            DerivationRule::Ratio {
                numerator,
                denominator,
                output,
            } => {
                let den = fields[denominator].value;
                if den == 0.0 {
                    return Err(ModelError::invalid_parameter(
                        fields[denominator].name.clone(),
                        "divisor of a derived field must be non-zero",
                    ));
                }
                Ok(vec![(output, fields[numerator].value / den)])
            }
        }
    }
}

/// Ordered collection of the fields of one model fragment
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParameterRegistry {
    fields: Vec<Field>,
    #[serde(skip)]
    index: AHashMap<String, usize>,
    slots: Vec<WireSlot>,
    channels: Vec<String>,
    rules: Vec<DerivationRule>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // region Channels

    /// Register a channel; its wire index is its declaration position
    pub fn declare_channel(&mut self, name: impl Into<String>) -> ModelResult<ChannelId> {
        let name = name.into();
        if self.channels.iter().any(|existing| *existing == name) {
            return Err(ModelError::DuplicateChannel(name));
        }
        self.channels.push(name);
        Ok(self.channels.len() - 1)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channels
    }

    /// Wire index for a channel's external name, `None` if it is not declared
    pub fn channel_id_for(&self, target: &str) -> Option<ChannelId> {
        self.channels.iter().position(|name| name == target)
    }

    pub fn channel_name(&self, channel: ChannelId) -> Option<&str> {
        self.channels.get(channel).map(String::as_str)
    }

    // endregion

    // region Declaration

    /// Register a field and, unless hidden, append its wire slot
    pub fn declare(&mut self, decl: FieldSpec) -> ModelResult<usize> {
        if !decl.value.is_finite() {
            return Err(ModelError::invalid_parameter(
                decl.name,
                "initial value must be finite",
            ));
        }
        self.check_label_free(&decl.name)?;
        if let Some(channel) = decl.channel {
            if channel >= self.channels.len() {
                return Err(ModelError::UnknownChannel(format!("#{}", channel)));
            }
        }

        let index = self.fields.len();
        self.fields.push(Field {
            name: decl.name.clone(),
            kind: decl.kind,
            unit: decl.unit,
            value: decl.value,
            channel: decl.channel,
        });
        self.index.insert(decl.name.clone(), index);

        if let Some(encoding) = decl.encoding {
            self.slots.push(WireSlot {
                label: decl.name,
                field: index,
                format: decl.format,
                encoding,
                channel: decl.channel,
            });
        }
        Ok(index)
    }

    /// Register a parameter emitted as-is
    pub fn declare_parameter(
        &mut self,
        name: &str,
        unit: &str,
        value: f64,
        format: FixedPointFormat,
    ) -> ModelResult<usize> {
        self.declare(FieldSpec::parameter(name, unit, value).format(format))
    }

    /// Register a state variable emitted as-is
    pub fn declare_state(
        &mut self,
        name: &str,
        unit: &str,
        value: f64,
        format: FixedPointFormat,
    ) -> ModelResult<usize> {
        self.declare(FieldSpec::state(name, unit, value).format(format))
    }

    /// Append a second wire slot backed by an existing field
    pub fn declare_wire_alias(
        &mut self,
        label: &str,
        field: &str,
        format: FixedPointFormat,
        encoding: WireEncoding,
    ) -> ModelResult<()> {
        self.check_label_free(label)?;
        let index = self.index_of(field)?;
        self.slots.push(WireSlot {
            label: label.to_string(),
            field: index,
            format,
            encoding,
            channel: self.fields[index].channel,
        });
        Ok(())
    }

    /// Keep `amp_a`/`amp_b` equal to the peak normalization of `tau_a`/`tau_b`
    ///
    /// The amplitudes are computed immediately, so an invalid pair fails here.
    pub fn derive_peak_normalization(
        &mut self,
        tau_a: &str,
        tau_b: &str,
        amp_a: &str,
        amp_b: &str,
        signs: (f64, f64),
    ) -> ModelResult<()> {
        let rule = DerivationRule::PeakNormalization {
            tau_a: self.index_of(tau_a)?,
            tau_b: self.index_of(tau_b)?,
            amp_a: self.index_of(amp_a)?,
            amp_b: self.index_of(amp_b)?,
            sign_a: signs.0,
            sign_b: signs.1,
        };
        self.add_rule(rule)
    }

    /// Keep `output` equal to `numerator / denominator`
    pub fn derive_ratio(&mut self, numerator: &str, denominator: &str, output: &str) -> ModelResult<()> {
        let rule = DerivationRule::Ratio {
            numerator: self.index_of(numerator)?,
            denominator: self.index_of(denominator)?,
            output: self.index_of(output)?,
        };
        self.add_rule(rule)
    }

    fn add_rule(&mut self, rule: DerivationRule) -> ModelResult<()> {
        for (index, value) in rule.compute(&self.fields)? {
            self.fields[index].value = value;
        }
        self.rules.push(rule);
        Ok(())
    }

    fn check_label_free(&self, label: &str) -> ModelResult<()> {
        if self.index.contains_key(label) || self.slots.iter().any(|slot| slot.label == label) {
            return Err(ModelError::DuplicateField(label.to_string()));
        }
        Ok(())
    }

    // endregion

    // region Access

    fn index_of(&self, name: &str) -> ModelResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownField(name.to_string()))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&index| &self.fields[index])
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn value_of(&self, name: &str) -> ModelResult<f64> {
        Ok(self.fields[self.index_of(name)?].value)
    }

    pub fn unit_of(&self, name: &str) -> ModelResult<&str> {
        Ok(&self.fields[self.index_of(name)?].unit)
    }

    pub fn kind_of(&self, name: &str) -> ModelResult<FieldKind> {
        Ok(self.fields[self.index_of(name)?].kind)
    }

    /// Whether a derivation rule owns this field's value
    pub fn is_derived(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&index| self.rules.iter().any(|rule| rule.produces(index)))
    }

    /// Set a field and synchronously recompute every field derived from it
    ///
    /// If a dependent derivation fails, the registry is left exactly as it
    /// was and the derivation's error is returned. Derived fields are
    /// rejected; set their inputs instead.
    pub fn set_value(&mut self, name: &str, value: f64) -> ModelResult<()> {
        let index = self.index_of(name)?;
        if !value.is_finite() {
            return Err(ModelError::invalid_parameter(name, "value must be finite"));
        }
        if self.rules.iter().any(|rule| rule.produces(index)) {
            return Err(ModelError::invalid_parameter(
                name,
                "derived field cannot be set directly",
            ));
        }

        let previous = self.fields[index].value;
        self.fields[index].value = value;

        let mut updates = Vec::new();
        for rule in self.rules.iter().filter(|rule| rule.depends_on(index)) {
            match rule.compute(&self.fields) {
                Ok(outputs) => updates.extend(outputs),
                Err(err) => {
                    self.fields[index].value = previous;
                    return Err(err);
                }
            }
        }
        for (output, derived) in updates {
            tracing::debug!(
                field = %self.fields[output].name,
                value = derived,
                trigger = name,
                "recomputed derived field"
            );
            self.fields[output].value = derived;
        }
        Ok(())
    }

    /// Parameter fields in declaration order
    pub fn parameters(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| !field.is_state())
    }

    /// State fields in declaration order
    pub fn state_variables(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_state())
    }

    // endregion

    // region Wire layout

    /// Wire slots in on-wire order
    pub fn wire_slots(&self) -> &[WireSlot] {
        &self.slots
    }

    /// Bytes the fragment occupies on the wire; independent of field values
    pub fn byte_size(&self) -> usize {
        self.slots.iter().map(WireSlot::byte_size).sum()
    }

    /// Real value a slot carries for the given step and weight scale
    ///
    /// `weight_scale` is only applied to [`WireEncoding::WeightScaled`] slots.
    pub fn resolve_slot(&self, slot: &WireSlot, timestep: Timestep, weight_scale: f64) -> ModelResult<f64> {
        let field = &self.fields[slot.field];
        let dt = timestep.as_millis();
        let value = match slot.encoding {
            WireEncoding::Direct => field.value,
            WireEncoding::WeightScaled => field.value * weight_scale,
            WireEncoding::StepDecay => decay_factors(field.value, timestep)
                .map_err(|err| rename_parameter(err, &field.name))?
                .decay,
            WireEncoding::StepInit => decay_factors(field.value, timestep)
                .map_err(|err| rename_parameter(err, &field.name))?
                .init,
            WireEncoding::StepCount => {
                if field.value < 0.0 {
                    return Err(ModelError::invalid_parameter(
                        field.name.clone(),
                        "duration must not be negative",
                    ));
                }
                (field.value / dt).ceil()
            }
            WireEncoding::StepMillis => dt,
        };
        Ok(value)
    }

    // endregion
}

fn rename_parameter(err: ModelError, field: &str) -> ModelError {
    match err {
        ModelError::InvalidParameter { name, reason } if name == "tau" => ModelError::InvalidParameter {
            name: field.to_string(),
            reason,
        },
        other => other,
    }
}

/// Value-only view of a registry
///
/// Handed out by [`ModelFragment::values_mut`](crate::ModelFragment::values_mut)
/// so values can change after a fragment is built while its fields,
/// channels and wire slots cannot.
#[derive(Debug)]
pub struct FieldValues<'a> {
    registry: &'a mut ParameterRegistry,
}

impl<'a> FieldValues<'a> {
    pub fn new(registry: &'a mut ParameterRegistry) -> Self {
        Self { registry }
    }

    pub fn value_of(&self, name: &str) -> ModelResult<f64> {
        self.registry.value_of(name)
    }

    /// See [`ParameterRegistry::set_value`]
    pub fn set_value(&mut self, name: &str, value: f64) -> ModelResult<()> {
        self.registry.set_value(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_registry() -> ParameterRegistry {
        let mut registry = ParameterRegistry::new();
        let ch = registry.declare_channel("excitatory").unwrap();
        registry
            .declare(FieldSpec::state("excitatory_a_response", "nA", 0.0).channel(ch))
            .unwrap();
        registry
            .declare(
                FieldSpec::parameter("excitatory_a_A", "", 1.0)
                    .encoding(WireEncoding::WeightScaled)
                    .channel(ch),
            )
            .unwrap();
        registry
            .declare(
                FieldSpec::parameter("excitatory_a_tau", "ms", 5.0)
                    .format(FixedPointFormat::U032)
                    .encoding(WireEncoding::StepDecay)
                    .channel(ch),
            )
            .unwrap();
        registry
            .declare(FieldSpec::parameter("excitatory_b_B", "", -1.0).channel(ch))
            .unwrap();
        registry
            .declare(FieldSpec::parameter("excitatory_b_tau", "ms", 1.0).hidden().channel(ch))
            .unwrap();
        registry
            .derive_peak_normalization(
                "excitatory_a_tau",
                "excitatory_b_tau",
                "excitatory_a_A",
                "excitatory_b_B",
                (1.0, -1.0),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_declaration_order_is_wire_order() {
        let registry = channel_registry();
        let labels: Vec<&str> = registry.wire_slots().iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec![
                "excitatory_a_response",
                "excitatory_a_A",
                "excitatory_a_tau",
                "excitatory_b_B"
            ]
        );
        assert_eq!(registry.byte_size(), 16);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = channel_registry();
        assert!(matches!(
            registry.declare_parameter("excitatory_a_A", "", 0.0, FixedPointFormat::S1615),
            Err(ModelError::DuplicateField(_))
        ));
        assert!(matches!(
            registry.declare_channel("excitatory"),
            Err(ModelError::DuplicateChannel(_))
        ));
        assert!(registry
            .declare_wire_alias("excitatory_a_A", "excitatory_a_tau", FixedPointFormat::S1615, WireEncoding::StepInit)
            .is_err());
    }

    #[test]
    fn test_unknown_lookups() {
        let registry = channel_registry();
        assert!(matches!(
            registry.value_of("missing"),
            Err(ModelError::UnknownField(_))
        ));
        assert!(registry.unit_of("missing").is_err());
        assert!(!registry.has_field("missing"));
        assert_eq!(registry.channel_id_for("inhibitory"), None);
        assert_eq!(registry.channel_id_for("excitatory"), Some(0));
    }

    #[test]
    fn test_units_and_kinds() {
        let registry = channel_registry();
        assert_eq!(registry.unit_of("excitatory_a_tau").unwrap(), "ms");
        assert_eq!(
            registry.kind_of("excitatory_a_response").unwrap(),
            FieldKind::State
        );
        assert_eq!(registry.state_variables().count(), 1);
        assert_eq!(registry.parameters().count(), 4);
    }

    #[test]
    fn test_time_constant_set_recomputes_amplitudes() {
        let mut registry = channel_registry();
        let before = registry.value_of("excitatory_a_A").unwrap();

        registry.set_value("excitatory_a_tau", 10.0).unwrap();
        let after = registry.value_of("excitatory_a_A").unwrap();
        let expected = kinetics::normalize(10.0, 1.0).unwrap();

        assert_ne!(before, after);
        assert_eq!(after, expected.a);
        assert_eq!(registry.value_of("excitatory_b_B").unwrap(), expected.b);
    }

    #[test]
    fn test_failed_derivation_rolls_back() {
        let mut registry = channel_registry();
        let amp = registry.value_of("excitatory_a_A").unwrap();

        let result = registry.set_value("excitatory_a_tau", 1.0);
        assert!(matches!(result, Err(ModelError::InvalidKinetics { .. })));
        assert_eq!(registry.value_of("excitatory_a_tau").unwrap(), 5.0);
        assert_eq!(registry.value_of("excitatory_a_A").unwrap(), amp);
    }

    #[test]
    fn test_derived_fields_cannot_be_set() {
        let mut registry = channel_registry();
        let (a_amp, b_amp) = (
            registry.value_of("excitatory_a_A").unwrap(),
            registry.value_of("excitatory_b_B").unwrap(),
        );

        for name in ["excitatory_a_A", "excitatory_b_B"] {
            assert!(registry.is_derived(name));
            assert!(matches!(
                registry.set_value(name, 3.0),
                Err(ModelError::InvalidParameter { .. })
            ));
        }
        assert!(!registry.is_derived("excitatory_a_tau"));
        assert!(!registry.is_derived("missing"));

        // pair is still normalized
        assert_eq!(registry.value_of("excitatory_a_A").unwrap(), a_amp);
        assert_eq!(registry.value_of("excitatory_b_B").unwrap(), b_amp);
        assert_eq!(a_amp.abs(), b_amp.abs());
    }

    #[test]
    fn test_field_values_handle() {
        let mut registry = channel_registry();
        let size = registry.byte_size();
        {
            let mut values = FieldValues::new(&mut registry);
            values.set_value("excitatory_a_response", 0.25).unwrap();
            assert_eq!(values.value_of("excitatory_a_response").unwrap(), 0.25);
            assert!(values.set_value("excitatory_a_A", 1.0).is_err());
        }
        assert_eq!(registry.byte_size(), size);
    }

    #[test]
    fn test_resolve_slots() {
        let registry = channel_registry();
        let ts = Timestep::default();
        let slots = registry.wire_slots();

        let scaled = registry.resolve_slot(&slots[1], ts, 2.0).unwrap();
        assert_eq!(scaled, registry.value_of("excitatory_a_A").unwrap() * 2.0);

        let decay = registry.resolve_slot(&slots[2], ts, 2.0).unwrap();
        assert!((decay - (-0.2f64).exp()).abs() < 1e-15);

        // Weight scale only touches weight-scaled slots
        let plain = registry.resolve_slot(&slots[3], ts, 2.0).unwrap();
        assert_eq!(plain, registry.value_of("excitatory_b_B").unwrap());
    }

    #[test]
    fn test_ratio_rule() {
        let mut registry = ParameterRegistry::new();
        registry.declare(FieldSpec::parameter("tau_m", "ms", 20.0).hidden()).unwrap();
        registry.declare(FieldSpec::parameter("cm", "nF", 1.0).hidden()).unwrap();
        registry.declare_parameter("r_membrane", "MOhm", 0.0, FixedPointFormat::S1615).unwrap();
        registry.derive_ratio("tau_m", "cm", "r_membrane").unwrap();
        assert_eq!(registry.value_of("r_membrane").unwrap(), 20.0);

        registry.set_value("cm", 2.0).unwrap();
        assert_eq!(registry.value_of("r_membrane").unwrap(), 10.0);
        assert!(registry.set_value("cm", 0.0).is_err());
        assert_eq!(registry.value_of("cm").unwrap(), 2.0);
        assert!(matches!(
            registry.set_value("r_membrane", 5.0),
            Err(ModelError::InvalidParameter { .. })
        ));
    }
}
