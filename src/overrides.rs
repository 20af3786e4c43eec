//! Override reconciliation for fine-tuning configurations
//!
//! A single flat override set is broadcast across one or more heterogeneous
//! configuration objects. Keys are plain field names, or dotted pairs
//! `ConfigName.field` scoped to a single configuration type. Unknown keys are
//! never fatal: partial applicability is the expected case when the same set
//! is applied to several configs at once, so reconciliation reports
//! diagnostics instead of failing.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// A flat set of user-supplied overrides, keyed by field name or
/// `ConfigName.field`.
pub type OverrideSet = BTreeMap<String, Value>;

/// Outcome of a single field assignment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The field exists and the value was stored
    Applied,
    /// The configuration has no field with that name
    UnknownField,
    /// The field exists but the value could not be converted to its type
    InvalidValue,
}

/// A configuration object that can receive overrides by field name.
///
/// Each implementation enumerates its settable fields explicitly; there is no
/// reflection. `config_name` is the identity used for dotted-key scoping.
pub trait Overridable {
    /// Type name used to scope dotted override keys
    fn config_name(&self) -> &'static str;

    /// Attempt to set a single field from a JSON value
    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome;

    /// Whether unscoped keys that match nothing should produce an
    /// unknown-parameter warning. Only the training configuration opts in.
    fn warns_on_unknown(&self) -> bool {
        false
    }
}

/// Non-fatal diagnostic produced while applying an override set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideWarning {
    /// A dotted key named this config type but a field it does not have
    UnknownField {
        /// Config type named by the key
        config: &'static str,
        /// The full override key
        key: String,
    },
    /// An unscoped key matched no field on the training configuration
    UnknownParameter {
        /// The override key
        key: String,
    },
    /// A key contained more than one `.` separator and was not applied
    MalformedKey {
        /// The override key
        key: String,
    },
    /// A field matched but the supplied value had an unusable type
    InvalidValue {
        /// Config the field belongs to
        config: &'static str,
        /// The override key
        key: String,
    },
}

impl fmt::Display for OverrideWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { config, key } => {
                write!(f, "{config} does not accept parameter: {key}")
            }
            Self::UnknownParameter { key } => write!(f, "unknown parameter {key}"),
            Self::MalformedKey { key } => {
                write!(f, "override key `{key}` must contain at most one `.`")
            }
            Self::InvalidValue { config, key } => {
                write!(f, "value for {config}.{key} has the wrong type")
            }
        }
    }
}

/// Apply an override set to a single configuration.
pub fn reconcile_one(config: &mut dyn Overridable, overrides: &OverrideSet) -> Vec<OverrideWarning> {
    reconcile(&mut [config], overrides)
}

/// Apply an override set to every configuration in `configs`, in place.
///
/// Per key and config: a direct field match wins; otherwise a
/// `ConfigName.field` key is applied only when `ConfigName` matches the
/// config, warning if the field is unknown; otherwise the key is silently
/// skipped for that config unless the config opts into unknown-parameter
/// warnings. Never fails; diagnostics are returned and logged.
pub fn reconcile(
    configs: &mut [&mut dyn Overridable],
    overrides: &OverrideSet,
) -> Vec<OverrideWarning> {
    let mut warnings = Vec::new();

    for (key, value) in overrides {
        let scoped = match key.split('.').collect::<Vec<_>>().as_slice() {
            [_] => None,
            [config_name, field] => Some((config_name.to_string(), field.to_string())),
            _ => {
                push_warning(&mut warnings, OverrideWarning::MalformedKey { key: key.clone() });
                continue;
            }
        };

        for config in configs.iter_mut() {
            match config.set_field(key, value) {
                SetOutcome::Applied => continue,
                SetOutcome::InvalidValue => {
                    push_warning(
                        &mut warnings,
                        OverrideWarning::InvalidValue {
                            config: config.config_name(),
                            key: key.clone(),
                        },
                    );
                    continue;
                }
                SetOutcome::UnknownField => {}
            }

            if let Some((config_name, field)) = &scoped {
                if config.config_name() != config_name {
                    continue;
                }
                match config.set_field(field, value) {
                    SetOutcome::Applied => {}
                    SetOutcome::UnknownField => push_warning(
                        &mut warnings,
                        OverrideWarning::UnknownField {
                            config: config.config_name(),
                            key: key.clone(),
                        },
                    ),
                    SetOutcome::InvalidValue => push_warning(
                        &mut warnings,
                        OverrideWarning::InvalidValue {
                            config: config.config_name(),
                            key: key.clone(),
                        },
                    ),
                }
            } else if config.warns_on_unknown() {
                push_warning(&mut warnings, OverrideWarning::UnknownParameter { key: key.clone() });
            }
        }
    }

    warnings
}

fn push_warning(warnings: &mut Vec<OverrideWarning>, warning: OverrideWarning) {
    warn!("Warning: {warning}");
    warnings.push(warning);
}

/// Store a converted value, reporting a type mismatch as `InvalidValue`.
pub(crate) fn assign<T>(slot: &mut T, parsed: Option<T>) -> SetOutcome {
    match parsed {
        Some(value) => {
            *slot = value;
            SetOutcome::Applied
        }
        None => SetOutcome::InvalidValue,
    }
}

pub(crate) fn as_usize(value: &Value) -> Option<usize> {
    value.as_u64().map(|v| v as usize)
}

pub(crate) fn as_u64(value: &Value) -> Option<u64> {
    value.as_u64()
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

pub(crate) fn as_f32(value: &Value) -> Option<f32> {
    value.as_f64().map(|v| v as f32)
}

pub(crate) fn as_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

pub(crate) fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

pub(crate) fn as_path(value: &Value) -> Option<PathBuf> {
    value.as_str().map(PathBuf::from)
}

pub(crate) fn as_string_vec(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DistillConfig, LoraSettings, TrainConfig};
    use serde_json::json;

    fn overrides(pairs: &[(&str, Value)]) -> OverrideSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_override_set_is_noop() {
        let mut config = TrainConfig::default();
        let before = config.clone();

        let warnings = reconcile_one(&mut config, &OverrideSet::new());

        assert!(warnings.is_empty());
        assert_eq!(config.lr, before.lr);
        assert_eq!(config.batch_size_training, before.batch_size_training);
        assert_eq!(config.peft_method, before.peft_method);
    }

    #[test]
    fn test_direct_field_override() {
        let mut config = TrainConfig::default();

        let warnings = reconcile_one(&mut config, &overrides(&[("lr", json!(3e-4))]));

        assert!(warnings.is_empty());
        assert_eq!(config.lr, 3e-4);
    }

    #[test]
    fn test_direct_field_targets_only_matching_config() {
        let mut train = TrainConfig::default();
        let mut distill = DistillConfig::default();
        let distill_before = distill.clone();

        let warnings = reconcile(
            &mut [&mut train, &mut distill],
            &overrides(&[("batch_size_training", json!(16))]),
        );

        assert!(warnings.is_empty());
        assert_eq!(train.batch_size_training, 16);
        assert_eq!(distill, distill_before);
    }

    #[test]
    fn test_shared_field_applies_to_every_config() {
        // Both configs expose `alpha`-free fields, but `temperature` exists
        // only on the distillation config while `lr` exists only on training.
        let mut train = TrainConfig::default();
        let mut distill = DistillConfig::default();

        reconcile(
            &mut [&mut train, &mut distill],
            &overrides(&[("temperature", json!(4.0)), ("lr", json!(2e-5))]),
        );

        assert_eq!(distill.temperature, 4.0);
        assert_eq!(train.lr, 2e-5);
    }

    #[test]
    fn test_dotted_key_scoped_to_type() {
        let mut lora = LoraSettings::default();

        let warnings = reconcile_one(&mut lora, &overrides(&[("LoraSettings.r", json!(64))]));

        assert!(warnings.is_empty());
        assert_eq!(lora.r, 64);
    }

    #[test]
    fn test_dotted_key_unknown_field_warns() {
        let mut train = TrainConfig::default();
        let before = train.clone();

        let warnings = reconcile_one(
            &mut train,
            &overrides(&[("TrainConfig.nonexistent_field", json!(1))]),
        );

        assert_eq!(
            warnings,
            vec![OverrideWarning::UnknownField {
                config: "TrainConfig",
                key: "TrainConfig.nonexistent_field".to_string(),
            }]
        );
        assert_eq!(train, before);
    }

    #[test]
    fn test_dotted_key_other_type_silently_skipped() {
        let mut train = TrainConfig::default();
        let before = train.clone();

        let warnings = reconcile_one(
            &mut train,
            &overrides(&[("OtherConfig.nonexistent_field", json!(1))]),
        );

        assert!(warnings.is_empty());
        assert_eq!(train, before);
    }

    #[test]
    fn test_unknown_parameter_warns_only_on_train_config() {
        let mut train = TrainConfig::default();
        let mut lora = LoraSettings::default();

        let warnings = reconcile(
            &mut [&mut train, &mut lora],
            &overrides(&[("definitely_not_a_field", json!(1))]),
        );

        // One warning from the training config; the lora config skips the
        // key silently.
        assert_eq!(
            warnings,
            vec![OverrideWarning::UnknownParameter {
                key: "definitely_not_a_field".to_string(),
            }]
        );
    }

    #[test]
    fn test_multi_dot_key_rejected_with_warning() {
        let mut train = TrainConfig::default();
        let before = train.clone();

        let warnings = reconcile_one(&mut train, &overrides(&[("a.b.c", json!(1))]));

        assert_eq!(
            warnings,
            vec![OverrideWarning::MalformedKey { key: "a.b.c".to_string() }]
        );
        assert_eq!(train, before);
    }

    #[test]
    fn test_wrong_value_type_warns_and_leaves_field() {
        let mut train = TrainConfig::default();
        let lr_before = train.lr;

        let warnings = reconcile_one(&mut train, &overrides(&[("lr", json!("fast"))]));

        assert_eq!(
            warnings,
            vec![OverrideWarning::InvalidValue {
                config: "TrainConfig",
                key: "lr".to_string(),
            }]
        );
        assert_eq!(train.lr, lr_before);
    }

    #[test]
    fn test_reapplying_empty_set_after_overrides_is_noop() {
        let mut config = TrainConfig::default();
        reconcile_one(&mut config, &overrides(&[("num_epochs", json!(7))]));
        let snapshot = config.clone();

        let warnings = reconcile_one(&mut config, &OverrideSet::new());

        assert!(warnings.is_empty());
        assert_eq!(config, snapshot);
    }

    #[test]
    fn test_string_vec_override() {
        let mut lora = LoraSettings::default();

        reconcile_one(
            &mut lora,
            &overrides(&[("target_modules", json!(["q_proj", "k_proj", "v_proj"]))]),
        );

        assert_eq!(lora.target_modules, vec!["q_proj", "k_proj", "v_proj"]);
    }
}
