//! Configuration resolvers
//!
//! Validate the selector fields of a [`TrainConfig`] against the registries,
//! instantiate the matching settings with defaults, apply overrides and hand
//! back the finished object. All failures surface before any adapter or
//! loader object is constructed.

use crate::adapter::AdapterConfig;
use crate::config::{DatasetConfig, TrainConfig};
use crate::error::{Error, Result};
use crate::overrides::{reconcile_one, OverrideSet, OverrideWarning};
use crate::registry::{MethodStatus, DATASETS, PEFT_METHODS};
use tracing::debug;

/// Resolve the adapter configuration for the peft method selected by
/// `train_config`, applying `overrides` to the method's settings.
///
/// Fails with [`Error::UnknownMethod`] for unregistered names,
/// [`Error::UnsupportedMethod`] for registered-but-disabled methods and
/// [`Error::IncompatibleCombination`] when the method cannot run under the
/// configured distributed mode.
pub fn resolve_peft(
    train_config: &TrainConfig,
    overrides: &OverrideSet,
) -> Result<(AdapterConfig, Vec<OverrideWarning>)> {
    let method = train_config.peft_method.as_str();
    let entry = PEFT_METHODS
        .get(method)
        .ok_or_else(|| Error::UnknownMethod(method.to_string()))?;

    if let MethodStatus::Disabled(reason) = entry.status {
        return Err(Error::UnsupportedMethod {
            method: method.to_string(),
            reason: reason.to_string(),
        });
    }

    if train_config.enable_fsdp && !entry.fsdp_compatible {
        return Err(Error::IncompatibleCombination {
            first: format!("peft_method={method}"),
            second: "enable_fsdp=true".to_string(),
        });
    }

    let mut settings = (entry.factory)();
    let warnings = reconcile_one(&mut settings, overrides);
    let adapter = settings.build_adapter();
    debug!("Resolved peft method `{method}`");

    Ok((adapter, warnings))
}

/// Resolve the dataset configuration selected by `train_config`, applying
/// `overrides` to it.
///
/// Fails with [`Error::UnknownDataset`] when the name is not a key of the
/// dataset registry.
pub fn resolve_dataset(
    train_config: &TrainConfig,
    overrides: &OverrideSet,
) -> Result<(DatasetConfig, Vec<OverrideWarning>)> {
    let name = train_config.dataset.as_str();
    let entry = DATASETS
        .get(name)
        .ok_or_else(|| Error::UnknownDataset(name.to_string()))?;

    let mut dataset_config = (entry.factory)();
    let warnings = reconcile_one(&mut dataset_config, overrides);
    debug!("Resolved dataset `{name}`");

    Ok((dataset_config, warnings))
}
