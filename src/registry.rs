//! Static registries of peft methods and datasets
//!
//! Each registry maps a short name to a record holding the settings factory
//! and the metadata the resolvers enforce. Adding a method or dataset means
//! adding one entry here; the resolver logic never changes.

use crate::config::dataset::{AlpacaDataset, GrammarDataset, SamsumDataset};
use crate::config::peft::{LlamaAdapterSettings, LoraSettings, PeftSettings, PrefixSettings};
use crate::config::DatasetConfig;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Whether a registered peft method may actually be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodStatus {
    /// The method is fully supported
    Supported,
    /// The method is registered but deliberately disabled
    Disabled(&'static str),
}

/// Registry record for a peft method
pub struct PeftMethodEntry {
    /// Creates the method's default settings object
    pub factory: fn() -> Box<dyn PeftSettings>,
    /// Support status, with a reason when disabled
    pub status: MethodStatus,
    /// Whether the method works under fully-sharded training
    pub fsdp_compatible: bool,
}

/// Registry record for a dataset
pub struct DatasetEntry {
    /// Creates the dataset's default configuration
    pub factory: fn() -> DatasetConfig,
}

/// All known peft methods, keyed by registry name
pub static PEFT_METHODS: Lazy<BTreeMap<&'static str, PeftMethodEntry>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "lora",
            PeftMethodEntry {
                factory: || Box::new(LoraSettings::default()),
                status: MethodStatus::Supported,
                fsdp_compatible: true,
            },
        ),
        (
            "llama_adapter",
            PeftMethodEntry {
                factory: || Box::new(LlamaAdapterSettings::default()),
                status: MethodStatus::Supported,
                // Adapter tokens live outside the sharded parameter groups
                // and cannot be gathered correctly.
                fsdp_compatible: false,
            },
        ),
        (
            "prefix",
            PeftMethodEntry {
                factory: || Box::new(PrefixSettings::default()),
                status: MethodStatus::Disabled(
                    "prefix tuning currently produces broken adapters pending an upstream fix",
                ),
                fsdp_compatible: true,
            },
        ),
    ])
});

/// All known datasets, keyed by registry name. Keys mirror the dataset
/// preprocessor table, which is the authority on which datasets exist.
pub static DATASETS: Lazy<BTreeMap<&'static str, DatasetEntry>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "samsum_dataset",
            DatasetEntry {
                factory: || DatasetConfig::Samsum(SamsumDataset::default()),
            },
        ),
        (
            "grammar_dataset",
            DatasetEntry {
                factory: || DatasetConfig::Grammar(GrammarDataset::default()),
            },
        ),
        (
            "alpaca_dataset",
            DatasetEntry {
                factory: || DatasetConfig::Alpaca(AlpacaDataset::default()),
            },
        ),
    ])
});

/// Names of all registered peft methods
pub fn peft_method_names() -> Vec<&'static str> {
    PEFT_METHODS.keys().copied().collect()
}

/// Names of all registered datasets
pub fn dataset_names() -> Vec<&'static str> {
    DATASETS.keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_methods_registered() {
        let names = peft_method_names();
        assert!(names.contains(&"lora"));
        assert!(names.contains(&"llama_adapter"));
        assert!(names.contains(&"prefix"));
    }

    #[test]
    fn test_prefix_is_disabled() {
        let entry = PEFT_METHODS.get("prefix").unwrap();
        assert!(matches!(entry.status, MethodStatus::Disabled(_)));
    }

    #[test]
    fn test_llama_adapter_incompatible_with_fsdp() {
        let entry = PEFT_METHODS.get("llama_adapter").unwrap();
        assert!(!entry.fsdp_compatible);
        assert_eq!(entry.status, MethodStatus::Supported);
    }

    #[test]
    fn test_expected_datasets_registered() {
        assert_eq!(
            dataset_names(),
            vec!["alpaca_dataset", "grammar_dataset", "samsum_dataset"]
        );
    }

    #[test]
    fn test_factories_produce_defaults() {
        let lora = (PEFT_METHODS.get("lora").unwrap().factory)();
        assert_eq!(lora.config_name(), "LoraSettings");

        let samsum = (DATASETS.get("samsum_dataset").unwrap().factory)();
        assert_eq!(samsum.name(), "samsum_dataset");
    }
}
