//! Dataset configurations
//!
//! One settings struct per registered dataset, wrapped in the [`DatasetConfig`]
//! tagged union returned by the dataset resolver. Split names point either at
//! hub splits or at local files, matching what the preprocessors expect.

use crate::overrides::{as_path, as_string, assign, Overridable, SetOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Configuration for the samsum summarization dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamsumDataset {
    /// Registry name of the dataset
    pub dataset: String,
    /// Split used for training
    pub train_split: String,
    /// Split used for evaluation
    pub test_split: String,
}

impl Default for SamsumDataset {
    fn default() -> Self {
        Self {
            dataset: "samsum_dataset".to_string(),
            train_split: "train".to_string(),
            test_split: "validation".to_string(),
        }
    }
}

impl Overridable for SamsumDataset {
    fn config_name(&self) -> &'static str {
        "SamsumDataset"
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        match field {
            "dataset" => assign(&mut self.dataset, as_string(value)),
            "train_split" => assign(&mut self.train_split, as_string(value)),
            "test_split" => assign(&mut self.test_split, as_string(value)),
            _ => SetOutcome::UnknownField,
        }
    }
}

/// Configuration for the grammar correction dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarDataset {
    /// Registry name of the dataset
    pub dataset: String,
    /// CSV file used for training
    pub train_split: String,
    /// CSV file used for evaluation
    pub test_split: String,
}

impl Default for GrammarDataset {
    fn default() -> Self {
        Self {
            dataset: "grammar_dataset".to_string(),
            train_split: "datasets/grammar/train.csv".to_string(),
            test_split: "datasets/grammar/validation.csv".to_string(),
        }
    }
}

impl Overridable for GrammarDataset {
    fn config_name(&self) -> &'static str {
        "GrammarDataset"
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        match field {
            "dataset" => assign(&mut self.dataset, as_string(value)),
            "train_split" => assign(&mut self.train_split, as_string(value)),
            "test_split" => assign(&mut self.test_split, as_string(value)),
            _ => SetOutcome::UnknownField,
        }
    }
}

/// Configuration for the alpaca instruction dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlpacaDataset {
    /// Registry name of the dataset
    pub dataset: String,
    /// Split used for training
    pub train_split: String,
    /// Split used for evaluation
    pub test_split: String,
    /// Local JSON file holding the instruction data
    pub data_path: PathBuf,
}

impl Default for AlpacaDataset {
    fn default() -> Self {
        Self {
            dataset: "alpaca_dataset".to_string(),
            train_split: "train".to_string(),
            test_split: "val".to_string(),
            data_path: PathBuf::from("datasets/alpaca_data.json"),
        }
    }
}

impl Overridable for AlpacaDataset {
    fn config_name(&self) -> &'static str {
        "AlpacaDataset"
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        match field {
            "dataset" => assign(&mut self.dataset, as_string(value)),
            "train_split" => assign(&mut self.train_split, as_string(value)),
            "test_split" => assign(&mut self.test_split, as_string(value)),
            "data_path" => assign(&mut self.data_path, as_path(value)),
            _ => SetOutcome::UnknownField,
        }
    }
}

/// A resolved dataset configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DatasetConfig {
    /// samsum summarization
    Samsum(SamsumDataset),
    /// grammar correction
    Grammar(GrammarDataset),
    /// alpaca instruction following
    Alpaca(AlpacaDataset),
}

impl DatasetConfig {
    /// Registry name of the wrapped dataset
    pub fn name(&self) -> &str {
        match self {
            Self::Samsum(config) => &config.dataset,
            Self::Grammar(config) => &config.dataset,
            Self::Alpaca(config) => &config.dataset,
        }
    }

    /// Train split of the wrapped dataset
    pub fn train_split(&self) -> &str {
        match self {
            Self::Samsum(config) => &config.train_split,
            Self::Grammar(config) => &config.train_split,
            Self::Alpaca(config) => &config.train_split,
        }
    }

    /// Test split of the wrapped dataset
    pub fn test_split(&self) -> &str {
        match self {
            Self::Samsum(config) => &config.test_split,
            Self::Grammar(config) => &config.test_split,
            Self::Alpaca(config) => &config.test_split,
        }
    }
}

impl Overridable for DatasetConfig {
    fn config_name(&self) -> &'static str {
        match self {
            Self::Samsum(config) => config.config_name(),
            Self::Grammar(config) => config.config_name(),
            Self::Alpaca(config) => config.config_name(),
        }
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        match self {
            Self::Samsum(config) => config.set_field(field, value),
            Self::Grammar(config) => config.set_field(field, value),
            Self::Alpaca(config) => config.set_field(field, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let samsum = SamsumDataset::default();
        assert_eq!(samsum.dataset, "samsum_dataset");
        assert_eq!(samsum.test_split, "validation");

        let alpaca = AlpacaDataset::default();
        assert_eq!(alpaca.data_path, PathBuf::from("datasets/alpaca_data.json"));
    }

    #[test]
    fn test_enum_delegates_to_inner_config() {
        let mut config = DatasetConfig::Grammar(GrammarDataset::default());
        assert_eq!(config.config_name(), "GrammarDataset");

        let outcome = config.set_field(
            "train_split",
            &serde_json::json!("datasets/grammar/train2.csv"),
        );
        assert_eq!(outcome, SetOutcome::Applied);
        assert_eq!(config.train_split(), "datasets/grammar/train2.csv");
    }
}
