//! Training configuration
//!
//! The single mutable record that flows through a fine-tuning run. Selector
//! fields (`peft_method`, `dataset`, `batching_strategy`) stay plain strings
//! so that unrecognized names reach the resolvers and fail with typed errors
//! instead of dying at parse time.

use crate::error::{Error, Result};
use crate::overrides::{
    as_bool, as_f64, as_path, as_string, as_u64, as_usize, assign, Overridable, SetOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Main training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Base model name or path
    pub model_name: String,

    /// Run validation after each epoch
    pub run_validation: bool,

    /// Batch size used during training
    pub batch_size_training: usize,

    /// Batch size used during validation
    pub val_batch_size: usize,

    /// Batching strategy: `padding` or `packing`
    pub batching_strategy: String,

    /// Maximum context length in tokens
    pub context_length: usize,

    /// Gradient accumulation steps
    pub gradient_accumulation_steps: usize,

    /// Number of training epochs
    pub num_epochs: usize,

    /// Number of data loading workers
    pub num_workers_dataloader: usize,

    /// Base learning rate
    pub lr: f64,

    /// Weight decay coefficient
    pub weight_decay: f64,

    /// Multiplicative learning rate decay per epoch
    pub gamma: f64,

    /// Seed for reproducibility
    pub seed: u64,

    /// Train with fp16 autocasting
    pub use_fp16: bool,

    /// Enable mixed precision training
    pub mixed_precision: bool,

    /// Train a parameter-efficient adapter instead of the full model
    pub use_peft: bool,

    /// Peft method name, looked up in the method registry
    pub peft_method: String,

    /// Dataset name, looked up in the dataset registry
    pub dataset: String,

    /// Shard model parameters and optimizer state across processes
    pub enable_fsdp: bool,

    /// Replicate the model across processes (standard data parallel)
    pub enable_ddp: bool,

    /// Output directory for checkpoints
    pub output_dir: PathBuf,

    /// Save the model after training
    pub save_model: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model_name: "meta-llama/Llama-2-7b-hf".to_string(),
            run_validation: true,
            batch_size_training: 4,
            val_batch_size: 1,
            batching_strategy: "packing".to_string(),
            context_length: 4096,
            gradient_accumulation_steps: 1,
            num_epochs: 3,
            num_workers_dataloader: 1,
            lr: 1e-4,
            weight_decay: 0.0,
            gamma: 0.85,
            seed: 42,
            use_fp16: false,
            mixed_precision: true,
            use_peft: false,
            peft_method: "lora".to_string(),
            dataset: "samsum_dataset".to_string(),
            enable_fsdp: false,
            enable_ddp: false,
            output_dir: PathBuf::from("checkpoints"),
            save_model: true,
        }
    }
}

impl TrainConfig {
    /// Load configuration from a JSON or YAML file (chosen by extension)
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;

        let config = if path.as_ref().extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        Ok(config)
    }

    /// Save configuration to a JSON or YAML file (chosen by extension)
    pub fn to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = if path.as_ref().extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };

        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size_training == 0 {
            return Err(Error::invalid_input("batch_size_training must be greater than 0"));
        }

        if self.val_batch_size == 0 {
            return Err(Error::invalid_input("val_batch_size must be greater than 0"));
        }

        if self.gradient_accumulation_steps == 0 {
            return Err(Error::invalid_input(
                "gradient_accumulation_steps must be greater than 0",
            ));
        }

        if self.num_epochs == 0 {
            return Err(Error::invalid_input("num_epochs must be greater than 0"));
        }

        if self.lr <= 0.0 {
            return Err(Error::invalid_input("lr must be positive"));
        }

        if self.weight_decay < 0.0 {
            return Err(Error::invalid_input("weight_decay must be non-negative"));
        }

        Ok(())
    }

    /// Get effective batch size (batch_size_training * gradient_accumulation_steps)
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size_training * self.gradient_accumulation_steps
    }
}

impl Overridable for TrainConfig {
    fn config_name(&self) -> &'static str {
        "TrainConfig"
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        match field {
            "model_name" => assign(&mut self.model_name, as_string(value)),
            "run_validation" => assign(&mut self.run_validation, as_bool(value)),
            "batch_size_training" => assign(&mut self.batch_size_training, as_usize(value)),
            "val_batch_size" => assign(&mut self.val_batch_size, as_usize(value)),
            "batching_strategy" => assign(&mut self.batching_strategy, as_string(value)),
            "context_length" => assign(&mut self.context_length, as_usize(value)),
            "gradient_accumulation_steps" => {
                assign(&mut self.gradient_accumulation_steps, as_usize(value))
            }
            "num_epochs" => assign(&mut self.num_epochs, as_usize(value)),
            "num_workers_dataloader" => assign(&mut self.num_workers_dataloader, as_usize(value)),
            "lr" => assign(&mut self.lr, as_f64(value)),
            "weight_decay" => assign(&mut self.weight_decay, as_f64(value)),
            "gamma" => assign(&mut self.gamma, as_f64(value)),
            "seed" => assign(&mut self.seed, as_u64(value)),
            "use_fp16" => assign(&mut self.use_fp16, as_bool(value)),
            "mixed_precision" => assign(&mut self.mixed_precision, as_bool(value)),
            "use_peft" => assign(&mut self.use_peft, as_bool(value)),
            "peft_method" => assign(&mut self.peft_method, as_string(value)),
            "dataset" => assign(&mut self.dataset, as_string(value)),
            "enable_fsdp" => assign(&mut self.enable_fsdp, as_bool(value)),
            "enable_ddp" => assign(&mut self.enable_ddp, as_bool(value)),
            "output_dir" => assign(&mut self.output_dir, as_path(value)),
            "save_model" => assign(&mut self.save_model, as_bool(value)),
            _ => SetOutcome::UnknownField,
        }
    }

    fn warns_on_unknown(&self) -> bool {
        true
    }
}
