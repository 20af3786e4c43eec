//! Typed configuration records for fine-tuning runs
//!
//! The training configuration, the per-method peft settings, the per-dataset
//! settings and the distillation record. All of them accept overrides through
//! [`crate::overrides::Overridable`].

pub mod dataset;
pub mod distill;
pub mod peft;
pub mod train;

pub use dataset::{AlpacaDataset, DatasetConfig, GrammarDataset, SamsumDataset};
pub use distill::DistillConfig;
pub use peft::{LlamaAdapterSettings, LoraSettings, PeftSettings, PrefixSettings};
pub use train::TrainConfig;
