//! Adapter configurations handed to the model patching layer
//!
//! These mirror the constructor surface of the external adapter library: one
//! configuration type per peft method, built from the resolved method
//! settings. Nothing here is tunable after construction.

use serde::{Deserialize, Serialize};

/// Final adapter configuration for low-rank adaptation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraAdapterConfig {
    /// LoRA rank
    pub r: usize,
    /// LoRA alpha scaling factor
    pub lora_alpha: usize,
    /// Modules the low-rank matrices attach to
    pub target_modules: Vec<String>,
    /// Bias handling: `none`, `all` or `lora_only`
    pub bias: String,
    /// Task type the adapter is built for
    pub task_type: String,
    /// Dropout probability on the LoRA path
    pub lora_dropout: f32,
    /// Whether the adapter is built for inference
    pub inference_mode: bool,
}

/// Final adapter configuration for Llama-Adapter (adaption prompt) tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptionPromptConfig {
    /// Number of adapter tokens prepended per layer
    pub adapter_len: usize,
    /// Number of transformer layers receiving adapter tokens
    pub adapter_layers: usize,
    /// Task type the adapter is built for
    pub task_type: String,
}

/// Final adapter configuration for prefix tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixTuningConfig {
    /// Number of trainable virtual tokens
    pub num_virtual_tokens: usize,
    /// Task type the adapter is built for
    pub task_type: String,
}

/// A fully resolved adapter configuration, one variant per peft method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdapterConfig {
    /// Low-rank adaptation
    Lora(LoraAdapterConfig),
    /// Llama-Adapter adaption prompt
    AdaptionPrompt(AdaptionPromptConfig),
    /// Prefix tuning
    PrefixTuning(PrefixTuningConfig),
}

impl AdapterConfig {
    /// Registry name of the method this adapter belongs to
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Lora(_) => "lora",
            Self::AdaptionPrompt(_) => "llama_adapter",
            Self::PrefixTuning(_) => "prefix",
        }
    }
}
