//! Parameter-efficient fine-tuning method settings
//!
//! One settings struct per registered peft method. Each struct carries the
//! method's tunable fields with stock defaults, accepts overrides through
//! [`Overridable`], and knows how to build the adapter configuration that is
//! handed to the model patching layer.

use crate::adapter::{AdapterConfig, AdaptionPromptConfig, LoraAdapterConfig, PrefixTuningConfig};
use crate::overrides::{
    as_bool, as_f32, as_string, as_string_vec, as_usize, assign, Overridable, SetOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A peft method's settings object: overridable fields plus the conversion
/// into the final adapter configuration.
pub trait PeftSettings: Overridable + Send + Sync {
    /// Build the adapter configuration from the current field values
    fn build_adapter(&self) -> AdapterConfig;
}

impl Overridable for Box<dyn PeftSettings> {
    fn config_name(&self) -> &'static str {
        (**self).config_name()
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        (**self).set_field(field, value)
    }

    fn warns_on_unknown(&self) -> bool {
        (**self).warns_on_unknown()
    }
}

/// Settings for low-rank adaptation (LoRA)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraSettings {
    /// LoRA rank
    pub r: usize,
    /// LoRA alpha scaling factor
    pub lora_alpha: usize,
    /// Modules the low-rank matrices attach to
    pub target_modules: Vec<String>,
    /// Bias handling: `none`, `all` or `lora_only`
    pub bias: String,
    /// Task type forwarded to the adapter constructor
    pub task_type: String,
    /// Dropout probability on the LoRA path
    pub lora_dropout: f32,
    /// Build the adapter for inference instead of training
    pub inference_mode: bool,
}

impl Default for LoraSettings {
    fn default() -> Self {
        Self {
            r: 8,
            lora_alpha: 32,
            target_modules: vec!["q_proj".to_string(), "v_proj".to_string()],
            bias: "none".to_string(),
            task_type: "CAUSAL_LM".to_string(),
            lora_dropout: 0.05,
            inference_mode: false,
        }
    }
}

impl Overridable for LoraSettings {
    fn config_name(&self) -> &'static str {
        "LoraSettings"
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        match field {
            "r" => assign(&mut self.r, as_usize(value)),
            "lora_alpha" => assign(&mut self.lora_alpha, as_usize(value)),
            "target_modules" => assign(&mut self.target_modules, as_string_vec(value)),
            "bias" => assign(&mut self.bias, as_string(value)),
            "task_type" => assign(&mut self.task_type, as_string(value)),
            "lora_dropout" => assign(&mut self.lora_dropout, as_f32(value)),
            "inference_mode" => assign(&mut self.inference_mode, as_bool(value)),
            _ => SetOutcome::UnknownField,
        }
    }
}

impl PeftSettings for LoraSettings {
    fn build_adapter(&self) -> AdapterConfig {
        AdapterConfig::Lora(LoraAdapterConfig {
            r: self.r,
            lora_alpha: self.lora_alpha,
            target_modules: self.target_modules.clone(),
            bias: self.bias.clone(),
            task_type: self.task_type.clone(),
            lora_dropout: self.lora_dropout,
            inference_mode: self.inference_mode,
        })
    }
}

/// Settings for Llama-Adapter (adaption prompt) tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlamaAdapterSettings {
    /// Number of adapter tokens prepended per layer
    pub adapter_len: usize,
    /// Number of transformer layers receiving adapter tokens
    pub adapter_layers: usize,
    /// Task type forwarded to the adapter constructor
    pub task_type: String,
}

impl Default for LlamaAdapterSettings {
    fn default() -> Self {
        Self {
            adapter_len: 10,
            adapter_layers: 30,
            task_type: "CAUSAL_LM".to_string(),
        }
    }
}

impl Overridable for LlamaAdapterSettings {
    fn config_name(&self) -> &'static str {
        "LlamaAdapterSettings"
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        match field {
            "adapter_len" => assign(&mut self.adapter_len, as_usize(value)),
            "adapter_layers" => assign(&mut self.adapter_layers, as_usize(value)),
            "task_type" => assign(&mut self.task_type, as_string(value)),
            _ => SetOutcome::UnknownField,
        }
    }
}

impl PeftSettings for LlamaAdapterSettings {
    fn build_adapter(&self) -> AdapterConfig {
        AdapterConfig::AdaptionPrompt(AdaptionPromptConfig {
            adapter_len: self.adapter_len,
            adapter_layers: self.adapter_layers,
            task_type: self.task_type.clone(),
        })
    }
}

/// Settings for prefix tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixSettings {
    /// Number of trainable virtual tokens prepended to the input
    pub num_virtual_tokens: usize,
    /// Task type forwarded to the adapter constructor
    pub task_type: String,
}

impl Default for PrefixSettings {
    fn default() -> Self {
        Self {
            num_virtual_tokens: 30,
            task_type: "CAUSAL_LM".to_string(),
        }
    }
}

impl Overridable for PrefixSettings {
    fn config_name(&self) -> &'static str {
        "PrefixSettings"
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        match field {
            "num_virtual_tokens" => assign(&mut self.num_virtual_tokens, as_usize(value)),
            "task_type" => assign(&mut self.task_type, as_string(value)),
            _ => SetOutcome::UnknownField,
        }
    }
}

impl PeftSettings for PrefixSettings {
    fn build_adapter(&self) -> AdapterConfig {
        AdapterConfig::PrefixTuning(PrefixTuningConfig {
            num_virtual_tokens: self.num_virtual_tokens,
            task_type: self.task_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lora_defaults() {
        let settings = LoraSettings::default();
        assert_eq!(settings.r, 8);
        assert_eq!(settings.lora_alpha, 32);
        assert_eq!(settings.target_modules, vec!["q_proj", "v_proj"]);
        assert!(!settings.inference_mode);
    }

    #[test]
    fn test_lora_builds_adapter_from_fields() {
        let mut settings = LoraSettings::default();
        settings.r = 32;
        settings.lora_dropout = 0.1;

        match settings.build_adapter() {
            AdapterConfig::Lora(adapter) => {
                assert_eq!(adapter.r, 32);
                assert_eq!(adapter.lora_dropout, 0.1);
                assert_eq!(adapter.task_type, "CAUSAL_LM");
            }
            other => panic!("expected lora adapter, got {other:?}"),
        }
    }

    #[test]
    fn test_llama_adapter_builds_adaption_prompt() {
        let settings = LlamaAdapterSettings::default();
        match settings.build_adapter() {
            AdapterConfig::AdaptionPrompt(adapter) => {
                assert_eq!(adapter.adapter_len, 10);
                assert_eq!(adapter.adapter_layers, 30);
            }
            other => panic!("expected adaption prompt adapter, got {other:?}"),
        }
    }

    #[test]
    fn test_prefix_builds_prefix_tuning() {
        let settings = PrefixSettings::default();
        match settings.build_adapter() {
            AdapterConfig::PrefixTuning(adapter) => {
                assert_eq!(adapter.num_virtual_tokens, 30);
            }
            other => panic!("expected prefix tuning adapter, got {other:?}"),
        }
    }
}
