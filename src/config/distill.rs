//! Knowledge distillation configuration
//!
//! Plain record with no resolver of its own; it only participates in override
//! reconciliation alongside the other configs.

use crate::overrides::{as_f64, as_string, assign, Overridable, SetOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Distillation hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistillConfig {
    /// Teacher model name or path
    pub teacher_model_name: String,
    /// Weight of the distillation term in the combined loss
    pub alpha: f64,
    /// Softmax temperature applied to teacher and student logits
    pub temperature: f64,
}

impl Default for DistillConfig {
    fn default() -> Self {
        Self {
            teacher_model_name: "meta-llama/Llama-2-7b-hf".to_string(),
            alpha: 0.5,
            temperature: 2.0,
        }
    }
}

impl Overridable for DistillConfig {
    fn config_name(&self) -> &'static str {
        "DistillConfig"
    }

    fn set_field(&mut self, field: &str, value: &Value) -> SetOutcome {
        match field {
            "teacher_model_name" => assign(&mut self.teacher_model_name, as_string(value)),
            "alpha" => assign(&mut self.alpha, as_f64(value)),
            "temperature" => assign(&mut self.temperature, as_f64(value)),
            _ => SetOutcome::UnknownField,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::reconcile_one;
    use serde_json::json;

    #[test]
    fn test_scoped_override() {
        let mut config = DistillConfig::default();
        let overrides = [("DistillConfig.alpha".to_string(), json!(0.9))]
            .into_iter()
            .collect();

        let warnings = reconcile_one(&mut config, &overrides);

        assert!(warnings.is_empty());
        assert_eq!(config.alpha, 0.9);
        assert_eq!(config.temperature, 2.0);
    }
}
