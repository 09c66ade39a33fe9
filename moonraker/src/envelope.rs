use serde::{Deserialize, Serialize};

/// Body of a `/printer/gcode/script` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    script: String,
}

impl CommandEnvelope {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_script_object() {
        let envelope = CommandEnvelope::new("manual_stepper stepper=stepper_j1 move=10.0 speed=5");

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            serde_json::json!({ "script": "manual_stepper stepper=stepper_j1 move=10.0 speed=5" })
        );
    }
}
