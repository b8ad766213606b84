//! Workflow configuration

use serde::{Deserialize, Serialize};

/// Settings for the endorsement workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Identity that stands for the school role
    #[serde(default = "default_school_id")]
    pub school_id: String,

    /// Display name written into WaitEndorserAcct for the school phase
    #[serde(default = "default_school_name")]
    pub school_name: String,

    /// Value written at `OD_<drawer>` when a bill goes overdue
    #[serde(default = "default_penalty_marker")]
    pub penalty_marker: String,

    /// Only the current waiting endorser may accept or reject
    #[serde(default = "default_enforce_endorser_identity")]
    pub enforce_endorser_identity: bool,
}

fn default_school_id() -> String {
    "0".to_string()
}

fn default_school_name() -> String {
    "School".to_string()
}

fn default_penalty_marker() -> String {
    "overdue".to_string()
}

fn default_enforce_endorser_identity() -> bool {
    true
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            school_id: default_school_id(),
            school_name: default_school_name(),
            penalty_marker: default_penalty_marker(),
            enforce_endorser_identity: default_enforce_endorser_identity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: WorkflowConfig =
            serde_json::from_str(r#"{"enforce_endorser_identity":false}"#).unwrap();
        assert!(!config.enforce_endorser_identity);
        assert_eq!(config.school_id, "0");
        assert_eq!(config.school_name, "School");
        assert_eq!(config.penalty_marker, "overdue");
    }
}
