//! Reconciliation result reporting.

use serde::Serialize;
use svc_cfgmgr_common::SvcResult;

use crate::types::Outcome;

/// Machine-readable summary of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub changed: bool,
    pub failed: bool,
    pub msg: String,
    /// Planned action on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Error class on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ReconcileReport {
    pub fn from_result(result: &SvcResult<Outcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                changed: outcome.changed,
                failed: false,
                msg: outcome.message(),
                action: Some(outcome.action.as_str().to_string()),
                error_kind: None,
            },
            Err(e) => Self::failure(e.to_string(), e.kind()),
        }
    }

    /// Report for a failure outside reconciliation, such as a bad config file.
    pub fn failure(msg: impl Into<String>, kind: &str) -> Self {
        Self {
            changed: false,
            failed: true,
            msg: msg.into(),
            action: None,
            error_kind: Some(kind.to_string()),
        }
    }

    pub fn to_json(&self) -> String {
        // A struct of strings and bools always serializes
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn exit_code(&self) -> u8 {
        if self.failed {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, OwnershipChange};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use svc_cfgmgr_common::SvcError;

    #[test]
    fn test_report_success() {
        let outcome = Outcome {
            name: "portset0".to_string(),
            action: Action::Update(OwnershipChange::Clear),
            changed: true,
            check_mode: false,
            existed: true,
        };
        let report = ReconcileReport::from_result(&Ok(outcome));
        assert_eq!(report.exit_code(), 0);

        let value: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(
            value,
            json!({
                "changed": true,
                "failed": false,
                "msg": "Portset (portset0) updated.",
                "action": "update"
            })
        );
    }

    #[test]
    fn test_report_failure() {
        let result: SvcResult<Outcome> = Err(SvcError::operation(
            "mkportset portset0",
            "CMMVC6035E The action failed as the object already exists.",
        ));
        let report = ReconcileReport::from_result(&result);
        assert!(report.failed);
        assert!(!report.changed);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.error_kind.as_deref(), Some("operation"));
        assert!(report.msg.contains("CMMVC6035E"));

        let value: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert!(value.get("action").is_none());
        assert_eq!(value["error_kind"], "operation");
    }
}
