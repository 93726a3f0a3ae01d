//! Input validation, run before any cluster call.

use svc_cfgmgr_common::{SvcError, SvcResult};

use crate::types::{DesiredState, PortsetState};

/// Rejects a desired state that cannot be reconciled.
///
/// Parameters that only apply to creation or update are an error with
/// `state=absent` rather than being silently ignored.
pub fn validate(desired: &DesiredState) -> SvcResult<()> {
    if desired.name.trim().is_empty() {
        return Err(SvcError::validation(
            "name",
            "Missing mandatory parameter: name",
        ));
    }

    if desired.ownership_group().is_some() && desired.clear_ownership_group {
        return Err(SvcError::validation(
            "ownershipgroup",
            "Mutually exclusive parameters: ownershipgroup, noownershipgroup",
        ));
    }

    if desired.state == PortsetState::Absent {
        let mut extra = Vec::new();
        if desired.resource_type.is_some() {
            extra.push("portset_type");
        }
        if desired.ownership_group().is_some() {
            extra.push("ownershipgroup");
        }
        if desired.clear_ownership_group {
            extra.push("noownershipgroup");
        }
        if !extra.is_empty() {
            return Err(SvcError::validation(
                "state",
                format!(
                    "state=absent but following parameter(s) exist: {}",
                    extra.join(", ")
                ),
            ));
        }
    }

    Ok(())
}
