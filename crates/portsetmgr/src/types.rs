//! Type definitions for portsetmgr

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use svc_cfgmgr_common::{Attributes, AttributesExt, SvcError};

use crate::fields::attrs;

/// Whether the portset should exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortsetState {
    Present,
    Absent,
}

impl PortsetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortsetState::Present => "present",
            PortsetState::Absent => "absent",
        }
    }
}

impl FromStr for PortsetState {
    type Err = SvcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(PortsetState::Present),
            "absent" => Ok(PortsetState::Absent),
            _ => Err(SvcError::validation(
                "state",
                format!("Invalid state '{}'. Valid options: present, absent", s),
            )),
        }
    }
}

impl fmt::Display for PortsetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portset type, fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortsetType {
    /// Host attachment portset.
    Host,
    /// Remote-copy replication portset.
    Replication,
}

impl PortsetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortsetType::Host => "host",
            PortsetType::Replication => "replication",
        }
    }
}

impl FromStr for PortsetType {
    type Err = SvcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(PortsetType::Host),
            "replication" => Ok(PortsetType::Replication),
            _ => Err(SvcError::validation(
                "portset_type",
                format!("Invalid portset type '{}'. Valid options: host, replication", s),
            )),
        }
    }
}

impl fmt::Display for PortsetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state of one portset.
///
/// Field names on the wire follow the automation parameter names
/// (`portset_type`, `ownershipgroup`, `noownershipgroup`), so a parameter
/// document can be deserialized directly. Unknown keys such as connection
/// parameters are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    /// Portset name
    #[serde(default)]
    pub name: String,

    /// present or absent
    pub state: PortsetState,

    /// Type applied on creation only
    #[serde(default, rename = "portset_type")]
    pub resource_type: Option<PortsetType>,

    /// Ownership group to assign
    #[serde(default, rename = "ownershipgroup")]
    pub ownership_group: Option<String>,

    /// Remove any ownership group
    #[serde(default, rename = "noownershipgroup")]
    pub clear_ownership_group: bool,
}

impl DesiredState {
    /// A portset that should exist, with no optional attributes.
    pub fn present(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: PortsetState::Present,
            resource_type: None,
            ownership_group: None,
            clear_ownership_group: false,
        }
    }

    /// A portset that should not exist.
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            state: PortsetState::Absent,
            ..Self::present(name)
        }
    }

    pub fn with_type(mut self, portset_type: PortsetType) -> Self {
        self.resource_type = Some(portset_type);
        self
    }

    pub fn with_ownership_group(mut self, group: impl Into<String>) -> Self {
        self.ownership_group = Some(group.into());
        self
    }

    pub fn clearing_ownership_group(mut self) -> Self {
        self.clear_ownership_group = true;
        self
    }

    /// Ownership group with an empty string treated as unset.
    pub fn ownership_group(&self) -> Option<&str> {
        self.ownership_group.as_deref().filter(|g| !g.is_empty())
    }
}

/// Ownership modification issued by `chportset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipChange {
    /// Assign this ownership group.
    Set(String),
    /// Remove the ownership group.
    Clear,
}

impl fmt::Display for OwnershipChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnershipChange::Set(group) => write!(f, "ownershipgroup={}", group),
            OwnershipChange::Clear => f.write_str("noownershipgroup"),
        }
    }
}

/// Snapshot of a portset as reported by `lsportset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemotePortset {
    pub id: String,
    pub name: String,
    pub portset_type: String,
    pub port_count: u32,
    pub host_count: u32,
    pub lossless: String,
    pub owner_id: Option<String>,
    /// Ownership group; `None` when the cluster reports an empty name
    pub owner_name: Option<String>,
}

impl RemotePortset {
    /// Builds a snapshot from query attributes.
    ///
    /// Missing or unparsable counters read as zero.
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let count = |field: &str| -> u32 {
            attributes
                .get_field(field)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        };
        let owned = |field: &str| attributes.non_empty_field(field).map(str::to_string);

        Self {
            id: attributes.get_field_or(attrs::ID, "").to_string(),
            name: attributes.get_field_or(attrs::NAME, "").to_string(),
            portset_type: attributes.get_field_or(attrs::TYPE, "").to_string(),
            port_count: count(attrs::PORT_COUNT),
            host_count: count(attrs::HOST_COUNT),
            lossless: attributes.get_field_or(attrs::LOSSLESS, "").to_string(),
            owner_id: owned(attrs::OWNER_ID),
            owner_name: owned(attrs::OWNER_NAME),
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }
}

/// The single action a reconciliation decides on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Already convergent.
    Noop,
    /// Create the portset.
    Create,
    /// Change the ownership group.
    Update(OwnershipChange),
    /// Remove the portset.
    Delete,
}

impl Action {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Action::Noop)
    }

    /// Short name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Noop => "none",
            Action::Create => "create",
            Action::Update(_) => "update",
            Action::Delete => "delete",
        }
    }
}

/// Result of one successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub name: String,
    pub action: Action,
    /// True if the action mutated, or in check mode would mutate, the cluster
    pub changed: bool,
    pub check_mode: bool,
    /// Whether the portset existed when it was queried
    pub existed: bool,
}

impl Outcome {
    pub fn message(&self) -> String {
        let text = match self.action {
            Action::Noop if self.existed => {
                format!("Portset ({}) already exists. No modifications done.", self.name)
            }
            Action::Noop => {
                format!("Portset ({}) does not exist. No modifications done.", self.name)
            }
            Action::Create => format!("Portset ({}) created.", self.name),
            Action::Update(_) => format!("Portset ({}) updated.", self.name),
            Action::Delete => format!("Portset ({}) deleted.", self.name),
        };
        if self.check_mode && self.changed {
            format!("(check mode) {}", text)
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use svc_cfgmgr_common::attributes;

    #[test]
    fn test_state_from_str() {
        assert_eq!("present".parse::<PortsetState>().unwrap(), PortsetState::Present);
        assert_eq!("absent".parse::<PortsetState>().unwrap(), PortsetState::Absent);
        assert!("gone".parse::<PortsetState>().is_err());
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!("host".parse::<PortsetType>().unwrap(), PortsetType::Host);
        assert_eq!(
            "replication".parse::<PortsetType>().unwrap(),
            PortsetType::Replication
        );
        assert!("storage".parse::<PortsetType>().is_err());
    }

    #[test]
    fn test_desired_state_builders() {
        let desired = DesiredState::present("portset0")
            .with_type(PortsetType::Host)
            .with_ownership_group("new_owner");
        assert_eq!(desired.state, PortsetState::Present);
        assert_eq!(desired.resource_type, Some(PortsetType::Host));
        assert_eq!(desired.ownership_group(), Some("new_owner"));

        let desired = DesiredState::absent("portset0");
        assert_eq!(desired.state, PortsetState::Absent);
        assert!(!desired.clear_ownership_group);
    }

    #[test]
    fn test_empty_ownership_group_is_unset() {
        let desired = DesiredState::present("portset0").with_ownership_group("");
        assert_eq!(desired.ownership_group(), None);
    }

    #[test]
    fn test_desired_state_from_parameter_document() {
        let doc = r#"{
            "clustername": "cluster1",
            "username": "admin",
            "name": "portset0",
            "state": "present",
            "portset_type": "replication",
            "ownershipgroup": "new_owner"
        }"#;
        let desired: DesiredState = serde_json::from_str(doc).unwrap();
        assert_eq!(
            desired,
            DesiredState::present("portset0")
                .with_type(PortsetType::Replication)
                .with_ownership_group("new_owner")
        );
    }

    #[test]
    fn test_remote_portset_from_attributes() {
        let attrs = attributes! {
            "id" => "4",
            "name" => "portset0",
            "type" => "host",
            "port_count" => "2",
            "host_count" => "0",
            "lossless" => "",
            "owner_id" => "0",
            "owner_name" => "new_owner",
        };
        let remote = RemotePortset::from_attributes(&attrs);
        assert_eq!(remote.id, "4");
        assert_eq!(remote.portset_type, "host");
        assert_eq!(remote.port_count, 2);
        assert_eq!(remote.owner(), Some("new_owner"));
    }

    #[test]
    fn test_remote_portset_empty_owner() {
        let attrs = attributes! {
            "name" => "portset0",
            "owner_id" => "",
            "owner_name" => "",
        };
        let remote = RemotePortset::from_attributes(&attrs);
        assert_eq!(remote.owner(), None);
        assert_eq!(remote.owner_id, None);
        assert_eq!(remote.port_count, 0);
    }

    #[test]
    fn test_outcome_messages() {
        let outcome = Outcome {
            name: "portset0".to_string(),
            action: Action::Create,
            changed: true,
            check_mode: false,
            existed: false,
        };
        assert_eq!(outcome.message(), "Portset (portset0) created.");

        let noop = Outcome {
            action: Action::Noop,
            changed: false,
            ..outcome.clone()
        };
        assert_eq!(
            noop.message(),
            "Portset (portset0) does not exist. No modifications done."
        );

        let noop = Outcome {
            existed: true,
            ..noop
        };
        assert_eq!(
            noop.message(),
            "Portset (portset0) already exists. No modifications done."
        );

        let outcome = Outcome {
            check_mode: true,
            action: Action::Delete,
            existed: true,
            ..outcome
        };
        assert_eq!(outcome.message(), "(check mode) Portset (portset0) deleted.");
    }
}
