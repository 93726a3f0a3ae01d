//! Assertions over a [`FakeCluster`]'s objects and received commands.

use thiserror::Error;

use crate::fake_cluster::FakeCluster;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected {kind} '{name}' not found on cluster")]
    ObjectNotFound { kind: String, name: String },

    #[error("Expected {kind} '{name}' to be absent")]
    UnexpectedObject { kind: String, name: String },

    #[error("Expected attribute '{attribute}' not found on {kind} '{name}'")]
    AttributeNotFound {
        kind: String,
        name: String,
        attribute: String,
    },

    #[error("Value mismatch for {name}:{attribute}: expected '{expected}', got '{actual}'")]
    ValueMismatch {
        name: String,
        attribute: String,
        expected: String,
        actual: String,
    },

    #[error("Expected command matching '{expected}', got {actual:?}")]
    CommandNotExecuted { expected: String, actual: Vec<String> },

    #[error("Command matching '{unexpected}' was executed")]
    UnexpectedCommand { unexpected: String },

    #[error("Expected {expected} commands, found {actual}")]
    CommandCountMismatch { expected: usize, actual: usize },
}

pub type VerifyResult<T> = Result<T, VerificationError>;

/// Checks objects of one kind on a [`FakeCluster`].
pub struct ClusterVerifier<'a> {
    cluster: &'a FakeCluster,
    kind: String,
}

impl<'a> ClusterVerifier<'a> {
    pub fn new(cluster: &'a FakeCluster, kind: impl Into<String>) -> Self {
        Self {
            cluster,
            kind: kind.into(),
        }
    }

    pub fn assert_exists(&self, name: &str) -> VerifyResult<()> {
        match self.cluster.object(&self.kind, name) {
            Some(_) => Ok(()),
            None => Err(VerificationError::ObjectNotFound {
                kind: self.kind.clone(),
                name: name.to_string(),
            }),
        }
    }

    pub fn assert_not_exists(&self, name: &str) -> VerifyResult<()> {
        match self.cluster.object(&self.kind, name) {
            Some(_) => Err(VerificationError::UnexpectedObject {
                kind: self.kind.clone(),
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn assert_attribute(&self, name: &str, attribute: &str, expected: &str) -> VerifyResult<()> {
        let attrs = self
            .cluster
            .object(&self.kind, name)
            .ok_or_else(|| VerificationError::ObjectNotFound {
                kind: self.kind.clone(),
                name: name.to_string(),
            })?;

        match attrs.get(attribute) {
            None => Err(VerificationError::AttributeNotFound {
                kind: self.kind.clone(),
                name: name.to_string(),
                attribute: attribute.to_string(),
            }),
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(VerificationError::ValueMismatch {
                name: name.to_string(),
                attribute: attribute.to_string(),
                expected: expected.to_string(),
                actual: actual.clone(),
            }),
        }
    }
}

/// Assertions over the CLI lines a cluster received, matched by substring.
pub struct CommandVerifier {
    commands: Vec<String>,
}

impl CommandVerifier {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    fn matching(&self, pattern: &str) -> Option<&String> {
        self.commands.iter().find(|cmd| cmd.contains(pattern))
    }

    pub fn assert_command_executed(&self, pattern: &str) -> VerifyResult<()> {
        self.matching(pattern)
            .map(|_| ())
            .ok_or_else(|| VerificationError::CommandNotExecuted {
                expected: pattern.to_string(),
                actual: self.commands.clone(),
            })
    }

    pub fn assert_command_not_executed(&self, pattern: &str) -> VerifyResult<()> {
        match self.matching(pattern) {
            Some(_) => Err(VerificationError::UnexpectedCommand {
                unexpected: pattern.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// No `svctask` line was sent.
    pub fn assert_no_mutation(&self) -> VerifyResult<()> {
        self.assert_command_not_executed("svctask")
    }

    pub fn assert_command_count(&self, expected: usize) -> VerifyResult<()> {
        match self.commands.len() {
            actual if actual == expected => Ok(()),
            actual => Err(VerificationError::CommandCountMismatch { expected, actual }),
        }
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::portset_fixtures;

    #[test]
    fn test_command_verifier() {
        let commands = vec![
            "svcinfo lsportset -delim \":\" \"portset0\"".to_string(),
            "svctask rmportset \"portset0\"".to_string(),
        ];

        let verifier = CommandVerifier::new(commands);

        assert!(verifier.assert_command_executed("lsportset").is_ok());
        assert!(verifier.assert_command_executed("svctask rmportset").is_ok());
        assert!(verifier.assert_command_not_executed("mkportset").is_ok());
        assert!(verifier.assert_command_count(2).is_ok());

        assert!(verifier.assert_command_count(3).is_err());
        assert!(verifier.assert_command_executed("chportset").is_err());
        assert!(verifier.assert_no_mutation().is_err());
    }

    #[test]
    fn test_cluster_verifier() {
        let cluster = portset_fixtures::cluster_with(portset_fixtures::owned_portset(
            "portset0",
            "new_owner",
        ));
        let verifier = ClusterVerifier::new(&cluster, portset_fixtures::KIND);

        assert!(verifier.assert_exists("portset0").is_ok());
        assert!(verifier.assert_not_exists("portset1").is_ok());
        assert!(verifier
            .assert_attribute("portset0", "owner_name", "new_owner")
            .is_ok());

        assert!(verifier.assert_exists("portset1").is_err());
        assert!(verifier.assert_attribute("portset0", "owner_name", "other").is_err());
        assert!(verifier.assert_attribute("portset0", "missing", "").is_err());
    }
}
