//! Transport abstraction over the cluster command interface.

use std::sync::Arc;

use async_trait::async_trait;

use crate::attributes::Attributes;
use crate::command::SvcCommand;
use crate::config::{SvcConfig, TransportKind};
use crate::error::SvcResult;
use crate::rest::RestTransport;
use crate::ssh::SshTransport;

/// Carries [`SvcCommand`]s to a cluster.
///
/// Implementations own authentication, timeouts and connection handling.
/// Errors reaching the cluster are reported as `SvcError::Transport`;
/// a rejected mutation as `SvcError::Operation`.
#[async_trait]
pub trait SvcTransport: Send + Sync {
    /// Runs an `svcinfo` query for a single object.
    ///
    /// Returns `Ok(None)` when the cluster reports that the object does
    /// not exist.
    async fn obj_info(&self, cmd: &SvcCommand) -> SvcResult<Option<Attributes>>;

    /// Runs an `svctask` mutation.
    async fn run_command(&self, cmd: &SvcCommand) -> SvcResult<()>;
}

#[async_trait]
impl<T: SvcTransport + ?Sized> SvcTransport for Box<T> {
    async fn obj_info(&self, cmd: &SvcCommand) -> SvcResult<Option<Attributes>> {
        (**self).obj_info(cmd).await
    }

    async fn run_command(&self, cmd: &SvcCommand) -> SvcResult<()> {
        (**self).run_command(cmd).await
    }
}

#[async_trait]
impl<T: SvcTransport + ?Sized> SvcTransport for Arc<T> {
    async fn obj_info(&self, cmd: &SvcCommand) -> SvcResult<Option<Attributes>> {
        (**self).obj_info(cmd).await
    }

    async fn run_command(&self, cmd: &SvcCommand) -> SvcResult<()> {
        (**self).run_command(cmd).await
    }
}

/// Builds the transport selected in the configuration.
pub fn from_config(config: &SvcConfig) -> SvcResult<Box<dyn SvcTransport>> {
    config.validate()?;
    match config.cluster.transport {
        TransportKind::Rest => Ok(Box::new(RestTransport::new(&config.cluster)?)),
        TransportKind::Ssh => Ok(Box::new(SshTransport::new(config)?)),
    }
}
