//! Remote client for portset objects.

use async_trait::async_trait;
use svc_cfgmgr_common::{SvcResult, SvcTransport};
use tracing::debug;

use crate::commands::*;
use crate::types::{OwnershipChange, PortsetType, RemotePortset};

/// The four cluster operations the reconciler needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PortsetClient: Send + Sync {
    /// Looks up a portset by name; `None` if it does not exist.
    async fn query(&self, name: &str) -> SvcResult<Option<RemotePortset>>;

    async fn create(
        &self,
        name: &str,
        portset_type: Option<PortsetType>,
        ownership_group: Option<String>,
    ) -> SvcResult<()>;

    async fn update(&self, name: &str, change: OwnershipChange) -> SvcResult<()>;

    async fn delete(&self, name: &str) -> SvcResult<()>;
}

/// [`PortsetClient`] over any [`SvcTransport`].
pub struct SvcPortsetClient<T> {
    transport: T,
}

impl<T: SvcTransport> SvcPortsetClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: SvcTransport> PortsetClient for SvcPortsetClient<T> {
    async fn query(&self, name: &str) -> SvcResult<Option<RemotePortset>> {
        let cmd = build_lsportset_cmd(name);
        let attrs = self.transport.obj_info(&cmd).await?;
        debug!(portset = %name, found = attrs.is_some(), "Queried portset");
        Ok(attrs.as_ref().map(RemotePortset::from_attributes))
    }

    async fn create(
        &self,
        name: &str,
        portset_type: Option<PortsetType>,
        ownership_group: Option<String>,
    ) -> SvcResult<()> {
        let cmd = build_mkportset_cmd(name, portset_type, ownership_group.as_deref());
        self.transport.run_command(&cmd).await
    }

    async fn update(&self, name: &str, change: OwnershipChange) -> SvcResult<()> {
        let cmd = build_chportset_cmd(name, &change);
        self.transport.run_command(&cmd).await
    }

    async fn delete(&self, name: &str) -> SvcResult<()> {
        let cmd = build_rmportset_cmd(name);
        self.transport.run_command(&cmd).await
    }
}
