//! Common infrastructure for Spectrum Virtualize configuration managers.
//!
//! This crate provides the pieces shared by every object manager
//! (portsetmgr today):
//!
//! - [`command`]: The `svcinfo`/`svctask` command model
//! - [`transport`]: The [`SvcTransport`] trait and its REST and SSH implementations
//! - [`config`]: Cluster connection configuration
//! - [`attributes`]: Object attribute maps returned by queries
//! - [`error`]: Error types for cfgmgr operations
//!
//! # Architecture
//!
//! Object managers follow this pattern:
//!
//! 1. Validate the desired state before touching the cluster
//! 2. Query the object once through a transport
//! 3. Diff desired against observed state
//! 4. Issue at most one `svctask` command
//!
//! # Example
//!
//! ```ignore
//! use svc_cfgmgr_common::{transport, SvcCommand, SvcConfig};
//!
//! let config = SvcConfig::load_or_default("/etc/svc/portsetmgr.toml")?;
//! let transport = transport::from_config(&config)?;
//! let attrs = transport
//!     .obj_info(&SvcCommand::info("lsportset").arg("portset0"))
//!     .await?;
//! ```

pub mod attributes;
pub mod command;
pub mod config;
pub mod error;
pub mod rest;
pub mod shell;
pub mod ssh;
pub mod transport;

// Re-export commonly used items at crate root
pub use attributes::{Attributes, AttributesExt};
pub use command::{CommandKind, OptValue, SvcCommand};
pub use config::{ClusterConfig, LoggingConfig, SshConfig, SvcConfig, TransportKind};
pub use error::{SvcError, SvcResult};
pub use rest::RestTransport;
pub use ssh::SshTransport;
pub use transport::SvcTransport;
