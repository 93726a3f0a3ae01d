//! Test infrastructure for Spectrum Virtualize configuration managers
//!
//! Provides:
//! - An in-memory cluster implementing `SvcTransport`
//! - Test fixtures for common objects
//! - Command and object verification helpers

mod fake_cluster;
pub mod fixtures;
mod verification;

pub use fake_cluster::FakeCluster;
pub use fixtures::*;
pub use verification::*;
