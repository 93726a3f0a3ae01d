//! Test fixtures for common cluster objects
//!
//! Attribute maps shaped like real `lsportset` output, and clusters
//! pre-configured to create objects with the same defaults the cluster uses.

use svc_cfgmgr_common::{attributes, Attributes};

use crate::fake_cluster::FakeCluster;

/// Common portset fixtures
pub mod portset_fixtures {
    use super::*;

    /// Object kind used by `lsportset`/`mkportset`/`chportset`/`rmportset`.
    pub const KIND: &str = "portset";

    /// Attributes a newly created portset starts with.
    pub fn defaults() -> Attributes {
        attributes! {
            "type" => "host",
            "port_count" => "0",
            "host_count" => "0",
            "lossless" => "",
            "owner_id" => "",
            "owner_name" => "",
        }
    }

    /// An unowned host portset.
    pub fn portset(name: &str) -> Attributes {
        let mut attrs = defaults();
        attrs.insert("id".to_string(), "4".to_string());
        attrs.insert("name".to_string(), name.to_string());
        attrs
    }

    /// A host portset owned by `owner`.
    pub fn owned_portset(name: &str, owner: &str) -> Attributes {
        let mut attrs = portset(name);
        attrs.insert("owner_id".to_string(), "0".to_string());
        attrs.insert("owner_name".to_string(), owner.to_string());
        attrs
    }

    /// A replication portset.
    pub fn replication_portset(name: &str) -> Attributes {
        let mut attrs = portset(name);
        attrs.insert("type".to_string(), "replication".to_string());
        attrs
    }

    /// Empty cluster that creates portsets with cluster defaults.
    pub fn cluster() -> FakeCluster {
        FakeCluster::default().with_object_defaults(KIND, defaults())
    }

    /// Cluster that already holds `existing`.
    pub fn cluster_with(existing: Attributes) -> FakeCluster {
        cluster().with_object(KIND, existing)
    }
}
