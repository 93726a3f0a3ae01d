//! Command and attribute name constants for portsets.
//!
//! These match the Spectrum Virtualize CLI reference.

/// Detailed or concise portset listing.
pub const LSPORTSET: &str = "lsportset";

/// Create a portset.
pub const MKPORTSET: &str = "mkportset";

/// Change portset properties.
pub const CHPORTSET: &str = "chportset";

/// Remove a portset.
pub const RMPORTSET: &str = "rmportset";

/// Option names accepted by the portset commands.
pub mod opts {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const OWNERSHIP_GROUP: &str = "ownershipgroup";
    pub const NO_OWNERSHIP_GROUP: &str = "noownershipgroup";
}

/// Attribute names in `lsportset` output.
pub mod attrs {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const PORT_COUNT: &str = "port_count";
    pub const HOST_COUNT: &str = "host_count";
    pub const LOSSLESS: &str = "lossless";
    pub const OWNER_ID: &str = "owner_id";
    pub const OWNER_NAME: &str = "owner_name";
}
