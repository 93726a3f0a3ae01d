//! Command builders for portset operations

use svc_cfgmgr_common::SvcCommand;

use crate::fields::{opts, CHPORTSET, LSPORTSET, MKPORTSET, RMPORTSET};
use crate::types::{OwnershipChange, PortsetType};

/// Build portset query command
pub fn build_lsportset_cmd(name: &str) -> SvcCommand {
    SvcCommand::info(LSPORTSET).arg(name)
}

/// Build portset creation command
///
/// Only the options that were supplied are passed; the cluster applies
/// its own defaults for the rest.
pub fn build_mkportset_cmd(
    name: &str,
    portset_type: Option<PortsetType>,
    ownership_group: Option<&str>,
) -> SvcCommand {
    SvcCommand::task(MKPORTSET)
        .opt(opts::NAME, name)
        .opt_if(opts::TYPE, portset_type.map(|t| t.as_str()))
        .opt_if(opts::OWNERSHIP_GROUP, ownership_group)
}

/// Build ownership change command
pub fn build_chportset_cmd(name: &str, change: &OwnershipChange) -> SvcCommand {
    let cmd = SvcCommand::task(CHPORTSET);
    let cmd = match change {
        OwnershipChange::Set(group) => cmd.opt(opts::OWNERSHIP_GROUP, group.as_str()),
        OwnershipChange::Clear => cmd.flag(opts::NO_OWNERSHIP_GROUP),
    };
    cmd.arg(name)
}

/// Build portset deletion command
pub fn build_rmportset_cmd(name: &str) -> SvcCommand {
    SvcCommand::task(RMPORTSET).arg(name)
}
