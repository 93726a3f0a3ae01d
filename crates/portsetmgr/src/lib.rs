//! Portset configuration manager for IBM Spectrum Virtualize.
//!
//! This crate implements `portsetmgr`, which drives a single portset on a
//! Spectrum Virtualize cluster to a desired state. Each call validates the
//! input, queries the portset once, and issues at most one mutating command.
//!
//! # Reconciliation
//!
//! | Desired | Observed | Action |
//! |---------|----------|--------|
//! | present | absent | `mkportset` |
//! | present | present, ownership differs | `chportset` |
//! | present | present, ownership matches | none |
//! | absent | present | `rmportset` |
//! | absent | absent | none |
//!
//! The portset type is applied on creation only and never triggers an update.
//!
//! # Example
//!
//! ```ignore
//! use svc_portsetmgr::{DesiredState, PortsetMgr, SvcPortsetClient};
//!
//! let transport = svc_cfgmgr_common::transport::from_config(&config)?;
//! let mgr = PortsetMgr::new(SvcPortsetClient::new(transport));
//! let outcome = mgr.reconcile(&DesiredState::present("portset0")).await?;
//! ```

mod client;
mod commands;
mod fields;
mod portset_mgr;
mod report;
mod types;
mod validate;

pub use client::{PortsetClient, SvcPortsetClient};
pub use commands::*;
pub use fields::*;
pub use portset_mgr::{plan, PortsetMgr};
pub use report::ReconcileReport;
pub use types::*;
pub use validate::validate;
