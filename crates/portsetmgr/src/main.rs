//! portsetmgr entry point.
//!
//! Loads the cluster configuration, builds the desired portset state from
//! flags or a parameter document, runs one reconciliation and prints the
//! JSON report on stdout.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use svc_cfgmgr_common::{transport, SvcConfig, SvcError, SvcResult, TransportKind};
use svc_portsetmgr::{
    DesiredState, PortsetMgr, PortsetState, PortsetType, ReconcileReport, SvcPortsetClient,
};

const DEFAULT_CONFIG_PATH: &str = "/etc/svc/portsetmgr.toml";

/// Spectrum Virtualize portset manager
#[derive(Parser, Debug)]
#[command(name = "portsetmgr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Cluster management host name or IP address
    #[arg(long)]
    clustername: Option<String>,

    /// Domain appended to the cluster name
    #[arg(long)]
    domain: Option<String>,

    /// Login user
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Login password
    #[arg(long, env = "SVC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Pre-obtained REST token
    #[arg(long, env = "SVC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    no_validate_certs: bool,

    /// Transport (rest, ssh)
    #[arg(long)]
    transport: Option<TransportKind>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Report what would change without changing it
    #[arg(long)]
    check_mode: bool,

    /// JSON parameter document
    #[arg(long)]
    args_file: Option<PathBuf>,

    /// Portset name
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Desired state (present, absent)
    #[arg(short = 's', long)]
    state: Option<PortsetState>,

    /// Portset type on creation (host, replication)
    #[arg(long)]
    portset_type: Option<PortsetType>,

    /// Ownership group to assign
    #[arg(long)]
    ownershipgroup: Option<String>,

    /// Remove the ownership group
    #[arg(long)]
    noownershipgroup: bool,
}

/// Connection parameters accepted in the parameter document.
#[derive(Debug, Default, Deserialize)]
struct ConnectionParams {
    clustername: Option<String>,
    domain: Option<String>,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    validate_certs: Option<bool>,
    log_path: Option<PathBuf>,
}

#[derive(Debug)]
struct ParameterDocument {
    connection: ConnectionParams,
    desired: DesiredState,
}

fn read_args_file(path: &Path) -> Result<ParameterDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse parameter file {}", path.display()))?;

    let connection = serde_json::from_value(value.clone())
        .with_context(|| format!("Invalid connection parameters in {}", path.display()))?;
    let desired = serde_json::from_value(value)
        .with_context(|| format!("Invalid portset parameters in {}", path.display()))?;

    Ok(ParameterDocument {
        connection,
        desired,
    })
}

/// Config file, then the parameter document, then flags.
fn load_config(args: &Args, doc: Option<&ParameterDocument>) -> Result<SvcConfig> {
    let mut config = SvcConfig::load_or_default(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    if let Some(conn) = doc.map(|d| &d.connection) {
        let cluster = &mut config.cluster;
        if let Some(v) = &conn.clustername {
            cluster.clustername = v.clone();
        }
        cluster.domain = conn.domain.clone().or(cluster.domain.take());
        cluster.username = conn.username.clone().or(cluster.username.take());
        cluster.password = conn.password.clone().or(cluster.password.take());
        cluster.token = conn.token.clone().or(cluster.token.take());
        if let Some(v) = conn.validate_certs {
            cluster.validate_certs = v;
        }
        config.logging.log_path = conn.log_path.clone().or(config.logging.log_path.take());
    }

    let cluster = &mut config.cluster;
    if let Some(v) = &args.clustername {
        cluster.clustername = v.clone();
    }
    cluster.domain = args.domain.clone().or(cluster.domain.take());
    cluster.username = args.username.clone().or(cluster.username.take());
    cluster.password = args.password.clone().or(cluster.password.take());
    cluster.token = args.token.clone().or(cluster.token.take());
    if args.no_validate_certs {
        cluster.validate_certs = false;
    }
    if let Some(kind) = args.transport {
        cluster.transport = kind;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.logging.log_path = args.log_path.clone().or(config.logging.log_path.take());

    Ok(config)
}

/// Flags override the parameter document field by field.
///
/// `state` has no default: it must come from the document or `--state`.
fn desired_state(args: &Args, doc: Option<ParameterDocument>) -> SvcResult<DesiredState> {
    let mut desired = match (doc, args.state) {
        (Some(doc), _) => doc.desired,
        (None, Some(_)) => DesiredState::present(""),
        (None, None) => {
            return Err(SvcError::validation(
                "state",
                "Missing mandatory parameter: state",
            ))
        }
    };

    if let Some(name) = &args.name {
        desired.name = name.clone();
    }
    if let Some(state) = args.state {
        desired.state = state;
    }
    if let Some(portset_type) = args.portset_type {
        desired.resource_type = Some(portset_type);
    }
    if let Some(group) = &args.ownershipgroup {
        desired.ownership_group = Some(group.clone());
    }
    if args.noownershipgroup {
        desired.clear_ownership_group = true;
    }
    Ok(desired)
}

/// Initialize tracing/logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(level: &str, log_path: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);

    match log_path {
        Some(path) => {
            let file: File = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn fail(msg: String, kind: &str) -> ExitCode {
    let report = ReconcileReport::failure(msg, kind);
    println!("{}", report.to_json());
    ExitCode::from(report.exit_code())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let doc = match args.args_file.as_deref().map(read_args_file).transpose() {
        Ok(doc) => doc,
        Err(e) => return fail(format!("{:#}", e), "config"),
    };

    let config = match load_config(&args, doc.as_ref()) {
        Ok(config) => config,
        Err(e) => return fail(format!("{:#}", e), "config"),
    };

    if let Err(e) = init_logging(&config.logging.level, config.logging.log_path.as_deref()) {
        return fail(format!("{:#}", e), "config");
    }

    let desired = match desired_state(&args, doc) {
        Ok(desired) => desired,
        Err(e) => {
            error!("portsetmgr rejected parameters: {}", e);
            return fail(e.to_string(), e.kind());
        }
    };

    info!(
        "--- Starting portsetmgr: portset {} state {} on {} via {:?} ---",
        desired.name,
        desired.state,
        config.cluster.host(),
        config.cluster.transport
    );

    let transport = match transport::from_config(&config) {
        Ok(transport) => transport,
        Err(e) => {
            error!("portsetmgr setup failed: {}", e);
            return fail(e.to_string(), e.kind());
        }
    };

    let mgr = PortsetMgr::new(SvcPortsetClient::new(transport)).with_check_mode(args.check_mode);
    let result = mgr.reconcile(&desired).await;

    if let Err(e) = &result {
        error!("portsetmgr failed: {}", e);
    }

    let report = ReconcileReport::from_result(&result);
    println!("{}", report.to_json());
    ExitCode::from(report.exit_code())
}
