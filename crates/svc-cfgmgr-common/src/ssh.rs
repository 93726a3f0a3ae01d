//! CLI-over-SSH transport.
//!
//! Runs `svcinfo`/`svctask` command lines through the local OpenSSH
//! client in batch mode, so key-based authentication must already be in
//! place. Query output is requested with `-delim :` and parsed into
//! [`Attributes`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::attributes::{self, Attributes};
use crate::command::SvcCommand;
use crate::config::SvcConfig;
use crate::error::{SvcError, SvcResult};
use crate::shell::{self, shellquote, ExecOutput, SSH_CMD};
use crate::transport::SvcTransport;

/// Delimiter requested for detailed listings.
pub const CLI_DELIM: char = ':';

/// Exit status OpenSSH uses for its own connection failures.
const SSH_CONNECT_FAILURE: i32 = 255;

/// CLI message codes meaning "the named object does not exist".
const NOT_FOUND_CODES: &[&str] = &["CMMVC5804E", "CMMVC5753E"];

/// Returns true if CLI output reports a missing object.
pub fn is_not_found(output: &str) -> bool {
    NOT_FOUND_CODES.iter().any(|code| output.contains(code))
}

/// SSH transport using the system `ssh` binary.
#[derive(Debug, Clone)]
pub struct SshTransport {
    program: String,
    destination: String,
    port: u16,
    identity_file: Option<PathBuf>,
    connect_timeout_secs: u64,
}

impl SshTransport {
    pub fn new(config: &SvcConfig) -> SvcResult<Self> {
        let user = config
            .cluster
            .username
            .as_deref()
            .ok_or_else(|| SvcError::config("SSH transport needs username"))?;

        Ok(Self {
            program: SSH_CMD.to_string(),
            destination: format!("{}@{}", user, config.cluster.host()),
            port: config.ssh.port,
            identity_file: config.ssh.identity_file.clone(),
            connect_timeout_secs: config.cluster.timeout_secs,
        })
    }

    /// Replaces the ssh binary (used to point at a wrapper).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Builds the local shell line that runs `cli` on the cluster.
    pub fn build_command(&self, cli: &str) -> String {
        let mut parts = vec![
            self.program.clone(),
            "-o BatchMode=yes".to_string(),
            format!("-o ConnectTimeout={}", self.connect_timeout_secs),
            format!("-p {}", self.port),
        ];
        if let Some(identity) = &self.identity_file {
            parts.push(format!("-i {}", shellquote(&identity.to_string_lossy())));
        }
        parts.push(shellquote(&self.destination));
        parts.push(shellquote(cli));
        parts.join(" ")
    }

    /// Connect timeout plus the same again for the command itself.
    fn time_limit(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.saturating_mul(2))
    }

    async fn run(&self, cli: &str) -> SvcResult<ExecOutput> {
        let result = shell::exec(&self.build_command(cli), self.time_limit()).await?;
        if result.status == SSH_CONNECT_FAILURE {
            return Err(SvcError::transport(&self.destination, result.message()));
        }
        Ok(result)
    }
}

#[async_trait]
impl SvcTransport for SshTransport {
    async fn obj_info(&self, cmd: &SvcCommand) -> SvcResult<Option<Attributes>> {
        let cli = cmd.clone().opt("delim", CLI_DELIM.to_string()).to_cli();
        let result = self.run(&cli).await?;

        if result.succeeded() {
            return Ok(attributes::parse_delimited(&result.stdout, CLI_DELIM));
        }

        if is_not_found(&result.stderr) || is_not_found(&result.stdout) {
            debug!(command = %cli, "Object does not exist");
            return Ok(None);
        }
        Err(SvcError::transport(&self.destination, result.message()))
    }

    async fn run_command(&self, cmd: &SvcCommand) -> SvcResult<()> {
        let cli = cmd.to_cli();
        let result = self.run(&cli).await?;
        if result.succeeded() {
            Ok(())
        } else {
            Err(SvcError::operation(cli, result.message()))
        }
    }
}
