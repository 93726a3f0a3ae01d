//! Local process execution for the SSH transport.
//!
//! The cluster CLI is reached through the local `ssh` client, so each
//! command becomes one `/bin/sh -c` line. Every value placed on that line
//! must be passed through [`shellquote`].

use std::io;
use std::process::Stdio;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{SvcError, SvcResult};

/// Path to the OpenSSH client.
pub const SSH_CMD: &str = "/usr/bin/ssh";

/// Characters that keep their meaning inside double quotes.
static DQUOTE_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[$`"\\\n]"#).expect("static pattern"));

/// Wraps `s` in double quotes, backslash-escaping `$`, `` ` ``, `"`, `\` and
/// newline.
///
/// ```
/// use svc_cfgmgr_common::shell::shellquote;
///
/// assert_eq!(shellquote("portset0"), "\"portset0\"");
/// assert_eq!(shellquote("a$b"), "\"a\\$b\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let body = DQUOTE_SPECIAL.replace_all(s, |caps: &regex::Captures| format!("\\{}", &caps[0]));
    format!("\"{}\"", body)
}

/// Exit status and trimmed output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit status; -1 if the process was killed by a signal
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn succeeded(&self) -> bool {
        self.status == 0
    }

    /// Text to report on failure.
    ///
    /// The cluster CLI writes `CMMVC` messages to stderr; stdout is used
    /// only when stderr is empty.
    pub fn message(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Runs `line` with `/bin/sh -c`, killing it after `limit`.
///
/// Only a failure to spawn, or the time limit, is an `Err`; a non-zero exit
/// status is returned in [`ExecOutput`].
pub async fn exec(line: &str, limit: Duration) -> SvcResult<ExecOutput> {
    debug!(command = %line, "Running local command");

    let spawn_error = |source: io::Error| SvcError::ShellExec {
        command: line.to_string(),
        source,
    };

    let child = Command::new("/bin/sh")
        .args(["-c", line])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_error)?;

    let output = tokio::time::timeout(limit, child.wait_with_output())
        .await
        .map_err(|_| {
            spawn_error(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no response within {}s", limit.as_secs()),
            ))
        })?
        .map_err(spawn_error)?;

    let result = ExecOutput {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };

    if !result.succeeded() {
        warn!(command = %line, status = result.status, "Local command exited non-zero");
    }
    Ok(result)
}
