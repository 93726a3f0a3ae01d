//! Cluster command model.
//!
//! A [`SvcCommand`] is built once and rendered by whichever transport is
//! in use: as a CLI line for the SSH transport, or as a REST path plus a
//! JSON body for the REST transport.

use std::fmt;

use serde_json::{Map, Value};

use crate::shell::shellquote;

/// CLI prefix for read-only commands.
pub const SVCINFO: &str = "svcinfo";

/// CLI prefix for mutating commands.
pub const SVCTASK: &str = "svctask";

/// Whether a command reads or mutates cluster state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `svcinfo` query.
    Info,
    /// `svctask` mutation.
    Task,
}

/// Value attached to a command option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptValue {
    /// Option without a value, e.g. `-noownershipgroup`.
    Flag,
    /// Option with a value, e.g. `-name portset0`.
    Value(String),
}

/// A single cluster command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvcCommand {
    kind: CommandKind,
    verb: String,
    opts: Vec<(String, OptValue)>,
    args: Vec<String>,
}

impl SvcCommand {
    /// Creates an `svcinfo` command.
    pub fn info(verb: impl Into<String>) -> Self {
        Self::new(CommandKind::Info, verb)
    }

    /// Creates an `svctask` command.
    pub fn task(verb: impl Into<String>) -> Self {
        Self::new(CommandKind::Task, verb)
    }

    fn new(kind: CommandKind, verb: impl Into<String>) -> Self {
        Self {
            kind,
            verb: verb.into(),
            opts: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Adds an option with a value.
    pub fn opt(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.push((name.into(), OptValue::Value(value.into())));
        self
    }

    /// Adds an option only when a value is present.
    pub fn opt_if(self, name: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.opt(name, v),
            None => self,
        }
    }

    /// Adds a value-less option.
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.opts.push((name.into(), OptValue::Flag));
        self
    }

    /// Adds a positional argument (usually the object name).
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn opts(&self) -> &[(String, OptValue)] {
        &self.opts
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Looks up an option value by name.
    pub fn opt_value(&self, name: &str) -> Option<&OptValue> {
        self.opts.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Renders the command as a CLI line with every value shell-quoted.
    pub fn to_cli(&self) -> String {
        let prefix = match self.kind {
            CommandKind::Info => SVCINFO,
            CommandKind::Task => SVCTASK,
        };
        let mut parts = vec![prefix.to_string(), self.verb.clone()];
        for (name, value) in &self.opts {
            parts.push(format!("-{}", name));
            if let OptValue::Value(v) = value {
                parts.push(shellquote(v));
            }
        }
        parts.extend(self.args.iter().map(|a| shellquote(a)));
        parts.join(" ")
    }

    /// REST path segments below the `/rest/` root: the verb, then each
    /// positional argument. Segments are unencoded.
    pub fn rest_segments(&self) -> Vec<&str> {
        std::iter::once(self.verb.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// REST request body: options as a JSON object, flags as `true`.
    pub fn rest_body(&self) -> Value {
        let mut body = Map::new();
        for (name, value) in &self.opts {
            let v = match value {
                OptValue::Flag => Value::Bool(true),
                OptValue::Value(s) => Value::String(s.clone()),
            };
            body.insert(name.clone(), v);
        }
        Value::Object(body)
    }
}

impl fmt::Display for SvcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cli())
    }
}
