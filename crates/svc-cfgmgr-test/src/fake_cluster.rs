//! In-memory cluster for exercising managers without a real system.
//!
//! [`FakeCluster`] implements [`SvcTransport`] and applies `mk*`, `ch*` and
//! `rm*` commands to an object table keyed by object kind (the verb with
//! its `ls`/`mk`/`ch`/`rm` prefix removed). Every command is recorded as its
//! CLI rendering.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use svc_cfgmgr_common::{
    Attributes, OptValue, SvcCommand, SvcError, SvcResult, SvcTransport,
};
use tracing::debug;

use crate::verification::CommandVerifier;

/// Error text the cluster returns for a missing object.
pub const NOT_FOUND: &str =
    "CMMVC5804E The action failed because an object that was specified in the command does not exist.";

/// Error text the cluster returns for a duplicate name.
pub const ALREADY_EXISTS: &str = "CMMVC6035E The action failed as the object already exists.";

const MISSING_PARAMETER: &str = "CMMVC5707E Required parameters are missing.";

const OWNERSHIP_GROUP: &str = "ownershipgroup";
const NO_OWNERSHIP_GROUP: &str = "noownershipgroup";

#[derive(Default)]
struct ClusterState {
    /// kind -> name -> attributes
    objects: BTreeMap<String, BTreeMap<String, Attributes>>,
    defaults: BTreeMap<String, Attributes>,
    /// ownership group name -> id
    groups: BTreeMap<String, String>,
    commands: Vec<String>,
    next_id: u32,
    unreachable: bool,
    mutation_failure: Option<String>,
}

impl ClusterState {
    fn group_id(&mut self, group: &str) -> String {
        let next = self.groups.len().to_string();
        self.groups.entry(group.to_string()).or_insert(next).clone()
    }

    fn apply_opts(&mut self, attrs: &mut Attributes, opts: &[(String, OptValue)]) {
        for (name, value) in opts {
            match (name.as_str(), value) {
                ("name", _) => {}
                (OWNERSHIP_GROUP, OptValue::Value(group)) => {
                    let id = self.group_id(group);
                    attrs.insert("owner_id".to_string(), id);
                    attrs.insert("owner_name".to_string(), group.clone());
                }
                (NO_OWNERSHIP_GROUP, OptValue::Flag) => {
                    attrs.insert("owner_id".to_string(), String::new());
                    attrs.insert("owner_name".to_string(), String::new());
                }
                (other, OptValue::Value(v)) => {
                    attrs.insert(other.to_string(), v.clone());
                }
                (other, OptValue::Flag) => {
                    attrs.insert(other.to_string(), "yes".to_string());
                }
            }
        }
    }
}

/// Splits `mkportset` into `("mk", "portset")`.
fn split_verb(verb: &str) -> Option<(&str, &str)> {
    ["ls", "mk", "ch", "rm"]
        .iter()
        .find_map(|prefix| verb.strip_prefix(prefix).map(|kind| (*prefix, kind)))
        .filter(|(_, kind)| !kind.is_empty())
}

/// In-memory [`SvcTransport`].
pub struct FakeCluster {
    name: String,
    state: Mutex<ClusterState>,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self::new("cluster1")
    }
}

impl FakeCluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ClusterState {
                next_id: 1,
                ..ClusterState::default()
            }),
        }
    }

    /// Attributes every newly created object of `kind` starts with.
    pub fn with_object_defaults(mut self, kind: &str, defaults: Attributes) -> Self {
        self.state_mut().defaults.insert(kind.to_string(), defaults);
        self
    }

    /// Seeds an existing object; `attrs` must carry a `name`.
    pub fn with_object(mut self, kind: &str, attrs: Attributes) -> Self {
        let name = attrs.get("name").cloned().unwrap_or_default();
        self.state_mut()
            .objects
            .entry(kind.to_string())
            .or_default()
            .insert(name, attrs);
        self
    }

    fn state_mut(&mut self) -> &mut ClusterState {
        self.state.get_mut().unwrap_or_else(|e| e.into_inner())
    }

    fn state(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every following call fail as if the cluster were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Rejects the next mutating command with `message`.
    pub fn fail_next_mutation(&self, message: impl Into<String>) {
        self.state().mutation_failure = Some(message.into());
    }

    pub fn object(&self, kind: &str, name: &str) -> Option<Attributes> {
        self.state()
            .objects
            .get(kind)
            .and_then(|objects| objects.get(name))
            .cloned()
    }

    /// Names of all objects of `kind`, sorted.
    pub fn object_names(&self, kind: &str) -> Vec<String> {
        self.state()
            .objects
            .get(kind)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every command received, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    /// Only the `svctask` commands received.
    pub fn mutations(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|cmd| cmd.starts_with("svctask"))
            .collect()
    }

    /// Verifier over the commands received so far.
    pub fn verifier(&self) -> CommandVerifier {
        CommandVerifier::new(self.commands())
    }

    fn record(&self, cmd: &SvcCommand) -> SvcResult<MutexGuard<'_, ClusterState>> {
        let cli = cmd.to_cli();
        debug!(cluster = %self.name, command = %cli, "Fake cluster received command");

        let mut state = self.state();
        state.commands.push(cli);
        if state.unreachable {
            return Err(SvcError::transport(&self.name, "connection refused"));
        }
        Ok(state)
    }

    fn parse<'a>(cmd: &'a SvcCommand, expected: &[&str]) -> SvcResult<(&'a str, &'a str)> {
        split_verb(cmd.verb())
            .filter(|(prefix, _)| expected.contains(prefix))
            .ok_or_else(|| SvcError::operation(cmd.to_cli(), "CMMVC6051E An unsupported command was specified."))
    }
}

#[async_trait]
impl SvcTransport for FakeCluster {
    async fn obj_info(&self, cmd: &SvcCommand) -> SvcResult<Option<Attributes>> {
        let state = self.record(cmd)?;
        let (_, kind) = Self::parse(cmd, &["ls"])?;
        let name = cmd
            .args()
            .first()
            .ok_or_else(|| SvcError::operation(cmd.to_cli(), MISSING_PARAMETER))?;

        Ok(state
            .objects
            .get(kind)
            .and_then(|objects| objects.get(name))
            .cloned())
    }

    async fn run_command(&self, cmd: &SvcCommand) -> SvcResult<()> {
        let mut state = self.record(cmd)?;
        let (prefix, kind) = Self::parse(cmd, &["mk", "ch", "rm"])?;

        if let Some(message) = state.mutation_failure.take() {
            return Err(SvcError::operation(cmd.to_cli(), message));
        }

        let state = &mut *state;
        match prefix {
            "mk" => {
                let name = match cmd.opt_value("name") {
                    Some(OptValue::Value(name)) => name.clone(),
                    _ => return Err(SvcError::operation(cmd.to_cli(), MISSING_PARAMETER)),
                };
                if state
                    .objects
                    .get(kind)
                    .is_some_and(|objects| objects.contains_key(&name))
                {
                    return Err(SvcError::operation(cmd.to_cli(), ALREADY_EXISTS));
                }

                let mut attrs = state.defaults.get(kind).cloned().unwrap_or_default();
                attrs.insert("id".to_string(), state.next_id.to_string());
                attrs.insert("name".to_string(), name.clone());
                state.next_id += 1;
                state.apply_opts(&mut attrs, cmd.opts());

                state
                    .objects
                    .entry(kind.to_string())
                    .or_default()
                    .insert(name, attrs);
            }
            "ch" => {
                let name = cmd.args().first().map(String::as_str).unwrap_or_default();
                let mut attrs = state
                    .objects
                    .get_mut(kind)
                    .and_then(|objects| objects.remove(name))
                    .ok_or_else(|| SvcError::operation(cmd.to_cli(), NOT_FOUND))?;
                state.apply_opts(&mut attrs, cmd.opts());
                state
                    .objects
                    .entry(kind.to_string())
                    .or_default()
                    .insert(name.to_string(), attrs);
            }
            _ => {
                let name = cmd.args().first().map(String::as_str).unwrap_or_default();
                state
                    .objects
                    .get_mut(kind)
                    .and_then(|objects| objects.remove(name))
                    .ok_or_else(|| SvcError::operation(cmd.to_cli(), NOT_FOUND))?;
            }
        }

        Ok(())
    }
}
