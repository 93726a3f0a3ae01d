//! Portset Manager - idempotent portset reconciliation

use svc_cfgmgr_common::SvcResult;
use tracing::{info, instrument, warn};

use crate::client::PortsetClient;
use crate::fields::{CHPORTSET, MKPORTSET, RMPORTSET};
use crate::types::{Action, DesiredState, OwnershipChange, Outcome, PortsetState, RemotePortset};
use crate::validate::validate;

/// Decides the single action that brings `observed` to `desired`.
///
/// Only ownership is compared on an existing portset. The portset type
/// cannot be changed after creation, so it never produces an update.
pub fn plan(desired: &DesiredState, observed: Option<&RemotePortset>) -> Action {
    match (desired.state, observed) {
        (PortsetState::Present, None) => Action::Create,
        (PortsetState::Present, Some(remote)) => match ownership_change(desired, remote) {
            Some(change) => Action::Update(change),
            None => Action::Noop,
        },
        (PortsetState::Absent, None) => Action::Noop,
        (PortsetState::Absent, Some(_)) => Action::Delete,
    }
}

fn ownership_change(desired: &DesiredState, remote: &RemotePortset) -> Option<OwnershipChange> {
    if desired.clear_ownership_group {
        return remote.owner().map(|_| OwnershipChange::Clear);
    }
    match desired.ownership_group() {
        Some(group) if remote.owner() != Some(group) => {
            Some(OwnershipChange::Set(group.to_string()))
        }
        _ => None,
    }
}

fn command_verb(action: &Action) -> &'static str {
    match action {
        Action::Noop => "",
        Action::Create => MKPORTSET,
        Action::Update(_) => CHPORTSET,
        Action::Delete => RMPORTSET,
    }
}

/// Portset Manager
///
/// Reconciles one portset per call: validate, query once, plan, and issue
/// at most one mutating command.
pub struct PortsetMgr<C> {
    client: C,
    check_mode: bool,
}

impl<C: PortsetClient> PortsetMgr<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            check_mode: false,
        }
    }

    /// In check mode the planned mutation is reported but not issued.
    pub fn with_check_mode(mut self, enabled: bool) -> Self {
        self.check_mode = enabled;
        self
    }

    /// Reconcile the cluster towards `desired`.
    ///
    /// # Returns
    ///
    /// * `Ok(Outcome)` - with `changed` set if a mutation was issued (or would be, in check mode)
    /// * `Err(Validation)` - input rejected, nothing was sent
    /// * `Err(Transport)` - the query failed, nothing was mutated
    /// * `Err(Operation)` - the mutation failed; re-running is safe
    #[instrument(skip(self, desired), fields(portset = %desired.name, state = %desired.state))]
    pub async fn reconcile(&self, desired: &DesiredState) -> SvcResult<Outcome> {
        validate(desired)?;

        let observed = self.client.query(&desired.name).await?;

        if let (Some(remote), Some(wanted)) = (&observed, desired.resource_type) {
            if remote.portset_type != wanted.as_str() {
                warn!(
                    "Portset {} has type {}, requested {}; type cannot be changed after creation",
                    desired.name, remote.portset_type, wanted
                );
            }
        }

        let action = plan(desired, observed.as_ref());
        let changed = action.is_mutation();

        if changed && self.check_mode {
            info!("Check mode: would {} portset {}", action.as_str(), desired.name);
        } else if changed {
            self.apply(desired, &action).await?;
        }

        Ok(Outcome {
            name: desired.name.clone(),
            action,
            changed,
            check_mode: self.check_mode,
            existed: observed.is_some(),
        })
    }

    async fn apply(&self, desired: &DesiredState, action: &Action) -> SvcResult<()> {
        let name = desired.name.as_str();

        let result = match action {
            Action::Noop => return Ok(()),
            Action::Create => {
                self.client
                    .create(
                        name,
                        desired.resource_type,
                        desired.ownership_group().map(str::to_string),
                    )
                    .await
            }
            Action::Update(change) => self.client.update(name, change.clone()).await,
            Action::Delete => self.client.delete(name).await,
        };

        result.map_err(|e| e.into_operation(&format!("{} {}", command_verb(action), name)))?;

        match action {
            Action::Create => info!("Created portset {}", name),
            Action::Update(change) => info!("Updated portset {} ({})", name, change),
            Action::Delete => info!("Deleted portset {}", name),
            Action::Noop => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockPortsetClient;
    use crate::types::PortsetType;
    use pretty_assertions::assert_eq;
    use svc_cfgmgr_common::SvcError;

    fn remote(owner: &str) -> RemotePortset {
        RemotePortset {
            id: "4".to_string(),
            name: "portset0".to_string(),
            portset_type: "host".to_string(),
            port_count: 0,
            host_count: 0,
            lossless: String::new(),
            owner_id: Some("0".to_string()),
            owner_name: Some(owner.to_string()).filter(|o| !o.is_empty()),
        }
    }

    fn expect_query(client: &mut MockPortsetClient, observed: Option<RemotePortset>) {
        client
            .expect_query()
            .withf(|name| name == "portset0")
            .times(1)
            .returning(move |_| Ok(observed.clone()));
    }

    fn expect_no_mutation(client: &mut MockPortsetClient) {
        client.expect_create().never();
        client.expect_update().never();
        client.expect_delete().never();
    }

    #[test]
    fn test_plan_table() {
        let present = DesiredState::present("portset0");
        let absent = DesiredState::absent("portset0");
        let owned = remote("new_owner");

        assert_eq!(plan(&present, None), Action::Create);
        assert_eq!(plan(&present, Some(&owned)), Action::Noop);
        assert_eq!(plan(&absent, None), Action::Noop);
        assert_eq!(plan(&absent, Some(&owned)), Action::Delete);
    }

    #[test]
    fn test_plan_ownership() {
        let owned = remote("new_owner");
        let unowned = remote("");

        let set_same = DesiredState::present("portset0").with_ownership_group("new_owner");
        assert_eq!(plan(&set_same, Some(&owned)), Action::Noop);

        let set_other = DesiredState::present("portset0").with_ownership_group("owner2");
        assert_eq!(
            plan(&set_other, Some(&owned)),
            Action::Update(OwnershipChange::Set("owner2".to_string()))
        );
        assert_eq!(
            plan(&set_other, Some(&unowned)),
            Action::Update(OwnershipChange::Set("owner2".to_string()))
        );

        let clear = DesiredState::present("portset0").clearing_ownership_group();
        assert_eq!(
            plan(&clear, Some(&owned)),
            Action::Update(OwnershipChange::Clear)
        );
        assert_eq!(plan(&clear, Some(&unowned)), Action::Noop);
    }

    #[test]
    fn test_plan_ignores_type_on_existing() {
        let desired = DesiredState::present("portset0").with_type(PortsetType::Replication);
        assert_eq!(plan(&desired, Some(&remote(""))), Action::Noop);
    }

    #[tokio::test]
    async fn test_create_portset_without_optional_params() {
        let mut client = MockPortsetClient::new();
        expect_query(&mut client, None);
        client
            .expect_create()
            .withf(|name, portset_type, owner| {
                name == "portset0" && portset_type.is_none() && owner.is_none()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mgr = PortsetMgr::new(client);
        let outcome = mgr.reconcile(&DesiredState::present("portset0")).await.unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.action, Action::Create);
        assert_eq!(outcome.message(), "Portset (portset0) created.");
    }

    #[tokio::test]
    async fn test_create_portset_with_optional_params() {
        let mut client = MockPortsetClient::new();
        expect_query(&mut client, None);
        client
            .expect_create()
            .withf(|name, portset_type, owner| {
                name == "portset0"
                    && *portset_type == Some(PortsetType::Replication)
                    && owner.as_deref() == Some("new_owner")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        client.expect_update().never();

        let desired = DesiredState::present("portset0")
            .with_ownership_group("new_owner")
            .with_type(PortsetType::Replication);
        let outcome = PortsetMgr::new(client).reconcile(&desired).await.unwrap();
        assert!(outcome.changed);
    }

    #[tokio::test]
    async fn test_create_portset_idempotency() {
        let mut client = MockPortsetClient::new();
        expect_query(&mut client, Some(remote("new_owner")));
        expect_no_mutation(&mut client);

        let desired = DesiredState::present("portset0")
            .with_ownership_group("new_owner")
            .with_type(PortsetType::Host);
        let outcome = PortsetMgr::new(client).reconcile(&desired).await.unwrap();
        assert!(!outcome.changed);
        assert_eq!(
            outcome.message(),
            "Portset (portset0) already exists. No modifications done."
        );
    }

    #[tokio::test]
    async fn test_update_portset_clears_ownership() {
        let mut client = MockPortsetClient::new();
        expect_query(&mut client, Some(remote("new_owner")));
        client
            .expect_update()
            .withf(|name, change| name == "portset0" && *change == OwnershipChange::Clear)
            .times(1)
            .returning(|_, _| Ok(()));
        client.expect_create().never();
        client.expect_delete().never();

        let desired = DesiredState::present("portset0").clearing_ownership_group();
        let outcome = PortsetMgr::new(client).reconcile(&desired).await.unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.action, Action::Update(OwnershipChange::Clear));
    }

    #[tokio::test]
    async fn test_type_mismatch_does_not_update() {
        let mut client = MockPortsetClient::new();
        expect_query(&mut client, Some(remote("new_owner")));
        expect_no_mutation(&mut client);

        let desired = DesiredState::present("portset0").with_type(PortsetType::Replication);
        let outcome = PortsetMgr::new(client).reconcile(&desired).await.unwrap();
        assert!(!outcome.changed);
    }

    #[tokio::test]
    async fn test_delete_portset() {
        let mut client = MockPortsetClient::new();
        expect_query(&mut client, Some(remote("new_owner")));
        client
            .expect_delete()
            .withf(|name| name == "portset0")
            .times(1)
            .returning(|_| Ok(()));

        let outcome = PortsetMgr::new(client)
            .reconcile(&DesiredState::absent("portset0"))
            .await
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.message(), "Portset (portset0) deleted.");
    }

    #[tokio::test]
    async fn test_delete_portset_idempotency() {
        let mut client = MockPortsetClient::new();
        expect_query(&mut client, None);
        expect_no_mutation(&mut client);

        let outcome = PortsetMgr::new(client)
            .reconcile(&DesiredState::absent("portset0"))
            .await
            .unwrap();
        assert!(!outcome.changed);
        assert_eq!(
            outcome.message(),
            "Portset (portset0) does not exist. No modifications done."
        );
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_remote_call() {
        let mut client = MockPortsetClient::new();
        client.expect_query().never();
        expect_no_mutation(&mut client);

        let desired = DesiredState::absent("portset0")
            .with_type(PortsetType::Host)
            .with_ownership_group("owner1");
        let err = PortsetMgr::new(client).reconcile(&desired).await.unwrap_err();
        assert!(matches!(err, SvcError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_check_mode_issues_no_mutation() {
        let mut client = MockPortsetClient::new();
        expect_query(&mut client, None);
        expect_no_mutation(&mut client);

        let mgr = PortsetMgr::new(client).with_check_mode(true);
        let outcome = mgr.reconcile(&DesiredState::present("portset0")).await.unwrap();
        assert!(outcome.changed);
        assert!(outcome.check_mode);
        assert_eq!(outcome.message(), "(check mode) Portset (portset0) created.");
    }

    #[tokio::test]
    async fn test_query_transport_error_aborts() {
        let mut client = MockPortsetClient::new();
        client
            .expect_query()
            .times(1)
            .returning(|_| Err(SvcError::transport("cluster1", "connection refused")));
        expect_no_mutation(&mut client);

        let err = PortsetMgr::new(client)
            .reconcile(&DesiredState::present("portset0"))
            .await
            .unwrap_err();
        assert!(matches!(err, SvcError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_mutation_transport_error_is_operation_error() {
        let mut client = MockPortsetClient::new();
        expect_query(&mut client, Some(remote("")));
        client
            .expect_delete()
            .times(1)
            .returning(|_| Err(SvcError::transport("cluster1", "connection reset")));

        let err = PortsetMgr::new(client)
            .reconcile(&DesiredState::absent("portset0"))
            .await
            .unwrap_err();
        match err {
            SvcError::Operation { command, message } => {
                assert_eq!(command, "rmportset portset0");
                assert!(message.contains("connection reset"));
            }
            other => panic!("Expected Operation error, got {:?}", other),
        }
    }
}
