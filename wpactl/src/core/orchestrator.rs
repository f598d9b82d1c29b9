//! Transactional connect.
//!
//! A connect call walks a fixed sequence of stages:
//!
//! ```text
//! Idle -> Resolving -> [Removing] -> Creating -> Configuring -> Activating -> Committed
//!                                                   |             |
//!                                                   +-------------+--> RollingBack -> Failed
//! ```
//!
//! Once `ADD_NETWORK` has returned an id, that profile belongs to the call.
//! If any later step fails the profile is removed again before the error is
//! returned, so a failed connect never leaves a half-configured profile
//! behind.

use log::{debug, error, info, warn};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tokio::time::timeout;

use crate::Result;
use crate::api::models::{ConnectionError, CredentialBundle, NetworkId, ParameterSet};
use crate::core::catalog;
use crate::core::params::{derive_parameters, validate_bundle, wire_value};
use crate::ctrl::{self, Command, ControlClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Idle,
    Resolving,
    Removing,
    Creating,
    Configuring,
    Activating,
    Committed,
    RollingBack,
    Failed,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Resolving => "resolving",
            Stage::Removing => "removing",
            Stage::Creating => "creating",
            Stage::Configuring => "configuring",
            Stage::Activating => "activating",
            Stage::Committed => "committed",
            Stage::RollingBack => "rolling back",
            Stage::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// State of one connect call.
struct Transaction<'a> {
    client: &'a dyn ControlClient,
    interface: &'a str,
    stage: Stage,
    /// Profile created by this call, if any.
    owned: Option<NetworkId>,
    /// Set once `SAVE_CONFIG` has written the owned profile to disk.
    saved: bool,
}

impl<'a> Transaction<'a> {
    fn new(client: &'a dyn ControlClient, interface: &'a str) -> Self {
        Self {
            client,
            interface,
            stage: Stage::Idle,
            owned: None,
            saved: false,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!("[{}] connect: {} -> {}", self.interface, self.stage, next);
        self.stage = next;
    }

    async fn forward(&mut self, ssid: &str, params: &ParameterSet) -> Result<NetworkId> {
        let (client, interface) = (self.client, self.interface);

        self.advance(Stage::Resolving);
        if let Some(stale) = catalog::find(client, interface, ssid).await? {
            self.advance(Stage::Removing);
            catalog::remove(client, interface, stale).await?;
        }

        self.advance(Stage::Creating);
        let id = add_network(client, interface).await?;
        self.owned = Some(id);

        self.advance(Stage::Configuring);
        for (name, value) in params.iter() {
            let command = Command::SetNetwork {
                id,
                name: name.to_string(),
                value: wire_value(value),
            };
            ctrl::send_expect_ok(client, interface, &command).await?;
        }

        self.advance(Stage::Activating);
        ctrl::send_expect_ok(client, interface, &Command::EnableNetwork(id)).await?;
        ctrl::send_expect_ok(client, interface, &Command::SaveConfig).await?;
        self.saved = true;
        ctrl::send_expect_ok(client, interface, &Command::SelectNetwork(id)).await?;

        Ok(id)
    }

    /// Removes the owned profile, if any, and returns the error to report.
    ///
    /// If the profile already reached the configuration file, the file is
    /// saved again without it.
    async fn roll_back(&mut self, cause: ConnectionError) -> ConnectionError {
        let Some(id) = self.owned.take() else {
            warn!("[{}] connect failed while {}: {cause}", self.interface, self.stage);
            self.advance(Stage::Failed);
            return cause;
        };

        warn!(
            "[{}] connect failed while {}, removing profile {id}: {cause}",
            self.interface, self.stage
        );
        self.advance(Stage::RollingBack);

        let mut result = catalog::remove(self.client, self.interface, id).await;
        if result.is_ok() && self.saved {
            result = ctrl::send_expect_ok(self.client, self.interface, &Command::SaveConfig).await;
        }
        self.advance(Stage::Failed);

        match result {
            Ok(()) => cause,
            Err(rollback) => {
                error!(
                    "[{}] rollback of profile {id} failed, profile may be left behind: {rollback}",
                    self.interface
                );
                ConnectionError::RollbackFailed {
                    cause: Box::new(cause),
                    rollback: Box::new(rollback),
                }
            }
        }
    }
}

/// Creates or replaces the saved profile for `ssid` and activates it.
///
/// Returns the id of the new profile. On failure after the profile was
/// created, the profile is removed before returning, and the configuration
/// is saved again if it already held the profile. If that cleanup fails
/// too, [`ConnectionError::RollbackFailed`] carries both errors.
///
/// With a `deadline`, the forward steps are abandoned when it expires and
/// [`ConnectionError::Timeout`] is returned after rolling back.
pub(crate) async fn connect(
    client: &dyn ControlClient,
    interface: &str,
    ssid: &str,
    bundle: &CredentialBundle,
    deadline: Option<Duration>,
) -> Result<NetworkId> {
    validate_bundle(bundle)?;
    if bundle.ssid != ssid {
        return Err(ConnectionError::InvalidCredentials(format!(
            "bundle is for '{}', not '{ssid}'",
            bundle.ssid
        )));
    }

    let params = derive_parameters(bundle);
    debug!(
        "[{interface}] connecting to '{ssid}' with parameters {:?}",
        params.names()
    );

    let mut tx = Transaction::new(client, interface);
    let outcome = match deadline {
        Some(limit) => timeout(limit, tx.forward(ssid, &params))
            .await
            .unwrap_or_else(|_| Err(ConnectionError::Timeout)),
        None => tx.forward(ssid, &params).await,
    };

    match outcome {
        Ok(id) => {
            tx.advance(Stage::Committed);
            info!("[{interface}] connected profile {id} for '{ssid}'");
            Ok(id)
        }
        Err(cause) => Err(tx.roll_back(cause).await),
    }
}

async fn add_network(client: &dyn ControlClient, interface: &str) -> Result<NetworkId> {
    let command = Command::AddNetwork;
    let reply = ctrl::send(client, interface, &command).await?;
    reply
        .trim()
        .parse::<u32>()
        .map(NetworkId)
        .map_err(|_| ctrl::protocol_error(&command, &reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers requests from a fixed script, recording what was sent.
    struct Scripted {
        replies: Mutex<VecDeque<&'static str>>,
        sent: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().copied().collect()),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ControlClient for Scripted {
        async fn request(&self, _interface: &str, command: &Command) -> Result<String> {
            self.sent.lock().unwrap().push(command.to_string());
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or("FAIL")
                .to_string())
        }
    }

    const EMPTY_LIST: &str = "network id / ssid / bssid / flags\n";

    #[tokio::test]
    async fn open_network_request_sequence() {
        let client = Scripted::new(&[EMPTY_LIST, "2\n", "OK", "OK", "OK", "OK", "OK"]);
        let id = connect(&client, "wlan0", "Cafe", &CredentialBundle::new("Cafe"), None)
            .await
            .unwrap();

        assert_eq!(id, NetworkId(2));
        assert_eq!(
            client.sent(),
            vec![
                "LIST_NETWORKS",
                "ADD_NETWORK",
                "SET_NETWORK 2 ssid \"Cafe\"",
                "SET_NETWORK 2 key_mgmt NONE",
                "ENABLE_NETWORK 2",
                "SAVE_CONFIG",
                "SELECT_NETWORK 2",
            ]
        );
    }

    #[tokio::test]
    async fn rollback_after_save_rewrites_config() {
        let client = Scripted::new(&[
            EMPTY_LIST, "4\n", "OK", "OK", "OK", "OK", "FAIL", "OK", "OK",
        ]);
        let err = connect(&client, "wlan0", "Cafe", &CredentialBundle::new("Cafe"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::Protocol { ref command, .. } if command == "SELECT_NETWORK 4"));
        assert_eq!(
            client.sent()[6..],
            ["SELECT_NETWORK 4", "REMOVE_NETWORK 4", "SAVE_CONFIG"]
        );
    }

    #[tokio::test]
    async fn rollback_before_save_leaves_config_alone() {
        let client = Scripted::new(&[EMPTY_LIST, "4\n", "OK", "OK", "FAIL", "OK"]);
        let err = connect(&client, "wlan0", "Cafe", &CredentialBundle::new("Cafe"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::Protocol { .. }));
        assert_eq!(client.sent().last().map(String::as_str), Some("REMOVE_NETWORK 4"));
        assert!(!client.sent().contains(&"SAVE_CONFIG".to_string()));
    }

    #[tokio::test]
    async fn non_numeric_id_fails_without_rollback() {
        let client = Scripted::new(&[EMPTY_LIST, "FAIL\n"]);
        let err = connect(&client, "wlan0", "Cafe", &CredentialBundle::new("Cafe"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::Protocol { ref command, .. } if command == "ADD_NETWORK"));
        assert_eq!(client.sent(), vec!["LIST_NETWORKS", "ADD_NETWORK"]);
    }

    #[tokio::test]
    async fn mismatched_bundle_is_rejected_before_any_request() {
        let client = Scripted::new(&[]);
        let err = connect(&client, "wlan0", "Cafe", &CredentialBundle::new("Home"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::InvalidCredentials(_)));
        assert!(client.sent().is_empty());
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::RollingBack.to_string(), "rolling back");
        assert_eq!(Stage::Committed.to_string(), "committed");
    }
}
