//! Live interface status.
//!
//! Provides functions to read the daemon's `STATUS` snapshot and derive
//! whether a given network is selected and connected.

use log::debug;

use crate::Result;
use crate::api::models::{
    ConnectionCheck, ConnectionError, ConnectionStatus, NetworkId, WpaState,
};
use crate::ctrl::{self, Command, ControlClient};
use crate::util::utils::{decode_escaped_ssid, parse_key_values};

/// Reads the current status snapshot of `interface`.
pub(crate) async fn status(client: &dyn ControlClient, interface: &str) -> Result<ConnectionStatus> {
    let command = Command::Status;
    let reply = ctrl::send(client, interface, &command).await?;
    if reply.trim() == "FAIL" {
        return Err(ctrl::protocol_error(&command, &reply));
    }
    Ok(parse_status(&reply))
}

/// Reads the status and checks it against `ssid`.
pub(crate) async fn check_connection(
    client: &dyn ControlClient,
    interface: &str,
    ssid: &str,
) -> Result<ConnectionCheck> {
    let snapshot = status(client, interface).await?;
    let check = evaluate(&snapshot, ssid)?;
    debug!(
        "Connection check for '{ssid}': selected={} connected={} ip={:?}",
        check.selected, check.connected, check.ip
    );
    Ok(check)
}

/// Derives a [`ConnectionCheck`] from a snapshot.
///
/// A snapshot with neither `ssid` nor `wpa_state` is rejected rather than
/// read as "not connected".
pub(crate) fn evaluate(status: &ConnectionStatus, ssid: &str) -> Result<ConnectionCheck> {
    if status.ssid.is_none() && status.wpa_state.is_none() {
        return Err(ConnectionError::IncompleteStatus);
    }

    let selected = status.ssid.as_deref() == Some(ssid);
    let connected = selected && status.wpa_state == Some(WpaState::Completed);
    let ip = if connected {
        status.ip_address.clone()
    } else {
        None
    };

    Ok(ConnectionCheck {
        selected,
        connected,
        ip,
    })
}

fn parse_status(reply: &str) -> ConnectionStatus {
    let mut kv = parse_key_values(reply);

    ConnectionStatus {
        ssid: kv.remove("ssid").map(|s| decode_escaped_ssid(&s)),
        wpa_state: kv.remove("wpa_state").map(|s| WpaState::from(s.as_str())),
        ip_address: kv.remove("ip_address"),
        bssid: kv.remove("bssid"),
        frequency: kv.remove("freq").and_then(|f| f.parse().ok()),
        network_id: kv.remove("id").and_then(|i| i.parse().ok()).map(NetworkId),
        key_mgmt: kv.remove("key_mgmt"),
        address: kv.remove("address"),
    }
}
