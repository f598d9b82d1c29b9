//! Saved profile management.
//!
//! Provides functions for listing, resolving and removing the network
//! profiles held by the daemon for one interface.

use log::debug;

use crate::Result;
use crate::api::models::{ConnectionError, NetworkId, NetworkProfile, ProfileFlags};
use crate::ctrl::{self, Command, ControlClient};
use crate::util::utils::decode_escaped_ssid;

/// Lists the saved profiles for `interface`, in daemon order.
pub(crate) async fn list(client: &dyn ControlClient, interface: &str) -> Result<Vec<NetworkProfile>> {
    let command = Command::ListNetworks;
    let reply = ctrl::send(client, interface, &command).await?;
    parse_network_list(&command, &reply)
}

/// Resolves `ssid` to the id of the first saved profile with exactly that
/// SSID.
pub(crate) async fn find(
    client: &dyn ControlClient,
    interface: &str,
    ssid: &str,
) -> Result<Option<NetworkId>> {
    let found = list(client, interface)
        .await?
        .into_iter()
        .find(|p| p.ssid == ssid)
        .map(|p| p.id);

    match found {
        Some(id) => debug!("Found saved profile {id} for '{ssid}'"),
        None => debug!("No saved profile for '{ssid}'"),
    }
    Ok(found)
}

/// Returns the ids of every saved profile with exactly this SSID.
pub(crate) async fn find_all(
    client: &dyn ControlClient,
    interface: &str,
    ssid: &str,
) -> Result<Vec<NetworkId>> {
    Ok(list(client, interface)
        .await?
        .into_iter()
        .filter(|p| p.ssid == ssid)
        .map(|p| p.id)
        .collect())
}

/// Removes a saved profile. Any reply other than `OK` is a failure.
pub(crate) async fn remove(client: &dyn ControlClient, interface: &str, id: NetworkId) -> Result<()> {
    ctrl::send_expect_ok(client, interface, &Command::RemoveNetwork(id)).await?;
    debug!("Removed profile {id}");
    Ok(())
}

/// Parses a `LIST_NETWORKS` reply.
///
/// ```text
/// network id / ssid / bssid / flags
/// 0	HomeNet	any	[CURRENT]
/// 1	Cafe	any
/// ```
fn parse_network_list(command: &Command, reply: &str) -> Result<Vec<NetworkProfile>> {
    if reply.trim() == "FAIL" {
        return Err(ctrl::protocol_error(command, reply));
    }

    let mut profiles = Vec::new();
    for line in reply.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let raw_id = fields.next().unwrap_or_default().trim();
        let id = raw_id
            .parse::<u32>()
            .map(NetworkId)
            .map_err(|_| ConnectionError::Protocol {
                command: command.to_string(),
                reply: format!("malformed profile row: {line}"),
            })?;

        let ssid = decode_escaped_ssid(fields.next().unwrap_or_default());
        let bssid = fields.next().unwrap_or("any").to_string();
        let flags = ProfileFlags::from_tokens(fields.next().unwrap_or_default());

        profiles.push(NetworkProfile {
            id,
            ssid,
            bssid,
            flags,
        });
    }

    Ok(profiles)
}
