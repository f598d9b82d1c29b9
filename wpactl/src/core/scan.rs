//! Wi-Fi network scanning and enumeration.
//!
//! Provides functions to trigger a scan, wait for the daemon to collect
//! results, and list the observed networks.

use log::{debug, warn};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;

use crate::Result;
use crate::api::models::{ConnectionError, Network, ScanObservation};
use crate::ctrl::{self, Command, ControlClient};
use crate::types::constants::reply;
use crate::util::utils::decode_escaped_ssid;

/// Triggers a scan, waits `settle`, then fetches the results.
///
/// The daemon scans asynchronously, so results are not ready when `SCAN`
/// returns. The wait is a single sleep; there is no polling and no retry if
/// the results turn out stale. A `SCAN` reply other than `OK` (typically
/// `FAIL-BUSY`) fails immediately without waiting.
pub(crate) async fn scan(
    client: &dyn ControlClient,
    interface: &str,
    settle: Duration,
) -> Result<Vec<ScanObservation>> {
    let accepted = ctrl::send(client, interface, &Command::Scan).await?;
    if accepted.trim() != reply::OK {
        warn!("Scan on {interface} rejected: {accepted}");
        return Err(ConnectionError::ScanRejected(accepted.trim().to_string()));
    }

    debug!("Scan requested, waiting {settle:?} for results");
    sleep(settle).await;

    let command = Command::ScanResults;
    let results = ctrl::send(client, interface, &command).await?;
    let observations = parse_scan_results(&command, &results)?;
    debug!("Scan found {} BSS entries", observations.len());
    Ok(observations)
}

/// Collapses observations into one [`Network`] per SSID.
///
/// When several BSSes share an SSID (mesh, dual band), the strongest one is
/// reported and security capabilities are merged. Hidden networks are
/// dropped. Sorted by signal, strongest first.
pub(crate) fn dedupe_networks(observations: &[ScanObservation]) -> Vec<Network> {
    let mut networks: HashMap<&str, Network> = HashMap::new();

    for obs in observations.iter().filter(|o| !o.is_hidden()) {
        networks
            .entry(obs.ssid.as_str())
            .and_modify(|n| n.merge(obs))
            .or_insert_with(|| Network::from(obs));
    }

    let mut list: Vec<Network> = networks.into_values().collect();
    list.sort_by(|a, b| b.signal_dbm.cmp(&a.signal_dbm).then(a.ssid.cmp(&b.ssid)));
    list
}

/// Parses a `SCAN_RESULTS` reply.
///
/// ```text
/// bssid / frequency / signal level / flags / ssid
/// 00:11:22:33:44:55	2437	-48	[WPA2-PSK-CCMP][ESS]	HomeNet
/// ```
fn parse_scan_results(command: &Command, reply: &str) -> Result<Vec<ScanObservation>> {
    if reply.trim() == "FAIL" {
        return Err(ctrl::protocol_error(command, reply));
    }

    let mut observations = Vec::new();
    for line in reply.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.splitn(5, '\t').collect();
        if fields.len() < 4 {
            warn!("Skipping short scan row: {line}");
            continue;
        }

        let malformed = || ConnectionError::Protocol {
            command: command.to_string(),
            reply: format!("malformed scan row: {line}"),
        };
        let frequency = fields[1].trim().parse::<u32>().map_err(|_| malformed())?;
        let signal_dbm = fields[2].trim().parse::<i32>().map_err(|_| malformed())?;

        let flags = fields[3]
            .split(['[', ']'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        observations.push(ScanObservation {
            bssid: fields[0].trim().to_string(),
            frequency,
            signal_dbm,
            flags,
            ssid: decode_escaped_ssid(fields.get(4).copied().unwrap_or_default()),
        });
    }

    Ok(observations)
}
