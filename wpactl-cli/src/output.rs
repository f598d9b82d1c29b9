//! Output formatting: plain tables or JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use wpactl::{ConnectionCheck, ConnectionStatus, Network, NetworkProfile, ScanObservation};

/// Prints `data` as pretty JSON, or through `table` otherwise.
pub fn emit<T, F>(json: bool, data: &T, table: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    let rendered = if json {
        serde_json::to_string_pretty(data).context("failed to serialize output")?
    } else {
        table(data)
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

pub fn scan_table(observations: &[ScanObservation]) -> String {
    let mut out = format!(
        "{:<17}  {:>5}  {:>4}  {:>4}  {:<4}  {}\n",
        "BSSID", "FREQ", "CH", "DBM", "BARS", "SSID"
    );
    for obs in observations {
        let channel = obs
            .channel()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into());
        out.push_str(&format!(
            "{:<17}  {:>5}  {:>4}  {:>4}  {:<4}  {}\n",
            obs.bssid,
            obs.frequency,
            channel,
            obs.signal_dbm,
            obs.bars(),
            display_ssid(&obs.ssid)
        ));
    }
    out
}

pub fn networks_table(networks: &[Network]) -> String {
    let mut out = format!(
        "{:<32}  {:>7}  {:<8}  {}\n",
        "SSID", "SIGNAL", "SECURITY", "BSSID"
    );
    for net in networks {
        let security = if net.is_eap {
            "802.1X"
        } else if net.is_psk {
            "WPA-PSK"
        } else if net.secured {
            "secured"
        } else {
            "open"
        };
        out.push_str(&format!(
            "{:<32}  {:>6}%  {:<8}  {}\n",
            display_ssid(&net.ssid),
            net.quality(),
            security,
            net.bssid
        ));
    }
    out
}

pub fn profiles_table(profiles: &[NetworkProfile]) -> String {
    let mut out = format!("{:>3}  {:<32}  {:<17}  {}\n", "ID", "SSID", "BSSID", "STATE");
    for profile in profiles {
        let state = if profile.is_current() {
            "current"
        } else if profile.is_disabled() {
            "disabled"
        } else {
            ""
        };
        out.push_str(&format!(
            "{:>3}  {:<32}  {:<17}  {}\n",
            profile.id,
            display_ssid(&profile.ssid),
            profile.bssid,
            state
        ));
    }
    out
}

pub fn status_text(status: &ConnectionStatus) -> String {
    let mut out = String::new();
    let mut line = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            out.push_str(&format!("{key:<10} {value}\n"));
        }
    };

    line("state", status.wpa_state.as_ref().map(ToString::to_string));
    line("ssid", status.ssid.as_deref().map(display_ssid));
    line("bssid", status.bssid.clone());
    line("freq", status.frequency.map(|f| format!("{f} MHz")));
    line("profile", status.network_id.map(|id| id.to_string()));
    line("key_mgmt", status.key_mgmt.clone());
    line("ip", status.ip_address.clone());
    line("address", status.address.clone());
    out
}

pub fn check_text(check: &ConnectionCheck) -> String {
    match (check.connected, check.selected, &check.ip) {
        (true, _, Some(ip)) => format!("connected ({ip})"),
        (true, _, None) => "connected (no address yet)".to_string(),
        (false, true, _) => "selected, not yet connected".to_string(),
        (false, false, _) => "not connected".to_string(),
    }
}

/// Makes control characters in an SSID visible.
fn display_ssid(ssid: &str) -> String {
    ssid.chars()
        .map(|c| {
            if c.is_control() {
                c.escape_default().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}
