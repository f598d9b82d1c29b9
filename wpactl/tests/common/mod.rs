//! In-memory stand-in for wpa_supplicant used by the integration tests.
//!
//! `FakeDaemon` keeps a profile table, answers control commands the way the
//! daemon does, and records every request it receives. Individual commands
//! can be made to fail or stall.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use wpactl::{Command, ControlClient, NetworkId, Supplicant, SupplicantConfig};

#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub ssid: String,
    /// Parameters as received on the wire, in order.
    pub params: Vec<(String, String)>,
    pub enabled: bool,
    pub current: bool,
}

#[derive(Default)]
struct State {
    profiles: BTreeMap<u32, Profile>,
    next_id: u32,
    log: Vec<(Instant, String)>,
    fail_prefixes: Vec<String>,
    /// Prefix and how many more matching commands succeed before failing.
    fail_later: Vec<(String, usize)>,
    fail_params: Vec<String>,
    delays: Vec<(String, Duration)>,
    scan_busy: bool,
    scan_results: String,
    status: String,
    saves: usize,
    /// Profile ids written by the last `SAVE_CONFIG`.
    on_disk: BTreeSet<u32>,
}

pub struct FakeDaemon {
    state: Mutex<State>,
}

pub const SCAN_HEADER: &str = "bssid / frequency / signal level / flags / ssid\n";

impl FakeDaemon {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                scan_results: SCAN_HEADER.to_string(),
                status: "wpa_state=DISCONNECTED\naddress=aa:bb:cc:dd:ee:ff\n".to_string(),
                ..State::default()
            }),
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Seeds a saved profile and returns its id.
    pub fn add_profile(&self, ssid: &str) -> NetworkId {
        let mut state = self.state();
        let id = state.next_id;
        state.next_id += 1;
        state.profiles.insert(
            id,
            Profile {
                ssid: ssid.to_string(),
                params: vec![("ssid".into(), format!("\"{ssid}\""))],
                enabled: true,
                current: false,
            },
        );
        NetworkId(id)
    }

    /// Replies `FAIL` to every command whose wire form starts with `prefix`.
    pub fn fail_on(&self, prefix: &str) {
        self.state().fail_prefixes.push(prefix.to_string());
    }

    /// Lets `successes` commands starting with `prefix` through, then fails
    /// the rest.
    pub fn fail_after(&self, prefix: &str, successes: usize) {
        self.state().fail_later.push((prefix.to_string(), successes));
    }

    /// Replies `FAIL` to `SET_NETWORK` for parameter `name`.
    pub fn fail_set(&self, name: &str) {
        self.state().fail_params.push(name.to_string());
    }

    /// Holds back the reply to commands starting with `prefix`.
    pub fn delay_on(&self, prefix: &str, delay: Duration) {
        self.state().delays.push((prefix.to_string(), delay));
    }

    pub fn set_scan_busy(&self, busy: bool) {
        self.state().scan_busy = busy;
    }

    /// Sets the scan table rows (without header).
    pub fn set_scan_rows(&self, rows: &[&str]) {
        let mut text = SCAN_HEADER.to_string();
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        self.state().scan_results = text;
    }

    pub fn set_status(&self, status: &str) {
        self.state().status = status.to_string();
    }

    pub fn profiles(&self) -> Vec<(NetworkId, Profile)> {
        self.state()
            .profiles
            .iter()
            .map(|(id, p)| (NetworkId(*id), p.clone()))
            .collect()
    }

    pub fn ssids(&self) -> Vec<String> {
        self.state().profiles.values().map(|p| p.ssid.clone()).collect()
    }

    pub fn param(&self, id: NetworkId, name: &str) -> Option<String> {
        self.state().profiles.get(&id.0).and_then(|p| {
            p.params
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// Every request received, in order.
    pub fn log(&self) -> Vec<String> {
        self.state().log.iter().map(|(_, c)| c.clone()).collect()
    }

    /// When the first request with this exact wire form arrived.
    pub fn received_at(&self, wire: &str) -> Option<Instant> {
        self.state()
            .log
            .iter()
            .find(|(_, c)| c == wire)
            .map(|(at, _)| *at)
    }

    pub fn saves(&self) -> usize {
        self.state().saves
    }

    /// Profiles present in the configuration file as of the last save.
    pub fn saved_ids(&self) -> Vec<NetworkId> {
        self.state().on_disk.iter().map(|id| NetworkId(*id)).collect()
    }

    fn handle(&self, command: &Command) -> String {
        let mut state = self.state();
        let wire = command.to_string();
        state.log.push((Instant::now(), wire.clone()));

        if state.fail_prefixes.iter().any(|p| wire.starts_with(p)) {
            return "FAIL\n".into();
        }
        for (prefix, remaining) in state.fail_later.iter_mut() {
            if wire.starts_with(prefix.as_str()) {
                if *remaining == 0 {
                    return "FAIL\n".into();
                }
                *remaining -= 1;
            }
        }

        match command {
            Command::Ping => "PONG\n".into(),
            Command::Scan if state.scan_busy => "FAIL-BUSY\n".into(),
            Command::Scan => "OK\n".into(),
            Command::ScanResults => state.scan_results.clone(),
            Command::ListNetworks => {
                let mut out = String::from("network id / ssid / bssid / flags\n");
                for (id, p) in &state.profiles {
                    let flags = match (p.current, p.enabled) {
                        (true, _) => "[CURRENT]",
                        (false, false) => "[DISABLED]",
                        (false, true) => "",
                    };
                    out.push_str(&format!("{id}\t{}\tany\t{flags}\n", escape_ssid(&p.ssid)));
                }
                out
            }
            Command::AddNetwork => {
                let id = state.next_id;
                state.next_id += 1;
                state.profiles.insert(id, Profile::default());
                format!("{id}\n")
            }
            Command::SetNetwork { id, name, value } => {
                if state.fail_params.iter().any(|n| n == name) {
                    return "FAIL\n".into();
                }
                match state.profiles.get_mut(&id.0) {
                    Some(profile) => {
                        if name == "ssid" {
                            profile.ssid = decode_value(value);
                        }
                        profile.params.push((name.clone(), value.clone()));
                        "OK\n".into()
                    }
                    None => "FAIL\n".into(),
                }
            }
            Command::EnableNetwork(id) => match state.profiles.get_mut(&id.0) {
                Some(profile) => {
                    profile.enabled = true;
                    "OK\n".into()
                }
                None => "FAIL\n".into(),
            },
            Command::SelectNetwork(id) => {
                if !state.profiles.contains_key(&id.0) {
                    return "FAIL\n".into();
                }
                for (pid, profile) in state.profiles.iter_mut() {
                    profile.current = *pid == id.0;
                }
                "OK\n".into()
            }
            Command::RemoveNetwork(id) => match state.profiles.remove(&id.0) {
                Some(_) => "OK\n".into(),
                None => "FAIL\n".into(),
            },
            Command::SaveConfig => {
                state.saves += 1;
                state.on_disk = state.profiles.keys().copied().collect();
                "OK\n".into()
            }
            Command::Status => state.status.clone(),
            Command::Disconnect => "OK\n".into(),
        }
    }
}

#[async_trait]
impl ControlClient for FakeDaemon {
    async fn request(&self, _interface: &str, command: &Command) -> wpactl::Result<String> {
        let wire = command.to_string();
        let delay = self
            .state()
            .delays
            .iter()
            .find(|(p, _)| wire.starts_with(p))
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.handle(command))
    }
}

/// Builds a handle on `wlan0` backed by `daemon`.
pub fn supplicant(daemon: &Arc<FakeDaemon>) -> Supplicant {
    supplicant_with(daemon, SupplicantConfig::default())
}

pub fn supplicant_with(daemon: &Arc<FakeDaemon>, config: SupplicantConfig) -> Supplicant {
    Supplicant::with_client(config, daemon.clone()).unwrap()
}

/// Reverses the daemon-side encoding of a `SET_NETWORK` value.
fn decode_value(value: &str) -> String {
    if let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        return inner.to_string();
    }
    let bytes: Vec<u8> = (0..value.len())
        .step_by(2)
        .filter_map(|i| value.get(i..i + 2))
        .filter_map(|h| u8::from_str_radix(h, 16).ok())
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn escape_ssid(ssid: &str) -> String {
    let mut out = String::new();
    for c in ssid.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
