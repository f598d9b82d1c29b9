use bitflags::bitflags;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::constants::defaults;
use crate::util::utils::{bars_from_quality, channel_from_freq, quality_from_dbm};

/// Daemon-assigned identifier of a saved network profile.
///
/// Returned by `ADD_NETWORK` and used by every request that targets a
/// single profile. Ids are only meaningful for the interface that issued
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u32);

impl Display for NetworkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Flags the daemon reports for a saved profile in `LIST_NETWORKS`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ProfileFlags: u8 {
        /// The profile is the one currently selected.
        const CURRENT = 1 << 0;
        /// The profile is disabled and will not be auto-selected.
        const DISABLED = 1 << 1;
        /// The profile is disabled temporarily after repeated failures.
        const TEMP_DISABLED = 1 << 2;
        /// The profile is a persistent P2P group.
        const P2P_PERSISTENT = 1 << 3;
    }
}

impl ProfileFlags {
    /// Parses the bracketed flag column, e.g. `[CURRENT][DISABLED]`.
    ///
    /// Unknown tokens are ignored.
    pub fn from_tokens(raw: &str) -> Self {
        let mut flags = ProfileFlags::empty();
        for token in raw
            .split(['[', ']'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            match token {
                "CURRENT" => flags |= ProfileFlags::CURRENT,
                "DISABLED" => flags |= ProfileFlags::DISABLED,
                "TEMP-DISABLED" => flags |= ProfileFlags::TEMP_DISABLED,
                "P2P-PERSISTENT" => flags |= ProfileFlags::P2P_PERSISTENT,
                other => debug!("Ignoring unknown profile flag '{other}'"),
            }
        }
        flags
    }
}

/// A saved network profile as listed by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub id: NetworkId,
    pub ssid: String,
    /// Peer address the profile is locked to, `any` when unrestricted.
    pub bssid: String,
    pub flags: ProfileFlags,
}

impl NetworkProfile {
    /// Returns whether this profile is the currently selected one.
    pub fn is_current(&self) -> bool {
        self.flags.contains(ProfileFlags::CURRENT)
    }

    /// Returns whether this profile is disabled.
    pub fn is_disabled(&self) -> bool {
        self.flags
            .intersects(ProfileFlags::DISABLED | ProfileFlags::TEMP_DISABLED)
    }
}

/// Credentials and overrides for a connection attempt.
///
/// The security class is inferred from which fields are present:
///
/// - no password: open network
/// - password only: pre-shared key (WPA-PSK)
/// - username and password: enterprise (WPA-EAP, PEAP by default)
///
/// `key_management`, `eap_method`, `phase1` and `phase2` override whatever
/// the inference produced.
///
/// # Examples
///
/// ```rust
/// use wpactl::CredentialBundle;
///
/// let open = CredentialBundle::new("CoffeeShop");
///
/// let home = CredentialBundle::new("HomeNet").with_password("secret123");
///
/// let corp = CredentialBundle::new("CorpNet")
///     .with_username("alice@corp.example")
///     .with_password("hunter22")
///     .with_eap_method("TTLS")
///     .with_phase2("auth=PAP");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialBundle {
    pub ssid: String,
    pub password: Option<String>,
    pub username: Option<String>,
    pub key_management: Option<String>,
    pub eap_method: Option<String>,
    pub phase1: Option<String>,
    pub phase2: Option<String>,
}

impl CredentialBundle {
    /// Creates a bundle for an open network with the given SSID.
    pub fn new(ssid: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_key_management(mut self, key_mgmt: impl Into<String>) -> Self {
        self.key_management = Some(key_mgmt.into());
        self
    }

    pub fn with_eap_method(mut self, eap: impl Into<String>) -> Self {
        self.eap_method = Some(eap.into());
        self
    }

    pub fn with_phase1(mut self, phase1: impl Into<String>) -> Self {
        self.phase1 = Some(phase1.into());
        self
    }

    pub fn with_phase2(mut self, phase2: impl Into<String>) -> Self {
        self.phase2 = Some(phase2.into());
        self
    }

    /// Returns whether the bundle describes an 802.1X network.
    pub fn is_enterprise(&self) -> bool {
        self.username.is_some()
            || self.eap_method.is_some()
            || self
                .key_management
                .as_deref()
                .is_some_and(|k| k.split_whitespace().any(|t| t == "WPA-EAP"))
    }
}

/// How a parameter value is written on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A string the daemon must treat literally; encoded with
    /// [`encode_literal`](crate::encode_literal).
    Literal(String),
    /// A keyword or raw value written as-is (`key_mgmt`, `eap`, hex PSK).
    Token(String),
}

impl ParamValue {
    /// The unencoded value.
    pub fn as_str(&self) -> &str {
        match self {
            ParamValue::Literal(s) | ParamValue::Token(s) => s,
        }
    }
}

/// Ordered set of network block parameters derived from a
/// [`CredentialBundle`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterSet {
    entries: Vec<(&'static str, ParamValue)>,
}

impl ParameterSet {
    /// Sets `name`, replacing an existing entry in place or appending.
    pub(crate) fn set(&mut self, name: &'static str, value: ParamValue) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A BSS observed in scan results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanObservation {
    pub bssid: String,
    /// Centre frequency in MHz.
    pub frequency: u32,
    /// Signal level in dBm.
    pub signal_dbm: i32,
    /// Capability tokens such as `WPA2-PSK-CCMP` or `ESS`.
    pub flags: Vec<String>,
    /// Empty for hidden networks.
    pub ssid: String,
}

impl ScanObservation {
    pub fn channel(&self) -> Option<u16> {
        channel_from_freq(self.frequency)
    }

    /// Signal quality as a 0-100 percentage.
    pub fn quality(&self) -> u8 {
        quality_from_dbm(self.signal_dbm)
    }

    pub fn bars(&self) -> &'static str {
        bars_from_quality(self.quality())
    }

    pub fn is_secured(&self) -> bool {
        self.flags
            .iter()
            .any(|f| f.starts_with("WPA") || f.starts_with("RSN") || f.starts_with("WEP"))
    }

    pub fn is_psk(&self) -> bool {
        self.flags.iter().any(|f| f.contains("-PSK") || f.contains("-SAE"))
    }

    pub fn is_eap(&self) -> bool {
        self.flags.iter().any(|f| f.contains("-EAP"))
    }

    pub fn is_hidden(&self) -> bool {
        self.ssid.is_empty()
    }
}

/// A network as seen across all BSSes advertising its SSID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub ssid: String,
    /// BSSID of the strongest observation.
    pub bssid: String,
    pub frequency: u32,
    pub signal_dbm: i32,
    pub secured: bool,
    pub is_psk: bool,
    pub is_eap: bool,
}

impl From<&ScanObservation> for Network {
    fn from(obs: &ScanObservation) -> Self {
        Self {
            ssid: obs.ssid.clone(),
            bssid: obs.bssid.clone(),
            frequency: obs.frequency,
            signal_dbm: obs.signal_dbm,
            secured: obs.is_secured(),
            is_psk: obs.is_psk(),
            is_eap: obs.is_eap(),
        }
    }
}

impl Network {
    /// Folds another observation of the same SSID into this one.
    ///
    /// The strongest BSS wins; security capabilities are OR-ed.
    pub fn merge(&mut self, other: &ScanObservation) {
        if other.signal_dbm > self.signal_dbm {
            self.signal_dbm = other.signal_dbm;
            self.frequency = other.frequency;
            self.bssid = other.bssid.clone();
        }

        self.secured |= other.is_secured();
        self.is_psk |= other.is_psk();
        self.is_eap |= other.is_eap();
    }

    pub fn quality(&self) -> u8 {
        quality_from_dbm(self.signal_dbm)
    }
}

/// Supplicant state as reported in the `wpa_state` field of `STATUS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WpaState {
    Disconnected,
    InterfaceDisabled,
    Inactive,
    Scanning,
    Authenticating,
    Associating,
    Associated,
    FourWayHandshake,
    GroupHandshake,
    Completed,
    /// A state string not mapped to a specific variant.
    Other(String),
}

impl From<&str> for WpaState {
    fn from(raw: &str) -> Self {
        match raw {
            "DISCONNECTED" => Self::Disconnected,
            "INTERFACE_DISABLED" => Self::InterfaceDisabled,
            "INACTIVE" => Self::Inactive,
            "SCANNING" => Self::Scanning,
            "AUTHENTICATING" => Self::Authenticating,
            "ASSOCIATING" => Self::Associating,
            "ASSOCIATED" => Self::Associated,
            "4WAY_HANDSHAKE" => Self::FourWayHandshake,
            "GROUP_HANDSHAKE" => Self::GroupHandshake,
            "COMPLETED" => Self::Completed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for WpaState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::InterfaceDisabled => write!(f, "INTERFACE_DISABLED"),
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Scanning => write!(f, "SCANNING"),
            Self::Authenticating => write!(f, "AUTHENTICATING"),
            Self::Associating => write!(f, "ASSOCIATING"),
            Self::Associated => write!(f, "ASSOCIATED"),
            Self::FourWayHandshake => write!(f, "4WAY_HANDSHAKE"),
            Self::GroupHandshake => write!(f, "GROUP_HANDSHAKE"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Snapshot of the interface state at query time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub ssid: Option<String>,
    pub wpa_state: Option<WpaState>,
    pub ip_address: Option<String>,
    pub bssid: Option<String>,
    pub frequency: Option<u32>,
    pub network_id: Option<NetworkId>,
    pub key_mgmt: Option<String>,
    /// MAC address of the local interface.
    pub address: Option<String>,
}

/// Result of [`Supplicant::check_connection`](crate::Supplicant::check_connection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCheck {
    /// The interface is associated (or associating) with the requested SSID.
    pub selected: bool,
    /// Selected and the handshake has completed.
    pub connected: bool,
    /// Present only when connected and the daemon reported an address.
    pub ip: Option<String>,
}

/// Configuration for a [`Supplicant`](crate::Supplicant) handle.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use wpactl::SupplicantConfig;
///
/// let config = SupplicantConfig::new()
///     .with_interface("wlp3s0")
///     .with_scan_settle(Duration::from_millis(1500))
///     .with_connect_timeout(Duration::from_secs(20));
///
/// assert_eq!(config.interface, "wlp3s0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplicantConfig {
    /// Interface used until [`Supplicant::with_interface`](crate::Supplicant::with_interface)
    /// selects another.
    pub interface: String,
    /// Directory holding the daemon's per-interface control sockets.
    pub ctrl_dir: PathBuf,
    /// Wait between triggering a scan and fetching its results.
    pub scan_settle: Duration,
    /// Deadline for a single control request.
    pub request_timeout: Duration,
    /// Optional deadline for a whole connect call.
    pub connect_timeout: Option<Duration>,
}

impl Default for SupplicantConfig {
    /// Returns the default configuration.
    ///
    /// Defaults:
    /// - `interface`: `wlan0`
    /// - `ctrl_dir`: `/var/run/wpa_supplicant`
    /// - `scan_settle`: 1 second
    /// - `request_timeout`: 5 seconds
    /// - `connect_timeout`: `None`
    fn default() -> Self {
        Self {
            interface: defaults::INTERFACE.to_string(),
            ctrl_dir: PathBuf::from(defaults::CTRL_DIR),
            scan_settle: defaults::scan_settle(),
            request_timeout: defaults::request_timeout(),
            connect_timeout: None,
        }
    }
}

impl SupplicantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    pub fn with_ctrl_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ctrl_dir = dir.into();
        self
    }

    pub fn with_scan_settle(mut self, settle: Duration) -> Self {
        self.scan_settle = settle;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

/// Errors that can occur while talking to the daemon.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The daemon answered, but not with the expected reply.
    #[error("daemon rejected '{command}': {reply}")]
    Protocol { command: String, reply: String },

    /// The control socket could not be reached or failed mid-request.
    #[error("control socket error: {0}")]
    Transport(#[from] std::io::Error),

    /// The daemon refused to start a scan.
    #[error("scan request rejected: {0}")]
    ScanRejected(String),

    /// The requested network is not visible.
    #[error("network not found: {0}")]
    NotFound(String),

    /// The status reply carried neither `ssid` nor `wpa_state`.
    #[error("status reply is missing both ssid and wpa_state")]
    IncompleteStatus,

    /// The credential bundle is malformed.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The interface name cannot address a control socket.
    #[error("invalid interface name: {0:?}")]
    InvalidInterface(String),

    /// No saved profile exists for the requested network.
    #[error("no saved profile for network: {0}")]
    NoSavedProfile(String),

    /// A request or connect call exceeded its deadline.
    #[error("operation timed out")]
    Timeout,

    /// A step failed and removing the half-built profile failed as well.
    #[error("{cause} (rollback also failed: {rollback})")]
    RollbackFailed {
        cause: Box<ConnectionError>,
        rollback: Box<ConnectionError>,
    },

    /// An interface lifecycle command exited unsuccessfully.
    #[error("'{program}' exited with {status}")]
    InterfaceCommand { program: String, status: String },
}

impl ConnectionError {
    /// Returns the error that started a failed connect, looking through
    /// rollback failures.
    pub fn root_cause(&self) -> &ConnectionError {
        match self {
            ConnectionError::RollbackFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
