use log::{debug, info};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

use crate::Result;
use crate::api::models::{
    ConnectionCheck, ConnectionError, ConnectionStatus, CredentialBundle, Network, NetworkId,
    NetworkProfile, ScanObservation, SupplicantConfig,
};
use crate::core::lifecycle::{IfUpDown, InterfaceLifecycle};
use crate::core::{catalog, orchestrator, scan, status};
use crate::ctrl::{self, Command, ControlClient, SocketClient};
use crate::types::constants::reply;

type LockRegistry = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// High-level handle to wpa_supplicant for one wireless interface.
///
/// This is the main entry point of the crate. Every operation targets the
/// handle's interface; use [`Supplicant::with_interface`] to get a handle
/// for another one.
///
/// # Creating an Instance
///
/// ```no_run
/// use wpactl::{Supplicant, SupplicantConfig};
///
/// # fn example() -> wpactl::Result<()> {
/// let wifi = Supplicant::new(SupplicantConfig::default())?;
/// # Ok(())
/// # }
/// ```
///
/// # Examples
///
/// ## Scanning and connecting
///
/// ```no_run
/// use wpactl::{CredentialBundle, Supplicant, SupplicantConfig};
///
/// # async fn example() -> wpactl::Result<()> {
/// let wifi = Supplicant::new(SupplicantConfig::default())?;
///
/// for net in wifi.list_networks().await? {
///     println!("{}: {}%", net.ssid, net.quality());
/// }
///
/// let id = wifi
///     .connect("HomeNet", CredentialBundle::new("HomeNet").with_password("secret123"))
///     .await?;
/// println!("Saved as profile {id}");
///
/// let check = wifi.check_connection("HomeNet").await?;
/// println!("connected: {}, ip: {:?}", check.connected, check.ip);
/// # Ok(())
/// # }
/// ```
///
/// ## Several interfaces
///
/// ```no_run
/// use wpactl::{Supplicant, SupplicantConfig};
///
/// # async fn example() -> wpactl::Result<()> {
/// let wlan0 = Supplicant::new(SupplicantConfig::default())?;
/// let wlan1 = wlan0.with_interface("wlan1")?;
///
/// assert_eq!(wlan0.interface(), "wlan0");
/// let status = wlan1.status().await?;
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// `Supplicant` is `Clone` and can be shared across tasks. Clones, and
/// handles derived with [`Supplicant::with_interface`], share the same
/// client. Connect and forget calls on the same interface run one at a
/// time; calls on different interfaces run concurrently.
#[derive(Clone)]
pub struct Supplicant {
    client: Arc<dyn ControlClient>,
    lifecycle: Arc<dyn InterfaceLifecycle>,
    interface: String,
    config: SupplicantConfig,
    locks: Arc<LockRegistry>,
}

impl Debug for Supplicant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supplicant")
            .field("interface", &self.interface)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Supplicant {
    /// Creates a handle that talks to the control sockets in
    /// `config.ctrl_dir` and restarts interfaces with `ifdown`/`ifup`.
    ///
    /// No request is sent; use [`Supplicant::ping`] to check the daemon is
    /// reachable.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidInterface`] if `config.interface`
    /// cannot name a control socket.
    pub fn new(config: SupplicantConfig) -> Result<Self> {
        let client = SocketClient::from_config(&config);
        Self::with_client(config, Arc::new(client))
    }

    /// Creates a handle over a custom [`ControlClient`].
    pub fn with_client(config: SupplicantConfig, client: Arc<dyn ControlClient>) -> Result<Self> {
        ctrl::validate_interface(&config.interface)?;
        Ok(Self {
            client,
            lifecycle: Arc::new(IfUpDown::new()),
            interface: config.interface.clone(),
            config,
            locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Replaces the interface up/down implementation.
    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn InterfaceLifecycle>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Returns a handle for `interface`, leaving `self` unchanged.
    pub fn with_interface(&self, interface: &str) -> Result<Self> {
        ctrl::validate_interface(interface)?;
        debug!("Selecting interface {interface}");
        let mut handle = self.clone();
        handle.interface = interface.to_string();
        handle.config.interface = interface.to_string();
        Ok(handle)
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn config(&self) -> &SupplicantConfig {
        &self.config
    }

    /// Checks that the daemon answers on this interface.
    pub async fn ping(&self) -> Result<()> {
        let command = Command::Ping;
        let reply = ctrl::send(self.client.as_ref(), &self.interface, &command).await?;
        if reply.trim() == reply::PONG {
            Ok(())
        } else {
            Err(ctrl::protocol_error(&command, &reply))
        }
    }

    /// Triggers a scan and returns every BSS observed, in daemon order.
    ///
    /// Waits `scan_settle` between the request and reading results.
    pub async fn scan(&self) -> Result<Vec<ScanObservation>> {
        scan::scan(self.client.as_ref(), &self.interface, self.config.scan_settle).await
    }

    /// Scans and returns one entry per visible SSID, strongest first.
    pub async fn list_networks(&self) -> Result<Vec<Network>> {
        let observations = self.scan().await?;
        Ok(scan::dedupe_networks(&observations))
    }

    /// Scans and returns the network advertising `ssid`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotFound`] if no BSS advertises `ssid`.
    pub async fn ensure_visible(&self, ssid: &str) -> Result<Network> {
        self.list_networks()
            .await?
            .into_iter()
            .find(|n| n.ssid == ssid)
            .ok_or_else(|| ConnectionError::NotFound(ssid.to_string()))
    }

    /// Lists the saved profiles for this interface.
    pub async fn list_profiles(&self) -> Result<Vec<NetworkProfile>> {
        catalog::list(self.client.as_ref(), &self.interface).await
    }

    /// Returns the id of the first saved profile for `ssid`.
    pub async fn find_profile(&self, ssid: &str) -> Result<Option<NetworkId>> {
        catalog::find(self.client.as_ref(), &self.interface, ssid).await
    }

    /// Removes one saved profile. The configuration file is not rewritten.
    pub async fn remove_profile(&self, id: NetworkId) -> Result<()> {
        let lock = self.interface_lock();
        let _guard = lock.lock().await;
        catalog::remove(self.client.as_ref(), &self.interface, id).await
    }

    /// Creates or replaces the saved profile for `ssid`, then enables,
    /// saves and selects it.
    ///
    /// Any existing profile with the same SSID is removed first. If a later
    /// step fails, the new profile is removed again (and the configuration
    /// re-saved if it was already written) and the original error is
    /// returned.
    ///
    /// Returns the id of the new profile. Selecting a profile does not wait
    /// for association; use [`Supplicant::check_connection`] afterwards.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::InvalidCredentials`] if `creds` fails validation
    ///   or is for another SSID. Validation runs before any request is sent
    ///   and is stricter than the daemon: a passphrase must be 8 to 63
    ///   printable ASCII characters or a 64-digit hex key, so a short
    ///   password such as `"p"` is rejected here
    /// - [`ConnectionError::Protocol`] if the daemon rejects a step
    /// - [`ConnectionError::Timeout`] if `connect_timeout` expires
    /// - [`ConnectionError::RollbackFailed`] if a step failed and the new
    ///   profile could not be removed, or the configuration could not be
    ///   saved again without it
    pub async fn connect(&self, ssid: &str, creds: CredentialBundle) -> Result<NetworkId> {
        let lock = self.interface_lock();
        let _guard = lock.lock().await;
        orchestrator::connect(
            self.client.as_ref(),
            &self.interface,
            ssid,
            &creds,
            self.config.connect_timeout,
        )
        .await
    }

    /// Connects to an open network.
    pub async fn connect_open(&self, ssid: &str) -> Result<NetworkId> {
        self.connect(ssid, CredentialBundle::new(ssid)).await
    }

    /// Scans first and refuses to connect if `ssid` is not visible.
    pub async fn connect_visible(&self, ssid: &str, creds: CredentialBundle) -> Result<NetworkId> {
        let network = self.ensure_visible(ssid).await?;
        debug!(
            "'{ssid}' visible at {} ({} dBm)",
            network.bssid, network.signal_dbm
        );
        self.connect(ssid, creds).await
    }

    /// Removes every saved profile for `ssid` and saves the configuration.
    ///
    /// Returns how many profiles were removed.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NoSavedProfile`] if there is none.
    pub async fn forget(&self, ssid: &str) -> Result<usize> {
        let lock = self.interface_lock();
        let _guard = lock.lock().await;

        let client = self.client.as_ref();
        let ids = catalog::find_all(client, &self.interface, ssid).await?;
        if ids.is_empty() {
            return Err(ConnectionError::NoSavedProfile(ssid.to_string()));
        }

        for id in &ids {
            catalog::remove(client, &self.interface, *id).await?;
        }
        ctrl::send_expect_ok(client, &self.interface, &Command::SaveConfig).await?;

        info!("Forgot {} profile(s) for '{ssid}'", ids.len());
        Ok(ids.len())
    }

    /// Disconnects the interface until a network is selected again.
    pub async fn disconnect(&self) -> Result<()> {
        ctrl::send_expect_ok(self.client.as_ref(), &self.interface, &Command::Disconnect).await
    }

    /// Returns the current status snapshot.
    pub async fn status(&self) -> Result<ConnectionStatus> {
        status::status(self.client.as_ref(), &self.interface).await
    }

    /// Reports whether `ssid` is selected and connected.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::IncompleteStatus`] if the snapshot carries
    /// neither `ssid` nor `wpa_state`.
    pub async fn check_connection(&self, ssid: &str) -> Result<ConnectionCheck> {
        status::check_connection(self.client.as_ref(), &self.interface, ssid).await
    }

    /// Takes the interface down and up again.
    pub async fn restart_interface(&self) -> Result<()> {
        info!("Restarting interface {}", self.interface);
        self.lifecycle.restart(&self.interface).await
    }

    fn interface_lock(&self) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(self.interface.clone()).or_default().clone()
    }
}
