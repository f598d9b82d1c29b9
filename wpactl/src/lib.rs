//! A Rust library for managing Wi-Fi connections through wpa_supplicant.
//!
//! This crate drives the wpa_supplicant control interface (the per-interface
//! datagram sockets under `/var/run/wpa_supplicant`) and provides a
//! high-level async API for common Wi-Fi operations:
//!
//! - Scanning and listing visible networks
//! - Connecting to open, WPA-PSK, and WPA-EAP networks
//! - Listing and forgetting saved network profiles
//! - Reading the live connection status
//!
//! # Example
//!
//! ```no_run
//! use wpactl::{CredentialBundle, Supplicant, SupplicantConfig};
//!
//! # async fn example() -> wpactl::Result<()> {
//! let wifi = Supplicant::new(SupplicantConfig::default())?;
//!
//! // List visible networks
//! for net in wifi.list_networks().await? {
//!     println!("{} ({}%)", net.ssid, net.quality());
//! }
//!
//! // Connect to a network
//! wifi.connect("MyNetwork", CredentialBundle::new("MyNetwork").with_password("password123"))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Transactional Connect
//!
//! [`Supplicant::connect`] creates a fresh profile, configures it, then
//! enables, saves and selects it. If any step after creation fails, the new
//! profile is removed before the error is returned, so a failed attempt
//! leaves the saved profiles as they were (apart from the stale profile for
//! the same SSID, which is replaced on every connect).
//!
//! # Error Handling
//!
//! All operations return `Result<T, ConnectionError>`. The error type
//! separates daemon rejections ([`ConnectionError::Protocol`]) from socket
//! failures ([`ConnectionError::Transport`]) and validation errors.
//!
//! # Testing
//!
//! The control socket sits behind the [`ControlClient`] trait. Implement it
//! to drive a [`Supplicant`] against an in-memory daemon with
//! [`Supplicant::with_client`].
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging.
//! Secret values (`psk`, `password`) are masked in log output. To see log
//! output, add a logging implementation like `env_logger`. For example:
//!
//! ```no_run,ignore
//! env_logger::init();
//! // ...
//! ```

// Internal implementation modules
mod core;
mod types;
mod util;

// Public API modules
pub mod api;
pub mod ctrl;

// Re-exported public API
pub use api::models::{
    ConnectionCheck, ConnectionError, ConnectionStatus, CredentialBundle, Network, NetworkId,
    NetworkProfile, ParamValue, ParameterSet, ProfileFlags, ScanObservation, SupplicantConfig,
    WpaState,
};
pub use api::supplicant::Supplicant;
pub use crate::core::lifecycle::{IfUpDown, InterfaceLifecycle};
pub use crate::core::params::{derive_parameters, encode_literal, validate_bundle};
pub use ctrl::{Command, ControlClient, SocketClient};

/// A specialized `Result` type for wpa_supplicant operations.
pub type Result<T> = std::result::Result<T, ConnectionError>;
