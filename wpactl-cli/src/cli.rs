//! Clap derive structures for the `wpactl` command.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use wpactl::{CredentialBundle, SupplicantConfig};

/// wpactl -- manage wpa_supplicant Wi-Fi profiles
#[derive(Debug, Parser)]
#[command(
    name = "wpactl",
    version,
    about = "Scan for, connect to and inspect Wi-Fi networks through wpa_supplicant",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Wireless interface to manage
    #[arg(
        long,
        short = 'i',
        env = "WPACTL_INTERFACE",
        default_value = "wlan0",
        global = true
    )]
    pub interface: String,

    /// Directory holding wpa_supplicant's control sockets
    #[arg(
        long,
        env = "WPACTL_CTRL_DIR",
        default_value = "/var/run/wpa_supplicant",
        global = true
    )]
    pub ctrl_dir: PathBuf,

    /// Wait between starting a scan and reading its results, in milliseconds
    #[arg(long, default_value_t = 1000, global = true)]
    pub scan_settle_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5, global = true)]
    pub timeout_secs: u64,

    /// Deadline for a whole connect, in seconds
    #[arg(long, global = true)]
    pub connect_timeout_secs: Option<u64>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl GlobalOpts {
    pub fn supplicant_config(&self) -> SupplicantConfig {
        let config = SupplicantConfig::new()
            .with_interface(self.interface.clone())
            .with_ctrl_dir(self.ctrl_dir.clone())
            .with_scan_settle(Duration::from_millis(self.scan_settle_ms))
            .with_request_timeout(Duration::from_secs(self.timeout_secs));

        match self.connect_timeout_secs {
            Some(secs) => config.with_connect_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }

    /// Log filter used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan and list every access point seen
    Scan,

    /// Scan and list visible networks, one per SSID
    #[command(alias = "ls")]
    Networks,

    /// List saved profiles
    Profiles,

    /// Create or replace the profile for a network and select it
    Connect(ConnectArgs),

    /// Show the interface status
    Status,

    /// Check whether a network is selected and connected
    Check {
        ssid: String,
    },

    /// Remove every saved profile for a network
    Forget {
        ssid: String,
    },

    /// Disconnect until a network is selected again
    Disconnect,

    /// Check that wpa_supplicant answers on the interface
    Ping,

    /// Take the interface down and up again
    Restart,
}

#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// Network name
    pub ssid: String,

    /// Passphrase or 64-digit hex key; omit for open networks
    #[arg(long, short = 'p', env = "WPACTL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Identity for 802.1X networks
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Override key_mgmt (e.g. "WPA-PSK", "WPA-EAP", "SAE")
    #[arg(long)]
    pub key_mgmt: Option<String>,

    /// Override the EAP method (default PEAP for 802.1X)
    #[arg(long)]
    pub eap: Option<String>,

    #[arg(long)]
    pub phase1: Option<String>,

    #[arg(long)]
    pub phase2: Option<String>,

    /// Refuse to connect unless the network shows up in a scan
    #[arg(long)]
    pub require_visible: bool,
}

impl ConnectArgs {
    pub fn bundle(&self) -> CredentialBundle {
        let mut bundle = CredentialBundle::new(self.ssid.clone());
        bundle.password = self.password.clone();
        bundle.username = self.username.clone();
        bundle.key_management = self.key_mgmt.clone();
        bundle.eap_method = self.eap.clone();
        bundle.phase1 = self.phase1.clone();
        bundle.phase2 = self.phase2.clone();
        bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_connect_with_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wpactl",
            "connect",
            "Corp",
            "--username",
            "alice",
            "--password",
            "hunter22",
            "--phase2",
            "auth=MSCHAPV2",
            "-i",
            "wlan1",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.global.interface, "wlan1");
        assert_eq!(cli.global.log_filter(), "debug");

        let Command::Connect(args) = cli.command else {
            panic!("expected connect");
        };
        let bundle = args.bundle();
        assert_eq!(bundle.ssid, "Corp");
        assert_eq!(bundle.username.as_deref(), Some("alice"));
        assert_eq!(bundle.phase2.as_deref(), Some("auth=MSCHAPV2"));
        assert!(bundle.is_enterprise());
        assert!(!args.require_visible);
    }

    #[test]
    fn builds_supplicant_config() {
        let cli = Cli::try_parse_from([
            "wpactl",
            "--ctrl-dir",
            "/tmp/ctrl",
            "--scan-settle-ms",
            "250",
            "--connect-timeout-secs",
            "30",
            "status",
        ])
        .unwrap();

        let config = cli.global.supplicant_config();
        assert_eq!(config.ctrl_dir, PathBuf::from("/tmp/ctrl"));
        assert_eq!(config.scan_settle, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn check_requires_ssid() {
        assert!(Cli::try_parse_from(["wpactl", "check"]).is_err());
    }
}
