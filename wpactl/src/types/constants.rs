//! Constants for the wpa_supplicant control interface.
//!
//! These values correspond to the reply tokens, parameter names and
//! defaults used when talking to wpa_supplicant over its control socket.

/// Replies the daemon sends back for simple requests.
pub mod reply {
    pub const OK: &str = "OK";
    pub const PONG: &str = "PONG";
    /// Prefix of unsolicited event messages (`<3>CTRL-EVENT-...`).
    pub const EVENT_PREFIX: char = '<';
}

/// Network block parameter names understood by `SET_NETWORK`.
pub mod param {
    pub const SSID: &str = "ssid";
    pub const KEY_MGMT: &str = "key_mgmt";
    pub const PSK: &str = "psk";
    pub const IDENTITY: &str = "identity";
    pub const PASSWORD: &str = "password";
    pub const EAP: &str = "eap";
    pub const PHASE1: &str = "phase1";
    pub const PHASE2: &str = "phase2";

    /// Parameters whose values are masked in log output.
    pub const SECRET: &[&str] = &[PSK, PASSWORD];
}

/// Key management and EAP defaults applied during parameter derivation.
pub mod security {
    pub const KEY_MGMT_NONE: &str = "NONE";
    pub const KEY_MGMT_WPA_EAP: &str = "WPA-EAP";
    pub const EAP_PEAP: &str = "PEAP";
}

/// Limits imposed by 802.11 and wpa_supplicant.
pub mod limits {
    pub const SSID_MAX_BYTES: usize = 32;
    pub const PASSPHRASE_MIN: usize = 8;
    pub const PASSPHRASE_MAX: usize = 63;
    pub const RAW_PSK_HEX_LEN: usize = 64;
    /// Linux `IFNAMSIZ` minus the trailing NUL.
    pub const IFNAME_MAX_BYTES: usize = 15;
    /// Largest reply we are prepared to read from the control socket.
    pub const REPLY_BUFFER_BYTES: usize = 16 * 1024;
}

/// Default configuration values.
pub mod defaults {
    use std::time::Duration;

    pub const INTERFACE: &str = "wlan0";
    pub const CTRL_DIR: &str = "/var/run/wpa_supplicant";
    pub const SCAN_SETTLE_MS: u64 = 1000;
    pub const REQUEST_TIMEOUT_SECS: u64 = 5;

    pub fn scan_settle() -> Duration {
        Duration::from_millis(SCAN_SETTLE_MS)
    }

    pub fn request_timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Signal strength thresholds for bar display
pub mod signal_strength {
    pub const BAR_1_MAX: u8 = 24;
    pub const BAR_2_MIN: u8 = BAR_1_MAX + 1;
    pub const BAR_2_MAX: u8 = 49;
    pub const BAR_3_MIN: u8 = BAR_2_MAX + 1;
    pub const BAR_3_MAX: u8 = 74;
    /// dBm at or below which quality is reported as 0%.
    pub const DBM_FLOOR: i32 = -100;
    /// dBm at or above which quality is reported as 100%.
    pub const DBM_CEILING: i32 = -50;
}

/// WiFi frequency constants (MHz)
pub mod frequency {
    pub const BAND_2_4_START: u32 = 2412;
    pub const BAND_2_4_END: u32 = 2472;
    pub const BAND_2_4_CH14: u32 = 2484;
    pub const BAND_5_START: u32 = 5000;
    pub const BAND_5_END: u32 = 5900;
    pub const BAND_6_START: u32 = 5955;
    pub const BAND_6_END: u32 = 7115;
    pub const CHANNEL_SPACING: u32 = 5;
}
