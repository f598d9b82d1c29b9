//! Tests for scan, status and profile management through the public API.

mod common;

use common::{FakeDaemon, supplicant, supplicant_with};
use std::time::Duration;
use wpactl::{ConnectionError, NetworkId, SupplicantConfig, WpaState};

const ROWS: &[&str] = &[
    "00:11:22:33:44:55\t2437\t-48\t[WPA2-PSK-CCMP][ESS]\tHomeNet",
    "00:11:22:33:44:66\t5180\t-71\t[WPA2-PSK-CCMP][ESS]\tHomeNet",
    "66:55:44:33:22:11\t2412\t-81\t[ESS]\tCafe",
    "aa:bb:cc:dd:ee:ff\t5745\t-55\t[WPA2-EAP-CCMP][ESS]\tCorp",
];

#[tokio::test(start_paused = true)]
async fn test_scan_waits_settle_interval() {
    let daemon = FakeDaemon::new();
    daemon.set_scan_rows(ROWS);
    let wifi = supplicant(&daemon);

    let observations = wifi.scan().await.unwrap();

    assert_eq!(observations.len(), 4);
    assert_eq!(observations[1].frequency, 5180);
    let requested = daemon.received_at("SCAN").unwrap();
    let fetched = daemon.received_at("SCAN_RESULTS").unwrap();
    assert!(fetched - requested >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_scan_settle_is_configurable() {
    let daemon = FakeDaemon::new();
    let wifi = supplicant_with(
        &daemon,
        SupplicantConfig::default().with_scan_settle(Duration::from_millis(2500)),
    );

    assert!(wifi.scan().await.unwrap().is_empty());
    let requested = daemon.received_at("SCAN").unwrap();
    let fetched = daemon.received_at("SCAN_RESULTS").unwrap();
    assert!(fetched - requested >= Duration::from_millis(2500));
}

#[tokio::test]
async fn test_busy_scan_fails_without_fetching() {
    let daemon = FakeDaemon::new();
    daemon.set_scan_busy(true);
    let wifi = supplicant(&daemon);

    let err = wifi.scan().await.unwrap_err();

    assert!(matches!(err, ConnectionError::ScanRejected(ref r) if r == "FAIL-BUSY"));
    assert_eq!(daemon.log(), vec!["SCAN"]);
}

#[tokio::test]
async fn test_list_networks_dedupes_by_ssid() {
    let daemon = FakeDaemon::new();
    daemon.set_scan_rows(ROWS);
    let wifi = supplicant_with(
        &daemon,
        SupplicantConfig::default().with_scan_settle(Duration::ZERO),
    );

    let networks = wifi.list_networks().await.unwrap();
    let ssids: Vec<&str> = networks.iter().map(|n| n.ssid.as_str()).collect();

    assert_eq!(ssids, vec!["HomeNet", "Corp", "Cafe"]);
    assert_eq!(networks[0].signal_dbm, -48);
    assert!(networks[1].is_eap);
    assert!(!networks[2].secured);
}

#[tokio::test]
async fn test_ensure_visible() {
    let daemon = FakeDaemon::new();
    daemon.set_scan_rows(ROWS);
    let wifi = supplicant_with(
        &daemon,
        SupplicantConfig::default().with_scan_settle(Duration::ZERO),
    );

    let corp = wifi.ensure_visible("Corp").await.unwrap();
    assert_eq!(corp.bssid, "aa:bb:cc:dd:ee:ff");

    let err = wifi.ensure_visible("homenet").await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound(_)));
}

#[tokio::test]
async fn test_status_snapshot() {
    let daemon = FakeDaemon::new();
    daemon.set_status(
        "bssid=00:11:22:33:44:55\nfreq=2437\nssid=HomeNet\nid=3\nkey_mgmt=WPA2-PSK\n\
         wpa_state=COMPLETED\nip_address=192.168.1.23\naddress=aa:bb:cc:dd:ee:ff\n",
    );
    let wifi = supplicant(&daemon);

    let status = wifi.status().await.unwrap();
    assert_eq!(status.ssid.as_deref(), Some("HomeNet"));
    assert_eq!(status.wpa_state, Some(WpaState::Completed));
    assert_eq!(status.network_id, Some(NetworkId(3)));

    let check = wifi.check_connection("HomeNet").await.unwrap();
    assert!(check.selected && check.connected);
    assert_eq!(check.ip.as_deref(), Some("192.168.1.23"));

    let other = wifi.check_connection("Cafe").await.unwrap();
    assert!(!other.selected && !other.connected);
    assert_eq!(other.ip, None);
}

#[tokio::test]
async fn test_check_connection_rejects_partial_status() {
    let daemon = FakeDaemon::new();
    daemon.set_status("address=aa:bb:cc:dd:ee:ff\nuuid=1234\n");
    let wifi = supplicant(&daemon);

    let err = wifi.check_connection("HomeNet").await.unwrap_err();
    assert!(matches!(err, ConnectionError::IncompleteStatus));
}

#[tokio::test]
async fn test_status_fail_is_protocol_error() {
    let daemon = FakeDaemon::new();
    daemon.fail_on("STATUS");
    let wifi = supplicant(&daemon);

    assert!(matches!(
        wifi.status().await,
        Err(ConnectionError::Protocol { .. })
    ));
}

#[tokio::test]
async fn test_forget_removes_all_and_saves() {
    let daemon = FakeDaemon::new();
    daemon.add_profile("HomeNet");
    daemon.add_profile("Cafe");
    daemon.add_profile("HomeNet");
    let wifi = supplicant(&daemon);

    assert_eq!(wifi.forget("HomeNet").await.unwrap(), 2);
    assert_eq!(daemon.ssids(), vec!["Cafe"]);
    assert_eq!(daemon.saves(), 1);

    let err = wifi.forget("HomeNet").await.unwrap_err();
    assert!(matches!(err, ConnectionError::NoSavedProfile(ref s) if s == "HomeNet"));
    assert_eq!(daemon.saves(), 1);
}

#[tokio::test]
async fn test_find_and_remove_profile() {
    let daemon = FakeDaemon::new();
    daemon.add_profile("HomeNet");
    let cafe = daemon.add_profile("Cafe");
    let wifi = supplicant(&daemon);

    assert_eq!(wifi.find_profile("Cafe").await.unwrap(), Some(cafe));
    assert_eq!(wifi.find_profile("cafe").await.unwrap(), None);

    wifi.remove_profile(cafe).await.unwrap();
    assert_eq!(wifi.find_profile("Cafe").await.unwrap(), None);
    assert!(wifi.remove_profile(cafe).await.is_err());
}

#[tokio::test]
async fn test_ping_and_disconnect() {
    let daemon = FakeDaemon::new();
    let wifi = supplicant(&daemon);

    wifi.ping().await.unwrap();
    wifi.disconnect().await.unwrap();
    assert_eq!(daemon.log(), vec!["PING", "DISCONNECT"]);

    daemon.fail_on("PING");
    assert!(wifi.ping().await.is_err());
}

#[tokio::test]
async fn test_with_interface_returns_new_handle() {
    let daemon = FakeDaemon::new();
    let wlan0 = supplicant(&daemon);

    let wlan1 = wlan0.with_interface("wlan1").unwrap();
    assert_eq!(wlan1.interface(), "wlan1");
    assert_eq!(wlan0.interface(), "wlan0");
    assert_eq!(wlan1.config().interface, "wlan1");
    assert_eq!(wlan0.config().interface, "wlan0");

    for bad in ["", "wlan 1", "../wlan1", "sixteen-chars-xx"] {
        assert!(matches!(
            wlan0.with_interface(bad),
            Err(ConnectionError::InvalidInterface(_))
        ));
    }
}
