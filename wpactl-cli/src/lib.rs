pub mod cli;
pub mod output;

use anyhow::{Context, Result};
use log::debug;
use serde_json::json;
use wpactl::Supplicant;

use crate::cli::{Cli, Command};

/// Installs `env_logger`, with `RUST_LOG` taking precedence over `-v`.
pub fn init_logging(cli: &Cli) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.global.log_filter()),
    )
    .format_timestamp(None)
    .init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let wifi = Supplicant::new(cli.global.supplicant_config())
        .with_context(|| format!("cannot manage interface {:?}", cli.global.interface))?;
    let json = cli.global.json;
    let iface = wifi.interface().to_string();

    debug!("Using interface {iface}, control sockets in {}", cli.global.ctrl_dir.display());
    match cli.command {
        Command::Scan => {
            let observations = wifi
                .scan()
                .await
                .with_context(|| format!("scan on {iface} failed"))?;
            output::emit(json, observations.as_slice(), output::scan_table)
        }
        Command::Networks => {
            let networks = wifi
                .list_networks()
                .await
                .with_context(|| format!("scan on {iface} failed"))?;
            output::emit(json, networks.as_slice(), output::networks_table)
        }
        Command::Profiles => {
            let profiles = wifi
                .list_profiles()
                .await
                .with_context(|| format!("cannot list profiles on {iface}"))?;
            output::emit(json, profiles.as_slice(), output::profiles_table)
        }
        Command::Connect(args) => {
            let bundle = args.bundle();
            let id = if args.require_visible {
                wifi.connect_visible(&args.ssid, bundle).await
            } else {
                wifi.connect(&args.ssid, bundle).await
            }
            .with_context(|| format!("cannot connect to '{}'", args.ssid))?;

            output::emit(json, &json!({ "ssid": args.ssid, "id": id }), |_| {
                format!("Selected '{}' (profile {id})", args.ssid)
            })
        }
        Command::Status => {
            let status = wifi
                .status()
                .await
                .with_context(|| format!("cannot read status of {iface}"))?;
            output::emit(json, &status, output::status_text)
        }
        Command::Check { ssid } => {
            let check = wifi
                .check_connection(&ssid)
                .await
                .with_context(|| format!("cannot check connection to '{ssid}'"))?;
            output::emit(json, &check, output::check_text)
        }
        Command::Forget { ssid } => {
            let removed = wifi
                .forget(&ssid)
                .await
                .with_context(|| format!("cannot forget '{ssid}'"))?;
            output::emit(json, &json!({ "ssid": ssid, "removed": removed }), |_| {
                format!("Removed {removed} profile(s) for '{ssid}'")
            })
        }
        Command::Disconnect => {
            wifi.disconnect()
                .await
                .with_context(|| format!("cannot disconnect {iface}"))?;
            output::emit(json, &json!({ "interface": iface }), |_| {
                format!("Disconnected {iface}")
            })
        }
        Command::Ping => {
            wifi.ping()
                .await
                .with_context(|| format!("wpa_supplicant is not answering on {iface}"))?;
            output::emit(json, &json!({ "interface": iface, "alive": true }), |_| {
                "PONG".to_string()
            })
        }
        Command::Restart => {
            wifi.restart_interface()
                .await
                .with_context(|| format!("cannot restart {iface}"))?;
            output::emit(json, &json!({ "interface": iface }), |_| {
                format!("Restarted {iface}")
            })
        }
    }
}
