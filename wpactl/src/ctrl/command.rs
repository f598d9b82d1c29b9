//! Control requests and their wire rendering.

use std::fmt::{Display, Formatter};

use crate::api::models::NetworkId;
use crate::types::constants::param;

/// A request understood by the daemon's control interface.
///
/// `Display` renders the exact bytes sent on the wire. Use
/// [`Command::redacted`] when the request is logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Scan,
    ScanResults,
    ListNetworks,
    AddNetwork,
    /// `value` must already be encoded for the wire.
    SetNetwork {
        id: NetworkId,
        name: String,
        value: String,
    },
    EnableNetwork(NetworkId),
    SelectNetwork(NetworkId),
    RemoveNetwork(NetworkId),
    SaveConfig,
    Status,
    Disconnect,
}

impl Command {
    /// Renders the request with secret parameter values masked.
    pub fn redacted(&self) -> String {
        match self {
            Command::SetNetwork { id, name, .. } if param::SECRET.contains(&name.as_str()) => {
                format!("SET_NETWORK {id} {name} <redacted>")
            }
            other => other.to_string(),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Ping => write!(f, "PING"),
            Command::Scan => write!(f, "SCAN"),
            Command::ScanResults => write!(f, "SCAN_RESULTS"),
            Command::ListNetworks => write!(f, "LIST_NETWORKS"),
            Command::AddNetwork => write!(f, "ADD_NETWORK"),
            Command::SetNetwork { id, name, value } => write!(f, "SET_NETWORK {id} {name} {value}"),
            Command::EnableNetwork(id) => write!(f, "ENABLE_NETWORK {id}"),
            Command::SelectNetwork(id) => write!(f, "SELECT_NETWORK {id}"),
            Command::RemoveNetwork(id) => write!(f, "REMOVE_NETWORK {id}"),
            Command::SaveConfig => write!(f, "SAVE_CONFIG"),
            Command::Status => write!(f, "STATUS"),
            Command::Disconnect => write!(f, "DISCONNECT"),
        }
    }
}
