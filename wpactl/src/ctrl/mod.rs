//! Control interface transport.
//!
//! The core never formats raw request strings or touches sockets directly:
//! it hands a typed [`Command`] to a [`ControlClient`] and interprets the
//! reply text. [`SocketClient`] is the production client; tests substitute
//! an in-memory daemon.

pub(crate) mod command;
pub(crate) mod socket;

use async_trait::async_trait;
use log::debug;

use crate::Result;
use crate::api::models::ConnectionError;
use crate::types::constants::{limits, reply};

pub use command::Command;
pub use socket::SocketClient;

/// Request/response access to the daemon's per-interface control socket.
///
/// Implementations return the raw reply text, or a transport error when the
/// daemon could not be reached. Interpreting the reply (`OK`, `FAIL`, ids,
/// tables) is left to the caller. No retries are expected.
#[async_trait]
pub trait ControlClient: Send + Sync {
    async fn request(&self, interface: &str, command: &Command) -> Result<String>;
}

/// Sends `command` and returns the reply without its trailing line break.
///
/// Only line terminators are stripped: a trailing tab or space can be part of
/// the last field of a table reply.
pub(crate) async fn send(
    client: &dyn ControlClient,
    interface: &str,
    command: &Command,
) -> Result<String> {
    debug!("[{interface}] -> {}", command.redacted());
    let raw = client.request(interface, command).await?;
    let trimmed = raw.trim_end_matches(['\n', '\r']).to_string();
    debug!(
        "[{interface}] <- {} ({} bytes)",
        trimmed.lines().next().unwrap_or_default(),
        trimmed.len()
    );
    Ok(trimmed)
}

/// Sends `command` and requires an `OK` reply.
pub(crate) async fn send_expect_ok(
    client: &dyn ControlClient,
    interface: &str,
    command: &Command,
) -> Result<()> {
    let reply = send(client, interface, command).await?;
    expect_ok(command, &reply)
}

/// Maps any reply other than `OK` to a protocol error.
pub(crate) fn expect_ok(command: &Command, reply: &str) -> Result<()> {
    if reply.trim() == reply::OK {
        Ok(())
    } else {
        Err(protocol_error(command, reply))
    }
}

pub(crate) fn protocol_error(command: &Command, reply: &str) -> ConnectionError {
    ConnectionError::Protocol {
        command: command.redacted(),
        reply: reply.trim().to_string(),
    }
}

/// Checks that `name` can address a control socket.
///
/// Interface names must be non-empty, at most 15 bytes, and free of path
/// separators, whitespace and NUL.
pub(crate) fn validate_interface(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= limits::IFNAME_MAX_BYTES
        && name != "."
        && name != ".."
        && !name
            .chars()
            .any(|c| c == '/' || c == '\0' || c.is_whitespace());

    if valid {
        Ok(())
    } else {
        Err(ConnectionError::InvalidInterface(name.to_string()))
    }
}
