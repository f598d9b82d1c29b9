//! Unix datagram client for the daemon's control sockets.
//!
//! Each interface managed by the daemon exposes a datagram socket named
//! after the interface inside the control directory. A request is a single
//! datagram; the reply comes back to the sender's bound address, so every
//! request binds a short-lived local socket of its own.

use async_trait::async_trait;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::UnixDatagram;
use tokio::time::timeout;

use crate::Result;
use crate::api::models::{ConnectionError, SupplicantConfig};
use crate::ctrl::{Command, ControlClient};
use crate::types::constants::{limits, reply};

static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(0);

/// Talks to the daemon over `<ctrl_dir>/<interface>`.
#[derive(Debug, Clone)]
pub struct SocketClient {
    ctrl_dir: PathBuf,
    local_dir: PathBuf,
    request_timeout: Duration,
}

impl SocketClient {
    /// Creates a client for sockets in `ctrl_dir`.
    ///
    /// Local reply sockets are bound in the system temporary directory.
    pub fn new(ctrl_dir: impl Into<PathBuf>, request_timeout: Duration) -> Self {
        Self {
            ctrl_dir: ctrl_dir.into(),
            local_dir: std::env::temp_dir(),
            request_timeout,
        }
    }

    pub fn from_config(config: &SupplicantConfig) -> Self {
        Self::new(config.ctrl_dir.clone(), config.request_timeout)
    }

    /// Binds local reply sockets in `dir` instead of the temporary directory.
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = dir.into();
        self
    }

    pub fn ctrl_dir(&self) -> &Path {
        &self.ctrl_dir
    }

    async fn exchange(&self, socket: &UnixDatagram, wire: &str) -> Result<String> {
        socket.send(wire.as_bytes()).await?;

        let mut buf = vec![0u8; limits::REPLY_BUFFER_BYTES];
        loop {
            let n = socket.recv(&mut buf).await?;
            let text = String::from_utf8_lossy(&buf[..n]).into_owned();
            if text.starts_with(reply::EVENT_PREFIX) {
                debug!("Skipping unsolicited event: {}", text.trim_end());
                continue;
            }
            return Ok(text);
        }
    }
}

#[async_trait]
impl ControlClient for SocketClient {
    async fn request(&self, interface: &str, command: &Command) -> Result<String> {
        let local = LocalSocket::bind(&self.local_dir)?;
        let remote = self.ctrl_dir.join(interface);

        local.socket.connect(&remote).map_err(|e| {
            warn!("Cannot reach control socket {}: {e}", remote.display());
            ConnectionError::Transport(e)
        })?;

        let wire = command.to_string();
        match timeout(self.request_timeout, self.exchange(&local.socket, &wire)).await {
            Ok(reply) => reply,
            Err(_) => {
                warn!(
                    "No reply to '{}' on {} within {:?}",
                    command.redacted(),
                    remote.display(),
                    self.request_timeout
                );
                Err(ConnectionError::Timeout)
            }
        }
    }
}

/// A bound reply socket whose filesystem entry is removed on drop.
struct LocalSocket {
    socket: UnixDatagram,
    path: PathBuf,
}

impl LocalSocket {
    fn bind(dir: &Path) -> Result<Self> {
        let id = NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("wpactl_{}-{id}", std::process::id()));

        // A stale entry from a crashed process would make bind fail.
        if path.exists() {
            let _ = std::fs::remove_file(&path);
        }

        let socket = UnixDatagram::bind(&path)?;
        Ok(Self { socket, path })
    }
}

impl Drop for LocalSocket {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("Failed to remove {}: {e}", self.path.display());
        }
    }
}
