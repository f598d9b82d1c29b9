//! Interface up/down control.
//!
//! Bringing links up and down is outside the control protocol. It is kept
//! behind [`InterfaceLifecycle`] so the system tool used can be swapped.

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;

use crate::Result;
use crate::api::models::ConnectionError;

/// Brings a network interface down and up again.
#[async_trait]
pub trait InterfaceLifecycle: Send + Sync {
    async fn down(&self, interface: &str) -> Result<()>;

    async fn up(&self, interface: &str) -> Result<()>;

    /// Takes the interface down, then up.
    ///
    /// A failed `down` is logged and does not prevent `up`, since the
    /// interface may already be down.
    async fn restart(&self, interface: &str) -> Result<()> {
        if let Err(e) = self.down(interface).await {
            warn!("Bringing {interface} down failed, continuing with up: {e}");
        }
        self.up(interface).await
    }
}

/// Runs `ifdown <iface>` / `ifup <iface>`.
#[derive(Debug, Clone)]
pub struct IfUpDown {
    down_program: String,
    up_program: String,
}

impl Default for IfUpDown {
    fn default() -> Self {
        Self::with_programs("ifdown", "ifup")
    }
}

impl IfUpDown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses other programs in place of `ifdown` and `ifup`. Each is called
    /// with the interface name as its only argument.
    pub fn with_programs(down: impl Into<String>, up: impl Into<String>) -> Self {
        Self {
            down_program: down.into(),
            up_program: up.into(),
        }
    }

    async fn run(program: &str, interface: &str) -> Result<()> {
        debug!("Running {program} {interface}");
        let output = Command::new(program).arg(interface).output().await?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("{program} {interface} failed: {}", stderr.trim());
        Err(ConnectionError::InterfaceCommand {
            program: program.to_string(),
            status: output.status.to_string(),
        })
    }
}

#[async_trait]
impl InterfaceLifecycle for IfUpDown {
    async fn down(&self, interface: &str) -> Result<()> {
        Self::run(&self.down_program, interface).await
    }

    async fn up(&self, interface: &str) -> Result<()> {
        Self::run(&self.up_program, interface).await
    }
}
