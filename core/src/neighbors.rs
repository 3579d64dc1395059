//! Access to the operating system's neighbor (ARP) cache.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use lanprobe_protocols::arp::{self, NeighborEntry};
use pnet::util::MacAddr;
use tracing::trace;

#[async_trait]
pub trait NeighborTable: Send + Sync {
    /// Hardware address of a complete entry for `ip`, if any.
    async fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr>;
}

/// Reads the kernel's table on every lookup so entries created by a probe
/// that just finished are visible.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNeighborTable;

#[async_trait]
impl NeighborTable for SystemNeighborTable {
    async fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        match read_entries().await {
            Ok(entries) => arp::find(&entries, ip),
            Err(e) => {
                trace!("Neighbor table unavailable: {e:#}");
                None
            }
        }
    }
}

/// Never knows anything. Used when only TCP evidence should count.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNeighborTable;

#[async_trait]
impl NeighborTable for NullNeighborTable {
    async fn lookup(&self, _ip: Ipv4Addr) -> Option<MacAddr> {
        None
    }
}

#[cfg(target_os = "linux")]
async fn read_entries() -> anyhow::Result<Vec<NeighborEntry>> {
    use anyhow::Context;

    let text = tokio::fs::read_to_string("/proc/net/arp")
        .await
        .context("reading /proc/net/arp")?;
    Ok(arp::parse_proc_net_arp(&text))
}

#[cfg(target_os = "macos")]
async fn read_entries() -> anyhow::Result<Vec<NeighborEntry>> {
    use anyhow::Context;

    let output = tokio::process::Command::new("arp")
        .arg("-an")
        .output()
        .await
        .context("running arp -an")?;
    anyhow::ensure!(output.status.success(), "arp -an exited with {}", output.status);
    Ok(arp::parse_arp_an(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
async fn read_entries() -> anyhow::Result<Vec<NeighborEntry>> {
    Ok(Vec::new())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
