//! # Result Sink
//!
//! Holds the hosts of the current session ordered by address, accumulates the
//! progress of the running scan, and saves or restores the result set as JSON.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::events::{ScanEvent, ScanSummary};
use crate::network::host::Host;

/// IP-ordered set of discovered hosts.
///
/// The first report of an address wins; later reports of the same address
/// are ignored.
#[derive(Debug, Default, Clone)]
pub struct HostList {
    hosts: BTreeMap<Ipv4Addr, Host>,
    progress: u64,
    summary: Option<ScanSummary>,
    external_ip: Option<String>,
}

/// Serializable view of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub external_ip: Option<String>,
}

impl HostList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the address was not known yet.
    pub fn insert(&mut self, host: Host) -> bool {
        match self.hosts.entry(host.ip) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(host);
                true
            }
        }
    }

    pub fn apply(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Progress { delta } => self.progress += u64::from(delta),
            ScanEvent::HostFound(host) => {
                self.insert(host);
            }
            ScanEvent::Completed(summary) => self.summary = Some(summary),
        }
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn get(&self, ip: Ipv4Addr) -> Option<&Host> {
        self.hosts.get(&ip)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn progress(&self) -> u64 {
        self.progress
    }

    pub fn summary(&self) -> Option<ScanSummary> {
        self.summary
    }

    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    /// Forgets hosts and progress of the previous scan. The cached external
    /// address survives.
    pub fn reset(&mut self) {
        self.hosts.clear();
        self.progress = 0;
        self.summary = None;
    }

    pub fn set_external_ip(&mut self, ip: Option<String>) {
        self.external_ip = ip;
    }

    pub fn external_ip(&self) -> Option<&str> {
        self.external_ip.as_deref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            hosts: self.hosts.values().cloned().collect(),
            external_ip: self.external_ip.clone(),
        }
    }

    pub fn restore(snapshot: SessionSnapshot) -> Self {
        let mut list = HostList::new();
        for host in snapshot.hosts {
            list.insert(host);
        }
        list.external_ip = snapshot.external_ip;
        list
    }
}

impl SessionSnapshot {
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize session")
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse session")
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&json)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
