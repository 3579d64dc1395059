//! # Network Discovery Service
//!
//! Wires the concrete probe and vendor database into a
//! [`DiscoveryScheduler`] and offers the two ways front ends consume a scan:
//! a streaming [`ScanJob`] or a finished [`HostList`].

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use lanprobe_common::config::Config;
use lanprobe_common::error::DiscoveryError;
use lanprobe_common::network::subnet::SubnetDescriptor;
use lanprobe_common::session::HostList;

use crate::probe::TcpConnectProbe;
use crate::scheduler::{DiscoveryScheduler, ScanJob};
use crate::vendors::MacOuiRepo;

pub struct DiscoveryService {
    scheduler: DiscoveryScheduler,
    timeout: Duration,
}

impl DiscoveryService {
    pub fn new(scheduler: DiscoveryScheduler, timeout: Duration) -> Self {
        Self { scheduler, timeout }
    }

    /// TCP connect probe, system neighbor table, reverse DNS unless
    /// disabled, and the IEEE vendor database.
    pub fn from_config(config: &Config) -> Result<Self, DiscoveryError> {
        config.validate()?;
        let scheduler = DiscoveryScheduler::new(
            Arc::new(TcpConnectProbe::from_config(config)),
            Arc::new(MacOuiRepo),
        )
        .with_workers(config.workers);
        Ok(Self::new(scheduler, config.timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts a scan and hands back its event stream.
    pub fn start(&mut self, local_ip: Ipv4Addr, descriptor: SubnetDescriptor) -> Result<ScanJob, DiscoveryError> {
        self.scheduler.start(local_ip, descriptor, self.timeout)
    }

    /// Runs a scan to completion and returns the ordered result set.
    pub async fn perform_discovery(
        &mut self,
        local_ip: Ipv4Addr,
        descriptor: SubnetDescriptor,
    ) -> Result<HostList, DiscoveryError> {
        let mut job = self.start(local_ip, descriptor)?;
        let mut hosts = HostList::new();
        while let Some(event) = job.next_event().await {
            hosts.apply(event);
        }
        Ok(hosts)
    }

    pub fn cancel_active(&mut self) {
        self.scheduler.cancel_active();
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
