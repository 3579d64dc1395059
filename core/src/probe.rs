//! # Host Probe
//!
//! Decides whether a single address is alive and gathers what can be learned
//! about it cheaply: the hardware address from the neighbor table and a name
//! from a reverse lookup.
//!
//! Liveness evidence is either a TCP answer on the probe port (a completed
//! handshake or a reset) or a complete neighbor table entry. Hosts that drop
//! TCP silently are still found on the local segment because the connect
//! attempt makes the kernel resolve their hardware address.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lanprobe_common::config::Config;
use lanprobe_common::network::mac;
use pnet::util::MacAddr;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use crate::neighbors::{NeighborTable, SystemNeighborTable};
use crate::resolver::{DnsClient, ReverseResolver};

/// Upper bound for reading the neighbor table after the connect attempt.
pub const NEIGHBOR_READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Alive {
        hostname: Option<String>,
        mac: Option<MacAddr>,
    },
    Unreachable,
}

impl ProbeOutcome {
    pub fn is_alive(&self) -> bool {
        matches!(self, ProbeOutcome::Alive { .. })
    }
}

#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Never fails: anything short of liveness evidence is `Unreachable`.
    async fn probe(&self, ip: Ipv4Addr, timeout: Duration) -> ProbeOutcome;

    /// Worst-case time `probe` may take beyond `timeout`.
    fn max_overhead(&self) -> Duration {
        Duration::ZERO
    }
}

pub struct TcpConnectProbe {
    port: u16,
    neighbors: Arc<dyn NeighborTable>,
    resolver: Option<Arc<dyn ReverseResolver>>,
    resolve_timeout: Duration,
}

impl TcpConnectProbe {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            neighbors: Arc::new(SystemNeighborTable),
            resolver: None,
            resolve_timeout: Duration::ZERO,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let probe = Self::new(config.probe_port);
        if config.no_dns {
            return probe;
        }

        let client = match config.nameserver {
            Some(nameserver) => DnsClient::new(nameserver, config.resolve_timeout),
            None => DnsClient::from_system(config.resolve_timeout),
        };
        probe.with_resolver(Arc::new(client), config.resolve_timeout)
    }

    pub fn with_neighbors(mut self, neighbors: Arc<dyn NeighborTable>) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ReverseResolver>, resolve_timeout: Duration) -> Self {
        self.resolver = Some(resolver);
        self.resolve_timeout = resolve_timeout;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    async fn hardware_address(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        match timeout(NEIGHBOR_READ_TIMEOUT, self.neighbors.lookup(ip)).await {
            Ok(found) => found.filter(|addr| !mac::is_unset(*addr)),
            Err(_elapsed) => {
                trace!("Neighbor lookup for {ip} timed out");
                None
            }
        }
    }

    async fn hostname(&self, ip: Ipv4Addr) -> Option<String> {
        let resolver = self.resolver.as_ref()?;
        let name = timeout(self.resolve_timeout, resolver.reverse_lookup(ip))
            .await
            .ok()
            .flatten()?;
        let name = name.trim_end_matches('.');
        if name.is_empty() || name == ip.to_string() {
            return None;
        }
        Some(name.to_string())
    }
}

#[async_trait]
impl HostProbe for TcpConnectProbe {
    async fn probe(&self, ip: Ipv4Addr, timeout: Duration) -> ProbeOutcome {
        let answered = knock(SocketAddr::new(IpAddr::V4(ip), self.port), timeout).await;
        let mac = self.hardware_address(ip).await;

        if !answered && mac.is_none() {
            return ProbeOutcome::Unreachable;
        }

        let hostname = self.hostname(ip).await;
        trace!("{ip} is alive (tcp: {answered}, mac: {mac:?}, name: {hostname:?})");
        ProbeOutcome::Alive { hostname, mac }
    }

    fn max_overhead(&self) -> Duration {
        match self.resolver {
            Some(_) => NEIGHBOR_READ_TIMEOUT + self.resolve_timeout,
            None => NEIGHBOR_READ_TIMEOUT,
        }
    }
}

/// One connect attempt. An accepted or refused connection means something
/// answered at `addr`.
pub async fn knock(addr: SocketAddr, connect_timeout: Duration) -> bool {
    match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => true,
        Ok(Err(e)) => {
            trace!("Connect to {addr} failed: {e}");
            false
        }
        Err(_elapsed) => false,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbors::NullNeighborTable;
    use tokio::net::TcpListener;

    const PI_MAC: MacAddr = MacAddr(0xb8, 0x27, 0xeb, 0x01, 0x02, 0x03);

    struct FixedNeighbors(Option<MacAddr>);

    #[async_trait]
    impl NeighborTable for FixedNeighbors {
        async fn lookup(&self, _ip: Ipv4Addr) -> Option<MacAddr> {
            self.0
        }
    }

    struct StuckNeighbors;

    #[async_trait]
    impl NeighborTable for StuckNeighbors {
        async fn lookup(&self, _ip: Ipv4Addr) -> Option<MacAddr> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            None
        }
    }

    struct FixedName(Option<String>);

    #[async_trait]
    impl ReverseResolver for FixedName {
        async fn reverse_lookup(&self, _ip: Ipv4Addr) -> Option<String> {
            self.0.clone()
        }
    }

    struct SilentName;

    #[async_trait]
    impl ReverseResolver for SilentName {
        async fn reverse_lookup(&self, _ip: Ipv4Addr) -> Option<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            None
        }
    }

    fn probe_on(port: u16) -> TcpConnectProbe {
        TcpConnectProbe::new(port).with_neighbors(Arc::new(NullNeighborTable))
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn listening_port_is_alive() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let outcome = probe_on(port).probe(Ipv4Addr::LOCALHOST, Duration::from_secs(1)).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Alive {
                hostname: None,
                mac: None
            }
        );
    }

    #[tokio::test]
    async fn refused_port_is_alive() {
        let port = closed_port().await;
        let outcome = probe_on(port).probe(Ipv4Addr::LOCALHOST, Duration::from_secs(1)).await;
        assert!(outcome.is_alive());
    }

    #[tokio::test]
    async fn neighbor_entry_is_evidence_without_tcp_answer() {
        let probe = TcpConnectProbe::new(9).with_neighbors(Arc::new(FixedNeighbors(Some(PI_MAC))));
        let outcome = probe.probe(Ipv4Addr::new(203, 0, 113, 1), Duration::from_millis(20)).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Alive {
                hostname: None,
                mac: Some(PI_MAC)
            }
        );
    }

    #[tokio::test]
    async fn zero_mac_is_not_evidence() {
        let probe = TcpConnectProbe::new(9).with_neighbors(Arc::new(FixedNeighbors(Some(MacAddr::zero()))));
        assert_eq!(probe.hardware_address(Ipv4Addr::new(192, 168, 1, 9)).await, None);
    }

    #[tokio::test]
    async fn stuck_neighbor_table_is_bounded() {
        let port = closed_port().await;
        let probe = TcpConnectProbe::new(port).with_neighbors(Arc::new(StuckNeighbors));
        let started = std::time::Instant::now();
        let outcome = probe.probe(Ipv4Addr::LOCALHOST, Duration::from_millis(200)).await;
        assert!(outcome.is_alive());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn hostname_comes_from_resolver() {
        let port = closed_port().await;
        let probe = probe_on(port).with_resolver(
            Arc::new(FixedName(Some("router.lan.".into()))),
            Duration::from_millis(200),
        );
        match probe.probe(Ipv4Addr::LOCALHOST, Duration::from_secs(1)).await {
            ProbeOutcome::Alive { hostname, .. } => assert_eq!(hostname.as_deref(), Some("router.lan")),
            ProbeOutcome::Unreachable => panic!("loopback should answer"),
        }
    }

    #[tokio::test]
    async fn hostname_equal_to_ip_is_dropped() {
        let port = closed_port().await;
        let probe = probe_on(port).with_resolver(
            Arc::new(FixedName(Some("127.0.0.1".into()))),
            Duration::from_millis(200),
        );
        match probe.probe(Ipv4Addr::LOCALHOST, Duration::from_secs(1)).await {
            ProbeOutcome::Alive { hostname, .. } => assert_eq!(hostname, None),
            ProbeOutcome::Unreachable => panic!("loopback should answer"),
        }
    }

    #[test]
    fn overhead_includes_resolver_budget() {
        let plain = TcpConnectProbe::new(7);
        assert_eq!(plain.max_overhead(), NEIGHBOR_READ_TIMEOUT);

        let resolving = TcpConnectProbe::new(7).with_resolver(Arc::new(FixedName(None)), Duration::from_millis(500));
        assert_eq!(resolving.max_overhead(), NEIGHBOR_READ_TIMEOUT + Duration::from_millis(500));
    }

    #[test]
    fn from_config_honours_no_dns() {
        let config = Config {
            no_dns: true,
            probe_port: 22,
            ..Config::default()
        };
        let probe = TcpConnectProbe::from_config(&config);
        assert_eq!(probe.port(), 22);
        assert_eq!(probe.max_overhead(), NEIGHBOR_READ_TIMEOUT);
    }

    #[tokio::test]
    async fn stalled_lookups_stay_within_timeout_plus_overhead() {
        let timeout = Duration::from_millis(500);
        let probe = TcpConnectProbe::new(7)
            .with_neighbors(Arc::new(StuckNeighbors))
            .with_resolver(Arc::new(SilentName), Duration::from_millis(100));
        let budget = timeout + probe.max_overhead();

        let started = std::time::Instant::now();
        probe.probe(Ipv4Addr::new(203, 0, 113, 1), timeout).await;
        assert!(started.elapsed() < budget + Duration::from_millis(250));
    }

    // Needs a network that silently drops traffic to TEST-NET-3; transparent
    // proxies that accept every connect make it fail.
    #[tokio::test]
    #[ignore]
    async fn unreachable_address_times_out() {
        let timeout = Duration::from_millis(500);
        let probe = TcpConnectProbe::new(7);
        let budget = timeout + probe.max_overhead();

        let started = std::time::Instant::now();
        let outcome = probe.probe(Ipv4Addr::new(203, 0, 113, 1), timeout).await;
        assert_eq!(outcome, ProbeOutcome::Unreachable);
        assert!(started.elapsed() < budget + Duration::from_millis(250));
    }
}
