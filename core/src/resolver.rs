//! # DNS Client
//!
//! Sends single UDP queries to a recursive nameserver and interprets the
//! answer. Used for both the interactive lookup and the reverse lookups
//! performed on live hosts.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use lanprobe_protocols::dns::{self, ParsedResponse, Record, RecordType};
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

pub const DNS_PORT: u16 = 53;
pub const FALLBACK_NAMESERVER: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), DNS_PORT);

const RESOLV_CONF: &str = "/etc/resolv.conf";
const MAX_RESPONSE_LEN: usize = 4096;
const RCODE_NAME_ERROR: u8 = 3;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("query timed out")]
    Timeout,
    #[error("no records found")]
    NoRecords,
    #[error("server failure (rcode {0})")]
    ServerFailure(u8),
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Malformed(String),
}

pub type LookupResult = Result<Vec<Record>, DnsError>;

/// Resolves an address back to a name.
#[async_trait]
pub trait ReverseResolver: Send + Sync {
    async fn reverse_lookup(&self, ip: Ipv4Addr) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct DnsClient {
    nameserver: SocketAddr,
    timeout: Duration,
}

impl DnsClient {
    pub fn new(nameserver: SocketAddr, timeout: Duration) -> Self {
        Self {
            nameserver,
            timeout,
        }
    }

    /// Uses the first nameserver of the system resolver configuration.
    pub fn from_system(timeout: Duration) -> Self {
        let nameserver = std::fs::read_to_string(RESOLV_CONF)
            .ok()
            .and_then(|text| parse_resolv_conf(&text))
            .unwrap_or_else(|| {
                debug!("No usable nameserver in {RESOLV_CONF}, using {FALLBACK_NAMESERVER}");
                FALLBACK_NAMESERVER
            });
        Self::new(nameserver, timeout)
    }

    pub fn nameserver(&self) -> SocketAddr {
        self.nameserver
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends one query and waits for the matching response, bounded by the
    /// client's timeout.
    pub async fn query(&self, name: &str, record_type: RecordType) -> LookupResult {
        match tokio::time::timeout(self.timeout, self.exchange(name, record_type)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(DnsError::Timeout),
        }
    }

    pub async fn reverse(&self, ip: IpAddr) -> LookupResult {
        self.query(&dns::reverse_address_to_ptr(&ip), RecordType::Ptr).await
    }

    async fn exchange(&self, name: &str, record_type: RecordType) -> LookupResult {
        let id: u16 = rand::random();
        let packet = dns::create_query_packet(name, record_type, id)
            .map_err(|e| DnsError::Malformed(e.to_string()))?;

        let bind_addr: SocketAddr = if self.nameserver.is_ipv4() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED), 0)
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(self.nameserver).await?;
        socket.send(&packet).await?;
        trace!("Sent {record_type} query {id:#06x} for {name} to {}", self.nameserver);

        let mut buf = [0u8; MAX_RESPONSE_LEN];
        loop {
            let len = socket.recv(&mut buf).await?;
            let payload = &buf[..len];
            match dns::parse_response(payload) {
                Ok(response) if response.id == id => return interpret(response),
                Ok(response) => {
                    trace!("Ignoring DNS response {:#06x}, waiting for {id:#06x}", response.id);
                }
                Err(e) if len >= 2 && u16::from_be_bytes([payload[0], payload[1]]) == id => {
                    return Err(DnsError::Malformed(e.to_string()));
                }
                Err(e) => trace!("Ignoring unparsable datagram: {e}"),
            }
        }
    }
}

#[async_trait]
impl ReverseResolver for DnsClient {
    async fn reverse_lookup(&self, ip: Ipv4Addr) -> Option<String> {
        match self.reverse(IpAddr::V4(ip)).await {
            Ok(records) => records.into_iter().find_map(|record| match record {
                Record::Ptr(name) => Some(name),
                _ => None,
            }),
            Err(e) => {
                trace!("Reverse lookup for {ip} failed: {e}");
                None
            }
        }
    }
}

fn interpret(response: ParsedResponse) -> LookupResult {
    match response.rcode {
        0 if response.records.is_empty() => Err(DnsError::NoRecords),
        0 => Ok(response.records),
        RCODE_NAME_ERROR => Err(DnsError::NoRecords),
        code => Err(DnsError::ServerFailure(code)),
    }
}

/// First `nameserver` line whose address parses. Scoped IPv6 entries
/// (`fe80::1%eth0`) are skipped.
pub fn parse_resolv_conf(text: &str) -> Option<SocketAddr> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .find_map(|line| {
            let mut parts = line.split_whitespace();
            if parts.next()? != "nameserver" {
                return None;
            }
            let ip: IpAddr = parts.next()?.parse().ok()?;
            Some(SocketAddr::new(ip, DNS_PORT))
        })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
