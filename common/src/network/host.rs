use std::net::Ipv4Addr;

use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};

/// A live address found by a discovery run.
///
/// The engine builds each `Host` once, fully populated, and hands it over in a
/// single event. Fields other than `ip` are best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub ip: Ipv4Addr,
    pub hostname: Option<String>,
    #[serde(with = "crate::network::mac::serde_opt", default)]
    pub mac: Option<MacAddr>,
    pub vendor: Option<String>,
}

impl Host {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            hostname: None,
            mac: None,
            vendor: None,
        }
    }

    pub fn with_hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    pub fn with_mac(mut self, mac: Option<MacAddr>) -> Self {
        self.mac = mac;
        self
    }

    pub fn with_vendor(mut self, vendor: Option<String>) -> Self {
        self.vendor = vendor;
        self
    }
}
