//! # Subnet Arithmetic
//!
//! Turns a local address plus a prefix length (or netmask) into the set of
//! candidate host addresses a discovery run has to probe.
//!
//! Everything here is pure: no I/O and no allocation proportional to the
//! subnet size. Candidates are produced lazily so a /16 costs the same to
//! describe as a /30.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::DiscoveryError;

/// A continuous range of IPv4 addresses, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone + Send + use<> {
        let start: u32 = u32::from(self.start_addr);
        let end: u32 = u32::from(self.end_addr);
        (start..=end).map(Ipv4Addr::from)
    }

    /// Number of addresses in the range, zero when `start > end`.
    pub fn len(&self) -> u64 {
        let start: u64 = u32::from(self.start_addr).into();
        let end: u64 = u32::from(self.end_addr).into();
        if start > end { 0 } else { end - start + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        (self.start_addr..=self.end_addr).contains(&ip)
    }
}

/// A network address and prefix length.
///
/// Always normalised: the host bits of `network` are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetDescriptor {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl SubnetDescriptor {
    /// Builds the descriptor of the subnet `local_ip` lives in.
    pub fn new(local_ip: Ipv4Addr, prefix_len: u8) -> Result<Self, DiscoveryError> {
        let mask: u32 = mask_bits(prefix_len)?;
        let network = Ipv4Addr::from(u32::from(local_ip) & mask);
        Ok(Self {
            network,
            prefix_len,
        })
    }

    pub fn from_netmask(local_ip: Ipv4Addr, netmask: Ipv4Addr) -> Result<Self, DiscoveryError> {
        Self::new(local_ip, prefix_from_netmask(netmask)?)
    }

    pub fn network_address(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn netmask(&self) -> Ipv4Addr {
        // prefix_len was validated on construction
        Ipv4Addr::from(mask_bits(self.prefix_len).unwrap_or(u32::MAX))
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !u32::from(self.netmask()))
    }

    /// Every address covered by the prefix, network and broadcast included.
    pub fn full_range(&self) -> Ipv4Range {
        Ipv4Range::new(self.network, self.broadcast())
    }

    /// The addresses a host can actually hold.
    ///
    /// /31 point-to-point links and /32 host routes have no network or
    /// broadcast address, so nothing is stripped for them.
    pub fn usable_range(&self) -> Ipv4Range {
        let full = self.full_range();
        if self.prefix_len >= 31 {
            return full;
        }
        let start = u32::from(full.start_addr) + 1;
        let end = u32::from(full.end_addr) - 1;
        Ipv4Range::new(Ipv4Addr::from(start), Ipv4Addr::from(end))
    }

    pub fn host_count(&self) -> u64 {
        self.usable_range().len()
    }

    /// Lazy, restartable sequence of candidate host addresses.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + Clone + Send + use<> {
        self.usable_range().iter()
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.full_range().contains(ip)
    }
}

impl fmt::Display for SubnetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for SubnetDescriptor {
    type Err = DiscoveryError;

    /// Parses `192.168.1.42/24` or `192.168.1.42/255.255.255.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((ip_str, suffix)) = s.trim().split_once('/') else {
            return Err(DiscoveryError::invalid(format!("expected ADDRESS/PREFIX, got '{s}'")));
        };

        let ip = ip_str
            .parse::<Ipv4Addr>()
            .map_err(|e| DiscoveryError::invalid(format!("invalid address '{ip_str}': {e}")))?;

        if let Ok(netmask) = suffix.parse::<Ipv4Addr>() {
            return Self::from_netmask(ip, netmask);
        }

        let prefix = suffix
            .parse::<u8>()
            .map_err(|e| DiscoveryError::invalid(format!("invalid prefix '{suffix}': {e}")))?;

        Self::new(ip, prefix)
    }
}

/// Candidate addresses of `descriptor`.
pub fn enumerate(descriptor: &SubnetDescriptor) -> impl Iterator<Item = Ipv4Addr> + Clone + Send + use<> {
    descriptor.hosts()
}

/// Exact number of addresses [`enumerate`] yields for `descriptor`.
pub fn host_count(descriptor: &SubnetDescriptor) -> u64 {
    descriptor.host_count()
}

/// Converts a dotted netmask into its prefix length.
///
/// Only contiguous masks are accepted.
pub fn prefix_from_netmask(netmask: Ipv4Addr) -> Result<u8, DiscoveryError> {
    let bits: u32 = u32::from(netmask);
    let prefix: u32 = bits.leading_ones();
    if bits.checked_shl(prefix).unwrap_or(0) != 0 {
        return Err(DiscoveryError::invalid(format!("non-contiguous netmask {netmask}")));
    }
    Ok(prefix as u8)
}

fn mask_bits(prefix_len: u8) -> Result<u32, DiscoveryError> {
    match prefix_len {
        0 => Ok(0),
        1..=32 => Ok(u32::MAX << (32 - prefix_len)),
        _ => Err(DiscoveryError::invalid(format!("prefix length {prefix_len} is outside 0..=32"))),
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

    fn subnet(a: u8, b: u8, c: u8, d: u8, prefix: u8) -> SubnetDescriptor {
        SubnetDescriptor::new(Ipv4Addr::new(a, b, c, d), prefix).unwrap()
    }

    #[test]
    fn ipv4range_iter_and_len_agree() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 3));
        let mut iter = range.iter();
        assert_eq!(iter.next(), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(iter.next(), Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(iter.next(), Some(Ipv4Addr::new(10, 0, 0, 3)));
        assert_eq!(iter.next(), None);
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn ipv4range_reversed_is_empty() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 1));
        assert!(range.is_empty());
        assert_eq!(range.iter().count(), 0);
    }

    #[test]
    fn slash_24_from_host_address() {
        let net = subnet(192, 168, 1, 42, 24);
        assert_eq!(net.network_address(), Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(net.broadcast(), Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(net.host_count(), 254);

        let hosts: Vec<Ipv4Addr> = net.hosts().collect();
        assert_eq!(hosts.first(), Some(&Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(hosts.last(), Some(&Ipv4Addr::new(192, 168, 1, 254)));
        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 0)));
        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 255)));
    }

    #[test]
    fn slash_31_keeps_both_endpoints() {
        let net = subnet(10, 0, 0, 7, 31);
        assert_eq!(net.host_count(), 2);
        let hosts: Vec<Ipv4Addr> = net.hosts().collect();
        assert_eq!(hosts, vec![Ipv4Addr::new(10, 0, 0, 6), Ipv4Addr::new(10, 0, 0, 7)]);
    }

    #[test]
    fn slash_32_is_the_single_address() {
        let net = subnet(203, 0, 113, 7, 32);
        assert_eq!(net.host_count(), 1);
        assert_eq!(net.hosts().collect::<Vec<_>>(), vec![Ipv4Addr::new(203, 0, 113, 7)]);
    }

    #[test]
    fn slash_0_counts_without_overflow() {
        let net = subnet(10, 20, 30, 40, 0);
        assert_eq!(net.network_address(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(net.broadcast(), Ipv4Addr::BROADCAST);
        assert_eq!(net.host_count(), (1u64 << 32) - 2);
    }

    #[test]
    fn host_count_matches_enumeration_for_small_prefixes() {
        for prefix in 20..=32 {
            let net = subnet(172, 16, 5, 10, prefix);
            assert_eq!(
                host_count(&net),
                enumerate(&net).count() as u64,
                "mismatch for /{prefix}"
            );
        }
    }

    #[test]
    fn enumeration_is_restartable() {
        let net = subnet(192, 168, 7, 1, 28);
        let first: Vec<Ipv4Addr> = enumerate(&net).collect();
        let second: Vec<Ipv4Addr> = enumerate(&net).collect();
        assert_eq!(first, second);

        let iter = net.hosts();
        assert_eq!(iter.clone().count(), iter.count());
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        let result = SubnetDescriptor::new(Ipv4Addr::new(192, 168, 1, 1), 33);
        assert!(matches!(result, Err(DiscoveryError::InvalidArgument(_))));
    }

    #[test]
    fn netmask_conversion() {
        assert_eq!(prefix_from_netmask(Ipv4Addr::new(255, 255, 255, 0)), Ok(24));
        assert_eq!(prefix_from_netmask(Ipv4Addr::new(255, 255, 240, 0)), Ok(20));
        assert_eq!(prefix_from_netmask(Ipv4Addr::UNSPECIFIED), Ok(0));
        assert_eq!(prefix_from_netmask(Ipv4Addr::BROADCAST), Ok(32));
        assert!(prefix_from_netmask(Ipv4Addr::new(255, 0, 255, 0)).is_err());

        let net = subnet(172, 16, 5, 10, 20);
        assert_eq!(prefix_from_netmask(net.netmask()), Ok(20));
    }

    #[test]
    fn from_str_accepts_prefix_and_netmask() {
        let a: SubnetDescriptor = "192.168.1.42/24".parse().unwrap();
        let b: SubnetDescriptor = "192.168.1.42/255.255.255.0".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "192.168.1.0/24");

        assert!("192.168.1.42".parse::<SubnetDescriptor>().is_err());
        assert!("192.168.1.420/24".parse::<SubnetDescriptor>().is_err());
        assert!("10.0.0.1/33".parse::<SubnetDescriptor>().is_err());
        assert!("10.0.0.1/255.0.255.0".parse::<SubnetDescriptor>().is_err());
    }

    #[test]
    fn contains_covers_network_and_broadcast() {
        let net = subnet(192, 168, 1, 42, 24);
        assert!(net.contains(Ipv4Addr::new(192, 168, 1, 0)));
        assert!(net.contains(Ipv4Addr::new(192, 168, 1, 255)));
        assert!(!net.contains(Ipv4Addr::new(192, 168, 2, 1)));
    }

    #[test]
    fn candidates_outlive_their_descriptor() {
        let candidates = {
            let net = subnet(10, 0, 0, 9, 30);
            enumerate(&net)
        };
        let worker = std::thread::spawn(move || candidates.collect::<Vec<_>>());
        assert_eq!(
            worker.join().unwrap(),
            vec![Ipv4Addr::new(10, 0, 0, 9), Ipv4Addr::new(10, 0, 0, 10)]
        );
    }
}
