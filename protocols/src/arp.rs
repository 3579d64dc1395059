//! Parsers for the operating system's neighbor (ARP) table.

use std::net::Ipv4Addr;

use pnet::util::MacAddr;

use lanprobe_common::network::mac;

/// ATF_COM: the entry is complete.
const ATF_COM: u32 = 0x2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub device: Option<String>,
}

/// Parses the Linux `/proc/net/arp` table.
///
/// ```text
/// IP address       HW type     Flags       HW address            Mask     Device
/// 192.168.1.1      0x1         0x2         aa:bb:cc:dd:ee:ff     *        eth0
/// ```
///
/// Incomplete entries and all-zero hardware addresses are skipped.
pub fn parse_proc_net_arp(text: &str) -> Vec<NeighborEntry> {
    text.lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 6 {
                return None;
            }
            let flags = u32::from_str_radix(parts[2].trim_start_matches("0x"), 16).ok()?;
            if flags & ATF_COM == 0 {
                return None;
            }
            let ip: Ipv4Addr = parts[0].parse().ok()?;
            let mac = complete_mac(parts[3])?;
            Some(NeighborEntry {
                ip,
                mac,
                device: Some(parts[5].to_string()),
            })
        })
        .collect()
}

/// Parses BSD style `arp -an` output.
///
/// ```text
/// ? (192.168.1.1) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]
/// ? (192.168.1.7) at (incomplete) on en0 ifscope [ethernet]
/// ```
pub fn parse_arp_an(text: &str) -> Vec<NeighborEntry> {
    text.lines()
        .filter_map(|line| {
            let open = line.find('(')?;
            let close = line[open..].find(')')? + open;
            let ip: Ipv4Addr = line[open + 1..close].parse().ok()?;

            let mut rest = line[close + 1..].split_whitespace();
            if rest.next()? != "at" {
                return None;
            }
            let mac = complete_mac(rest.next()?)?;
            let device = match rest.next() {
                Some("on") => rest.next().map(str::to_string),
                _ => None,
            };
            Some(NeighborEntry { ip, mac, device })
        })
        .collect()
}

pub fn find(entries: &[NeighborEntry], ip: Ipv4Addr) -> Option<MacAddr> {
    entries.iter().find(|entry| entry.ip == ip).map(|entry| entry.mac)
}

fn complete_mac(raw: &str) -> Option<MacAddr> {
    mac::parse_mac(raw).filter(|addr| !mac::is_unset(*addr))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
