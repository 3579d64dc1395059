//! # Local Interface Detection
//!
//! Finds the interface attached to the LAN and reports the address, prefix
//! and hardware address a discovery run starts from.

use std::net::Ipv4Addr;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;

#[cfg(target_os = "linux")]
use linux_impl::{is_physical, is_wireless};
#[cfg(target_os = "macos")]
use macos_impl::{is_physical, is_wireless};
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use fallback_impl::{is_physical, is_wireless};

use crate::error::DiscoveryError;
use crate::network::subnet::SubnetDescriptor;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    /// The interface was filtered out as "not physical" by the provided logic.
    NotPhysical,
    /// The interface does not have a MAC address.
    NoMacAddress,
    /// The interface does not support broadcast (required for ARP).
    NotBroadcast,
    /// The interface is a point-to-point link (e.g., a VPN).
    IsPointToPoint,
    /// The interface has no private IPv4 address.
    NoValidLanIp,
}

/// The local end of the segment being scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNetwork {
    pub interface: String,
    pub ip: Ipv4Addr,
    pub prefix_len: u8,
    pub mac: Option<MacAddr>,
    pub is_wireless: bool,
}

impl LocalNetwork {
    pub fn descriptor(&self) -> Result<SubnetDescriptor, DiscoveryError> {
        SubnetDescriptor::new(self.ip, self.prefix_len)
    }
}

/// Finds the primary LAN interface and its private IPv4 network.
pub fn get_lan_network() -> anyhow::Result<LocalNetwork> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces()
        .into_iter()
        .filter(|interface| is_viable_lan_interface(interface, is_physical).is_ok())
        .collect();

    let Some(interface) = select_best_lan_interface(interfaces, is_wired) else {
        anyhow::bail!("No interfaces available for LAN discovery");
    };

    let Some(net) = private_ipv4_net(&interface) else {
        anyhow::bail!("Interface {} has no private IPv4 address", interface.name);
    };

    Ok(LocalNetwork {
        ip: net.ip(),
        prefix_len: net.prefix(),
        mac: interface.mac,
        is_wireless: is_wireless(&interface),
        interface: interface.name,
    })
}

fn private_ipv4_net(interface: &NetworkInterface) -> Option<Ipv4Network> {
    interface.ips.iter().find_map(|net| match net {
        IpNetwork::V4(v4) if v4.ip().is_private() => Some(*v4),
        _ => None,
    })
}

fn is_viable_lan_interface(
    interface: &NetworkInterface,
    is_physical: impl Fn(&NetworkInterface) -> bool,
) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if !is_physical(interface) || interface.is_loopback() {
        return Err(ViabilityError::NotPhysical);
    }
    if interface.mac.is_none() {
        return Err(ViabilityError::NoMacAddress);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }
    if private_ipv4_net(interface).is_none() {
        return Err(ViabilityError::NoValidLanIp);
    }

    Ok(())
}

fn select_best_lan_interface(
    interfaces: Vec<NetworkInterface>,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<NetworkInterface> {
    let wired = interfaces.iter().position(|interface| is_wired(interface));
    let idx = wired.unwrap_or(0);
    interfaces.into_iter().nth(idx)
}

fn is_wired(interface: &NetworkInterface) -> bool {
    is_physical(interface) && !is_wireless(interface)
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::path::Path;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/device", interface.name)).exists()
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
    }
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use std::collections::HashSet;
    use std::process::Command;
    use std::sync::OnceLock;

    struct HardwareInfo {
        physical_devices: HashSet<String>,
        wireless_devices: HashSet<String>,
    }

    /// Runs `networksetup` once and caches what it reports.
    fn get_hardware_info() -> &'static HardwareInfo {
        static HARDWARE_INFO: OnceLock<HardwareInfo> = OnceLock::new();

        HARDWARE_INFO.get_or_init(|| {
            let mut physical = HashSet::new();
            let mut wireless = HashSet::new();

            if let Ok(output) = Command::new("networksetup").arg("-listallhardwareports").output() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                for line in stdout.lines() {
                    if let Some(device) = line.strip_prefix("Device: ") {
                        physical.insert(device.trim().to_string());
                    }
                }
            }

            for device in &physical {
                let is_wifi = Command::new("networksetup")
                    .arg("-getairportnetwork")
                    .arg(device)
                    .output()
                    .map(|out| out.status.success())
                    .unwrap_or(false);

                if is_wifi {
                    wireless.insert(device.clone());
                }
            }

            HardwareInfo {
                physical_devices: physical,
                wireless_devices: wireless,
            }
        })
    }

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        get_hardware_info().physical_devices.contains(&interface.name)
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        get_hardware_info().wireless_devices.contains(&interface.name)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod fallback_impl {
    use super::*;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        !interface.is_loopback()
    }

    pub fn is_wireless(_interface: &NetworkInterface) -> bool {
        false
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

    const IFF_UP: u32 = 1;
    const IFF_BROADCAST: u32 = 1 << 1;
    const IFF_LOOPBACK: u32 = 1 << 3;
    const IFF_POINTTOPOINT: u32 = 1 << 4;

    fn create_mock_interface(
        name: &str,
        mac: Option<MacAddr>,
        ips: Vec<IpNetwork>,
        flags: u32,
    ) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: "An interface".to_string(),
            index: 0,
            mac,
            ips,
            flags,
        }
    }

    fn default_mac() -> Option<MacAddr> {
        Some(MacAddr(0x1, 0x2, 0x3, 0x4, 0x5, 0x6))
    }

    fn default_ips() -> Vec<IpNetwork> {
        vec![IpNetwork::V4("192.168.1.100/24".parse().unwrap())]
    }

    fn physical(_: &NetworkInterface) -> bool {
        true
    }

    #[test]
    fn is_viable_lan_interface_should_succeed() {
        let interface = create_mock_interface("eth0", default_mac(), default_ips(), IFF_UP | IFF_BROADCAST);
        assert_eq!(is_viable_lan_interface(&interface, physical), Ok(()));
    }

    #[test]
    fn is_viable_lan_interface_should_fail_with_public_ipv4_only() {
        let ips = vec![IpNetwork::V4("203.0.113.9/24".parse().unwrap())];
        let interface = create_mock_interface("eth0", default_mac(), ips, IFF_UP | IFF_BROADCAST);
        assert_eq!(
            is_viable_lan_interface(&interface, physical),
            Err(ViabilityError::NoValidLanIp)
        );
    }

    #[test]
    fn is_viable_lan_interface_should_fail_with_ipv6_only() {
        let ips = vec![IpNetwork::V6("fe80::1234:5678:abcd:ef01/64".parse().unwrap())];
        let interface = create_mock_interface("eth0", default_mac(), ips, IFF_UP | IFF_BROADCAST);
        assert_eq!(
            is_viable_lan_interface(&interface, physical),
            Err(ViabilityError::NoValidLanIp)
        );
    }

    #[test]
    fn is_viable_lan_interface_should_fail_non_physical() {
        let interface = create_mock_interface("eth1", default_mac(), default_ips(), IFF_UP | IFF_BROADCAST);
        let result = is_viable_lan_interface(&interface, |_: &NetworkInterface| false);
        assert_eq!(result, Err(ViabilityError::NotPhysical))
    }

    #[test]
    fn is_viable_lan_interface_should_fail_no_mac_addr() {
        let interface = create_mock_interface("eth0", None, default_ips(), IFF_UP | IFF_BROADCAST);
        assert_eq!(
            is_viable_lan_interface(&interface, physical),
            Err(ViabilityError::NoMacAddress)
        )
    }

    #[test]
    fn is_viable_lan_interface_should_fail_when_down() {
        let interface = create_mock_interface("wlan0", default_mac(), default_ips(), IFF_BROADCAST);
        assert_eq!(is_viable_lan_interface(&interface, physical), Err(ViabilityError::IsDown))
    }

    #[test]
    fn is_viable_lan_interface_should_fail_loop_back() {
        let interface = create_mock_interface(
            "lo",
            default_mac(),
            default_ips(),
            IFF_LOOPBACK | IFF_UP | IFF_BROADCAST,
        );
        assert_eq!(
            is_viable_lan_interface(&interface, physical),
            Err(ViabilityError::NotPhysical)
        )
    }

    #[test]
    fn is_viable_lan_interface_should_fail_not_broadcast() {
        let interface = create_mock_interface("eth0", default_mac(), default_ips(), IFF_UP);
        assert_eq!(
            is_viable_lan_interface(&interface, physical),
            Err(ViabilityError::NotBroadcast)
        );
    }

    #[test]
    fn is_viable_lan_interface_should_fail_point_to_point() {
        let interface = create_mock_interface(
            "tun0",
            default_mac(),
            default_ips(),
            IFF_BROADCAST | IFF_POINTTOPOINT | IFF_UP,
        );
        assert_eq!(
            is_viable_lan_interface(&interface, physical),
            Err(ViabilityError::IsPointToPoint)
        )
    }

    #[test]
    fn select_best_lan_interface_selects_wired_over_wireless() {
        let wired = create_mock_interface("eth0", default_mac(), default_ips(), IFF_UP | IFF_BROADCAST);
        let wireless = create_mock_interface("wlan0", default_mac(), default_ips(), IFF_UP | IFF_BROADCAST);
        let is_wired = |interface: &NetworkInterface| interface.name == "eth0";
        let result = select_best_lan_interface(vec![wireless, wired], is_wired);
        assert_eq!(result.map(|i| i.name), Some("eth0".to_string()));
    }

    #[test]
    fn select_best_lan_interface_falls_back_to_first() {
        let wireless = create_mock_interface("wlan0", default_mac(), default_ips(), IFF_UP | IFF_BROADCAST);
        let result = select_best_lan_interface(vec![wireless], |_: &NetworkInterface| false);
        assert_eq!(result.map(|i| i.name), Some("wlan0".to_string()));
    }

    #[test]
    fn select_best_lan_interface_returns_none() {
        assert!(select_best_lan_interface(vec![], |_: &NetworkInterface| true).is_none());
    }

    #[test]
    fn private_ipv4_net_keeps_prefix() {
        let interface = create_mock_interface("eth0", default_mac(), default_ips(), IFF_UP | IFF_BROADCAST);
        let net = private_ipv4_net(&interface).unwrap();
        assert_eq!(net.ip(), Ipv4Addr::new(192, 168, 1, 100));
        assert_eq!(net.prefix(), 24);
    }
}
