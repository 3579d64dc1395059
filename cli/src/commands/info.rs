use colored::*;
use lanprobe_common::network::interface;
use lanprobe_common::vendors::VendorRepository;
use lanprobe_core::resolver::DnsClient;
use lanprobe_core::vendors::MacOuiRepo;

use crate::terminal::{colors, format, print};

const KEY_WIDTH: usize = 10;

pub fn info(quiet: u8) -> anyhow::Result<()> {
    print::header("local network", quiet);
    print::GLOBAL_KEY_WIDTH.set(KEY_WIDTH);

    let lan = interface::get_lan_network()?;
    let descriptor = lan.descriptor()?;

    print::aligned_line("Interface", lan.interface.as_str());
    print::aligned_line("Medium", if lan.is_wireless { "wireless" } else { "wired" });
    print::aligned_line("IPv4", lan.ip.to_string().color(colors::IPV4_ADDR));

    match lan.mac {
        Some(mac) => {
            print::aligned_line("MAC", mac.to_string().color(colors::MAC_ADDR));
            let vendor = MacOuiRepo
                .vendor_for_mac(mac)
                .unwrap_or_else(|| "Unknown".to_string());
            print::aligned_line("Vendor", vendor.color(colors::VENDOR));
        }
        None => print::aligned_line("MAC", "None".color(colors::NO_DATA)),
    }

    print::aligned_line("Subnet", format::subnet(&descriptor));
    print::aligned_line("Netmask", descriptor.netmask().to_string());
    print::aligned_line("Broadcast", descriptor.broadcast().to_string());
    print::aligned_line("Hosts", descriptor.host_count().to_string().color(colors::ACCENT));

    let dns = DnsClient::from_system(lanprobe_common::config::DEFAULT_RESOLVE_TIMEOUT);
    print::aligned_line("DNS", dns.nameserver().to_string());
    Ok(())
}
