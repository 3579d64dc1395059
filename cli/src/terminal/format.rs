use std::net::Ipv4Addr;

use colored::*;
use lanprobe_common::network::host::Host;
use lanprobe_common::network::subnet::SubnetDescriptor;
use pnet::util::MacAddr;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn ip_to_detail(ip: Ipv4Addr) -> Detail {
    ("IPv4".to_string(), ip.to_string().color(colors::IPV4_ADDR))
}

pub fn mac_to_detail(mac: &Option<MacAddr>) -> Option<Detail> {
    mac.map(|mac| ("MAC".to_string(), mac.to_string().color(colors::MAC_ADDR)))
}

pub fn vendor_to_detail(vendor: &Option<String>) -> Option<Detail> {
    vendor
        .as_ref()
        .map(|vendor| ("Vendor".to_string(), vendor.color(colors::VENDOR)))
}

pub fn host_details(host: &Host) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![ip_to_detail(host.ip)];
    details.extend(mac_to_detail(&host.mac));
    details.extend(vendor_to_detail(&host.vendor));
    details
}

pub fn hostname(host: &Host) -> ColoredString {
    match &host.hostname {
        Some(name) => name.color(colors::HOSTNAME),
        None => "No hostname".color(colors::NO_DATA).italic(),
    }
}

pub fn subnet(descriptor: &SubnetDescriptor) -> ColoredString {
    let address: ColoredString = descriptor.network_address().to_string().color(colors::IPV4_ADDR);
    let prefix: ColoredString = descriptor.prefix_len().to_string().color(colors::IPV4_PREFIX);
    format!("{address}/{prefix}").color(colors::SEPARATOR)
}
