//! Hardware address helpers.

use pnet::util::MacAddr;

/// First three bytes of a MAC address, the IEEE organisationally unique
/// identifier.
pub type OuiPrefix = [u8; 3];

pub fn oui_prefix(mac: MacAddr) -> OuiPrefix {
    [mac.0, mac.1, mac.2]
}

/// Parses `aa:bb:cc:dd:ee:ff` or `aa-bb-cc-dd-ee-ff`.
///
/// Single digit octets are accepted because BSD `arp` prints them that way
/// (`0:1b:63:a:b:c`).
pub fn parse_mac(s: &str) -> Option<MacAddr> {
    let octets = parse_octets::<6>(s)?;
    Some(MacAddr::new(
        octets[0], octets[1], octets[2], octets[3], octets[4], octets[5],
    ))
}

/// Parses an OUI written as `B8:27:EB`, `b8-27-eb` or `B827EB`.
pub fn parse_oui(s: &str) -> Option<OuiPrefix> {
    let s = s.trim();
    if s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut prefix: OuiPrefix = [0; 3];
        for (idx, byte) in prefix.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[idx * 2..idx * 2 + 2], 16).ok()?;
        }
        return Some(prefix);
    }
    parse_octets::<3>(s)
}

/// All-zero entries show up in neighbor tables for unresolved addresses.
pub fn is_unset(mac: MacAddr) -> bool {
    mac == MacAddr::zero()
}

fn parse_octets<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut octets = [0u8; N];
    let mut parts = s.trim().split([':', '-']);
    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 2 {
            return None;
        }
        *octet = u8::from_str_radix(part, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

/// `serde(with = ..)` adapter storing an optional MAC as its colon form.
pub mod serde_opt {
    use pnet::util::MacAddr;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(mac: &Option<MacAddr>, serializer: S) -> Result<S::Ok, S::Error> {
        match mac {
            Some(mac) => serializer.serialize_some(&mac.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<MacAddr>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse_mac(&s).ok_or_else(|| D::Error::custom(format!("invalid MAC address '{s}'"))))
            .transpose()
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
