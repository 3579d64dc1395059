use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use anyhow::Context;
use dns_parser::{Packet, RData, ResponseCode};
use pnet::packet::dns::{DnsClass, DnsQuery, DnsType, DnsTypes, MutableDnsPacket, Opcode, Retcode};

use lanprobe_common::error::DiscoveryError;

pub const DNS_HDR_LEN: usize = 12;
const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 253;

/// Query types accepted by the lookup front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Ptr,
}

impl RecordType {
    pub fn dns_type(self) -> DnsType {
        match self {
            RecordType::A => DnsTypes::A,
            RecordType::Aaaa => DnsTypes::AAAA,
            RecordType::Ptr => DnsTypes::PTR,
        }
    }
}

impl FromStr for RecordType {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "PTR" => Ok(RecordType::Ptr),
            _ => Err(DiscoveryError::UnsupportedRecordType(s.to_string())),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Ptr => "PTR",
        };
        f.write_str(name)
    }
}

/// A single answer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ptr(String),
    Cname(String),
}

impl Record {
    pub fn record_type(&self) -> &'static str {
        match self {
            Record::A(_) => "A",
            Record::Aaaa(_) => "AAAA",
            Record::Ptr(_) => "PTR",
            Record::Cname(_) => "CNAME",
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::A(ip) => write!(f, "{ip}"),
            Record::Aaaa(ip) => write!(f, "{ip}"),
            Record::Ptr(name) | Record::Cname(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub id: u16,
    /// Raw RCODE, 0 on success.
    pub rcode: u8,
    pub records: Vec<Record>,
}

pub fn create_query_packet(name: &str, record_type: RecordType, id: u16) -> anyhow::Result<Vec<u8>> {
    let query: DnsQuery = DnsQuery {
        qname: encode_dns_name(name)?,
        qtype: record_type.dns_type(),
        qclass: DnsClass(1),
        payload: Vec::new(),
    };
    let q_fixed_len: usize = 4;
    let total: usize = DNS_HDR_LEN + query.qname.len() + q_fixed_len;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(1);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(0);
    }

    // Question section follows the fixed header.
    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    let type_bytes: [u8; 2] = query.qtype.0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&type_bytes);
    cursor += 2;

    let class_bytes: [u8; 2] = query.qclass.0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&class_bytes);

    Ok(buffer)
}

pub fn create_ptr_packet(ip_addr: &IpAddr, id: u16) -> anyhow::Result<Vec<u8>> {
    create_query_packet(&reverse_address_to_ptr(ip_addr), RecordType::Ptr, id)
}

/// `192.168.1.10` becomes `10.1.168.192.in-addr.arpa`, IPv6 addresses are
/// expanded into reversed nibbles under `ip6.arpa`.
pub fn reverse_address_to_ptr(ip_addr: &IpAddr) -> String {
    match ip_addr {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa")
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(72);
            for byte in v6.octets().iter().rev() {
                name.push_str(&format!("{:x}.{:x}.", byte & 0x0f, byte >> 4));
            }
            name.push_str("ip6.arpa");
            name
        }
    }
}

/// Parses a response, keeping A, AAAA, PTR and CNAME answers in order.
pub fn parse_response(payload: &[u8]) -> anyhow::Result<ParsedResponse> {
    let packet = Packet::parse(payload).context("Failed to parse DNS packet")?;
    if packet.header.query {
        anyhow::bail!("DNS packet {} is a query, not a response", packet.header.id);
    }

    let records: Vec<Record> = packet
        .answers
        .iter()
        .filter_map(|answer| match &answer.data {
            RData::A(a) => Some(Record::A(a.0)),
            RData::AAAA(aaaa) => Some(Record::Aaaa(aaaa.0)),
            RData::PTR(ptr) => Some(Record::Ptr(ptr.0.to_string())),
            RData::CNAME(cname) => Some(Record::Cname(cname.0.to_string())),
            _ => None,
        })
        .collect();

    Ok(ParsedResponse {
        id: packet.header.id,
        rcode: rcode_value(&packet.header.response_code),
        records,
    })
}

fn rcode_value(code: &ResponseCode) -> u8 {
    match code {
        ResponseCode::NoError => 0,
        ResponseCode::FormatError => 1,
        ResponseCode::ServerFailure => 2,
        ResponseCode::NameError => 3,
        ResponseCode::NotImplemented => 4,
        ResponseCode::Refused => 5,
        ResponseCode::Reserved(code) => *code,
    }
}

fn encode_dns_name(name: &str) -> anyhow::Result<Vec<u8>> {
    let name = name.trim_end_matches('.');
    if name.is_empty() {
        anyhow::bail!("DNS name is empty");
    }
    if name.len() > MAX_NAME_LEN {
        anyhow::bail!("DNS name is longer than {MAX_NAME_LEN} bytes");
    }

    let mut encoded: Vec<u8> = Vec::with_capacity(name.len() + 2);
    for label in name.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            anyhow::bail!("Invalid DNS label in '{name}'");
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    Ok(encoded)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
