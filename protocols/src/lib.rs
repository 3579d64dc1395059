pub mod arp;
pub mod dns;
