pub mod discover;
pub mod dns;
pub mod info;
pub mod show;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser, Subcommand};
use lanprobe_common::config::{DEFAULT_PROBE_PORT, DEFAULT_WORKERS};
use lanprobe_common::error::DiscoveryError;
use lanprobe_common::network::subnet::SubnetDescriptor;

#[derive(Parser)]
#[command(name = "lanprobe")]
#[command(version, about = "Finds the live hosts on your local network.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Reduce output (-q hides decorations, -qq prints only results)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover live hosts on the local network or a given subnet
    #[command(alias = "d")]
    Discover {
        /// Subnet as ip/prefix or ip/netmask (defaults to the detected LAN)
        target: Option<Target>,

        /// Connect timeout per probe, in milliseconds
        #[arg(short, long, default_value_t = 150)]
        timeout: u64,

        /// Number of probes in flight at once
        #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// TCP port knocked on by the probe
        #[arg(short, long, default_value_t = DEFAULT_PROBE_PORT)]
        port: u16,

        /// Skip reverse DNS lookups
        #[arg(long)]
        no_dns: bool,

        /// Nameserver used for reverse lookups (ip:port)
        #[arg(long)]
        nameserver: Option<SocketAddr>,

        /// Write the result set to this file as JSON
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
    /// Look up a DNS record
    Dns {
        domain: String,

        /// Record type: A, AAAA or PTR
        #[arg(short = 't', long = "type", default_value = "A")]
        record_type: String,

        /// Timeout in milliseconds
        #[arg(long, default_value_t = 2000)]
        timeout: u64,

        /// Nameserver to ask (ip:port)
        #[arg(long)]
        nameserver: Option<SocketAddr>,
    },
    /// Show the detected LAN interface and subnet
    #[command(alias = "i")]
    Info,
    /// Print a saved result set without scanning
    Show { file: PathBuf },
}

/// A subnet together with the address it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub ip: Ipv4Addr,
    pub descriptor: SubnetDescriptor,
}

impl FromStr for Target {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, _) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| DiscoveryError::invalid(format!("'{s}' is missing a /prefix or /netmask")))?;
        let ip: Ipv4Addr = ip
            .parse()
            .map_err(|_| DiscoveryError::invalid(format!("'{ip}' is not an IPv4 address")))?;
        let descriptor: SubnetDescriptor = s.trim().parse()?;
        Ok(Target { ip, descriptor })
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
