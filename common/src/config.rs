use std::net::SocketAddr;
use std::time::Duration;

use crate::error::DiscoveryError;

/// Per-probe connect timeout used when the user does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(150);

/// Size of the probe worker pool.
///
/// Independent of the subnet size: a /16 still keeps at most this many
/// sockets open at once.
pub const DEFAULT_WORKERS: usize = 64;

/// TCP port knocked on by the liveness probe (echo).
pub const DEFAULT_PROBE_PORT: u16 = 7;

/// Upper bound for the reverse lookup performed on live hosts.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Config {
    /// Disables reverse DNS lookups for discovered hosts.
    pub no_dns: bool,
    /// 0 prints everything, 1 hides decorations, 2 prints only results.
    pub quiet: u8,
    pub no_banner: bool,
    /// Connect timeout of a single liveness probe.
    pub timeout: Duration,
    pub workers: usize,
    pub probe_port: u16,
    pub resolve_timeout: Duration,
    /// Overrides the nameserver taken from the system resolver configuration.
    pub nameserver: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_dns: false,
            quiet: 0,
            no_banner: false,
            timeout: DEFAULT_TIMEOUT,
            workers: DEFAULT_WORKERS,
            probe_port: DEFAULT_PROBE_PORT,
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
            nameserver: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.timeout.is_zero() {
            return Err(DiscoveryError::invalid("timeout must be a positive number of milliseconds"));
        }
        if self.workers == 0 {
            return Err(DiscoveryError::invalid("worker pool needs at least one worker"));
        }
        if self.resolve_timeout.is_zero() && !self.no_dns {
            return Err(DiscoveryError::invalid("resolve timeout must be positive"));
        }
        Ok(())
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
