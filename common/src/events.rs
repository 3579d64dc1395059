//! Events streamed from a running discovery job to its consumer.

use serde::{Deserialize, Serialize};

use crate::network::host::Host;

/// One notification from a discovery job.
///
/// A job emits one `Progress` per candidate address, at most one `HostFound`
/// per address, and finishes with exactly one `Completed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Progress { delta: u32 },
    HostFound(Host),
    Completed(ScanSummary),
}

impl ScanEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanEvent::Completed(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Candidates whose probe finished (or was counted as unreachable).
    pub probed: u64,
    pub found: u64,
    pub cancelled: bool,
}
