//! # Discovery Scheduler
//!
//! Drives a [`HostProbe`] over every candidate address of a subnet.
//!
//! A single dispatcher task per job pulls candidates lazily and keeps at most
//! `workers` probes in flight in a [`JoinSet`]. It is also the only producer
//! of the job's event channel, so the consumer observes events one at a time
//! and never needs to synchronise. The only state shared with the consumer is
//! the counter behind [`ScanJob::progress`].

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lanprobe_common::config::DEFAULT_WORKERS;
use lanprobe_common::error::DiscoveryError;
use lanprobe_common::events::{ScanEvent, ScanSummary};
use lanprobe_common::network::host::Host;
use lanprobe_common::network::subnet::{self, SubnetDescriptor};
use lanprobe_common::vendors::VendorRepository;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::probe::{HostProbe, ProbeOutcome};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Slack added on top of a probe's own budget before the dispatcher gives
/// up on it, so timer jitter does not turn a slow answer into a miss.
pub const GUARD_MARGIN: Duration = Duration::from_millis(50);

type Candidates = Box<dyn Iterator<Item = Ipv4Addr> + Send>;

pub struct DiscoveryScheduler {
    probe: Arc<dyn HostProbe>,
    vendors: Arc<dyn VendorRepository>,
    workers: usize,
    event_capacity: usize,
    next_id: u64,
    active: Option<JobCanceller>,
}

impl DiscoveryScheduler {
    pub fn new(probe: Arc<dyn HostProbe>, vendors: Arc<dyn VendorRepository>) -> Self {
        Self {
            probe,
            vendors,
            workers: DEFAULT_WORKERS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            next_id: 0,
            active: None,
        }
    }

    /// Fixed size of the probe pool. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Validates the request, cancels the job started before, and launches a
    /// new one.
    ///
    /// Must be called from within a Tokio runtime. Fails with
    /// [`DiscoveryError::InvalidArgument`] for a zero `timeout` or a
    /// `local_ip` outside `descriptor`; nothing is probed in that case.
    pub fn start(
        &mut self,
        local_ip: Ipv4Addr,
        descriptor: SubnetDescriptor,
        timeout: Duration,
    ) -> Result<ScanJob, DiscoveryError> {
        if timeout.is_zero() {
            return Err(DiscoveryError::invalid("timeout must be greater than zero"));
        }
        if !descriptor.contains(local_ip) {
            return Err(DiscoveryError::invalid(format!(
                "{local_ip} is not part of {descriptor}"
            )));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| DiscoveryError::invalid("discovery must be started inside a Tokio runtime"))?;

        self.cancel_active();
        self.next_id += 1;

        let token = CancellationToken::new();
        let probed = Arc::new(AtomicU64::new(0));
        let (events_tx, events_rx) = mpsc::channel(self.event_capacity);

        let dispatcher = Dispatcher {
            job_id: self.next_id,
            probe: self.probe.clone(),
            vendors: self.vendors.clone(),
            workers: self.workers,
            timeout,
            token: token.clone(),
            probed: probed.clone(),
            events: events_tx,
        };

        info!(
            "Job {} scanning {} ({} candidates, {} workers, {:?} timeout)",
            self.next_id,
            descriptor,
            descriptor.host_count(),
            self.workers,
            timeout
        );
        runtime.spawn(dispatcher.run(Box::new(subnet::enumerate(&descriptor))));

        self.active = Some(JobCanceller {
            token: token.clone(),
        });

        Ok(ScanJob {
            id: self.next_id,
            local_ip,
            descriptor,
            timeout,
            token,
            events: events_rx,
            probed,
            summary: None,
        })
    }

    /// Cancels the most recently started job, if it is still running.
    pub fn cancel_active(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel();
        }
    }
}

/// Handle on a running (or finished) discovery job.
///
/// Dropping the handle cancels the job.
pub struct ScanJob {
    id: u64,
    local_ip: Ipv4Addr,
    descriptor: SubnetDescriptor,
    timeout: Duration,
    token: CancellationToken,
    events: mpsc::Receiver<ScanEvent>,
    probed: Arc<AtomicU64>,
    summary: Option<ScanSummary>,
}

impl ScanJob {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn local_ip(&self) -> Ipv4Addr {
        self.local_ip
    }

    pub fn descriptor(&self) -> SubnetDescriptor {
        self.descriptor
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of candidates the job will probe.
    pub fn total(&self) -> u64 {
        self.descriptor.host_count()
    }

    /// Candidates probed so far.
    pub fn progress(&self) -> u64 {
        self.probed.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A cloneable handle that can cancel this job from elsewhere.
    pub fn canceller(&self) -> JobCanceller {
        JobCanceller {
            token: self.token.clone(),
        }
    }

    /// Next event of the job, `None` once `Completed` has been returned.
    ///
    /// After cancellation only the terminal event is delivered; progress and
    /// host events still buffered are discarded.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        if self.summary.is_some() {
            return None;
        }
        loop {
            let event = self.events.recv().await?;
            if let ScanEvent::Completed(summary) = &event {
                self.summary = Some(*summary);
                return Some(event);
            }
            if self.token.is_cancelled() {
                continue;
            }
            return Some(event);
        }
    }

    /// Drains the job and returns its summary.
    pub async fn finish(mut self) -> ScanSummary {
        while self.next_event().await.is_some() {}
        self.summary.unwrap_or(ScanSummary {
            probed: self.progress(),
            found: 0,
            cancelled: self.token.is_cancelled(),
        })
    }

    pub fn summary(&self) -> Option<ScanSummary> {
        self.summary
    }
}

impl Drop for ScanJob {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[derive(Debug, Clone)]
pub struct JobCanceller {
    token: CancellationToken,
}

impl JobCanceller {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct Dispatcher {
    job_id: u64,
    probe: Arc<dyn HostProbe>,
    vendors: Arc<dyn VendorRepository>,
    workers: usize,
    timeout: Duration,
    token: CancellationToken,
    probed: Arc<AtomicU64>,
    events: mpsc::Sender<ScanEvent>,
}

enum Step {
    Cancelled,
    Joined(Result<(Ipv4Addr, ProbeOutcome), JoinError>),
}

impl Dispatcher {
    async fn run(self, mut candidates: Candidates) {
        let guard = task_guard(self.timeout, self.probe.max_overhead());
        let mut in_flight: JoinSet<(Ipv4Addr, ProbeOutcome)> = JoinSet::new();
        let mut seen: HashSet<Ipv4Addr> = HashSet::new();
        let mut exhausted = false;
        let mut cancelled = false;
        let mut found: u64 = 0;

        loop {
            while !exhausted && in_flight.len() < self.workers {
                match candidates.next() {
                    Some(ip) => self.admit(&mut in_flight, ip, guard),
                    None => exhausted = true,
                }
            }

            let step = tokio::select! {
                biased;
                _ = self.token.cancelled() => Step::Cancelled,
                joined = in_flight.join_next() => match joined {
                    Some(joined) => Step::Joined(joined),
                    None => break,
                },
            };

            let joined = match step {
                Step::Cancelled => {
                    cancelled = true;
                    break;
                }
                Step::Joined(joined) => joined,
            };

            self.probed.fetch_add(1, Ordering::Relaxed);
            if !self.emit(ScanEvent::Progress { delta: 1 }).await {
                cancelled = true;
                break;
            }

            let host = match joined {
                Ok((ip, ProbeOutcome::Alive { hostname, mac })) if seen.insert(ip) => {
                    let vendor = mac.and_then(|mac| self.vendors.vendor_for_mac(mac));
                    Host::new(ip).with_hostname(hostname).with_mac(mac).with_vendor(vendor)
                }
                Ok((ip, ProbeOutcome::Alive { .. })) => {
                    trace!("Duplicate report for {ip}");
                    continue;
                }
                Ok((ip, ProbeOutcome::Unreachable)) => {
                    trace!("{ip} unreachable");
                    continue;
                }
                Err(e) => {
                    debug!("Probe task failed, counting as unreachable: {e}");
                    continue;
                }
            };

            found += 1;
            debug!("Found {}", host.ip);
            if !self.emit(ScanEvent::HostFound(host)).await {
                cancelled = true;
                break;
            }
        }

        in_flight.abort_all();

        let summary = ScanSummary {
            probed: self.probed.load(Ordering::Relaxed),
            found,
            cancelled,
        };
        info!(
            "Job {} {} after {} probes, {} hosts found",
            self.job_id,
            if cancelled { "cancelled" } else { "completed" },
            summary.probed,
            summary.found
        );
        let _ = self.events.send(ScanEvent::Completed(summary)).await;
    }

    fn admit(&self, in_flight: &mut JoinSet<(Ipv4Addr, ProbeOutcome)>, ip: Ipv4Addr, guard: Duration) {
        let probe = self.probe.clone();
        let timeout = self.timeout;
        in_flight.spawn(async move {
            let outcome = match tokio::time::timeout(guard, probe.probe(ip, timeout)).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => {
                    trace!("Probe of {ip} exceeded {guard:?}");
                    ProbeOutcome::Unreachable
                }
            };
            (ip, outcome)
        });
    }

    /// Sends a non-terminal event. Returns `false` when the job was cancelled
    /// or the consumer went away.
    async fn emit(&self, event: ScanEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            sent = self.events.send(event) => sent.is_ok(),
        }
    }
}

/// Hard upper bound for a single probe task.
fn task_guard(timeout: Duration, overhead: Duration) -> Duration {
    timeout + overhead + GUARD_MARGIN
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
