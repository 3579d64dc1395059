use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lanprobe_common::config::Config;
use lanprobe_common::events::ScanEvent;
use lanprobe_common::network::subnet::SubnetDescriptor;
use lanprobe_common::session::{HostList, SessionSnapshot};
use lanprobe_common::vendors::OuiTable;
use lanprobe_core::discovery::DiscoveryService;
use lanprobe_core::neighbors::NullNeighborTable;
use lanprobe_core::probe::{HostProbe, ProbeOutcome, TcpConnectProbe};
use lanprobe_core::scheduler::DiscoveryScheduler;
use lanprobe_core::vendors::MacOuiRepo;
use pnet::util::MacAddr;

/// Alive when the last octet is a multiple of three; latency varies per
/// address so completions arrive out of order.
struct PatternProbe {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    probed: std::sync::Mutex<Vec<Ipv4Addr>>,
}

impl PatternProbe {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            probed: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn is_alive(ip: Ipv4Addr) -> bool {
        ip.octets()[3] % 3 == 0
    }
}

#[async_trait]
impl HostProbe for PatternProbe {
    async fn probe(&self, ip: Ipv4Addr, _timeout: Duration) -> ProbeOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.probed.lock().unwrap().push(ip);

        let jitter = u64::from(ip.octets()[3] % 7);
        tokio::time::sleep(Duration::from_millis(jitter)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if Self::is_alive(ip) {
            let [_, _, c, d] = ip.octets();
            ProbeOutcome::Alive {
                hostname: None,
                mac: Some(MacAddr::new(0xdc, 0xa6, 0x32, 0x00, c, d)),
            }
        } else {
            ProbeOutcome::Unreachable
        }
    }
}

struct SlowProbe;

#[async_trait]
impl HostProbe for SlowProbe {
    async fn probe(&self, _ip: Ipv4Addr, _timeout: Duration) -> ProbeOutcome {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        ProbeOutcome::Unreachable
    }
}

fn lan(prefix: u8) -> (Ipv4Addr, SubnetDescriptor) {
    let ip = Ipv4Addr::new(192, 168, 1, 10);
    (ip, SubnetDescriptor::new(ip, prefix).unwrap())
}

fn service(probe: Arc<dyn HostProbe>, workers: usize) -> DiscoveryService {
    let scheduler = DiscoveryScheduler::new(probe, Arc::new(OuiTable::builtin())).with_workers(workers);
    DiscoveryService::new(scheduler, Duration::from_millis(100))
}

fn closed_loopback_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn full_scan_reports_every_alive_host_once_in_order() {
    let probe = Arc::new(PatternProbe::new());
    let (ip, subnet) = lan(24);

    let hosts: HostList = service(probe.clone(), 32).perform_discovery(ip, subnet).await.unwrap();

    let expected: Vec<Ipv4Addr> = subnet.hosts().filter(|ip| PatternProbe::is_alive(*ip)).collect();
    let found: Vec<Ipv4Addr> = hosts.hosts().map(|h| h.ip).collect();
    assert_eq!(found, expected);

    let summary = hosts.summary().unwrap();
    assert_eq!(summary.probed, 254);
    assert_eq!(summary.found, expected.len() as u64);
    assert!(!summary.cancelled);
    assert_eq!(hosts.progress(), 254);

    let probed = probe.probed.lock().unwrap();
    let unique: HashSet<&Ipv4Addr> = probed.iter().collect();
    assert_eq!(probed.len(), 254);
    assert_eq!(unique.len(), 254);
}

#[tokio::test]
async fn vendors_are_attached_to_found_hosts() {
    let (ip, subnet) = lan(28);
    let hosts = service(Arc::new(PatternProbe::new()), 4)
        .perform_discovery(ip, subnet)
        .await
        .unwrap();

    assert!(!hosts.is_empty());
    for host in hosts.hosts() {
        assert_eq!(host.vendor.as_deref(), Some("Raspberry Pi Trading Ltd"));
    }
}

#[tokio::test]
async fn pool_bound_holds_on_large_subnet() {
    let probe = Arc::new(PatternProbe::new());
    let (ip, subnet) = lan(22);

    let hosts = service(probe.clone(), 16).perform_discovery(ip, subnet).await.unwrap();

    assert_eq!(hosts.progress(), 1022);
    let peak = probe.peak.load(Ordering::SeqCst);
    assert!(peak <= 16, "peak concurrency was {peak}");
}

#[tokio::test]
async fn cancelled_scan_can_be_followed_by_a_new_one() {
    let (ip, subnet) = lan(24);
    let mut slow = service(Arc::new(SlowProbe), 8);
    let mut job = slow.start(ip, subnet).unwrap();
    slow.cancel_active();

    let mut events = Vec::new();
    while let Some(event) = tokio::time::timeout(Duration::from_secs(5), job.next_event())
        .await
        .unwrap()
    {
        events.push(event);
    }
    assert_eq!(events.len(), 1);
    match &events[0] {
        ScanEvent::Completed(summary) => assert!(summary.cancelled),
        other => panic!("unexpected {other:?}"),
    }

    let hosts = service(Arc::new(PatternProbe::new()), 8)
        .perform_discovery(ip, SubnetDescriptor::new(ip, 30).unwrap())
        .await
        .unwrap();
    assert!(hosts.is_complete());
}

#[tokio::test]
async fn results_survive_a_snapshot_round_trip() {
    let (ip, subnet) = lan(26);
    let hosts = service(Arc::new(PatternProbe::new()), 8)
        .perform_discovery(ip, subnet)
        .await
        .unwrap();

    let path = std::env::temp_dir().join(format!("lanprobe-it-{}.json", std::process::id()));
    hosts.snapshot().save(&path).unwrap();
    let restored = HostList::restore(SessionSnapshot::load(&path).unwrap());
    std::fs::remove_file(&path).unwrap();

    assert_eq!(restored.snapshot(), hosts.snapshot());
}

#[tokio::test]
async fn loopback_scan_with_real_probe() {
    let probe = TcpConnectProbe::new(closed_loopback_port()).with_neighbors(Arc::new(NullNeighborTable));
    let scheduler = DiscoveryScheduler::new(Arc::new(probe), Arc::new(MacOuiRepo)).with_workers(4);
    let mut service = DiscoveryService::new(scheduler, Duration::from_millis(500));

    let localhost = Ipv4Addr::LOCALHOST;
    let subnet = SubnetDescriptor::new(localhost, 30).unwrap();
    let hosts = service.perform_discovery(localhost, subnet).await.unwrap();

    assert_eq!(hosts.progress(), 2);
    let first = hosts.hosts().next().expect("localhost should answer");
    assert_eq!(first.ip, localhost);
    assert_eq!(first.mac, None);
}

#[tokio::test]
async fn service_from_config_scans_localhost() {
    let config = Config {
        no_dns: true,
        probe_port: closed_loopback_port(),
        timeout: Duration::from_millis(500),
        ..Config::default()
    };
    let mut service = DiscoveryService::from_config(&config).unwrap();

    let localhost = Ipv4Addr::LOCALHOST;
    let hosts = service
        .perform_discovery(localhost, SubnetDescriptor::new(localhost, 32).unwrap())
        .await
        .unwrap();

    let found: Vec<Ipv4Addr> = hosts.hosts().map(|h| h.ip).collect();
    assert_eq!(found, vec![localhost]);
}
