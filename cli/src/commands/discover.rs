use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use indicatif::ProgressStyle;
use lanprobe_common::config::Config;
use lanprobe_common::events::ScanEvent;
use lanprobe_common::network::interface;
use lanprobe_common::session::HostList;
use lanprobe_common::{info, success, warn};
use lanprobe_core::discovery::DiscoveryService;
use tracing::info_span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::commands::Target;
use crate::terminal::{format, input::KeyWatcher, network_fmt, print};

const BAR_TEMPLATE: &str = "{spinner:.blue} [{bar:32.green/bright_black}] {pos}/{len} {msg}";

pub async fn discover(target: Option<Target>, cfg: &Config, save: Option<&Path>) -> anyhow::Result<()> {
    let target = match target {
        Some(target) => target,
        None => {
            let lan = interface::get_lan_network()?;
            info!("Using {} ({}/{})", lan.interface, lan.ip, lan.prefix_len);
            Target {
                ip: lan.ip,
                descriptor: lan.descriptor()?,
            }
        }
    };

    let mut service = DiscoveryService::from_config(cfg)?;
    let mut job = service.start(target.ip, target.descriptor)?;
    let total = job.total();
    if cfg.quiet == 0 {
        print::GLOBAL_KEY_WIDTH.set(7);
        print::aligned_line("Subnet", format::subnet(&target.descriptor));
        print::aligned_line("Targets", total.to_string());
    }

    let span = info_span!("discovery", indicatif.pb_show = true);
    span.pb_set_style(&ProgressStyle::with_template(BAR_TEMPLATE)?.progress_chars("=> "));
    span.pb_set_length(total);
    span.pb_set_message("press 'q' to stop");
    let guard = span.enter();

    let watcher = KeyWatcher::spawn(job.canceller());
    let canceller = job.canceller();
    let start_time: Instant = Instant::now();
    let mut hosts = HostList::new();

    loop {
        let event = tokio::select! {
            event = job.next_event() => event,
            _ = tokio::signal::ctrl_c() => {
                canceller.cancel();
                continue;
            }
        };
        let Some(event) = event else { break };

        match &event {
            ScanEvent::Progress { delta } => span.pb_inc(u64::from(*delta)),
            ScanEvent::HostFound(host) => {
                span.pb_set_message(&format!("{} hosts so far, latest {}", hosts.len() + 1, host.ip));
            }
            ScanEvent::Completed(_) => {}
        }
        hosts.apply(event);
    }

    drop(watcher);
    drop(guard);
    drop(span);

    let elapsed: Duration = start_time.elapsed();
    if let Some(notice) = hosts
        .summary()
        .and_then(|summary| network_fmt::cancellation_notice(&summary, total))
    {
        warn!("{notice}");
    }

    network_fmt::print_host_list(&hosts, Some(elapsed), cfg.quiet);

    if let Some(path) = save {
        hosts
            .snapshot()
            .save(path)
            .with_context(|| format!("saving results to {}", path.display()))?;
        success!("Saved {} hosts to {}", hosts.len(), path.display().to_string().bold());
    }

    Ok(())
}
