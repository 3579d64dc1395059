use std::time::Duration;

use colored::*;
use lanprobe_common::events::ScanSummary;
use lanprobe_common::session::HostList;
use lanprobe_common::success;

use crate::mprint;
use crate::terminal::{colors, format, print};

const NO_RESULTS: &str = r#"
         _   _  ___    _   _  ___  ___ _____ ___
        | \ | |/ _ \  | | | |/ _ \/ __|_   _/ __|
        |  \| | (_) | | |_| | (_) \__ \ | | \__ \
        |_|\__|\___/  |_| |_|\___/|___/ |_| |___/
"#;

/// Prints the host tree in address order, followed by the summary line.
pub fn print_host_list(hosts: &HostList, elapsed: Option<Duration>, quiet: u8) {
    if hosts.is_empty() {
        print::header("zero hosts detected", quiet);
        print::print(&format!("{}", NO_RESULTS.red().bold()));
        return;
    }

    if quiet > 0 {
        mprint!();
    }

    print::header("network discovery", quiet);
    for (idx, host) in hosts.hosts().enumerate() {
        if quiet < 2 {
            let index = format!("[{}]", idx.to_string().color(colors::ACCENT));
            print::print(&format!("{} {}", index.color(colors::SEPARATOR), format::hostname(host)));
            print::as_tree_one_level(&format::host_details(host));
        }
        if idx + 1 != hosts.len() && quiet < 2 {
            mprint!();
        }
    }
    print_summary(hosts.len(), elapsed, quiet);
}

fn print_summary(hosts_len: usize, elapsed: Option<Duration>, quiet: u8) {
    let active_hosts: ColoredString = format!("{hosts_len} active hosts").bold().green();
    let text = match elapsed {
        Some(elapsed) => {
            let total_time: ColoredString = format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow();
            format!("Discovery Complete: {active_hosts} identified in {total_time}")
        }
        None => format!("Session holds {active_hosts}"),
    };
    let output: ColoredString = text.color(colors::TEXT_DEFAULT);

    match quiet {
        0 => {
            let text = output.to_string();
            let pad = " ".repeat(print::TOTAL_WIDTH.saturating_sub(console::measure_text_width(&text)) / 2);
            print::print(&print::rule('═').to_string());
            print::print(&format!("{pad}{text}{pad}"));
        }
        _ => {
            mprint!();
            success!("{}", output)
        }
    }
}

/// One line describing how a scan ended early, if it did.
pub fn cancellation_notice(summary: &ScanSummary, total: u64) -> Option<String> {
    if !summary.cancelled {
        return None;
    }
    Some(format!(
        "Discovery cancelled after probing {} of {} addresses",
        summary.probed, total
    ))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
