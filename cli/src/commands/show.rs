use std::path::Path;

use lanprobe_common::session::{HostList, SessionSnapshot};

use crate::terminal::{network_fmt, print};

pub fn show(file: &Path, quiet: u8) -> anyhow::Result<()> {
    let snapshot = SessionSnapshot::load(file)?;
    let hosts = HostList::restore(snapshot);

    if let Some(external_ip) = hosts.external_ip()
        && quiet == 0
    {
        print::aligned_line("External", external_ip);
    }
    network_fmt::print_host_list(&hosts, None, quiet);
    Ok(())
}
