use std::net::SocketAddr;
use std::time::Duration;

use colored::*;
use lanprobe_common::{error, success};
use lanprobe_core::dns::DnsLookup;
use lanprobe_core::resolver::DnsClient;

use crate::terminal::{colors, print};

pub async fn dns(domain: &str, record_type: &str, timeout: Duration, nameserver: Option<SocketAddr>, quiet: u8) -> anyhow::Result<()> {
    let client = match nameserver {
        Some(nameserver) => DnsClient::new(nameserver, timeout),
        None => DnsClient::from_system(timeout),
    };
    let lookup = DnsLookup::new(client);
    let rx = lookup.resolve(domain, record_type)?;

    if quiet == 0 {
        print::aligned_line("Server", lookup.client().nameserver().to_string());
        print::aligned_line("Query", format!("{} {}", record_type.to_uppercase(), domain));
    }

    let records = match rx.await? {
        Ok(records) => records,
        Err(e) => {
            error!("Lookup of {domain} failed: {e}");
            return Ok(());
        }
    };

    print::header("answers", quiet);
    let details: Vec<(String, ColoredString)> = records
        .iter()
        .map(|record| {
            (
                record.record_type().to_string(),
                record.to_string().color(colors::PRIMARY),
            )
        })
        .collect();
    print::as_tree_one_level(&details);
    success!("{} records for {}", records.len(), domain.bold());
    Ok(())
}
