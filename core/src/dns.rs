//! # DNS Lookup
//!
//! Single-shot lookups for the interactive front end. Input is validated
//! before anything touches the network; the query then runs on its own task
//! and delivers exactly one result.

use std::net::IpAddr;
use std::time::Duration;

use lanprobe_common::error::DiscoveryError;
use lanprobe_protocols::dns::{self, RecordType};
use tokio::sync::oneshot;
use tracing::debug;

use crate::resolver::{DnsClient, LookupResult};

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Clone)]
pub struct DnsLookup {
    client: DnsClient,
}

impl DnsLookup {
    pub fn new(client: DnsClient) -> Self {
        Self { client }
    }

    pub fn from_system(timeout: Duration) -> Self {
        Self::new(DnsClient::from_system(timeout))
    }

    pub fn client(&self) -> &DnsClient {
        &self.client
    }

    /// Parses `record_type` and starts the lookup.
    pub fn resolve(
        &self,
        domain: &str,
        record_type: &str,
    ) -> Result<oneshot::Receiver<LookupResult>, DiscoveryError> {
        let record_type: RecordType = record_type.parse()?;
        self.resolve_record(domain, record_type)
    }

    /// Must be called from within a Tokio runtime, otherwise fails with
    /// [`DiscoveryError::InvalidArgument`].
    pub fn resolve_record(
        &self,
        domain: &str,
        record_type: RecordType,
    ) -> Result<oneshot::Receiver<LookupResult>, DiscoveryError> {
        let name = query_name(domain, record_type)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| DiscoveryError::invalid("lookups must be started inside a Tokio runtime"))?;
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();

        debug!("Resolving {record_type} {name} via {}", client.nameserver());
        runtime.spawn(async move {
            let result = client.query(&name, record_type).await;
            let _ = tx.send(result);
        });

        Ok(rx)
    }
}

/// The name actually sent on the wire: PTR lookups of an address literal are
/// rewritten to the reverse zone.
pub fn query_name(domain: &str, record_type: RecordType) -> Result<String, DiscoveryError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(DiscoveryError::invalid("domain must not be empty"));
    }

    if record_type == RecordType::Ptr
        && let Ok(ip) = domain.parse::<IpAddr>()
    {
        return Ok(dns::reverse_address_to_ptr(&ip));
    }

    let name = domain.trim_end_matches('.');
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(DiscoveryError::invalid(format!("'{domain}' is not a valid domain name")));
    }
    if name.split('.').any(|label| label.is_empty() || label.len() > MAX_LABEL_LEN) {
        return Err(DiscoveryError::invalid(format!("'{domain}' has an empty or oversized label")));
    }
    Ok(name.to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
