//! # Vendor Lookup
//!
//! Maps the OUI prefix of a hardware address to the name of the organisation
//! it was assigned to. Lookups are pure reads of tables that are loaded once
//! per process and never change afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use pnet::util::MacAddr;

use crate::network::mac::{self, OuiPrefix};

static BUILTIN_TABLE: &str = include_str!("../data/oui.tsv");

pub trait VendorRepository: Send + Sync {
    fn get_vendor(&self, prefix: OuiPrefix) -> Option<String>;

    fn vendor_for_mac(&self, mac: MacAddr) -> Option<String> {
        self.get_vendor(mac::oui_prefix(mac))
    }
}

/// OUI prefix to vendor name.
#[derive(Debug, Default, Clone)]
pub struct OuiTable {
    entries: HashMap<OuiPrefix, String>,
}

impl OuiTable {
    /// Reads `AA:BB:CC<TAB>Vendor` lines. Blank lines, `#` comments and lines
    /// that do not parse are skipped. The first entry for a prefix wins.
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((prefix, vendor)) = line.split_once('\t') else {
                tracing::trace!("Skipping OUI line without a tab: {line}");
                continue;
            };
            let vendor = vendor.trim();
            match mac::parse_oui(prefix) {
                Some(prefix) if !vendor.is_empty() => {
                    entries.entry(prefix).or_insert_with(|| vendor.to_string());
                }
                _ => tracing::trace!("Skipping malformed OUI line: {line}"),
            }
        }
        Self { entries }
    }

    /// The table bundled with the crate.
    pub fn builtin() -> &'static OuiTable {
        static TABLE: OnceLock<OuiTable> = OnceLock::new();
        TABLE.get_or_init(|| OuiTable::parse(BUILTIN_TABLE))
    }

    pub fn lookup(&self, prefix: OuiPrefix) -> Option<&str> {
        self.entries.get(&prefix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VendorRepository for OuiTable {
    fn get_vendor(&self, prefix: OuiPrefix) -> Option<String> {
        self.lookup(prefix).map(str::to_string)
    }
}

impl VendorRepository for &'static OuiTable {
    fn get_vendor(&self, prefix: OuiPrefix) -> Option<String> {
        (**self).get_vendor(prefix)
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
