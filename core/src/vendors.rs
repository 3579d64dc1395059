use std::sync::OnceLock;

use lanprobe_common::network::mac::OuiPrefix;
use lanprobe_common::vendors::{OuiTable, VendorRepository};
use mac_oui::Oui;
use tracing::warn;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                warn!("Failed to load OUI database, using the bundled table: {e:?}");
                None
            }
        })
        .as_ref()
}

/// IEEE assignments from the `mac_oui` database, backed by the bundled table
/// for prefixes the database does not know.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacOuiRepo;

impl VendorRepository for MacOuiRepo {
    fn get_vendor(&self, prefix: OuiPrefix) -> Option<String> {
        let from_db = get_oui_db().and_then(|db| {
            let mac_str = format!("{:02x}:{:02x}:{:02x}:00:00:00", prefix[0], prefix[1], prefix[2]);
            match db.lookup_by_mac(&mac_str) {
                Ok(Some(entry)) => Some(entry.company_name.clone()),
                _ => None,
            }
        });
        from_db.or_else(|| OuiTable::builtin().get_vendor(prefix))
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

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::util::MacAddr;

    #[test]
    fn raspberry_pi_prefix_resolves() {
        let mac = MacAddr::new(0xb8, 0x27, 0xeb, 0x12, 0x34, 0x56);
        let vendor = MacOuiRepo.vendor_for_mac(mac).unwrap();
        assert!(vendor.contains("Raspberry"), "unexpected vendor {vendor}");
    }

    #[test]
    fn locally_administered_prefix_is_unknown() {
        assert_eq!(MacOuiRepo.get_vendor([0xfe, 0xed, 0xfa]), None);
    }

    #[test]
    fn lookups_are_stable() {
        let first = MacOuiRepo.get_vendor([0x00, 0x1b, 0x63]);
        assert!(first.is_some());
        assert_eq!(MacOuiRepo.get_vendor([0x00, 0x1b, 0x63]), first);
    }
}
