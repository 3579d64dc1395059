use colored::*;
use unicode_width::UnicodeWidthStr;

use crate::terminal::print::{self, TOTAL_WIDTH};

const BANNER: &str = r#"
   _                                  _
  | | __ _ _ __  _ __  _ __ ___  | |__   ___
  | |/ _` | '_ \| '_ \| '__/ _ \ | '_ \ / _ \
  | | (_| | | | | |_) | | | (_) || |_) |  __/
  |_|\__,_|_| |_| .__/|_|  \___/ |_.__/ \___|
                |_|
"#;

/// Logo followed by the version line. Skipped in quiet mode.
pub fn show(no_banner: bool, quiet: u8) {
    if no_banner || quiet > 0 {
        return;
    }

    for line in BANNER.lines().skip(1) {
        print::print(&format!("{}", line.bright_green()));
    }

    let version = format!("⟦ LANPROBE v{} ⟧ ", env!("CARGO_PKG_VERSION"));
    let sep = "═"
        .repeat(TOTAL_WIDTH.saturating_sub(version.width()) / 2)
        .bright_black();
    print::print(&format!("{sep}{}{sep}", version.bright_green().bold()));
}
