//! Line-oriented terminal output.
//!
//! Every line goes through [`print`], which hands it to the tracing
//! formatter so output never tears the progress bar.

use std::cell::Cell;
use std::fmt::Display;

use colored::*;
use tracing::info;

use crate::terminal::colors;
use crate::terminal::logging::PRINT_TARGET;

pub const TOTAL_WIDTH: usize = 64;
const TREE_KEY_WIDTH: usize = 7;

thread_local! {
    /// Width the keys of [`aligned_line`] are padded to.
    pub static GLOBAL_KEY_WIDTH: Cell<usize> = const { Cell::new(0) }
}

#[macro_export]
macro_rules! mprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, "{msg}");
}

/// A full-width line drawn with `ch`.
pub fn rule(ch: char) -> ColoredString {
    ch.to_string().repeat(TOTAL_WIDTH).color(colors::SEPARATOR)
}

/// `──⟦ TITLE ⟧──` centred on the line. Hidden in quiet mode.
pub fn header(title: &str, quiet: u8) {
    if quiet > 0 {
        return;
    }

    let label = format!("⟦ {} ⟧", title.to_uppercase());
    let fill = TOTAL_WIDTH.saturating_sub(label.chars().count());
    let left = "─".repeat(fill / 2).color(colors::SEPARATOR);
    let right = "─".repeat(fill - fill / 2).color(colors::SEPARATOR);
    print(&format!("{left}{}{right}", label.bright_green()));
}

/// `> Key....: value` with keys padded to [`GLOBAL_KEY_WIDTH`].
pub fn aligned_line(key: &str, value: impl Display) {
    let dots = ".".repeat((GLOBAL_KEY_WIDTH.get() + 1).saturating_sub(key.len()));
    print(&format!(
        "{} {}{}{} {}",
        ">".color(colors::SEPARATOR),
        key.color(colors::PRIMARY),
        dots.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR),
        value.to_string().color(colors::TEXT_DEFAULT)
    ));
}

/// One indented level of `├─ key..: value` lines.
pub fn as_tree_one_level(details: &[(String, ColoredString)]) {
    for (i, (key, value)) in details.iter().enumerate() {
        let branch = if i + 1 == details.len() { "└─" } else { "├─" };
        let dots = ".".repeat(TREE_KEY_WIDTH.saturating_sub(key.len()));
        print(&format!(
            " {} {}{}{} {}",
            branch.bright_black(),
            key.color(colors::TEXT_DEFAULT),
            dots.color(colors::SEPARATOR),
            ":".color(colors::SEPARATOR),
            value
        ));
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
