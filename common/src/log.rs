//! Logging macros used across the workspace.
//!
//! They are thin wrappers around [`tracing`] so front ends decide how events
//! are rendered. `success!` is an `INFO` event on its own target, which lets a
//! formatter give positive outcomes a distinct marker.

pub const SUCCESS_TARGET: &str = "lanprobe::success";

#[doc(hidden)]
pub use tracing as __tracing;

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log::__tracing::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::log::__tracing::info!(target: "lanprobe::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log::__tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log::__tracing::error!($($arg)*)
    };
}
