//! # lanprobe-common
//!
//! Shared vocabulary of the workspace: the scan data model, input validation
//! errors, configuration, the vendor table and the result sink consumed by
//! front ends.

pub mod config;
pub mod error;
pub mod events;
pub mod log;
pub mod network;
pub mod session;
pub mod vendors;
