//! # lanprobe-core
//!
//! The concurrent discovery engine: liveness probes, the bounded scheduler
//! that drives them over a subnet, DNS lookups and the vendor database.

pub mod discovery;
pub mod dns;
pub mod neighbors;
pub mod probe;
pub mod resolver;
pub mod scheduler;
pub mod vendors;
