pub mod banner;
pub mod colors;
pub mod format;
pub mod input;
pub mod logging;
pub mod network_fmt;
pub mod print;
