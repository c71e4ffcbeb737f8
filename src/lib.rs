//! Nearest-agent package dispatch with per-agent distance and efficiency reporting.
//!
//! - [`dispatch`]: the assignment and aggregation engine
//! - [`data`]: scenario loading and report export
//! - [`cli`], [`server`]: command line and HTTP entry points

pub mod cli;
pub mod data;
pub mod dispatch;
pub mod logging;
pub mod server;
