//! hg64-tools: command line exploration and benchmarking for hg64.
//!
//! everything here goes through the public hg64 api only.

pub mod config;
pub mod data;
pub mod explore;
pub mod report;
pub mod sigs;

use std::io::Write;

/// initialises `env_logger` with nanosecond timestamps.
///
/// defaults to `info`, override with `RUST_LOG`.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = buf.timestamp_nanos();
            writeln!(
                buf,
                "[{} {:5} {}:{}] {}",
                ts,
                record.level(),
                record.module_path().unwrap_or(""),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}
