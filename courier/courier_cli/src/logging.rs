//! Log output setup for the binary.

use courier_core::LogLevel;

/// Route `log` records at `level` and above to stderr.
pub fn init(level: LogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis()
        .try_init();
}
