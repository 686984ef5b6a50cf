//! Tracing and logging setup shared by the binary and tests.

pub mod tracing;

pub use self::tracing::{LogFormat, ParseLogFormatError};

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(format: LogFormat) {
    self::tracing::init(format);
}
