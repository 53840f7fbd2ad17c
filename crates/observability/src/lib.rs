//! Process-wide logging setup.

/// Subscriber configuration (filters, formatting).
pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, LogFormat};

/// Environment variable selecting the log format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "MEDRX_LOG_FORMAT";

/// Install the subscriber, JSON unless `MEDRX_LOG_FORMAT=pretty`.
/// Later calls are no-ops.
pub fn init() {
    let format = std::env::var(LOG_FORMAT_ENV)
        .map(|v| LogFormat::parse(&v))
        .unwrap_or_default();
    crate::tracing::init(format);
}
