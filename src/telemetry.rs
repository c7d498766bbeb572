//! Telemetry utilities for dispatch timing and tracing spans.

use std::time::{Duration, Instant};
use tracing::warn;

/// Dispatches slower than this hold up every other event and get a warning.
pub const SLOW_DISPATCH: Duration = Duration::from_millis(250);

/// Guard for timing one event dispatch.
///
/// Warns when dropped if the subscribers took longer than [`SLOW_DISPATCH`].
pub struct DispatchTimer {
    kind: &'static str,
    start: Instant,
}

impl DispatchTimer {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            start: Instant::now(),
        }
    }
}

impl Drop for DispatchTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if elapsed > SLOW_DISPATCH {
            warn!(
                kind = self.kind,
                elapsed_ms = elapsed.as_millis() as u64,
                "slow event dispatch"
            );
        }
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span, trace_span};

    /// Span for the lifetime of a server connection.
    pub fn connection(address: &str, nick: &str) -> Span {
        info_span!("connection", address = %address, nick = %nick)
    }

    /// Span for one event travelling through the bus.
    pub fn dispatch(category: &str, kind: &str) -> Span {
        trace_span!("dispatch", category = %category, kind = %kind)
    }
}
