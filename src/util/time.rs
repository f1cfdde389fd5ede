//! Time utilities

use std::sync::OnceLock;
use std::time::Instant;

/// Server start time for uptime tracking
static SERVER_START: OnceLock<Instant> = OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}
