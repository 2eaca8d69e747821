use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Forwards notifications to `tracing` so they show up next to diagnostics.
pub struct ConsoleLogger;

impl DomainLogger for ConsoleLogger {
    fn info(&self, msg: &str) {
        tracing::info!(target: "waypoint_router::notify", "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "waypoint_router::notify", "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "waypoint_router::notify", "{}", msg);
    }
}

pub fn init_console_logger() -> DynLogger {
    Arc::new(ConsoleLogger)
}
