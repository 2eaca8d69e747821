use crate::domains::logger::{DomainLogger, DynLogger, LogLevel};
use std::sync::Arc;

/// Fans every notification out to all sinks in order.
pub struct MultiLogger {
    sinks: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(sinks: Vec<DynLogger>) -> Self {
        Self { sinks }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.error(msg));
    }
}

/// Console plus, when `path` is given and the file backend starts, a log file.
pub fn init_combined_logger(path: Option<&str>, level: LogLevel) -> DynLogger {
    let console = super::console_logger::init_console_logger();
    let Some(path) = path else {
        return console;
    };
    match super::file_logger::init_file_logger(path, level) {
        Ok(file) => Arc::new(MultiLogger::new(vec![console, file])),
        Err(e) => {
            tracing::warn!("{}, notifications go to the console only", e);
            console
        }
    }
}
