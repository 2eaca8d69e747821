use crate::domains::logger::{DomainLogger, DynLogger, LogLevel};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

struct Entry {
    level: LogLevel,
    msg: String,
}

/// Hands notifications to a background task so the map session never waits
/// on a slow sink. Messages are dropped, and counted, when the queue is full.
pub struct BufferedLogger {
    sender: mpsc::Sender<Entry>,
    dropped: Arc<AtomicU64>,
}

impl BufferedLogger {
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, level: LogLevel, msg: &str) {
        let entry = Entry {
            level,
            msg: msg.to_string(),
        };
        if self.sender.try_send(entry).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl DomainLogger for BufferedLogger {
    fn info(&self, msg: &str) {
        self.push(LogLevel::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(LogLevel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(LogLevel::Error, msg);
    }
}

/// Wrap `sink` in a queue of `capacity` entries drained on the current tokio runtime.
pub fn init_buffered_logger(sink: DynLogger, capacity: usize) -> Arc<BufferedLogger> {
    let (sender, mut receiver) = mpsc::channel::<Entry>(capacity.max(1));
    tokio::spawn(async move {
        while let Some(entry) = receiver.recv().await {
            match entry.level {
                LogLevel::Error => sink.error(&entry.msg),
                LogLevel::Warn => sink.warn(&entry.msg),
                LogLevel::Info | LogLevel::Debug => sink.info(&entry.msg),
            }
        }
    });
    Arc::new(BufferedLogger {
        sender,
        dropped: Arc::new(AtomicU64::new(0)),
    })
}
