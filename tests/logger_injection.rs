use std::sync::{Arc, Mutex};
use std::time::Duration;
use waypoint_router::adapters::outbound::{
    init_buffered_logger, init_console_logger, init_noop_logger, MultiLogger,
};
use waypoint_router::domains::logger::{DomainLogger, DynLogger};

#[derive(Default)]
struct BridgeCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

impl DomainLogger for BridgeCapture {
    fn info(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("INFO:{}", msg));
    }
    fn warn(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("WARN:{}", msg));
    }
    fn error(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("ERR:{}", msg));
    }
}

#[tokio::test]
async fn buffered_logger_forwards_in_order() {
    let capture = Arc::new(BridgeCapture::default());
    let buffered = init_buffered_logger(capture.clone() as DynLogger, 8);

    buffered.info("one");
    buffered.warn("two");
    buffered.error("three");

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(
        *capture.messages.lock().unwrap(),
        vec!["INFO:one", "WARN:two", "ERR:three"]
    );
    assert_eq!(buffered.dropped(), 0);
}

#[tokio::test]
async fn buffered_logger_drops_when_full() {
    let capture = Arc::new(BridgeCapture::default());
    let buffered = init_buffered_logger(capture.clone() as DynLogger, 1);

    // The drain task cannot run before the first await on this runtime.
    for i in 0..5 {
        buffered.warn(&format!("burst {}", i));
    }
    assert_eq!(buffered.dropped(), 4);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*capture.messages.lock().unwrap(), vec!["WARN:burst 0"]);
}

#[test]
fn multi_logger_fans_out_to_every_sink() {
    let first = Arc::new(BridgeCapture::default());
    let second = Arc::new(BridgeCapture::default());
    let multi = MultiLogger::new(vec![
        first.clone() as DynLogger,
        init_noop_logger(),
        second.clone() as DynLogger,
    ]);

    multi.warn("route 3 failed: no path found");
    multi.info("ready");

    for capture in [&first, &second] {
        assert_eq!(
            *capture.messages.lock().unwrap(),
            vec!["WARN:route 3 failed: no path found", "INFO:ready"]
        );
    }
}

#[test]
fn console_and_noop_loggers_accept_everything() {
    let console = init_console_logger();
    console.info("hello");
    console.warn("careful");
    console.error("broken");

    let noop = init_noop_logger();
    noop.info("ignored");
    noop.error("ignored");
}
