use std::path::Path;
use std::time::Duration;
use waypoint_router::adapters::outbound::init_file_logger;
use waypoint_router::domains::logger::LogLevel;

// Installs the process-wide `log` backend, so it lives in its own test binary.
#[test]
fn file_logger_writes_into_the_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notifications.log");
    let path_str = path.to_str().unwrap();

    let logger = init_file_logger(path_str, LogLevel::Info).unwrap();
    logger.warn("route 1 failed: no path found");
    logger.info("route 2 applied");
    log::logger().flush();
    std::thread::sleep(Duration::from_millis(200));

    assert!(Path::new(&path).exists());
}
