//! Logging setup.

use pdzs::logging::{LoggingGuard, LOG_FILE_PREFIX};

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn production_logging_creates_the_logs_dir() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let logs_dir = tmp.path().join("state").join("logs");
    assert!(!logs_dir.exists());

    // only test in this binary that installs the global subscriber
    let guard = pdzs::logging::init_production(&logs_dir).expect("logging installs");
    tracing::info!(chat_id = -100_i64, "logging smoke test");
    drop(guard);

    assert!(logs_dir.is_dir());
    let written = std::fs::read_dir(&logs_dir)
        .expect("read logs dir")
        .filter_map(Result::ok)
        .any(|entry| entry.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX));
    assert!(written, "a {LOG_FILE_PREFIX} file should exist");
}
