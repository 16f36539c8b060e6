//! Tests for `src/logging.rs`.

use skynet::logging::LoggingGuard;

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn init_production_creates_logs_dir() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let logs_dir = tmp.path().join("logs");
    assert!(!logs_dir.exists());

    // Only one global subscriber per process; the directory is created
    // before installation is attempted, so it exists either way.
    let _result = skynet::logging::init_production(&logs_dir, "info");
    assert!(logs_dir.exists(), "logs directory should be created");
}

#[test]
fn init_production_rejects_unusable_dir() {
    let file = tempfile::NamedTempFile::new().expect("should create temp file");
    let result = skynet::logging::init_production(&file.path().join("logs"), "info");
    assert!(result.is_err());
}
