use std::ffi::{CStr, CString};
use std::ptr;

use hello_addon::AddonError;
use hello_addon::error::{hello_error_free, hello_error_message, hello_error_t};
use hello_addon::logging::{self, LogConfig, hello_log_config_t, hello_log_init, hello_log_level_t};
use log::{Log, Metadata, Record};

struct HostLogger;

impl Log for HostLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, _record: &Record) {}

    fn flush(&self) {}
}

static HOST_LOGGER: HostLogger = HostLogger;

#[test]
fn foreign_logger_is_reported_as_conflict() {
    log::set_logger(&HOST_LOGGER).unwrap();

    let err = logging::init(LogConfig {
        filter: Some("info".into()),
        ..LogConfig::default()
    })
    .unwrap_err();
    assert!(matches!(err, AddonError::LoggerConflict));

    let filter = CString::new("info").unwrap();
    let config = hello_log_config_t {
        level: hello_log_level_t::HELLO_LOG_LEVEL_INFO,
        filter: filter.as_ptr(),
        callback: None,
        user_data: ptr::null_mut(),
    };
    let mut error: *mut hello_error_t = ptr::null_mut();
    assert!(!hello_log_init(&config, &mut error));
    let message = unsafe { CStr::from_ptr(hello_error_message(error)) };
    assert_eq!(
        message.to_str().unwrap(),
        "logging already initialized by another logger"
    );
    hello_error_free(error);
}
