//! Logging for the addon, routed through the `log` facade.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Once, RwLock};

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

use crate::error::{
    AddonError, Result, clear_error, cstring_from_str_lossy, hello_error_t, write_error,
};

const LOGGER_STATE_UNINIT: u8 = 0;
const LOGGER_STATE_READY: u8 = 1;
const LOGGER_STATE_FAILED: u8 = 2;

/// Target that the level-only configuration applies to.
pub const DEFAULT_TARGET: &str = "hello_addon";

static LOGGER_STATE: AtomicU8 = AtomicU8::new(LOGGER_STATE_UNINIT);
static LOGGER_INIT: Once = Once::new();
static ADDON_LOGGER: Lazy<AddonLogger> = Lazy::new(AddonLogger::new);

/// Log level values for addon logging.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(C)]
pub enum hello_log_level_t {
    HELLO_LOG_LEVEL_OFF = 0,
    HELLO_LOG_LEVEL_ERROR = 1,
    HELLO_LOG_LEVEL_WARN = 2,
    HELLO_LOG_LEVEL_INFO = 3,
    HELLO_LOG_LEVEL_DEBUG = 4,
    HELLO_LOG_LEVEL_TRACE = 5,
}

impl From<hello_log_level_t> for LevelFilter {
    fn from(value: hello_log_level_t) -> Self {
        match value {
            hello_log_level_t::HELLO_LOG_LEVEL_OFF => LevelFilter::Off,
            hello_log_level_t::HELLO_LOG_LEVEL_ERROR => LevelFilter::Error,
            hello_log_level_t::HELLO_LOG_LEVEL_WARN => LevelFilter::Warn,
            hello_log_level_t::HELLO_LOG_LEVEL_INFO => LevelFilter::Info,
            hello_log_level_t::HELLO_LOG_LEVEL_DEBUG => LevelFilter::Debug,
            hello_log_level_t::HELLO_LOG_LEVEL_TRACE => LevelFilter::Trace,
        }
    }
}

impl From<Level> for hello_log_level_t {
    fn from(value: Level) -> Self {
        match value {
            Level::Error => hello_log_level_t::HELLO_LOG_LEVEL_ERROR,
            Level::Warn => hello_log_level_t::HELLO_LOG_LEVEL_WARN,
            Level::Info => hello_log_level_t::HELLO_LOG_LEVEL_INFO,
            Level::Debug => hello_log_level_t::HELLO_LOG_LEVEL_DEBUG,
            Level::Trace => hello_log_level_t::HELLO_LOG_LEVEL_TRACE,
        }
    }
}

/// Log record delivered to a C callback.
///
/// String pointers are only valid for the duration of the callback and must not be retained.
/// `module_path` and `file` may be null when unavailable. `line` is 0 when unknown.
#[repr(C)]
pub struct hello_log_record_t {
    pub level: hello_log_level_t,
    pub target: *const c_char,
    pub message: *const c_char,
    pub module_path: *const c_char,
    pub file: *const c_char,
    pub line: u32,
}

/// Callback invoked for each log record emitted by the addon.
///
/// The callback may be invoked from any thread that emits a log record.
#[allow(non_camel_case_types)]
pub type hello_log_callback_t =
    Option<extern "C" fn(record: *const hello_log_record_t, user_data: *mut c_void)>;

/// Configuration for initializing addon logging from C.
///
/// A non-null `filter` is parsed as a `RUST_LOG`-style string and overrides `level`.
/// A null `callback` sends records to stderr; otherwise `user_data` is forwarded unchanged.
#[repr(C)]
pub struct hello_log_config_t {
    pub level: hello_log_level_t,
    pub filter: *const c_char,
    pub callback: hello_log_callback_t,
    pub user_data: *mut c_void,
}

/// Rust-side logging configuration.
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub filter: Option<String>,
    pub sink: LogSink,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            filter: None,
            sink: LogSink::Stderr,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum LogSink {
    Stderr,
    Callback {
        callback: extern "C" fn(*const hello_log_record_t, *mut c_void),
        user_data: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
struct TargetFilter {
    target: String,
    level: LevelFilter,
}

#[derive(Clone, Debug, PartialEq)]
struct LogFilter {
    default: LevelFilter,
    directives: Vec<TargetFilter>,
}

impl LogFilter {
    fn for_level(level: LevelFilter) -> Self {
        Self {
            default: LevelFilter::Off,
            directives: vec![TargetFilter {
                target: DEFAULT_TARGET.to_string(),
                level,
            }],
        }
    }

    fn parse(spec: &str) -> std::result::Result<Self, String> {
        let mut default = LevelFilter::Off;
        let mut directives = Vec::new();

        for (index, raw) in spec.split(',').enumerate() {
            let directive = raw.trim();
            if directive.is_empty() {
                continue;
            }
            let (target, level) = match directive.split_once('=') {
                Some((target, level)) => (target.trim(), Some(level.trim())),
                None => (directive, None),
            };
            if target.is_empty() {
                return Err(format!("empty log directive at position {index}"));
            }

            match level {
                Some("") => return Err(format!("missing log level for target `{target}`")),
                Some(level) => {
                    let level =
                        parse_level(level).ok_or_else(|| format!("invalid level `{level}`"))?;
                    directives.push(TargetFilter {
                        target: target.to_string(),
                        level,
                    });
                }
                None => match parse_level(target) {
                    Some(level) => default = level,
                    None => directives.push(TargetFilter {
                        target: target.to_string(),
                        level: LevelFilter::Trace,
                    }),
                },
            }
        }

        Ok(Self { default, directives })
    }

    fn enabled(&self, metadata: &Metadata) -> bool {
        // Longest matching target prefix wins.
        let level = self
            .directives
            .iter()
            .filter(|directive| metadata.target().starts_with(&directive.target))
            .max_by_key(|directive| directive.target.len())
            .map_or(self.default, |directive| directive.level);
        metadata.level().to_level_filter() <= level
    }

    fn max_level(&self) -> LevelFilter {
        self.directives
            .iter()
            .map(|directive| directive.level)
            .fold(self.default, std::cmp::max)
    }
}

struct LoggerConfig {
    filter: LogFilter,
    sink: LogSink,
}

struct AddonLogger {
    config: RwLock<LoggerConfig>,
}

impl AddonLogger {
    fn new() -> Self {
        Self {
            config: RwLock::new(LoggerConfig {
                filter: LogFilter::for_level(LevelFilter::Info),
                sink: LogSink::Stderr,
            }),
        }
    }

    fn update(&self, config: LoggerConfig) {
        let mut guard = self.config.write().unwrap_or_else(|err| err.into_inner());
        *guard = config;
    }

    fn with_config<T>(&self, f: impl FnOnce(&LoggerConfig) -> T) -> T {
        let guard = self.config.read().unwrap_or_else(|err| err.into_inner());
        f(&guard)
    }
}

impl Log for AddonLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.with_config(|config| config.filter.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        let (sink, enabled) =
            self.with_config(|config| (config.sink, config.filter.enabled(record.metadata())));
        if !enabled {
            return;
        }

        match sink {
            LogSink::Callback { callback, user_data } => {
                let target = cstring_from_str_lossy(record.target());
                let message = cstring_from_str_lossy(&record.args().to_string());
                let module_path = record.module_path().map(cstring_from_str_lossy);
                let file = record.file().map(cstring_from_str_lossy);
                let c_record = hello_log_record_t {
                    level: record.level().into(),
                    target: target.as_ptr(),
                    message: message.as_ptr(),
                    module_path: module_path.as_ref().map_or(ptr::null(), |value| value.as_ptr()),
                    file: file.as_ref().map_or(ptr::null(), |value| value.as_ptr()),
                    line: record.line().unwrap_or(0),
                };
                callback(&c_record, user_data as *mut c_void);
            }
            LogSink::Stderr => {
                eprintln!("{} {}: {}", record.level(), record.target(), record.args());
            }
        }
    }

    fn flush(&self) {}
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

fn invalid_filter(filter: String, reason: String) -> AddonError {
    AddonError::InvalidLogFilter { filter, reason }
}

fn resolve_filter(config: &LogConfig, env_filter: Option<String>) -> Result<LogFilter> {
    match config.filter.clone().or(env_filter) {
        Some(filter) => LogFilter::parse(&filter).map_err(|reason| invalid_filter(filter, reason)),
        None => Ok(LogFilter::for_level(config.level)),
    }
}

fn ensure_logger() -> Result<()> {
    LOGGER_INIT.call_once(|| {
        let state = match log::set_logger(&*ADDON_LOGGER) {
            Ok(()) => LOGGER_STATE_READY,
            Err(_) => LOGGER_STATE_FAILED,
        };
        LOGGER_STATE.store(state, Ordering::SeqCst);
    });

    match LOGGER_STATE.load(Ordering::SeqCst) {
        LOGGER_STATE_READY => Ok(()),
        _ => Err(AddonError::LoggerConflict),
    }
}

/// Installs the addon logger, or reconfigures it if already installed.
///
/// `config.filter` wins over `RUST_LOG`, which wins over `config.level`.
pub fn init(config: LogConfig) -> Result<()> {
    let filter = resolve_filter(&config, std::env::var("RUST_LOG").ok())?;
    ensure_logger()?;

    let max_level = filter.max_level();
    ADDON_LOGGER.update(LoggerConfig {
        filter,
        sink: config.sink,
    });
    log::set_max_level(max_level);
    Ok(())
}

fn read_optional_cstr(value: *const c_char) -> Option<String> {
    if value.is_null() {
        return None;
    }
    // Safety: caller guarantees a valid, NUL-terminated C string.
    let cstr = unsafe { CStr::from_ptr(value) };
    Some(cstr.to_string_lossy().into_owned())
}

impl From<&hello_log_config_t> for LogConfig {
    fn from(config: &hello_log_config_t) -> Self {
        Self {
            level: config.level.into(),
            filter: read_optional_cstr(config.filter),
            sink: match config.callback {
                Some(callback) => LogSink::Callback {
                    callback,
                    user_data: config.user_data as usize,
                },
                None => LogSink::Stderr,
            },
        }
    }
}

/// Initializes default logging configuration values.
///
/// The defaults select INFO logging for the addon and use no callback.
#[unsafe(no_mangle)]
pub extern "C" fn hello_log_config_init(config: *mut hello_log_config_t) {
    if config.is_null() {
        return;
    }
    // Safety: caller provided a writable config pointer.
    unsafe {
        *config = hello_log_config_t {
            level: hello_log_level_t::HELLO_LOG_LEVEL_INFO,
            filter: ptr::null(),
            callback: None,
            user_data: ptr::null_mut(),
        };
    }
}

/// Initializes logging for the addon.
///
/// If `config` is null, defaults are used. May be called again to update the
/// configuration.
#[unsafe(no_mangle)]
pub extern "C" fn hello_log_init(
    config: *const hello_log_config_t,
    out_error: *mut *mut hello_error_t,
) -> bool {
    clear_error(out_error);
    // Safety: caller passes null or a valid config pointer.
    let config = unsafe { config.as_ref() }.map(LogConfig::from).unwrap_or_default();
    match init(config) {
        Ok(()) => true,
        Err(err) => {
            write_error(out_error, err.to_string());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use log::MetadataBuilder;

    use super::*;

    fn metadata(target: &str, level: Level) -> Metadata<'_> {
        MetadataBuilder::new().target(target).level(level).build()
    }

    #[test]
    fn level_only_filter_targets_the_addon() {
        let filter = LogFilter::for_level(LevelFilter::Debug);
        assert!(filter.enabled(&metadata("hello_addon::module", Level::Debug)));
        assert!(!filter.enabled(&metadata("hello_addon::module", Level::Trace)));
        assert!(!filter.enabled(&metadata("napi", Level::Error)));
        assert_eq!(filter.max_level(), LevelFilter::Debug);
    }

    #[test]
    fn parses_mixed_directives() {
        let filter =
            LogFilter::parse("warn, hello_addon=trace, hello_addon::logging=off, extra").unwrap();
        assert_eq!(filter.default, LevelFilter::Warn);
        assert!(filter.enabled(&metadata("other", Level::Warn)));
        assert!(!filter.enabled(&metadata("other", Level::Info)));
        assert!(filter.enabled(&metadata("hello_addon::method", Level::Trace)));
        assert!(!filter.enabled(&metadata("hello_addon::logging", Level::Error)));
        assert!(filter.enabled(&metadata("extra", Level::Trace)));
        assert_eq!(filter.max_level(), LevelFilter::Trace);
    }

    #[test]
    fn rejects_malformed_directives() {
        assert!(LogFilter::parse("=info").is_err());
        assert!(LogFilter::parse("hello_addon=").is_err());
        assert!(LogFilter::parse("hello_addon=loud").is_err());
        assert_eq!(LogFilter::parse("").unwrap().max_level(), LevelFilter::Off);
    }

    #[test]
    fn explicit_filter_beats_environment() {
        let config = LogConfig {
            filter: Some("debug".into()),
            ..LogConfig::default()
        };
        let filter = resolve_filter(&config, Some("error".into())).unwrap();
        assert_eq!(filter.default, LevelFilter::Debug);

        let filter = resolve_filter(&LogConfig::default(), Some("error".into())).unwrap();
        assert_eq!(filter.default, LevelFilter::Error);

        let filter = resolve_filter(&LogConfig::default(), None).unwrap();
        assert_eq!(filter, LogFilter::for_level(LevelFilter::Info));
    }

    #[test]
    fn invalid_filter_is_reported() {
        let config = LogConfig {
            filter: Some("x=y".into()),
            ..LogConfig::default()
        };
        let err = resolve_filter(&config, None).unwrap_err();
        assert!(matches!(err, AddonError::InvalidLogFilter { ref filter, .. } if filter == "x=y"));
    }

    #[test]
    fn c_config_defaults() {
        let mut config = hello_log_config_t {
            level: hello_log_level_t::HELLO_LOG_LEVEL_OFF,
            filter: ptr::null(),
            callback: None,
            user_data: ptr::null_mut(),
        };
        hello_log_config_init(&mut config);
        let config = LogConfig::from(&config);
        assert_eq!(config.level, LevelFilter::Info);
        assert!(config.filter.is_none());
        assert!(matches!(config.sink, LogSink::Stderr));
    }
}
