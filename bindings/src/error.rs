use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Errors raised while assembling or querying a module's exports.
///
/// The exported callables themselves never fail; these cover the plumbing
/// around them.
#[derive(Debug, thiserror::Error)]
pub enum AddonError {
    #[error("export `{0}` is already registered")]
    DuplicateExport(String),
    #[error("export key must not be empty")]
    EmptyExportKey,
    #[error("no export named `{0}`")]
    UnknownExport(String),
    #[error("no module named `{0}`")]
    UnknownModule(String),
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidLogFilter { filter: String, reason: String },
    #[error("logging already initialized by another logger")]
    LoggerConflict,
    #[cfg(feature = "napi")]
    #[error("host rejected registration: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, AddonError>;

#[cfg(feature = "napi")]
impl From<AddonError> for napi::Error {
    fn from(err: AddonError) -> Self {
        napi::Error::from_reason(err.to_string())
    }
}

/// Opaque error type for C callers.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct hello_error_t;

struct ErrorHandle {
    message: CString,
}

pub(crate) fn cstring_from_str_lossy(value: &str) -> CString {
    let sanitized = value.replace('\0', " ");
    // Interior NULs were replaced above.
    CString::new(sanitized).unwrap_or_default()
}

pub(crate) fn clear_error(out_error: *mut *mut hello_error_t) {
    if !out_error.is_null() {
        // Safety: caller provided a valid out_error pointer.
        unsafe {
            *out_error = ptr::null_mut();
        }
    }
}

pub(crate) fn write_error(out_error: *mut *mut hello_error_t, message: impl Into<String>) {
    if out_error.is_null() {
        return;
    }
    let handle = Box::new(ErrorHandle {
        message: cstring_from_str_lossy(&message.into()),
    });
    // Safety: out_error is non-null and points to writable memory.
    unsafe {
        *out_error = Box::into_raw(handle) as *mut hello_error_t;
    }
}

/// Returns the message for an error allocated by the addon.
///
/// The returned pointer is valid as long as the error handle is alive.
#[unsafe(no_mangle)]
pub extern "C" fn hello_error_message(error: *const hello_error_t) -> *const c_char {
    if error.is_null() {
        return ptr::null();
    }
    // Safety: error must be a valid handle allocated by the addon.
    let handle = unsafe { &*(error as *const ErrorHandle) };
    handle.message.as_ptr()
}

/// Frees an error returned by the addon.
#[unsafe(no_mangle)]
pub extern "C" fn hello_error_free(error: *mut hello_error_t) {
    if error.is_null() {
        return;
    }
    // Safety: error must be a valid handle allocated by the addon.
    unsafe {
        drop(Box::from_raw(error as *mut ErrorHandle));
    }
}

/// Frees a string allocated by the addon.
#[unsafe(no_mangle)]
pub extern "C" fn hello_string_free(value: *mut c_char) {
    if value.is_null() {
        return;
    }
    // Safety: value must be a string returned by one of the addon's entry points.
    unsafe {
        drop(CString::from_raw(value));
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    #[test]
    fn lossy_cstring_replaces_interior_nul() {
        let value = cstring_from_str_lossy("a\0b");
        assert_eq!(value.to_str().unwrap(), "a b");
    }

    #[test]
    fn error_handle_round_trips_message() {
        let mut error: *mut hello_error_t = ptr::null_mut();
        write_error(&mut error, AddonError::UnknownExport("nope".into()).to_string());
        assert!(!error.is_null());

        let message = unsafe { CStr::from_ptr(hello_error_message(error)) };
        assert_eq!(message.to_str().unwrap(), "no export named `nope`");

        hello_error_free(error);
        clear_error(&mut error);
        assert!(error.is_null());
    }

    #[test]
    fn null_handles_are_ignored() {
        assert!(hello_error_message(ptr::null()).is_null());
        hello_error_free(ptr::null_mut());
        hello_string_free(ptr::null_mut());
        write_error(ptr::null_mut(), "dropped");
    }
}
