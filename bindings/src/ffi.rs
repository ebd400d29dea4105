//! Shared utilities for the addon's C entry points.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{Result, hello_error_t, write_error};

pub(crate) fn read_cstr(
    value: *const c_char,
    field: &'static str,
    out_error: *mut *mut hello_error_t,
) -> Option<String> {
    if value.is_null() {
        write_error(out_error, format!("{field} was null"));
        return None;
    }
    // Safety: caller guarantees a valid, NUL-terminated C string.
    let cstr = unsafe { CStr::from_ptr(value) };
    Some(cstr.to_string_lossy().into_owned())
}

/// Runs `f`, reporting both `Err` results and panics through `out_error`.
pub(crate) fn guarded<T>(
    action: &'static str,
    out_error: *mut *mut hello_error_t,
    f: impl FnOnce() -> Result<T>,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            write_error(out_error, err.to_string());
            None
        }
        Err(_) => {
            write_error(out_error, format!("panic while {action}"));
            None
        }
    }
}
