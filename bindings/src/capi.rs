//! C bindings over the module lifecycle, for hosts other than Node.

use std::os::raw::c_char;
use std::ptr;

use crate::error::{clear_error, cstring_from_str_lossy, hello_error_t, write_error};
use crate::exports::ExportsTable;
use crate::ffi::{guarded, read_cstr};
use crate::method::{EnvHandle, InvocationContext};
use crate::module::{self, BindingModule};

/// Opaque handle to a loaded module and its exports.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct hello_exports_t;

struct ExportsHandle {
    module: BindingModule,
    exports: ExportsTable,
}

impl Drop for ExportsHandle {
    fn drop(&mut self) {
        self.module.unload();
    }
}

fn handle_ref<'a>(exports: *const hello_exports_t) -> Option<&'a ExportsHandle> {
    // Safety: exports must be null or a live handle from `hello_module_init`.
    unsafe { (exports as *const ExportsHandle).as_ref() }
}

/// Loads the module named `name` (`"hello"` or `"hello1"`) into a fresh exports table.
///
/// Modules with a load banner print it to stdout before returning. The returned
/// handle must be released with `hello_exports_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hello_module_init(
    name: *const c_char,
    out_error: *mut *mut hello_error_t,
) -> *mut hello_exports_t {
    clear_error(out_error);
    let Some(name) = read_cstr(name, "name", out_error) else {
        return ptr::null_mut();
    };

    let handle = guarded("initializing module", out_error, || {
        let mut module = BindingModule::new(module::find(&name)?);
        let exports = module.initialize(EnvHandle::detached(), ExportsTable::new())?;
        Ok(ExportsHandle { module, exports })
    });

    match handle {
        Some(handle) => Box::into_raw(Box::new(handle)) as *mut hello_exports_t,
        None => ptr::null_mut(),
    }
}

/// Returns the number of entries in the exports table, or 0 for a null handle.
#[unsafe(no_mangle)]
pub extern "C" fn hello_exports_len(exports: *const hello_exports_t) -> usize {
    handle_ref(exports).map_or(0, |handle| handle.exports.len())
}

/// Returns whether `key` is registered.
#[unsafe(no_mangle)]
pub extern "C" fn hello_exports_contains(
    exports: *const hello_exports_t,
    key: *const c_char,
) -> bool {
    let Some(handle) = handle_ref(exports) else {
        return false;
    };
    read_cstr(key, "key", ptr::null_mut()).is_some_and(|key| handle.exports.contains(&key))
}

/// Invokes the callable registered under `key`.
///
/// The returned string is heap-allocated and must be freed with `hello_string_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hello_exports_call(
    exports: *const hello_exports_t,
    key: *const c_char,
    out_error: *mut *mut hello_error_t,
) -> *mut c_char {
    clear_error(out_error);
    let Some(handle) = handle_ref(exports) else {
        write_error(out_error, "exports handle was null");
        return ptr::null_mut();
    };
    let Some(key) = read_cstr(key, "key", out_error) else {
        return ptr::null_mut();
    };

    let ctx = InvocationContext::new(EnvHandle::detached(), 0);
    guarded("invoking export", out_error, || handle.exports.call(&key, &ctx))
        .map_or(ptr::null_mut(), |value| cstring_from_str_lossy(value).into_raw())
}

/// Frees an exports handle, unloading its module.
#[unsafe(no_mangle)]
pub extern "C" fn hello_exports_free(exports: *mut hello_exports_t) {
    if exports.is_null() {
        return;
    }
    // Safety: exports must be a valid handle allocated by `hello_module_init`.
    unsafe {
        drop(Box::from_raw(exports as *mut ExportsHandle));
    }
}
