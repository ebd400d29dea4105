//! The callable entry points handed to the host.

use std::ffi::c_void;
use std::ptr;

/// The value every exported callable returns.
pub const GREETING: &str = "world";

/// Opaque host environment token.
///
/// Passed through without interpretation; the addon never dereferences it and
/// never holds it past the call that supplied it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvHandle(*mut c_void);

impl EnvHandle {
    pub fn from_raw(raw: *mut c_void) -> Self {
        Self(raw)
    }

    /// A handle for callers that have no host environment, such as the C ABI.
    pub fn detached() -> Self {
        Self(ptr::null_mut())
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.0
    }

    pub fn is_detached(&self) -> bool {
        self.0.is_null()
    }
}

/// What the host supplies on each call.
#[derive(Clone, Copy, Debug)]
pub struct InvocationContext {
    env: EnvHandle,
    arg_count: usize,
}

impl InvocationContext {
    pub fn new(env: EnvHandle, arg_count: usize) -> Self {
        Self { env, arg_count }
    }

    pub fn env(&self) -> EnvHandle {
        self.env
    }

    pub fn arg_count(&self) -> usize {
        self.arg_count
    }
}

/// A registered entry point. Callables are plain functions so they carry no
/// state and are safe to invoke from any host thread.
pub type Callable = fn(&InvocationContext) -> &'static str;

/// Returns [`GREETING`] regardless of the arguments supplied.
pub fn method(ctx: &InvocationContext) -> &'static str {
    log::trace!("method invoked with {} argument(s)", ctx.arg_count());
    GREETING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_ignores_arguments() {
        for arg_count in [0, 1, 7] {
            let ctx = InvocationContext::new(EnvHandle::detached(), arg_count);
            assert_eq!(method(&ctx), "world");
        }
    }

    #[test]
    fn method_is_idempotent() {
        let ctx = InvocationContext::new(EnvHandle::detached(), 0);
        let first = method(&ctx);
        for _ in 0..16 {
            assert_eq!(method(&ctx), first);
        }
    }

    #[test]
    fn env_handle_is_passed_through() {
        let mut token = 0u8;
        let env = EnvHandle::from_raw(&mut token as *mut u8 as *mut c_void);
        let ctx = InvocationContext::new(env, 0);
        assert_eq!(ctx.env().as_raw(), env.as_raw());
        assert!(!ctx.env().is_detached());
        assert_eq!(method(&ctx), GREETING);
    }

    #[test]
    fn callable_is_usable_across_threads() {
        let callable: Callable = method;
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(move || {
                    callable(&InvocationContext::new(EnvHandle::detached(), 0))
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), GREETING);
        }
    }
}
