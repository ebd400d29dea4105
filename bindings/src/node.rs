//! N-API registration adapter.
//!
//! The host's exports object becomes an [`Exports`] implementation, so a Node
//! addon runs the same [`BindingModule::initialize`] as every other host.

use std::ffi::c_void;

use napi::{Env, JsObject};

use crate::error::{AddonError, Result};
use crate::exports::Exports;
use crate::method::{Callable, EnvHandle, InvocationContext};
use crate::module::{BindingModule, ModuleDescriptor};

/// The exports object Node passes to a module's init function.
pub struct NodeExports<'a> {
    env: &'a Env,
    object: &'a mut JsObject,
}

impl<'a> NodeExports<'a> {
    pub fn new(env: &'a Env, object: &'a mut JsObject) -> Self {
        Self { env, object }
    }
}

fn host_error(err: napi::Error) -> AddonError {
    AddonError::Host(err.to_string())
}

impl Exports for NodeExports<'_> {
    fn set(&mut self, key: &str, callable: Callable) -> Result<()> {
        if key.is_empty() {
            return Err(AddonError::EmptyExportKey);
        }
        if self.object.has_named_property(key).map_err(host_error)? {
            return Err(AddonError::DuplicateExport(key.to_string()));
        }

        let function = self
            .env
            .create_function_from_closure(key, move |ctx| {
                let env = EnvHandle::from_raw(ctx.env.raw() as *mut c_void);
                let invocation = InvocationContext::new(env, ctx.length);
                Ok(callable(&invocation).to_owned())
            })
            .map_err(host_error)?;
        self.object
            .set_named_property(key, function)
            .map_err(host_error)
    }
}

/// Runs `descriptor`'s initialization against Node's exports object.
pub fn register(
    env: &Env,
    exports: &mut JsObject,
    descriptor: &'static ModuleDescriptor,
) -> Result<()> {
    let handle = EnvHandle::from_raw(env.raw() as *mut c_void);
    BindingModule::new(descriptor).initialize(handle, NodeExports::new(env, exports))?;
    Ok(())
}
