//! Binding core for the `hello` and `hello1` native addons.
//!
//! Each addon registers a single callable returning `"world"` under its
//! export key. The core is host-agnostic: [`module::BindingModule`] populates
//! any [`exports::Exports`] implementation, with adapters for N-API (feature
//! `napi`) and a plain C ABI.

pub mod capi;
pub mod error;
pub mod exports;
pub mod logging;
pub mod method;
pub mod module;
#[cfg(feature = "napi")]
pub mod node;

mod ffi;

pub use error::{AddonError, Result};
pub use exports::{Exports, ExportsTable};
pub use method::{Callable, EnvHandle, GREETING, InvocationContext, method};
pub use module::{BindingModule, HELLO, HELLO1, ModuleDescriptor, ModuleState};
