//! Module descriptors and the load lifecycle.

use std::collections::HashMap;
use std::io::{self, Write};

use once_cell::sync::Lazy;

use crate::error::{AddonError, Result};
use crate::exports::Exports;
use crate::method::{Callable, EnvHandle, method};

/// Static description of one addon module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub export_key: &'static str,
    /// Line written to stdout once per load, before registration.
    pub load_banner: Option<&'static str>,
}

impl ModuleDescriptor {
    pub fn callable(&self) -> Callable {
        method
    }
}

pub static HELLO: ModuleDescriptor = ModuleDescriptor {
    name: "hello",
    export_key: "hello",
    load_banner: Some("this is a test"),
};

pub static HELLO1: ModuleDescriptor = ModuleDescriptor {
    name: "hello1",
    export_key: "hello1",
    load_banner: None,
};

static CATALOG: Lazy<HashMap<&'static str, &'static ModuleDescriptor>> = Lazy::new(|| {
    [&HELLO, &HELLO1]
        .into_iter()
        .map(|descriptor| (descriptor.name, descriptor))
        .collect()
});

/// Looks up a module descriptor by name.
pub fn find(name: &str) -> Result<&'static ModuleDescriptor> {
    CATALOG
        .get(name)
        .copied()
        .ok_or_else(|| AddonError::UnknownModule(name.to_string()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleState {
    Unloaded,
    Loaded,
}

/// A module instance moving through `Unloaded -> Loaded`.
#[derive(Debug)]
pub struct BindingModule {
    descriptor: &'static ModuleDescriptor,
    state: ModuleState,
}

impl BindingModule {
    pub fn new(descriptor: &'static ModuleDescriptor) -> Self {
        Self {
            descriptor,
            state: ModuleState::Unloaded,
        }
    }

    pub fn descriptor(&self) -> &'static ModuleDescriptor {
        self.descriptor
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Populates `exports` and returns it, printing the load banner to stdout.
    pub fn initialize<E: Exports>(&mut self, env: EnvHandle, exports: E) -> Result<E> {
        let mut stdout = io::stdout().lock();
        self.initialize_with(env, exports, &mut stdout)
    }

    /// Same as [`initialize`](Self::initialize) with the banner going to `out`.
    ///
    /// A failed banner write is logged and does not abort the load.
    pub fn initialize_with<E: Exports, W: Write>(
        &mut self,
        env: EnvHandle,
        mut exports: E,
        out: &mut W,
    ) -> Result<E> {
        if let Some(banner) = self.descriptor.load_banner {
            if let Err(err) = writeln!(out, "{banner}").and_then(|()| out.flush()) {
                log::warn!("{}: failed to write load banner: {err}", self.descriptor.name);
            }
        }

        exports.set(self.descriptor.export_key, self.descriptor.callable())?;
        log::debug!(
            "{}: registered `{}` (env detached: {})",
            self.descriptor.name,
            self.descriptor.export_key,
            env.is_detached()
        );

        self.state = ModuleState::Loaded;
        Ok(exports)
    }

    /// Returns the module to `Unloaded`; the host owns the exports it was given.
    pub fn unload(&mut self) {
        if self.state == ModuleState::Loaded {
            log::debug!("{}: unloaded", self.descriptor.name);
        }
        self.state = ModuleState::Unloaded;
    }
}
