//! Exports tables: the name to callable mapping a module hands its host.

use std::collections::BTreeMap;

use crate::error::{AddonError, Result};
use crate::method::{Callable, InvocationContext};

/// Something a module can register callables into.
///
/// Implemented by [`ExportsTable`] and, with the `napi` feature, by the
/// host's exports object.
pub trait Exports {
    fn set(&mut self, key: &str, callable: Callable) -> Result<()>;
}

/// In-process exports table.
///
/// Frozen once [`BindingModule::initialize`](crate::module::BindingModule::initialize)
/// hands it back; callers only read from it after that.
#[derive(Clone, Debug, Default)]
pub struct ExportsTable {
    entries: BTreeMap<String, Callable>,
}

impl ExportsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Callable> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Invokes the callable registered under `key`.
    pub fn call(&self, key: &str, ctx: &InvocationContext) -> Result<&'static str> {
        let callable = self
            .get(key)
            .ok_or_else(|| AddonError::UnknownExport(key.to_string()))?;
        Ok(callable(ctx))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Exports for ExportsTable {
    fn set(&mut self, key: &str, callable: Callable) -> Result<()> {
        if key.is_empty() {
            return Err(AddonError::EmptyExportKey);
        }
        if self.entries.contains_key(key) {
            log::warn!("refusing to overwrite export `{key}`");
            return Err(AddonError::DuplicateExport(key.to_string()));
        }
        self.entries.insert(key.to_string(), callable);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{EnvHandle, method};

    fn other(_: &InvocationContext) -> &'static str {
        "other"
    }

    #[test]
    fn set_and_call() {
        let mut table = ExportsTable::new();
        table.set("hello", method).unwrap();
        let ctx = InvocationContext::new(EnvHandle::detached(), 0);
        assert_eq!(table.call("hello", &ctx).unwrap(), "world");
        assert_eq!(table.len(), 1);
        assert!(table.contains("hello"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut table = ExportsTable::new();
        table.set("hello", method).unwrap();
        let err = table.set("hello", other).unwrap_err();
        assert!(matches!(err, AddonError::DuplicateExport(key) if key == "hello"));

        let ctx = InvocationContext::new(EnvHandle::detached(), 0);
        assert_eq!(table.call("hello", &ctx).unwrap(), "world");
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut table = ExportsTable::new();
        assert!(matches!(table.set("", method), Err(AddonError::EmptyExportKey)));
        assert!(table.is_empty());
    }

    #[test]
    fn unknown_key() {
        let table = ExportsTable::new();
        let ctx = InvocationContext::new(EnvHandle::detached(), 0);
        assert!(matches!(
            table.call("missing", &ctx),
            Err(AddonError::UnknownExport(key)) if key == "missing"
        ));
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn keys_are_sorted() {
        let mut table = ExportsTable::new();
        table.set("b", other).unwrap();
        table.set("a", method).unwrap();
        assert_eq!(table.keys().collect::<Vec<_>>(), ["a", "b"]);
    }
}
