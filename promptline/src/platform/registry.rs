//! Global dialect registry for looking up dialects by name.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::warn;
use once_cell::sync::Lazy;

use super::dialect::Dialect;
use super::vendors;
use crate::error::{PlatformError, Result};

static REGISTRY: Lazy<RwLock<DialectRegistry>> = Lazy::new(|| {
    let mut registry = DialectRegistry::new();
    registry.register_builtin_dialects();
    RwLock::new(registry)
});

/// Registry for dialects.
#[derive(Debug, Default)]
pub struct DialectRegistry {
    dialects: HashMap<String, Arc<Dialect>>,
}

impl DialectRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            dialects: HashMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<DialectRegistry> {
        &REGISTRY
    }

    /// Look up a dialect in the global registry.
    pub fn lookup(name: &str) -> Result<Arc<Dialect>> {
        let registry = REGISTRY.read().map_err(|_| PlatformError::InvalidDefinition {
            message: "dialect registry lock poisoned".to_string(),
        })?;
        registry.get(name).ok_or_else(|| {
            PlatformError::UnknownDialect {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn register_builtin_dialects(&mut self) {
        let builtins = [
            vendors::generic::dialect(),
            vendors::cisco_ios::dialect(),
            vendors::vyatta::dialect(),
            vendors::riverbed::dialect(),
            vendors::powershell::dialect(),
        ];
        for dialect in builtins {
            if let Err(e) = dialect.and_then(|dialect| self.register(dialect)) {
                warn!("Skipping built-in dialect: {}", e);
            }
        }
    }

    /// Register a dialect.
    pub fn register(&mut self, dialect: Dialect) -> Result<()> {
        if self.dialects.contains_key(&dialect.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: dialect.name.clone(),
            }
            .into());
        }
        dialect.validate()?;
        self.dialects.insert(dialect.name.clone(), Arc::new(dialect));
        Ok(())
    }

    /// Get a dialect by name.
    pub fn get(&self, name: &str) -> Option<Arc<Dialect>> {
        self.dialects.get(name).cloned()
    }

    /// Check if a dialect is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.dialects.contains_key(name)
    }

    /// List all registered dialect names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.dialects.keys()
    }
}
