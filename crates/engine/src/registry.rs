//! Check registry - maps declared check names to typed factories.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;

use crate::check::{
    Check, FileExists, HttpStatus, NotImplemented, PackageExists, UserExists, WebpageContent,
};
use crate::error::RegistryError;

/// Arguments supplied to a check factory.
///
/// Bare-string check entries carry no arguments (`Null`); mapping entries
/// carry the argument mapping as parsed from the source.
pub type CheckArgs = serde_yaml::Value;

/// Factory that builds a configured check from its declared arguments.
pub type CheckFactory =
    Box<dyn Fn(CheckArgs) -> Result<Box<dyn Check>, serde_yaml::Error> + Send + Sync>;

/// Mapping from a check's declared name to its factory.
///
/// The registry is populated once at startup and read-only afterwards; the
/// loader and evaluator only ever take it by shared reference, so it is safe
/// for concurrent readers. Registering a name twice is rejected, and the
/// registry freezes on first resolution: once loading has begun, further
/// registration is rejected too.
pub struct CheckRegistry {
    factories: HashMap<String, CheckFactory>,
    // Set on first resolve; registration is rejected afterwards.
    frozen: AtomicBool,
}

impl CheckRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            frozen: AtomicBool::new(false),
        }
    }

    /// Registry pre-populated with the built-in checks.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert("check_not_implemented", deserializing::<NotImplemented>());
        registry.insert("check_webpage_content", deserializing::<WebpageContent>());
        registry.insert("check_http_status", deserializing::<HttpStatus>());
        registry.insert("check_package_exists", deserializing::<PackageExists>());
        registry.insert("check_file_exists", deserializing::<FileExists>());
        registry.insert("check_user_exists", deserializing::<UserExists>());
        registry
    }

    /// Register a check factory under a name.
    ///
    /// Fails once the registry has started resolving checks for a loader.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: CheckFactory,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.frozen.load(Ordering::Relaxed) {
            return Err(RegistryError::RegistryFrozen(name));
        }
        if self.factories.contains_key(&name) {
            return Err(RegistryError::DuplicateCheckName(name));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Resolve a factory by name. Freezes the registry against further
    /// registration.
    pub fn resolve(&self, name: &str) -> Result<&CheckFactory, RegistryError> {
        self.frozen.store(true, Ordering::Relaxed);
        self.factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownCheckName(name.to_string()))
    }

    /// Names of all registered checks, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    // Built-in names are distinct by construction.
    fn insert(&mut self, name: &str, factory: CheckFactory) {
        self.factories.insert(name.to_string(), factory);
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory that deserializes the argument mapping into `T`.
///
/// Zero-argument checks accept the null value a bare-string entry produces;
/// checks with required arguments fail construction when given a bare entry
/// or an incomplete mapping.
pub fn deserializing<T>() -> CheckFactory
where
    T: Check + DeserializeOwned + 'static,
{
    Box::new(|args| Ok(Box::new(serde_yaml::from_value::<T>(args)?) as Box<dyn Check>))
}
