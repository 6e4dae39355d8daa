//! Multiplicity model factory and registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::calculator::CalcError;
use crate::fitting::{Behroozi, MultiplicityFunction, PressSchechter, ShethTormen, Tinker08};

/// Factory trait for resolving multiplicity models by name.
pub trait ModelFactory: Send + Sync {
    /// Get or create a model by name.
    fn get(&self, name: &str) -> Result<Arc<dyn MultiplicityFunction>, CalcError>;

    /// List all available model names.
    fn available(&self) -> Vec<&str>;
}

/// Default factory with lazy creation and cache.
pub struct DefaultModelFactory {
    cache: RwLock<HashMap<String, Arc<dyn MultiplicityFunction>>>,
}

impl DefaultModelFactory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn create_model(name: &str) -> Result<Arc<dyn MultiplicityFunction>, CalcError> {
        match name.to_ascii_lowercase().as_str() {
            "behroozi" => Ok(Arc::new(Behroozi::default())),
            "tinker08" | "tinker" => Ok(Arc::new(Tinker08)),
            "st" | "smt" | "shethtormen" => Ok(Arc::new(ShethTormen::default())),
            "ps" | "pressschechter" => Ok(Arc::new(PressSchechter)),
            _ => Err(CalcError::Config(format!("unknown mass function model: {name}"))),
        }
    }
}

impl Default for DefaultModelFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelFactory for DefaultModelFactory {
    fn get(&self, name: &str) -> Result<Arc<dyn MultiplicityFunction>, CalcError> {
        if let Some(model) = self.cache.read().get(name) {
            return Ok(Arc::clone(model));
        }

        let model = Self::create_model(name)?;
        self.cache
            .write()
            .insert(name.to_string(), Arc::clone(&model));
        Ok(model)
    }

    fn available(&self) -> Vec<&str> {
        vec!["Behroozi", "Tinker08", "ST", "PS"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_resolves_every_available_name() {
        let factory = DefaultModelFactory::new();
        for name in factory.available() {
            let model = factory.get(name).unwrap();
            assert_eq!(model.name(), name);
        }
    }

    #[test]
    fn factory_is_case_insensitive() {
        let factory = DefaultModelFactory::new();
        assert_eq!(factory.get("tinker08").unwrap().name(), "Tinker08");
        assert_eq!(factory.get("BEHROOZI").unwrap().name(), "Behroozi");
    }

    #[test]
    fn factory_caches() {
        let factory = DefaultModelFactory::new();
        let a = factory.get("PS").unwrap();
        let b = factory.get("PS").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn factory_unknown_name() {
        let factory = DefaultModelFactory::new();
        assert!(matches!(factory.get("Watson13"), Err(CalcError::Config(_))));
    }
}
