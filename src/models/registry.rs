//! Model registry: static table of model configurations.
//!
//! Read-mostly and populated at startup. Uses DashMap so lookups on the
//! fetch path never contend with the coordinator lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;

use super::priority::PriorityClass;
use crate::error::{AdapterError, RegistryError};

/// Load/unload operations for one model. The manager never looks inside.
#[async_trait]
pub trait ModelAdapter<H>: Send + Sync {
    /// Bring the model into accelerator memory and return its handle.
    async fn load(&self) -> Result<H, AdapterError>;

    /// Release the accelerator memory held by `handle`.
    async fn unload(&self, handle: H) -> Result<(), AdapterError>;
}

type LoadFn<H> = Box<dyn Fn() -> BoxFuture<'static, Result<H, AdapterError>> + Send + Sync>;
type UnloadFn<H> = Box<dyn Fn(H) -> BoxFuture<'static, Result<(), AdapterError>> + Send + Sync>;

/// Adapter built from a pair of closures.
pub struct FnAdapter<H> {
    load: LoadFn<H>,
    unload: UnloadFn<H>,
}

impl<H> FnAdapter<H> {
    pub fn new<L, U>(load: L, unload: U) -> Self
    where
        L: Fn() -> BoxFuture<'static, Result<H, AdapterError>> + Send + Sync + 'static,
        U: Fn(H) -> BoxFuture<'static, Result<(), AdapterError>> + Send + Sync + 'static,
    {
        Self {
            load: Box::new(load),
            unload: Box::new(unload),
        }
    }
}

#[async_trait]
impl<H: Send + 'static> ModelAdapter<H> for FnAdapter<H> {
    async fn load(&self) -> Result<H, AdapterError> {
        (self.load)().await
    }

    async fn unload(&self, handle: H) -> Result<(), AdapterError> {
        (self.unload)(handle).await
    }
}

/// Registry entry. Immutable after registration apart from the two flags.
pub struct ModelConfig<H> {
    id: String,
    cost_mb: u64,
    priority: PriorityClass,
    adapter: Arc<dyn ModelAdapter<H>>,
    enabled: AtomicBool,
    available: AtomicBool,
}

impl<H> ModelConfig<H> {
    pub fn new(
        id: impl Into<String>,
        cost_mb: u64,
        priority: PriorityClass,
        adapter: Arc<dyn ModelAdapter<H>>,
    ) -> Self {
        Self {
            id: id.into(),
            cost_mb,
            priority,
            adapter,
            enabled: AtomicBool::new(true),
            available: AtomicBool::new(false),
        }
    }

    /// Builder-style toggle for the enabled flag.
    pub fn enabled(self, enabled: bool) -> Self {
        self.enabled.store(enabled, Ordering::SeqCst);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cost_mb(&self) -> u64 {
        self.cost_mb
    }

    pub fn priority(&self) -> PriorityClass {
        self.priority
    }

    pub fn adapter(&self) -> &Arc<dyn ModelAdapter<H>> {
        &self.adapter
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Set after the first successful load. Reporting only, never gates loads.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_available(&self) {
        self.available.store(true, Ordering::SeqCst);
    }
}

/// Thread-safe registry of model configurations.
pub struct ModelRegistry<H> {
    models: DashMap<String, Arc<ModelConfig<H>>>,
}

impl<H> ModelRegistry<H> {
    pub fn new() -> Self {
        Self {
            models: DashMap::new(),
        }
    }

    /// Register a model. Identifiers are unique and costs positive.
    pub fn register(&self, config: ModelConfig<H>) -> Result<(), RegistryError> {
        if config.id.is_empty() {
            return Err(RegistryError::EmptyIdentifier);
        }
        if config.cost_mb == 0 {
            return Err(RegistryError::InvalidCost(config.id));
        }

        match self.models.entry(config.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(RegistryError::DuplicateModel(config.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                tracing::debug!(
                    model_id = %config.id,
                    cost_mb = config.cost_mb,
                    priority = %config.priority,
                    enabled = config.is_enabled(),
                    "model registered"
                );
                slot.insert(Arc::new(config));
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<ModelConfig<H>>> {
        self.models.get(id).map(|entry| entry.value().clone())
    }

    /// Look up a config that may be loaded right now.
    pub fn get_enabled(&self, id: &str) -> Option<Arc<ModelConfig<H>>> {
        self.get(id).filter(|config| config.is_enabled())
    }

    /// Toggle the enabled flag. Returns false if the model is unknown.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        match self.models.get(id) {
            Some(config) => {
                config.enabled.store(enabled, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.models.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Identifier to `available` flag, sorted by identifier.
    pub fn capabilities(&self) -> Vec<(String, bool)> {
        let mut caps: Vec<(String, bool)> = self
            .models
            .iter()
            .map(|e| (e.key().clone(), e.value().is_available()))
            .collect();
        caps.sort();
        caps
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl<H> Default for ModelRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn adapter() -> Arc<dyn ModelAdapter<u32>> {
        Arc::new(FnAdapter::new(
            || async { Ok(7u32) }.boxed(),
            |_| async { Ok(()) }.boxed(),
        ))
    }

    #[test]
    fn rejects_zero_cost() {
        let registry = ModelRegistry::new();
        let result = registry.register(ModelConfig::new("pose", 0, PriorityClass::Low, adapter()));
        assert_eq!(result, Err(RegistryError::InvalidCost("pose".into())));
    }

    #[test]
    fn rejects_empty_identifier() {
        let registry = ModelRegistry::new();
        let result = registry.register(ModelConfig::new("", 10, PriorityClass::Low, adapter()));
        assert_eq!(result, Err(RegistryError::EmptyIdentifier));
    }

    #[test]
    fn rejects_duplicates() {
        let registry = ModelRegistry::new();
        registry
            .register(ModelConfig::new("pose", 10, PriorityClass::Low, adapter()))
            .unwrap();
        let result = registry.register(ModelConfig::new("pose", 20, PriorityClass::High, adapter()));
        assert_eq!(result, Err(RegistryError::DuplicateModel("pose".into())));
        assert_eq!(registry.get("pose").unwrap().cost_mb(), 10);
    }

    #[test]
    fn disabled_models_are_hidden_from_get_enabled() {
        let registry = ModelRegistry::new();
        registry
            .register(ModelConfig::new("threat", 10, PriorityClass::High, adapter()).enabled(false))
            .unwrap();
        assert!(registry.contains("threat"));
        assert!(registry.get_enabled("threat").is_none());

        assert!(registry.set_enabled("threat", true));
        assert!(registry.get_enabled("threat").is_some());
        assert!(!registry.set_enabled("ghost", true));
    }

    #[test]
    fn ids_are_sorted() {
        let registry = ModelRegistry::new();
        for id in ["vehicle", "clothing", "pose"] {
            registry
                .register(ModelConfig::new(id, 10, PriorityClass::Low, adapter()))
                .unwrap();
        }
        assert_eq!(registry.ids(), vec!["clothing", "pose", "vehicle"]);
    }

    #[tokio::test]
    async fn fn_adapter_invokes_closures() {
        let adapter = adapter();
        assert_eq!(adapter.load().await.unwrap(), 7);
        assert!(adapter.unload(7).await.is_ok());
    }
}
