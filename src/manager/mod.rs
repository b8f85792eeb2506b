// Copyright 2024-2026 GG-CORE Contributors
// Licensed under the Apache License, Version 2.0

//! On-demand model manager.
//!
//! Every state-changing operation (fetch, acquire, eviction, idle sweep,
//! explicit unload) runs while holding a single async gate, so loads and
//! unloads happen one at a time and budget decisions always see a
//! consistent table. The table and budget sit behind a separate short-lived
//! lock that is never held across an `.await`; status reads and lease
//! releases only take that one.
//!
//! Reference counts are only incremented while the gate is held. A lease
//! may decrement at any time, which can only make an entry more evictable,
//! so an eviction plan computed under the gate stays valid while it runs.
//!
//! A caller cancelled during an eviction stops waiting, but the victim's
//! unload still runs to completion on its own task.

mod eviction;
mod lease;
mod reaper;
mod resident;
mod status;

pub use eviction::{candidates, plan, Candidate};
pub use lease::ModelLease;
pub use reaper::{spawn_idle_reaper, ReaperConfig};
pub use resident::ResidentEntry;
pub use status::{ManagerStatus, ResidentStatus, STATUS_SCHEMA_VERSION};

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{Instrument, Span};

use crate::error::{AdapterError, ManagerError, RegistryError};
use crate::memory::BudgetConfig;
use crate::models::{FnAdapter, ModelAdapter, ModelConfig, ModelRegistry, PriorityClass};
use crate::telemetry::{self, EvictionReason, ModelSpan, SpanExt};
use resident::ResidentState;

/// Configuration for a model manager.
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    pub budget: BudgetConfig,
}

impl ManagerConfig {
    pub fn with_budget_mb(total_mb: u64) -> Self {
        Self {
            budget: BudgetConfig { total_mb },
        }
    }
}

struct ManagerInner<H> {
    registry: ModelRegistry<H>,
    gate: tokio::sync::Mutex<()>,
    state: Arc<Mutex<ResidentState<H>>>,
}

/// Budget-constrained cache of loaded models. Cheap to clone.
pub struct ModelManager<H> {
    inner: Arc<ManagerInner<H>>,
}

impl<H> Clone for ModelManager<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H> ModelManager<H>
where
    H: Clone + Send + Sync + 'static,
{
    pub fn new(config: ManagerConfig) -> Self {
        tracing::info!(budget_mb = config.budget.total_mb, "model manager created");
        Self {
            inner: Arc::new(ManagerInner {
                registry: ModelRegistry::new(),
                gate: tokio::sync::Mutex::new(()),
                state: Arc::new(Mutex::new(ResidentState::new(config.budget))),
            }),
        }
    }

    pub fn registry(&self) -> &ModelRegistry<H> {
        &self.inner.registry
    }

    pub fn register(&self, config: ModelConfig<H>) -> Result<(), RegistryError> {
        self.inner.registry.register(config)
    }

    /// Register a model from a pair of load/unload closures.
    pub fn register_fn<L, U>(
        &self,
        id: impl Into<String>,
        cost_mb: u64,
        priority: PriorityClass,
        load: L,
        unload: U,
        enabled: bool,
    ) -> Result<(), RegistryError>
    where
        L: Fn() -> BoxFuture<'static, Result<H, AdapterError>> + Send + Sync + 'static,
        U: Fn(H) -> BoxFuture<'static, Result<(), AdapterError>> + Send + Sync + 'static,
    {
        let adapter = Arc::new(FnAdapter::new(load, unload));
        self.register(ModelConfig::new(id, cost_mb, priority, adapter).enabled(enabled))
    }

    /// Return the model's handle, loading it first if needed.
    ///
    /// Registers no reference: the model may be evicted by any later call.
    pub async fn fetch(&self, id: &str) -> Result<H, ManagerError> {
        self.ensure_resident("fetch", id, false).await
    }

    /// Load if needed and pin the model until the returned lease is dropped.
    pub async fn acquire(&self, id: &str) -> Result<ModelLease<H>, ManagerError> {
        let handle = self.ensure_resident("acquire", id, true).await?;
        Ok(ModelLease::new(id.to_string(), handle, self.inner.state.clone()))
    }

    /// Explicitly give up a lease. Equivalent to dropping it.
    pub fn release(&self, lease: ModelLease<H>) {
        lease.release();
    }

    /// `fetch` bounded by `timeout`. A load cut short commits nothing.
    pub async fn fetch_with_timeout(&self, id: &str, timeout: Duration) -> Result<H, ManagerError> {
        tokio::time::timeout(timeout, self.fetch(id))
            .await
            .map_err(|_| timeout_error(id, timeout))?
    }

    /// `acquire` bounded by `timeout`. A load cut short commits nothing.
    pub async fn acquire_with_timeout(
        &self,
        id: &str,
        timeout: Duration,
    ) -> Result<ModelLease<H>, ManagerError> {
        tokio::time::timeout(timeout, self.acquire(id))
            .await
            .map_err(|_| timeout_error(id, timeout))?
    }

    /// Unload a resident model now. Returns false if it was not resident.
    pub async fn unload(&self, id: &str) -> Result<bool, ManagerError> {
        let _gate = self.inner.gate.lock().await;
        let active_refs = match self.inner.state.lock().get(id) {
            Some(entry) => entry.active_refs,
            None => return Ok(false),
        };
        if active_refs > 0 {
            return Err(ManagerError::ModelInUse {
                model_id: id.to_string(),
                active_refs,
            });
        }
        Ok(self.evict(id, EvictionReason::Explicit).await)
    }

    /// Unload every unreferenced resident. Pinned models stay.
    pub async fn unload_all(&self) -> Vec<String> {
        let _gate = self.inner.gate.lock().await;
        let mut ids: Vec<String> = self
            .inner
            .state
            .lock()
            .entries()
            .filter(|e| e.is_evictable())
            .map(|e| e.id.clone())
            .collect();
        ids.sort();

        for id in &ids {
            self.evict(id, EvictionReason::Explicit).await;
        }
        ids
    }

    /// Unload unreferenced models idle for longer than `threshold`.
    pub async fn sweep_idle(&self, threshold: Duration) -> Vec<String> {
        let _gate = self.inner.gate.lock().await;
        let now = Instant::now();
        let mut idle: Vec<String> = self
            .inner
            .state
            .lock()
            .entries()
            .filter(|e| e.is_evictable() && now.duration_since(e.last_used) > threshold)
            .map(|e| e.id.clone())
            .collect();
        idle.sort();

        for id in &idle {
            self.evict(id, EvictionReason::Idle).await;
        }
        if !idle.is_empty() {
            tracing::info!(count = idle.len(), models = ?idle, "idle sweep unloaded models");
        }
        idle
    }

    /// Read-only snapshot of budget and residency.
    pub fn status(&self) -> ManagerStatus {
        let state = self.inner.state.lock();
        let budget = state.budget();
        let now = Instant::now();

        let mut resident: Vec<ResidentStatus> = state
            .entries()
            .map(|e| ResidentStatus {
                identifier: e.id.clone(),
                cost_mb: e.cost_mb,
                priority: e.priority,
                last_used: e.last_used_at,
                idle_secs: now.duration_since(e.last_used).as_secs_f64(),
                active_refs: e.active_refs,
            })
            .collect();
        resident.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        ManagerStatus {
            schema_version: STATUS_SCHEMA_VERSION,
            budget_total_mb: budget.total_mb(),
            budget_used_mb: budget.committed_mb(),
            budget_free_mb: budget.free_mb(),
            utilization_percent: budget.utilization_percent(),
            resident,
            registered: self.inner.registry.ids(),
        }
    }

    pub fn is_resident(&self, id: &str) -> bool {
        self.inner.state.lock().contains(id)
    }

    /// Outstanding leases on a resident model, `None` if not resident.
    pub fn active_refs(&self, id: &str) -> Option<u32> {
        self.inner.state.lock().get(id).map(|e| e.active_refs)
    }

    pub fn committed_mb(&self) -> u64 {
        self.inner.state.lock().budget().committed_mb()
    }

    pub fn free_mb(&self) -> u64 {
        self.inner.state.lock().budget().free_mb()
    }

    pub fn total_mb(&self) -> u64 {
        self.inner.state.lock().budget().total_mb()
    }

    /// True when the committed total equals the sum of resident costs and
    /// fits in the budget.
    pub fn budget_consistent(&self) -> bool {
        let state = self.inner.state.lock();
        let budget = state.budget();
        budget.committed_mb() == state.resident_cost_mb()
            && budget.committed_mb() <= budget.total_mb()
    }

    async fn ensure_resident(&self, op: &'static str, id: &str, pin: bool) -> Result<H, ManagerError> {
        let span = ModelSpan::new(op, id);
        async move {
            let result = self.load_or_touch(id, pin).await;
            Span::current().record_result(&result);
            result
        }
        .instrument(span)
        .await
    }

    async fn load_or_touch(&self, id: &str, pin: bool) -> Result<H, ManagerError> {
        let _gate = self.inner.gate.lock().await;

        if let Some(handle) = self.touch_resident(id, pin) {
            return Ok(handle);
        }

        let config = self
            .inner
            .registry
            .get_enabled(id)
            .ok_or_else(|| ManagerError::UnknownModel(id.to_string()))?;

        let evicted = self.make_room(&config).await?;
        Span::current().record_evicted(evicted);

        let started = Instant::now();
        let handle = match config.adapter().load().await {
            Ok(handle) => handle,
            Err(source) => {
                telemetry::record_load_failure(id);
                tracing::warn!(model_id = %id, error = %source, "model load failed");
                return Err(ManagerError::ModelLoad {
                    model_id: id.to_string(),
                    source,
                });
            }
        };
        let elapsed = started.elapsed();
        telemetry::record_load(id, elapsed);
        Span::current().record_load(elapsed);

        let mut entry = ResidentEntry::new(id.to_string(), handle.clone(), config.cost_mb(), config.priority());
        if pin {
            entry.active_refs = 1;
        }

        let rejected = {
            let mut state = self.inner.state.lock();
            let outcome = state.insert(entry);
            let budget = state.budget();
            telemetry::record_budget(budget.committed_mb(), budget.utilization_percent(), state.len());
            outcome.err().map(|entry| (entry, budget.free_mb(), budget.total_mb()))
        };

        if let Some((entry, free_mb, total_mb)) = rejected {
            // make_room ran under the gate, so this is an accounting bug.
            tracing::error!(model_id = %id, free_mb, "budget refused commit after eviction");
            finish_unload(id, config.adapter().clone(), entry.handle).await;
            return Err(ManagerError::BudgetExceeded {
                model_id: id.to_string(),
                required_mb: config.cost_mb(),
                free_mb,
                total_mb,
            });
        }

        config.mark_available();
        tracing::info!(
            model_id = %id,
            cost_mb = config.cost_mb(),
            priority = %config.priority(),
            load_ms = elapsed.as_millis() as u64,
            "model loaded"
        );
        Ok(handle)
    }

    fn touch_resident(&self, id: &str, pin: bool) -> Option<H> {
        let mut state = self.inner.state.lock();
        let entry = state.get_mut(id)?;
        entry.touch();
        if pin {
            entry.active_refs += 1;
        }
        tracing::debug!(model_id = %id, active_refs = entry.active_refs, "resident model reused");
        Some(entry.handle.clone())
    }

    /// Evict until `config` fits. Evicts nothing if it can never fit.
    async fn make_room(&self, config: &ModelConfig<H>) -> Result<usize, ManagerError> {
        let required_mb = config.cost_mb();
        let victims = {
            let state = self.inner.state.lock();
            let budget = state.budget();
            if budget.fits(required_mb) {
                return Ok(0);
            }

            let order = candidates(state.entries());
            let victims = if required_mb > budget.total_mb() {
                None
            } else {
                plan(&order, budget.free_mb(), required_mb)
            };
            victims.ok_or_else(|| ManagerError::BudgetExceeded {
                model_id: config.id().to_string(),
                required_mb,
                free_mb: budget.free_mb(),
                total_mb: budget.total_mb(),
            })
        };

        let victims = match victims {
            Ok(victims) => victims,
            Err(e) => {
                tracing::warn!(model_id = %config.id(), error = %e, "no room for model");
                return Err(e);
            }
        };

        for victim in &victims {
            self.evict(&victim.id, EvictionReason::Budget).await;
        }
        Ok(victims.len())
    }

    /// Remove one entry, release its cost, then run its unload operation.
    ///
    /// Unload failures are logged and otherwise ignored: the entry is gone
    /// and its budget is free either way. The unload itself runs on its own
    /// task, so it completes even if the caller is dropped mid-eviction.
    async fn evict(&self, id: &str, reason: EvictionReason) -> bool {
        let entry = {
            let mut state = self.inner.state.lock();
            let entry = state.remove(id);
            let budget = state.budget();
            telemetry::record_budget(budget.committed_mb(), budget.utilization_percent(), state.len());
            entry
        };
        let Some(entry) = entry else {
            return false;
        };

        telemetry::record_eviction(id, entry.priority, reason);
        tracing::info!(
            model_id = %id,
            cost_mb = entry.cost_mb,
            priority = %entry.priority,
            reason = reason.as_str(),
            "model evicted"
        );

        match self.inner.registry.get(id) {
            Some(config) => finish_unload(id, config.adapter().clone(), entry.handle).await,
            None => tracing::error!(model_id = %id, "evicted model missing from registry"),
        }
        true
    }
}

/// Run an adapter's unload to completion on a separate task.
///
/// Once an entry's cost has been released its unload must finish, so the
/// call is detached from the awaiting future: cancelling the caller only
/// stops the wait.
async fn finish_unload<H>(id: &str, adapter: Arc<dyn ModelAdapter<H>>, handle: H)
where
    H: Send + 'static,
{
    let task = tokio::spawn(async move { adapter.unload(handle).await });
    let outcome = match task.await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(join) => Err(format!("unload task aborted: {join}")),
    };
    if let Err(error) = outcome {
        telemetry::record_unload_failure(id);
        tracing::warn!(model_id = %id, %error, "model unload failed; entry dropped anyway");
    }
}

fn timeout_error(id: &str, timeout: Duration) -> ManagerError {
    tracing::warn!(model_id = %id, timeout_ms = timeout.as_millis() as u64, "model request timed out");
    ManagerError::Timeout {
        model_id: id.to_string(),
        timeout_ms: timeout.as_millis() as u64,
    }
}
