//! Shared test adapters for model manager integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gg_vram::{AdapterError, ManagerConfig, ModelAdapter, ModelConfig, ModelManager, PriorityClass};
use parking_lot::Mutex;

pub type Handle = Arc<String>;

/// Observations shared by every adapter of one harness.
#[derive(Default)]
pub struct Journal {
    pub loads: AtomicUsize,
    pub unloads: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub unloaded: Mutex<Vec<String>>,
}

impl Journal {
    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn unloads(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }

    pub fn unloaded(&self) -> Vec<String> {
        self.unloaded.lock().clone()
    }
}

/// Adapter knobs.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub load_delay: Duration,
    pub unload_delay: Duration,
    pub fail_load: bool,
    pub fail_unload: bool,
}

pub struct TestAdapter {
    id: String,
    journal: Arc<Journal>,
    behavior: Behavior,
    fail_load: AtomicBool,
}

#[async_trait]
impl ModelAdapter<Handle> for TestAdapter {
    async fn load(&self) -> Result<Handle, AdapterError> {
        self.journal.enter();
        if !self.behavior.load_delay.is_zero() {
            tokio::time::sleep(self.behavior.load_delay).await;
        }
        self.journal.exit();

        if self.fail_load.load(Ordering::SeqCst) {
            return Err(AdapterError::new(format!("{} weights unavailable", self.id)));
        }
        self.journal.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.id.clone()))
    }

    async fn unload(&self, handle: Handle) -> Result<(), AdapterError> {
        self.journal.enter();
        if self.behavior.unload_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.behavior.unload_delay).await;
        }
        self.journal.exit();

        self.journal.unloads.fetch_add(1, Ordering::SeqCst);
        self.journal.unloaded.lock().push(handle.to_string());
        if self.behavior.fail_unload {
            return Err(AdapterError::new(format!("{} driver refused to free", self.id)));
        }
        Ok(())
    }
}

pub struct Harness {
    pub manager: ModelManager<Handle>,
    pub journal: Arc<Journal>,
}

impl Harness {
    pub fn new(budget_mb: u64) -> Self {
        Self {
            manager: ModelManager::new(ManagerConfig::with_budget_mb(budget_mb)),
            journal: Arc::new(Journal::default()),
        }
    }

    pub fn add(&self, id: &str, cost_mb: u64, priority: PriorityClass) {
        self.add_with(id, cost_mb, priority, Behavior::default());
    }

    pub fn add_with(&self, id: &str, cost_mb: u64, priority: PriorityClass, behavior: Behavior) {
        let adapter = TestAdapter {
            id: id.to_string(),
            journal: self.journal.clone(),
            fail_load: AtomicBool::new(behavior.fail_load),
            behavior,
        };
        self.manager
            .register(ModelConfig::new(id, cost_mb, priority, Arc::new(adapter)))
            .unwrap();
    }

    /// Committed equals the resident sum and fits the budget.
    pub fn assert_consistent(&self) {
        let status = self.manager.status();
        assert_eq!(status.budget_used_mb, status.resident_cost_mb());
        assert!(status.budget_used_mb <= status.budget_total_mb);
        assert!(self.manager.budget_consistent());
    }
}
