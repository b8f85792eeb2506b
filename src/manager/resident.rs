//! Resident model table.
//!
//! Owned by the coordinator state and only touched while its lock is held.
//! The budget lives alongside it so commit-and-insert and
//! remove-and-release are each a single step.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::memory::{Budget, BudgetConfig};
use crate::models::PriorityClass;

/// A loaded model.
#[derive(Debug)]
pub struct ResidentEntry<H> {
    pub(crate) id: String,
    pub(crate) handle: H,
    pub(crate) cost_mb: u64,
    pub(crate) priority: PriorityClass,
    pub(crate) last_used: Instant,
    pub(crate) last_used_at: DateTime<Utc>,
    pub(crate) active_refs: u32,
}

impl<H> ResidentEntry<H> {
    pub(crate) fn new(id: String, handle: H, cost_mb: u64, priority: PriorityClass) -> Self {
        Self {
            id,
            handle,
            cost_mb,
            priority,
            last_used: Instant::now(),
            last_used_at: Utc::now(),
            active_refs: 0,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_used = Instant::now();
        self.last_used_at = Utc::now();
    }

    /// Entries with outstanding leases are never eviction candidates.
    pub(crate) fn is_evictable(&self) -> bool {
        self.active_refs == 0
    }
}

/// Resident entries plus the budget they are charged against.
pub(crate) struct ResidentState<H> {
    entries: HashMap<String, ResidentEntry<H>>,
    budget: Budget,
}

impl<H> ResidentState<H> {
    pub(crate) fn new(budget: BudgetConfig) -> Self {
        Self {
            entries: HashMap::new(),
            budget: Budget::new(budget),
        }
    }

    pub(crate) fn budget(&self) -> &Budget {
        &self.budget
    }

    pub(crate) fn get(&self, id: &str) -> Option<&ResidentEntry<H>> {
        self.entries.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ResidentEntry<H>> {
        self.entries.get_mut(id)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &ResidentEntry<H>> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Commit the entry's cost and insert it. Hands the entry back if the
    /// budget refuses the commit.
    pub(crate) fn insert(&mut self, entry: ResidentEntry<H>) -> Result<(), ResidentEntry<H>> {
        if self.entries.contains_key(&entry.id) || !self.budget.commit(entry.cost_mb) {
            return Err(entry);
        }
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Remove the entry and release its cost in one step.
    pub(crate) fn remove(&mut self, id: &str) -> Option<ResidentEntry<H>> {
        let entry = self.entries.remove(id)?;
        self.budget.release(entry.cost_mb);
        Some(entry)
    }

    /// Sum of declared costs of resident entries.
    pub(crate) fn resident_cost_mb(&self) -> u64 {
        self.entries.values().map(|e| e.cost_mb).sum()
    }
}
