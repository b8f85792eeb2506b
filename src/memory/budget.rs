//! Accelerator memory budget accounting.
//!
//! Plain counters: the owner keeps the budget behind the same lock as the
//! resident table, so commit and insert happen in one critical section.

use serde::{Deserialize, Serialize};

/// Configuration for the memory budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub total_mb: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            total_mb: 8 * 1024, // 8 GB default
        }
    }
}

/// Total capacity and committed total, both in megabytes.
#[derive(Debug)]
pub struct Budget {
    total_mb: u64,
    committed_mb: u64,
}

impl Budget {
    pub fn new(config: BudgetConfig) -> Self {
        Self {
            total_mb: config.total_mb,
            committed_mb: 0,
        }
    }

    /// Commit `cost_mb`. Returns false, changing nothing, if it would not fit.
    pub fn commit(&mut self, cost_mb: u64) -> bool {
        if !self.fits(cost_mb) {
            return false;
        }
        self.committed_mb += cost_mb;
        true
    }

    /// Release previously committed memory.
    pub fn release(&mut self, cost_mb: u64) {
        debug_assert!(cost_mb <= self.committed_mb, "released more than committed");
        self.committed_mb = self.committed_mb.saturating_sub(cost_mb);
    }

    /// Would `cost_mb` fit in the free budget right now.
    pub fn fits(&self, cost_mb: u64) -> bool {
        cost_mb <= self.free_mb()
    }

    pub fn total_mb(&self) -> u64 {
        self.total_mb
    }

    pub fn committed_mb(&self) -> u64 {
        self.committed_mb
    }

    pub fn free_mb(&self) -> u64 {
        self.total_mb.saturating_sub(self.committed_mb)
    }

    /// Committed share of the total, 0.0 - 100.0.
    pub fn utilization_percent(&self) -> f64 {
        if self.total_mb == 0 {
            return 0.0;
        }
        self.committed_mb as f64 / self.total_mb as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(total_mb: u64) -> Budget {
        Budget::new(BudgetConfig { total_mb })
    }

    #[test]
    fn commit_tracks_allocation() {
        let mut b = budget(1000);
        assert!(b.commit(600));
        assert_eq!(b.committed_mb(), 600);
        assert_eq!(b.free_mb(), 400);
        assert!((b.utilization_percent() - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn commit_rejects_overflow_without_side_effect() {
        let mut b = budget(1000);
        assert!(b.commit(600));
        assert!(!b.commit(500));
        assert_eq!(b.committed_mb(), 600);
    }

    #[test]
    fn commit_allows_exact_fill() {
        let mut b = budget(1000);
        assert!(b.commit(400));
        assert!(b.commit(600));
        assert_eq!(b.free_mb(), 0);
        assert!(!b.fits(1));
    }

    #[test]
    fn release_frees_capacity() {
        let mut b = budget(1000);
        b.commit(700);
        b.release(700);
        assert_eq!(b.committed_mb(), 0);
        assert!(b.fits(1000));
    }

    #[test]
    fn zero_total_reports_zero_utilization() {
        let b = budget(0);
        assert_eq!(b.utilization_percent(), 0.0);
        assert!(!b.fits(1));
    }
}
