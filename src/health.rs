//! Health reporting on top of the manager status snapshot.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::manager::ManagerStatus;

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Detailed health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub state: HealthState,
    pub models_resident: usize,
    pub models_pinned: usize,
    pub models_registered: usize,
    pub budget_used_mb: u64,
    /// Budget held by residents with outstanding leases.
    pub pinned_mb: u64,
    pub utilization_percent: f64,
    pub pinned_percent: f64,
    pub uptime_secs: u64,
}

/// Health check configuration.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Share of the budget pinned by leases at or above which the manager
    /// is reported as `Degraded`. A full but evictable cache stays healthy.
    pub pressure_percent: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            pressure_percent: 95.0,
        }
    }
}

/// Derives health from manager status snapshots.
pub struct HealthChecker {
    config: HealthConfig,
    start_time: Instant,
}

impl HealthChecker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
        }
    }

    pub fn report(&self, status: &ManagerStatus) -> HealthReport {
        let pinned_mb = pinned_mb(status);
        let pinned_percent = if status.budget_total_mb == 0 {
            0.0
        } else {
            pinned_mb as f64 / status.budget_total_mb as f64 * 100.0
        };
        HealthReport {
            state: self.compute_state(status, pinned_percent),
            models_resident: status.resident.len(),
            models_pinned: status.resident.iter().filter(|r| r.active_refs > 0).count(),
            models_registered: status.registered.len(),
            budget_used_mb: status.budget_used_mb,
            pinned_mb,
            utilization_percent: status.utilization_percent,
            pinned_percent,
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn compute_state(&self, status: &ManagerStatus, pinned_percent: f64) -> HealthState {
        if status.budget_total_mb == 0 {
            return HealthState::Unhealthy;
        }
        if pinned_percent >= self.config.pressure_percent {
            return HealthState::Degraded;
        }
        HealthState::Healthy
    }
}

fn pinned_mb(status: &ManagerStatus) -> u64 {
    status
        .resident
        .iter()
        .filter(|r| r.active_refs > 0)
        .map(|r| r.cost_mb)
        .sum()
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}
