//! Point-in-time status snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PriorityClass;

/// Bumped whenever a field is removed or changes meaning.
pub const STATUS_SCHEMA_VERSION: u32 = 1;

/// One resident model as seen by the status reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidentStatus {
    pub identifier: String,
    pub cost_mb: u64,
    pub priority: PriorityClass,
    pub last_used: DateTime<Utc>,
    pub idle_secs: f64,
    pub active_refs: u32,
}

/// Budget, utilization and residency at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerStatus {
    pub schema_version: u32,
    pub budget_total_mb: u64,
    pub budget_used_mb: u64,
    pub budget_free_mb: u64,
    pub utilization_percent: f64,
    /// Sorted by identifier.
    pub resident: Vec<ResidentStatus>,
    /// Every registered identifier, resident or not. Sorted.
    pub registered: Vec<String>,
}

impl ManagerStatus {
    pub fn resident_ids(&self) -> Vec<&str> {
        self.resident.iter().map(|r| r.identifier.as_str()).collect()
    }

    /// Sum of declared costs of the listed residents.
    pub fn resident_cost_mb(&self) -> u64 {
        self.resident.iter().map(|r| r.cost_mb).sum()
    }
}
