//! Priority classes for resident models.
//!
//! Lower ordinal means higher priority, and higher priority models are
//! evicted later. `Critical` is the last to go, `Low` the first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Eviction precedence of a registered model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl PriorityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl Default for PriorityClass {
    fn default() -> Self {
        Self::Medium
    }
}

impl From<u8> for PriorityClass {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Critical,
            1 => Self::High,
            2 => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown priority class: {other}")),
        }
    }
}
