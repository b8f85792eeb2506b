//! Accelerator memory accounting.

mod budget;

pub use budget::{Budget, BudgetConfig};
