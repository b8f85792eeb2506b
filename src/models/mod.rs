//! Model registration: priority classes, adapters and the registry table.

mod priority;
mod registry;

pub use priority::PriorityClass;
pub use registry::{FnAdapter, ModelAdapter, ModelConfig, ModelRegistry};
