//! GG-VRAM: on-demand model manager.
//!
//! Keeps a fleet of accelerator-resident models inside a fixed memory
//! budget. Models load lazily on first use and are evicted lowest priority,
//! least recently used first when the budget runs out.
//!
//! # Guarantees
//!
//! - The committed total always equals the sum of resident costs and never
//!   exceeds the budget.
//! - Loads and unloads are serialized across the whole manager.
//! - Models pinned by a [`ModelLease`] are never evicted or reaped.
//! - A failed or cancelled load commits nothing.
//!
//! ```no_run
//! use futures::FutureExt;
//! use gg_vram::{ManagerConfig, ModelManager, PriorityClass};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager: ModelManager<u64> = ModelManager::new(ManagerConfig::with_budget_mb(1000));
//! manager.register_fn(
//!     "pose",
//!     600,
//!     PriorityClass::High,
//!     || async { Ok(42u64) }.boxed(),
//!     |_| async { Ok(()) }.boxed(),
//!     true,
//! )?;
//!
//! let handle = manager.fetch("pose").await?;
//! let lease = manager.acquire("pose").await?;
//! assert_eq!(*lease, handle);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod manager;
pub mod memory;
pub mod models;
pub mod telemetry;

pub use error::{AdapterError, ManagerError, RegistryError};
pub use manager::{
    spawn_idle_reaper, ManagerConfig, ManagerStatus, ModelLease, ModelManager, ReaperConfig,
    ResidentStatus,
};
pub use models::{FnAdapter, ModelAdapter, ModelConfig, ModelRegistry, PriorityClass};
