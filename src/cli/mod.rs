// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for GG-VRAM commands.
//!
//! ## Usage
//!
//! ```bash
//! gg-vram-cli config show              # Effective config from GG_VRAM_* env
//! gg-vram-cli config defaults          # Documented defaults
//! gg-vram-cli simulate workload.toml   # Run a simulated workload, print status JSON
//! ```

pub mod config_cmd;
pub mod simulate;

pub use simulate::{run_simulate, run_workload, SimulationReport, Step, Workload, WorkloadError};
