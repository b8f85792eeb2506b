//! `simulate` subcommand: drive a manager with simulated models.
//!
//! A workload file declares a set of models with fake load latencies and a
//! list of steps to run against them in order. Budget, per-call timeout and
//! reaper settings come from the `GG_VRAM_*` environment unless the file
//! overrides them.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::EnvConfig;
use crate::error::AdapterError;
use crate::manager::{
    spawn_idle_reaper, ManagerConfig, ManagerStatus, ModelLease, ModelManager, ReaperConfig,
};
use crate::models::PriorityClass;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("Failed to read workload file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Invalid workload file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid model {0}: {1}")]
    Model(String, String),
}

/// A model that only pretends to occupy accelerator memory.
#[derive(Debug)]
pub struct SimulatedModel {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedModelSpec {
    pub id: String,
    pub cost_mb: u64,
    #[serde(default)]
    pub priority: PriorityClass,
    #[serde(default)]
    pub load_ms: u64,
    #[serde(default)]
    pub fail_load: bool,
    #[serde(default)]
    pub fail_unload: bool,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    Fetch { model: String },
    Acquire { model: String },
    Release { model: String },
    Unload { model: String },
    Sweep { idle_secs: u64 },
    Sleep { ms: u64 },
}

/// Idle reaper settings for the duration of the workload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReaperSpec {
    pub interval_ms: u64,
    pub idle_threshold_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workload {
    /// Overrides `GG_VRAM_BUDGET_MB`.
    #[serde(default)]
    pub budget_mb: Option<u64>,
    /// Overrides `GG_VRAM_LOAD_TIMEOUT_SECS` for each fetch/acquire.
    #[serde(default)]
    pub load_timeout_ms: Option<u64>,
    /// Overrides the `GG_VRAM_SWEEP_INTERVAL_SECS` / `GG_VRAM_IDLE_THRESHOLD_SECS` reaper.
    #[serde(default)]
    pub reaper: Option<ReaperSpec>,
    #[serde(default)]
    pub models: Vec<SimulatedModelSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Workload {
    pub fn from_file(path: &Path) -> Result<Self, WorkloadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<StepOutcome>,
    pub status: ManagerStatus,
}

type SimHandle = Arc<SimulatedModel>;

fn build_manager(
    workload: &Workload,
    env: &EnvConfig,
) -> Result<ModelManager<SimHandle>, WorkloadError> {
    let config = match workload.budget_mb {
        Some(budget_mb) => ManagerConfig::with_budget_mb(budget_mb),
        None => env.manager_config(),
    };
    let manager = ModelManager::new(config);

    for spec in &workload.models {
        let load_spec = spec.clone();
        let fail_unload = spec.fail_unload;
        manager
            .register_fn(
                spec.id.clone(),
                spec.cost_mb,
                spec.priority,
                move || {
                    let spec = load_spec.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(spec.load_ms)).await;
                        if spec.fail_load {
                            return Err(AdapterError::new(format!("simulated load failure for {}", spec.id)));
                        }
                        Ok(Arc::new(SimulatedModel { id: spec.id }))
                    }
                    .boxed()
                },
                move |handle: SimHandle| {
                    async move {
                        if fail_unload {
                            return Err(AdapterError::new(format!(
                                "simulated unload failure for {}",
                                handle.id
                            )));
                        }
                        Ok(())
                    }
                    .boxed()
                },
                spec.enabled,
            )
            .map_err(|e| WorkloadError::Model(spec.id.clone(), e.to_string()))?;
    }

    Ok(manager)
}

/// Run every step in order and report the outcome of each.
///
/// Settings the workload leaves out are taken from `env`.
pub async fn run_workload(
    workload: &Workload,
    env: &EnvConfig,
) -> Result<SimulationReport, WorkloadError> {
    let manager = build_manager(workload, env)?;
    let timeout = workload
        .load_timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(env.load_timeout);
    let reaper_config = match &workload.reaper {
        Some(spec) => ReaperConfig {
            interval: Duration::from_millis(spec.interval_ms.max(1)),
            idle_threshold: Duration::from_millis(spec.idle_threshold_ms),
        },
        None => env.reaper.clone(),
    };
    let shutdown = CancellationToken::new();
    let reaper = spawn_idle_reaper(manager.clone(), reaper_config, shutdown.clone());
    let mut leases: HashMap<String, Vec<ModelLease<SimHandle>>> = HashMap::new();
    let mut outcomes = Vec::with_capacity(workload.steps.len());

    for (index, step) in workload.steps.iter().enumerate() {
        let (op, result): (&'static str, Result<String, String>) = match step {
            Step::Fetch { model } => (
                "fetch",
                manager
                    .fetch_with_timeout(model, timeout)
                    .await
                    .map(|h| format!("fetched {}", h.id))
                    .map_err(|e| e.to_string()),
            ),
            Step::Acquire { model } => (
                "acquire",
                match manager.acquire_with_timeout(model, timeout).await {
                    Ok(lease) => {
                        leases.entry(model.clone()).or_default().push(lease);
                        Ok(format!("acquired {model}"))
                    }
                    Err(e) => Err(e.to_string()),
                },
            ),
            Step::Release { model } => (
                "release",
                match leases.get_mut(model).and_then(Vec::pop) {
                    Some(lease) => {
                        manager.release(lease);
                        Ok(format!("released {model}"))
                    }
                    None => Err(format!("no lease held on {model}")),
                },
            ),
            Step::Unload { model } => (
                "unload",
                match manager.unload(model).await {
                    Ok(true) => Ok(format!("unloaded {model}")),
                    Ok(false) => Ok(format!("{model} was not resident")),
                    Err(e) => Err(e.to_string()),
                },
            ),
            Step::Sweep { idle_secs } => {
                let unloaded = manager.sweep_idle(Duration::from_secs(*idle_secs)).await;
                ("sweep", Ok(format!("unloaded {unloaded:?}")))
            }
            Step::Sleep { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                ("sleep", Ok(format!("slept {ms}ms")))
            }
        };

        let (ok, detail) = match result {
            Ok(detail) => (true, detail),
            Err(detail) => (false, detail),
        };
        outcomes.push(StepOutcome {
            step: index,
            op,
            ok,
            detail,
        });
    }

    shutdown.cancel();
    if let Err(e) = reaper.await {
        tracing::warn!(error = %e, "idle reaper task failed");
    }

    let status = manager.status();
    drop(leases);
    Ok(SimulationReport {
        steps: outcomes,
        status,
    })
}

/// Entry point for `gg-vram-cli simulate <workload.toml>`.
pub async fn run_simulate(path: &str, env: &EnvConfig) -> i32 {
    let workload = match Workload::from_file(Path::new(path)) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    match run_workload(&workload, env).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{json}");
                0
            }
            Err(e) => {
                eprintln!("Error: failed to serialize report: {e}");
                1
            }
        },
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}
