//! GG-VRAM command-line entry point.
//!
//! ## CLI Subcommands
//!
//! - `gg-vram-cli simulate <workload.toml>` - Run a simulated workload
//! - `gg-vram-cli config show|defaults` - Print configuration
//! - `gg-vram-cli version` - Print version

use std::process::ExitCode;

use gg_vram::cli::{config_cmd, run_simulate};
use gg_vram::config as vram_config;
use gg_vram::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "simulate" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: gg-vram-cli simulate <workload.toml>");
                return ExitCode::FAILURE;
            };
            let env = vram_config::load();
            if let Err(e) = telemetry::init_logging(&env.logging) {
                eprintln!("Logging setup failed: {}", e);
                return ExitCode::FAILURE;
            }
            let code = run_simulate(path, &env).await;
            ExitCode::from(code as u8)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_usage();
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("GG-VRAM {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("GG-VRAM {} - on-demand model manager", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("    gg-vram-cli <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    simulate <file>    Run a simulated workload and print the final status");
    println!("    config show        Show effective configuration");
    println!("    config defaults    Show default configuration");
    println!("    version            Print version");
    println!("    help               Print this message");
    println!();
    println!("ENVIRONMENT:");
    println!("    GG_VRAM_BUDGET_MB, GG_VRAM_IDLE_THRESHOLD_SECS, GG_VRAM_SWEEP_INTERVAL_SECS,");
    println!("    GG_VRAM_LOAD_TIMEOUT_SECS, GG_VRAM_LOG_LEVEL, GG_VRAM_LOG_FORMAT");
}
