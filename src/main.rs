// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! telemetry-relay command line entry point.
//!
//! ## CLI Subcommands
//!
//! - `telemetry-relay-cli config show` - Effective configuration (default)
//! - `telemetry-relay-cli config validate` - Exit 0 if valid, 1 on warnings
//! - `telemetry-relay-cli heartbeat` - Emit one heartbeat envelope to stdout

use std::path::PathBuf;
use std::process::ExitCode;

use telemetry_relay::cli::{config_cmd, get_config_dir, run_heartbeat};
use telemetry_relay::telemetry::{init_logging, LogConfig, LogFormat};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    let log_config = LogConfig {
        format: LogFormat::Pretty,
        level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        output_path: None,
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let global_dir = get_config_dir();
    let data_dir = data_dir_arg(&args);

    match command {
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => exit_code(config_cmd::run_show(data_dir.as_deref(), &global_dir)),
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => exit_code(config_cmd::run_validate(data_dir.as_deref(), &global_dir)),
                "init" => exit_code(config_cmd::run_init(&global_dir)),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_usage();
                    ExitCode::FAILURE
                }
            }
        }
        "heartbeat" => exit_code(run_heartbeat(data_dir.as_deref(), &global_dir)),
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("telemetry-relay {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

/// Value following `--data-dir`, if given.
fn data_dir_arg(args: &[String]) -> Option<PathBuf> {
    args.iter()
        .position(|a| a == "--data-dir")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code.clamp(0, 255) as u8)
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "telemetry-relay v{}

USAGE:
    telemetry-relay-cli [COMMAND] [OPTIONS]

COMMANDS:
    config show       Print effective configuration (file + env)
    config defaults   Print default configuration
    config validate   Check configuration (exit 0 valid, 1 warnings, 2 unreadable)
    config init       Write a default telemetry.toml to the config directory
    heartbeat         Emit one heartbeat envelope as a JSON line on stdout
    version           Show version information
    help              Show this help message

OPTIONS:
    --data-dir PATH   Directory checked for telemetry.toml before the config directory

ENVIRONMENT:
    TELEMETRY_CONFIG_DIR            Global config directory (default: .)
    TELEMETRY_ENABLE                Override enable (true/false)
    TELEMETRY_MIN_LOG_LEVEL         Override min_log_level
    TELEMETRY_REPORT_HISTORY_LEVEL  Override report_history_level
    TELEMETRY_HISTORY_DEPTH         Override log_history_depth
    TELEMETRY_QUEUE_DEPTH           Override queue_depth
    TELEMETRY_NAME                  Override name
    RUST_LOG                        Output filter (default: info)",
        version
    );
}
