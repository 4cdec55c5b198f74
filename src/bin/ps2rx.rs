// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Headless Emotion Engine runner
//!
//! Boots a BIOS (or a raw program image) and runs it for a number of cycles,
//! forwarding the EE debug console to stdout.

use clap::Parser;
use log::{error, info};
use ps2rx::core::config::{EmulatorConfig, ExecutionMode};
use ps2rx::core::error::Result;
use ps2rx::core::save_state::SaveState;
use ps2rx::core::system::System;
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// PlayStation 2 Emotion Engine emulator
#[derive(Parser)]
#[command(name = "ps2rx")]
#[command(about = "PlayStation 2 Emotion Engine emulator", long_about = None)]
struct Args {
    /// Path to PlayStation 2 BIOS file (e.g., SCPH-70012.BIN)
    bios_file: PathBuf,

    /// Number of cycles to execute
    #[arg(short = 'n', long, default_value = "10000000")]
    cycles: u64,

    /// Configuration file (TOML); overrides PS2RX_CONFIG
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Force the uncached interpreter
    #[arg(long)]
    interpreter: bool,

    /// Raw program image copied into RAM after the BIOS is loaded
    #[arg(short = 'p', long)]
    program: Option<PathBuf>,

    /// Physical RAM address for --program
    #[arg(long, default_value = "0x00100000", value_parser = parse_hex)]
    load_addr: u32,

    /// Entry point for --program
    #[arg(long, default_value = "0x80100000", value_parser = parse_hex)]
    entry: u32,

    /// Restore a save state before running
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Write a save state after running
    #[arg(long)]
    save_state: Option<PathBuf>,
}

fn parse_hex(text: &str) -> std::result::Result<u32, String> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid address '{}': {}", text, e))
}

fn load_config(args: &Args) -> Result<EmulatorConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| env::var_os("PS2RX_CONFIG").map(PathBuf::from));

    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            EmulatorConfig::load(path)?
        }
        None => EmulatorConfig::default(),
    };

    if args.interpreter {
        config.mode = ExecutionMode::Interpreter;
    }
    Ok(config)
}

fn main() -> Result<()> {
    // Load .env file if present (for development configuration)
    if let Err(e) = dotenvy::dotenv() {
        // Only log if the error is NOT "file not found"
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize logger with default level INFO
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("ps2rx v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = load_config(&args)?;
    let mut system = System::new(config);

    info!("Loading BIOS from: {}", args.bios_file.display());
    if let Err(e) = system.load_bios(&args.bios_file) {
        error!("Failed to load BIOS: {}", e);
        return Err(e);
    }

    if let Some(program) = &args.program {
        let image = std::fs::read(program)?;
        system.load_program(args.load_addr, &image, args.entry)?;
    }

    if let Some(path) = &args.load_state {
        let state = SaveState::load_from_file(path)?;
        system.load_state(&state)?;
    }

    system.set_console_hook(Box::new(|byte| {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(&[byte]);
        if byte == b'\n' {
            let _ = stdout.flush();
        }
    }));

    info!("Starting emulation...");
    let log_interval = (args.cycles / 10).max(1);
    let mut executed = 0u64;

    while executed < args.cycles {
        let slice = log_interval.min(args.cycles - executed);
        match system.run_cycles(slice) {
            Ok(cycles) => executed += cycles,
            Err(e) => {
                error!("Error at PC=0x{:08X}: {}", system.pc(), e);
                system.cpu().dump_registers();
                return Err(e);
            }
        }

        info!(
            "Progress: {}/{} cycles | PC: 0x{:08X}",
            executed,
            args.cycles,
            system.pc()
        );
    }
    let _ = std::io::stdout().flush();

    let stats = system.stats();
    info!("Emulation completed");
    info!("Total cycles: {}", system.cycles());
    info!("Final PC: 0x{:08X}", system.pc());
    info!(
        "Instructions: {} | blocks built: {} | replays: {} | flushes: {}",
        stats.instructions, stats.blocks_built, stats.blocks_replayed, stats.flushes
    );
    info!(
        "Fast-forwards: {} idle, {} polling | invalidations: {}",
        stats.idle_skips, stats.poll_skips, stats.invalidations
    );

    if let Some(path) = &args.save_state {
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        system.save_state(&label).save_to_file(path)?;
        info!("Saved state to: {}", path.display());
    }

    Ok(())
}
