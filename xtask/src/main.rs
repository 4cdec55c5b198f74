use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Largest accepted PS2 BIOS image (4MB ROM window)
const MAX_BIOS_SIZE: u64 = 4 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for ps2rx")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Library areas with their own test modules
#[derive(Clone, Copy, ValueEnum)]
enum Area {
    Cpu,
    Driver,
    Mmi,
    Fpu,
    Memory,
    Timing,
    SaveState,
    System,
}

impl Area {
    /// Test filter passed to `cargo test --lib`
    fn filter(self) -> &'static str {
        match self {
            Area::Cpu => "core::cpu",
            Area::Driver => "core::cpu::tests::driver",
            Area::Mmi => "core::cpu::tests::mmi",
            Area::Fpu => "core::cpu::tests::fpu",
            Area::Memory => "core::memory",
            Area::Timing => "core::timing",
            Area::SaveState => "save_state",
            Area::System => "core::system",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        /// Restrict to one or more library areas
        #[arg(long = "area", value_enum)]
        areas: Vec<Area>,
    },
    /// Run benchmarks, optionally filtered by name
    Bench { filter: Option<String> },
    /// Boot a real BIOS image through the ps2rx binary
    BiosBoot {
        /// Path to BIOS file
        #[arg(default_value = "SCPH-70012.BIN")]
        bios_path: String,
        /// Number of cycles to execute
        #[arg(short = 'n', long, default_value = "10000000")]
        cycles: u64,
        /// Run the uncached interpreter instead of the block cache
        #[arg(long)]
        interpreter: bool,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Pre-commit hook (fmt, clippy, test)
    PreCommit,
    /// Install git hooks
    InstallHooks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Check { verbose } => run_check(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            ignored,
            areas,
        } => run_test(doc, ignored, &areas),
        Commands::Bench { filter } => run_bench(filter.as_deref()),
        Commands::BiosBoot {
            bios_path,
            cycles,
            interpreter,
            release,
        } => run_bios_boot(&bios_path, cycles, interpreter, release),
        Commands::PreCommit => run_pre_commit(),
        Commands::InstallHooks => install_hooks(),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Pipeline ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Build", || run_build(false), verbose)?;
    run_task("Test", || run_test(false, false, &[]), verbose)?;
    run_task("Doc Test", || run_test(true, false, &[]), verbose)?;

    report_elapsed("CI passed in", start);
    Ok(())
}

fn run_check(verbose: bool) -> Result<()> {
    println!("{}", "=== Running Quick Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;

    report_elapsed("Checks passed in", start);
    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy").arg("--workspace").arg("--all-targets");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("build");

    if release {
        cmd.arg("--release");
    }

    execute_command(&mut cmd)
}

fn cargo_test(extra: &[&str], ignored: bool) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg("test").arg("-p").arg("ps2rx").args(extra);

    if ignored {
        cmd.arg("--").arg("--ignored");
    }
    cmd
}

fn run_test(doc: bool, ignored: bool, areas: &[Area]) -> Result<()> {
    if doc {
        return execute_command(&mut cargo_test(&["--doc"], ignored));
    }

    if areas.is_empty() {
        return execute_command(&mut cargo_test(&[], ignored));
    }

    let mut failed = Vec::new();

    for &area in areas {
        let name = area.filter();
        println!("{} Running {} tests...", "→".blue(), name.bold());

        match execute_command(&mut cargo_test(&["--lib", name], ignored)) {
            Ok(_) => println!("{} {} tests passed\n", "✓".green(), name),
            Err(e) => {
                println!("{} {} tests failed\n", "✗".red(), name);
                if areas.len() == 1 {
                    return Err(e);
                }
                failed.push(name);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Tests failed in: {}", failed.join(", "))
    }
}

fn run_bench(filter: Option<&str>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench").arg("-p").arg("ps2rx");

    if let Some(filter) = filter {
        cmd.arg("--").arg(filter);
    }

    execute_command(&mut cmd)
}

fn run_bios_boot(bios_path: &str, cycles: u64, interpreter: bool, release: bool) -> Result<()> {
    println!("{}", "=== BIOS Boot ===".bold().blue());

    let path = Path::new(bios_path);
    if !path.exists() {
        println!(
            "{} BIOS file not found: {}",
            "✗".red().bold(),
            bios_path.yellow()
        );
        println!(
            "\n{} Pass the path of a PS2 BIOS dump (e.g., SCPH-70012.BIN).",
            "ℹ".blue()
        );
        anyhow::bail!("BIOS file not found");
    }

    let size = std::fs::metadata(path)?.len();
    if size == 0 || size > MAX_BIOS_SIZE {
        println!(
            "{} Invalid BIOS size: {} bytes (expected at most {} bytes)",
            "✗".red().bold(),
            size,
            MAX_BIOS_SIZE
        );
        anyhow::bail!("Invalid BIOS file size");
    }

    println!("{} BIOS file: {}", "✓".green(), bios_path.cyan());
    println!("{} Cycles: {}", "→".blue(), cycles.to_string().bold());
    println!(
        "{} Mode: {}",
        "→".blue(),
        if interpreter {
            "interpreter".yellow().bold()
        } else {
            "block cache".green().bold()
        }
    );
    println!();

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run").arg("-p").arg("ps2rx").arg("--bin").arg("ps2rx");

    if release {
        cmd.arg("--release");
    }

    cmd.arg("--")
        .arg(bios_path)
        .arg("-n")
        .arg(cycles.to_string());

    if interpreter {
        cmd.arg("--interpreter");
    }

    if let Err(e) = execute_command(&mut cmd) {
        println!("\n{} BIOS boot failed", "✗".red().bold());
        return Err(e);
    }

    report_elapsed("BIOS boot completed in", start);
    Ok(())
}

fn run_pre_commit() -> Result<()> {
    println!("{}", "=== Pre-commit Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), false)?;
    run_task("Clippy", || run_clippy(false), false)?;
    run_task("Test", || run_test(false, false, &[]), false)?;

    report_elapsed("Pre-commit checks passed in", start);
    Ok(())
}

fn install_hooks() -> Result<()> {
    use std::fs;

    println!("{}", "Installing git hooks...".bold());

    let hook_content = r#"#!/bin/sh
# Auto-generated by cargo x install-hooks
set -e

cargo x pre-commit
"#;

    let hook_path = ".git/hooks/pre-commit";
    fs::write(hook_path, hook_content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(hook_path, perms)?;
    }

    println!("{}", "✓ Git hooks installed".green());
    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn report_elapsed(message: &str, start: Instant) {
    println!(
        "\n{} {}",
        format!("✓ {}", message).green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
