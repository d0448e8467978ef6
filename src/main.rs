//! Command-line entry point: build the project in the working directory and
//! extract its release executable.
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use log::{error, info};
use relbin::{
    init_logging, ArtifactStrategy, BuildRunner, CliOverrides, Environment, RunError, RunnerConfig,
};

/// Build a Cargo project in release mode and extract its executable
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// How to locate the built executable
    #[arg(long, value_parser = clap::value_parser!(ArtifactStrategy))]
    strategy: Option<ArtifactStrategy>,

    /// Toolchain program to invoke
    #[arg(long)]
    toolchain: Option<String>,

    /// File name for the extracted executable
    #[arg(long)]
    dest: Option<String>,

    /// Link the C runtime statically
    #[arg(long)]
    static_crt: bool,

    /// Print the planned steps without running them
    #[arg(long)]
    dry_run: bool,

    /// Configuration file (defaults to relbin.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            toolchain: self.toolchain.clone(),
            strategy: self.strategy,
            dest: self.dest.clone(),
            static_crt: self.static_crt.then_some(true),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            error!("{report:?}");
            let code = report
                .downcast_ref::<RunError>()
                .map_or(1, RunError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    color_eyre::install()?;

    let cwd = std::env::current_dir().wrap_err("failed to read the working directory")?;
    let config = RunnerConfig::load(&cwd, args.config.as_deref(), &args.overrides())
        .wrap_err("failed to load configuration")?;
    let runner = BuildRunner::new(config, cwd, Environment::capture());

    if args.dry_run {
        for line in runner.describe_plan() {
            info!("{line}");
        }
        return Ok(());
    }

    runner.run()?;
    Ok(())
}
