//! yeewave command-line interface.
//!
//! Run 2D TMz FDTD scenarios from TOML configuration files:
//! ```sh
//! yeewave run job.toml
//! yeewave run --preset double_slit -o out/
//! yeewave validate job.toml
//! yeewave presets
//! ```

mod config;
mod presets;
mod runner;
mod sink;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "yeewave")]
#[command(about = "yeewave: 2D TMz FDTD wave simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a TOML configuration file or a built-in preset.
    Run {
        /// Path to the job configuration file.
        #[arg(required_unless_present = "preset")]
        config: Option<PathBuf>,
        /// Name of a built-in scenario (see `yeewave presets`).
        #[arg(long, conflicts_with = "config")]
        preset: Option<String>,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of steps (overrides config file setting).
        #[arg(long)]
        steps: Option<usize>,
    },
    /// Validate a configuration file without running the simulation.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// List the built-in scenarios.
    Presets,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            preset,
            output,
            steps,
        } => {
            println!("yeewave FDTD Solver");
            println!("===================");
            let mut job = match (&config, &preset) {
                (_, Some(name)) => {
                    println!("Preset: {}", name);
                    presets::load(name)?
                }
                (Some(path), None) => {
                    println!("Configuration: {}", path.display());
                    config::load_config(path)?
                }
                (None, None) => anyhow::bail!("either a configuration file or --preset is required"),
            };
            if let Some(steps) = steps {
                job.simulation.steps = steps;
            }

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));
            let report = runner::run_job(&job, &out_dir)?;

            println!(
                "Simulation complete: {} steps in {:.2} s, peak |Ez| = {:.3e}",
                report.run.steps, report.run.elapsed_seconds, report.run.peak_ez
            );
            if report.frames_written > 0 {
                println!("Frames written: {}", report.frames_written);
            }
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let engine = runner::build_engine(&job)?;
            let grid = engine.grid();
            println!("Configuration is valid: {}", config.display());
            println!(
                "  grid {}x{}, dt = {:.3e} s (limit {:.3e} s), {} source(s), {} PEC cell(s)",
                grid.nx(),
                grid.ny(),
                grid.dt(),
                grid.courant_limit(),
                engine.sources().len(),
                engine.mask().count()
            );
            Ok(())
        }
        Commands::Presets => {
            println!("Built-in scenarios:");
            println!();
            for preset in presets::PRESETS {
                println!("  {:<16} {}", preset.name, preset.description);
            }
            Ok(())
        }
    }
}
