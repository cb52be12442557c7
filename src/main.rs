use std::path::PathBuf;

use clap::Parser;
use euler3d::{Config, Simulation};

pub static DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub static VERSION_AND_BUILD: &str = git_version::git_version!(prefix = concat!("v", env!("CARGO_PKG_VERSION"), " "));

/// Structured-grid compressible Euler solver.
#[derive(Parser, Debug)]
#[clap(version = VERSION_AND_BUILD, about = DESCRIPTION)]
struct Cli {
    /// YAML case file (see `Config` for the schema).
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    // Triangulated-surface ingestion is an external collaborator (spec §6);
    // this entry point runs without an immersed boundary until one is wired
    // in by the caller.
    let mut simulation = Simulation::new(config, Vec::new())?;
    let diagnostics = simulation.run_until_final_time()?;

    tracing::info!(
        t = diagnostics.t,
        steps = diagnostics.step,
        mass = diagnostics.mass,
        energy = diagnostics.energy,
        "simulation finished"
    );
    Ok(())
}
