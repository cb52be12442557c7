use rayon::prelude::*;

use crate::config::{Config, SourceMode};
use crate::grid::Grid;
use crate::state::CellKind;

/// Total fluid mass in the domain (spec §4.8), excluding solid cells.
pub fn mass_total(grid: &Grid) -> f64 {
    let cell_volume = grid.dx * grid.dy * grid.dz;
    grid.cells
        .par_iter()
        .filter(|c| c.kind == CellKind::Fluid)
        .map(|c| c.u.density() * cell_volume)
        .sum()
}

/// Total energy in the domain (spec §4.8). Under the `Augmented` or
/// `Perturbation` energy convention the conserved `U[4]` excludes the
/// gravitational potential, so it is added back in here; `None` and
/// `PerturbationTotalEnergy` already carry it.
pub fn energy_total(grid: &Grid, config: &Config) -> f64 {
    let cell_volume = grid.dx * grid.dy * grid.dz;
    let g = config.constants.gravity;
    let adds_potential = matches!(config.source_mode, SourceMode::Augmented | SourceMode::Perturbation);

    grid.cells
        .par_iter()
        .filter(|c| c.kind == CellKind::Fluid)
        .map(|c| {
            let e = if adds_potential {
                c.u.energy() + c.u.density() * g * c.center[2]
            } else {
                c.u.energy()
            };
            e * cell_volume
        })
        .sum()
}

/// Volume-averaged turbulent kinetic energy over fluid cells (spec §4.8).
pub fn tke_mean(grid: &Grid) -> f64 {
    let cell_volume = grid.dx * grid.dy * grid.dz;
    let (tke, volume): (f64, f64) = grid
        .cells
        .par_iter()
        .filter(|c| c.kind == CellKind::Fluid)
        .map(|c| {
            let [u, v, w] = c.u.velocity();
            (0.5 * c.u.density() * (u * u + v * v + w * w) * cell_volume, cell_volume)
        })
        .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));
    tke / volume
}
