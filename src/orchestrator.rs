use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::diagnostics::{energy_total, mass_total, tke_mean};
use crate::error::SolverError;
use crate::fluxes::{compute_fluxes, reconstruct_walls};
use crate::grid::Grid;
use crate::immersed_boundary::{assign_image_points, classify, update_ghost_cells};
use crate::integrator::{step as integrator_step, update_dt};
use crate::physics::{gamma_of, potential_temperature, pressure_from_energy};
use crate::state::{CellKind, Triangle};
use crate::tasks::Tasks;

/// Derived, per-cell scalars exposed to an output collaborator at dump
/// cadence (spec §6): the conserved state plus velocity, pressure,
/// overpressure against the hydrostatic-equilibrium reference, and
/// potential temperature.
#[derive(Debug, Clone, Copy)]
pub struct CellOutput {
    pub center: [f64; 3],
    pub density: f64,
    pub velocity: [f64; 3],
    pub pressure: f64,
    pub overpressure: f64,
    pub potential_temperature: f64,
}

/// Scalars exposed to an output-writing collaborator after every step
/// (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics {
    pub t: f64,
    pub dt: f64,
    pub step: usize,
    pub mass: f64,
    pub energy: f64,
    pub tke: f64,
}

/// Returned by `Simulation::step`: the time advance taken and the
/// simulation clock after it (spec §4.9).
#[derive(Debug, Clone, Copy)]
pub struct StepReport {
    pub dt: f64,
    pub t: f64,
    pub diagnostics: Diagnostics,
}

/// Owns the grid and drives it forward in time (spec §4.9). Construction
/// runs the one-time immersed-boundary classification; `step` runs one
/// full SSP-RK3 advance, repairs ghost cells, and checks the conserved
/// state stays physical.
pub struct Simulation {
    pub config: Config,
    pub grid: Grid,
    pub triangles: Vec<Triangle>,
    pub tasks: Tasks,
    pub t: f64,
    pub step_count: usize,
}

impl Simulation {
    pub fn new(config: Config, triangles: Vec<Triangle>) -> Result<Self, SolverError> {
        config.validate()?;
        let mut grid = Grid::build(&config)?;

        for recovery in grid.assign_stencils(config.order) {
            warn!(?recovery, "downgraded periodic axis");
        }
        for recovery in classify(&mut grid, &triangles) {
            warn!(?recovery, "immersed-boundary classification recovery");
        }
        for recovery in assign_image_points(&mut grid) {
            warn!(?recovery, "ghost cell demoted to solid");
        }
        if !triangles.is_empty() {
            update_ghost_cells(&mut grid, &triangles);
        }

        Ok(Self { config, grid, triangles, tasks: Tasks::new(), t: 0.0, step_count: 0 })
    }

    /// Advances the simulation by one CFL-limited SSP-RK3 step — every
    /// sub-stage's own ghost-cell repair happens inside `integrator::step`
    /// — and returns the Δt taken and the updated clock (spec §4.9).
    pub fn step(&mut self) -> Result<StepReport, SolverError> {
        let span = info_span!("step", step = self.step_count, t = self.t);
        let _guard = span.enter();

        // A throwaway flux pass to populate lambda_max before committing to
        // a step size; `integrator::step` recomputes fluxes at every
        // sub-stage regardless.
        reconstruct_walls(&mut self.grid, &self.config);
        compute_fluxes(&mut self.grid, &self.config);
        let dt = update_dt(&self.grid, &self.config, self.t);

        integrator_step(&mut self.grid, &self.config, dt, &self.triangles);

        self.validate_state()?;

        self.t += dt;
        self.step_count += 1;

        let mass = mass_total(&self.grid);
        let energy = energy_total(&self.grid, &self.config);
        let tke = tke_mean(&self.grid);

        if self.tasks.report_progress.is_due(self.t) {
            info!(t = self.t, dt, mass, energy, tke, "progress");
            self.tasks.report_progress.advance(self.config.output_interval);
        }

        let diagnostics = Diagnostics { t: self.t, dt, step: self.step_count, mass, energy, tke };
        Ok(StepReport { dt, t: self.t, diagnostics })
    }

    /// Repeatedly steps until `config.final_time` is reached.
    pub fn run_until_final_time(&mut self) -> Result<Diagnostics, SolverError> {
        let mut last = Diagnostics { t: self.t, dt: 0.0, step: self.step_count, mass: 0.0, energy: 0.0, tke: 0.0 };
        while self.t < self.config.final_time {
            last = self.step()?.diagnostics;
        }
        Ok(last)
    }

    /// Steps until `t_final`, invoking `on_output` whenever the elapsed time
    /// crosses an `output_interval` boundary, tracked the same
    /// recurring-due-time way `Tasks::report_progress` is (spec §4.9).
    pub fn run_until(&mut self, t_final: f64, mut on_output: impl FnMut(&Simulation)) -> Result<(), SolverError> {
        while self.t < t_final {
            self.step()?;
            if self.tasks.write_primitives.is_due(self.t) || self.t >= t_final {
                on_output(self);
                while self.tasks.write_primitives.is_due(self.t) {
                    self.tasks.write_primitives.advance(self.config.output_interval);
                }
            }
        }
        Ok(())
    }

    /// Per-cell derived scalars for the current state, for an output
    /// collaborator to serialize at dump cadence (spec §6).
    pub fn output_snapshot(&self) -> Vec<CellOutput> {
        self.grid.cells.iter().map(|cell| {
            let gamma = gamma_of(&cell.u, &self.config);
            let rho = cell.u.density();
            let velocity = cell.u.velocity();
            let pressure = pressure_from_energy(gamma, cell.u.energy(), velocity, rho, cell.center[2], &self.config);
            let gamma_e = gamma_of(&cell.ue, &self.config);
            let pressure_e = pressure_from_energy(
                gamma_e, cell.ue.energy(), cell.ue.velocity(), cell.ue.density(), cell.center[2], &self.config,
            );
            CellOutput {
                center: cell.center,
                density: rho,
                velocity,
                pressure,
                overpressure: pressure - pressure_e,
                potential_temperature: potential_temperature(pressure, rho, gamma, &self.config),
            }
        }).collect()
    }

    fn validate_state(&self) -> Result<(), SolverError> {
        for cell in &self.grid.cells {
            if cell.kind != CellKind::Fluid {
                continue;
            }
            let rho = cell.u.density();
            let gamma = gamma_of(&cell.u, &self.config);
            let pressure = pressure_from_energy(gamma, cell.u.energy(), cell.u.velocity(), rho, cell.center[2], &self.config);
            if rho <= 0.0 || pressure <= 0.0 {
                let (l, m, n) = cell.index;
                return Err(SolverError::NegativeDensityOrPressure { l, m, n });
            }
        }
        Ok(())
    }
}
