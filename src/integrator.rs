use rayon::prelude::*;

use crate::config::{Config, SourceMode};
use crate::fluxes::{compute_fluxes, reconstruct_walls};
use crate::grid::Grid;
use crate::immersed_boundary::update_ghost_cells;
use crate::source::{compute_source, equilibrium_reconstruction};
use crate::state::{CellKind, Conserved, Triangle};

/// CFL-limited time step (spec §4.7), clamped so a step never overshoots
/// `final_time`.
pub fn update_dt(grid: &Grid, config: &Config, t: f64) -> f64 {
    let lambda_max = grid.walls.par_iter().map(|w| w.lambda_max).reduce(|| 0.0, f64::max);
    let dl = grid.dx.min(grid.dy).min(grid.dz);
    let mut dt = config.cfl * dl / lambda_max;
    if t + dt > config.final_time {
        dt = config.final_time - t;
    }
    dt
}

/// Net flux divergence through a cell's six faces (spec §4.7), using the
/// wall order `[-y, +x, +y, -x, -z, +z]` `Cell::walls` is wired in.
fn divergence(grid: &Grid, cell_idx: usize) -> Conserved {
    let walls = grid.cells[cell_idx].walls;
    let extent = grid.cells[cell_idx].extent;
    let pos_x = &grid.walls[walls[1]];
    let neg_x = &grid.walls[walls[3]];
    let pos_y = &grid.walls[walls[2]];
    let neg_y = &grid.walls[walls[0]];
    let pos_z = &grid.walls[walls[5]];
    let neg_z = &grid.walls[walls[4]];

    let mut div = Conserved::ZERO;
    for k in 0..6 {
        div[k] = (pos_x.f_l_star[k] - neg_x.f_r_star[k]) / extent[0]
            + (pos_y.f_l_star[k] - neg_y.f_r_star[k]) / extent[1]
            + (pos_z.f_l_star[k] - neg_z.f_r_star[k]) / extent[2];
    }
    div
}

/// Recomputes reconstruction, fluxes, the gravity source, and the
/// equilibrium correction (when active) for the current `cell.u`. Shared
/// by every SSP-RK3 sub-stage since each stage evaluates the spatial
/// operator at a different intermediate state.
fn evaluate_operator(grid: &mut Grid, config: &Config) {
    if config.source_mode != SourceMode::None {
        equilibrium_reconstruction(grid, config);
    }
    reconstruct_walls(grid, config);
    compute_fluxes(grid, config);

    let z_has_extent = grid.zc > 1;
    let n_cells = grid.cells.len();
    for idx in 0..n_cells {
        let cell = &grid.cells[idx];
        if cell.kind != CellKind::Fluid || cell.ghost {
            continue;
        }
        let s = compute_source(&cell.u, &cell.ue, &cell.s_corr, config, z_has_extent);
        grid.cells[idx].s = s;
    }
}

/// Advances the grid by one SSP-RK3 (Shu-Osher) step of size `dt` (spec
/// §4.7/§4.9). Three sub-stages, each re-evaluating the spatial operator at
/// the sub-stage's own state, with ghost-cell repair run again right after
/// each sub-stage update so the next stage's reconstruction sees a
/// consistent immersed-boundary state (matching the reference solver's main
/// loop, which repairs ghosts after every `update_cellK{1,2,3}`):
///
/// ```text
/// U1 = U^n - dt * (div(U^n) - S(U^n))
/// U2 = 3/4 U^n + 1/4 U1 - 1/4 dt * (div(U1) - S(U1))
/// U^{n+1} = 1/3 U^n + 2/3 U2 - 2/3 dt * (div(U2) - S(U2))
/// ```
pub fn step(grid: &mut Grid, config: &Config, dt: f64, triangles: &[Triangle]) {
    let n_cells = grid.cells.len();

    evaluate_operator(grid, config);
    for idx in 0..n_cells {
        if grid.cells[idx].kind != CellKind::Fluid || grid.cells[idx].ghost {
            continue;
        }
        let div = divergence(grid, idx);
        let cell = &mut grid.cells[idx];
        cell.u_aux = cell.u;
        cell.u = cell.u - (div - cell.s) * dt;
    }
    if !triangles.is_empty() {
        update_ghost_cells(grid, triangles);
    }

    evaluate_operator(grid, config);
    for idx in 0..n_cells {
        if grid.cells[idx].kind != CellKind::Fluid || grid.cells[idx].ghost {
            continue;
        }
        let div = divergence(grid, idx);
        let cell = &mut grid.cells[idx];
        cell.u = cell.u_aux * 0.75 + cell.u * 0.25 - (div - cell.s) * (0.25 * dt);
    }
    if !triangles.is_empty() {
        update_ghost_cells(grid, triangles);
    }

    evaluate_operator(grid, config);
    for idx in 0..n_cells {
        if grid.cells[idx].kind != CellKind::Fluid || grid.cells[idx].ghost {
            continue;
        }
        let div = divergence(grid, idx);
        let cell = &mut grid.cells[idx];
        cell.u = cell.u_aux * (1.0 / 3.0) + cell.u * (2.0 / 3.0) - (div - cell.s) * ((2.0 / 3.0) * dt);
    }
    if !triangles.is_empty() {
        update_ghost_cells(grid, triangles);
    }
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryCondition, Constants, ReconstructionFamily, RiemannSolver, Tolerances};

    fn config() -> Config {
        Config {
            xcells: 8, ycells: 4, zcells: 4,
            lx: 1.0, ly: 1.0, lz: 1.0,
            boundaries: [BoundaryCondition::Periodic; 6],
            final_time: 1.0, output_interval: 0.1, cfl: 0.4,
            order: 3,
            reconstruction: ReconstructionFamily::Weno,
            riemann_solver: RiemannSolver::Hllc,
            source_mode: SourceMode::None,
            multicomponent: false,
            multicomponent_gamma: Default::default(),
            dirichlet: [None; 6],
            constants: Constants::default(),
            tolerances: Tolerances::default(),
            num_threads: 2,
        }
    }

    #[test]
    fn uniform_state_is_a_fixed_point() {
        let config = config();
        let mut grid = Grid::build(&config).unwrap();
        grid.assign_stencils(config.order);
        let u = Conserved::new(1.0, 0.0, 0.0, 0.0, 2.5, 0.0);
        for cell in grid.cells.iter_mut() {
            cell.u = u;
        }
        step(&mut grid, &config, 1e-4, &[]);
        for cell in &grid.cells {
            for k in 0..5 {
                assert!((cell.u[k] - u[k]).abs() < 1e-8, "component {k} drifted: {}", cell.u[k]);
            }
        }
    }

    #[test]
    fn dt_is_clamped_to_final_time() {
        let mut config = config();
        config.final_time = 1e-6;
        let mut grid = Grid::build(&config).unwrap();
        grid.assign_stencils(config.order);
        for wall in grid.walls.iter_mut() {
            wall.lambda_max = 10.0;
        }
        let dt = update_dt(&grid, &config, 0.0);
        assert!(dt <= config.final_time);
    }
}
