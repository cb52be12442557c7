use rayon::prelude::*;

use crate::config::{Config, RiemannSolver};
use crate::grid::Grid;
use crate::reconstruction::reconstruct;
use crate::riemann::{dirichlet, hlle, hllc, hlls, solid_wall, transmissive};
use crate::state::{Axis, Conserved, Wall, WallKind};
use crate::transport::compute_transport;

/// Extrapolates `Cell::u` to every wall face (spec §4.2/§4.9). `wall.ul`
/// comes from `cell_l`'s own axis stencil evaluated at its upper face;
/// `wall.ur` comes from `cell_r`'s own axis stencil evaluated at its lower
/// face — the two independent one-sided reconstructions a Riemann solver
/// needs.
pub fn reconstruct_walls(grid: &mut Grid, config: &Config) {
    let cells = &grid.cells;
    let mut walls = std::mem::take(&mut grid.walls);

    walls.par_iter_mut().for_each(|wall| {
        let (st_l, st_r) = match wall.axis {
            Axis::X => (cells[wall.cell_l].st_x, cells[wall.cell_r].st_x),
            Axis::Y => (cells[wall.cell_l].st_y, cells[wall.cell_r].st_y),
            Axis::Z => (cells[wall.cell_l].st_z, cells[wall.cell_r].st_z),
        };

        let mut ul = Conserved::ZERO;
        let mut ur = Conserved::ZERO;
        for k in 0..6 {
            let phi_l: Vec<f64> = (0..st_l.size).map(|i| cells[st_l.members[i]].u[k]).collect();
            let (_, right) = reconstruct(&phi_l, st_l.size, config.reconstruction, &config.tolerances);
            ul[k] = right;

            let phi_r: Vec<f64> = (0..st_r.size).map(|i| cells[st_r.members[i]].u[k]).collect();
            let (left, _) = reconstruct(&phi_r, st_r.size, config.reconstruction, &config.tolerances);
            ur[k] = left;
        }
        wall.ul = ul;
        wall.ur = ur;
    });

    grid.walls = walls;
}

/// Whether the domain's interior cell sits on the low-index side of a
/// boundary wall. Boundary ids are ordered [-x,+x,-y,+y,-z,+z]; the "+"
/// faces (even ids) have their interior cell on the left.
fn interior_on_left(wall: &Wall) -> bool {
    wall.boundary_id.map_or(true, |id| id % 2 == 0)
}

/// Runs the configured Riemann solver (or the appropriate boundary
/// treatment) at every wall, then the upwind passive-scalar transport flux
/// (spec §4.3/§4.4/§4.9). Must run after `reconstruct_walls` and, when
/// gravity is active, after `source::equilibrium_reconstruction`.
pub fn compute_fluxes(grid: &mut Grid, config: &Config) {
    grid.walls.par_iter_mut().for_each(|wall| {
        match wall.kind {
            WallKind::Inactive => return,
            WallKind::Inner => match config.riemann_solver {
                RiemannSolver::Hlle => hlle(wall, config),
                RiemannSolver::Hllc => hllc(wall, config),
                RiemannSolver::Hlls => hlls(wall, config),
            },
            WallKind::Transmissive => transmissive(wall, config, interior_on_left(wall)),
            WallKind::SolidWall => solid_wall(wall, config, interior_on_left(wall)),
            WallKind::UserDirichlet => dirichlet(wall, config, interior_on_left(wall)),
        }
        compute_transport(wall);
    });
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryCondition, Constants, ReconstructionFamily, SourceMode, Tolerances};

    fn uniform_config() -> Config {
        Config {
            xcells: 6, ycells: 4, zcells: 4,
            lx: 1.0, ly: 1.0, lz: 1.0,
            boundaries: [BoundaryCondition::Periodic; 6],
            final_time: 1.0, output_interval: 0.1, cfl: 0.5,
            order: 5,
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
    fn user_dirichlet_wall_uses_the_prescribed_state_not_the_wraparound_neighbor() {
        use crate::config::DirichletState;

        let mut config = uniform_config();
        config.boundaries[0] = BoundaryCondition::User;
        config.boundaries[1] = BoundaryCondition::User;
        config.dirichlet[0] = Some(DirichletState {
            density: 2.0, velocity: [0.0; 3], pressure: 5.0, scalar: 0.0,
        });
        config.dirichlet[1] = Some(DirichletState {
            density: 2.0, velocity: [0.0; 3], pressure: 5.0, scalar: 0.0,
        });

        let mut grid = Grid::build(&config).unwrap();
        grid.assign_stencils(config.order);
        let interior = Conserved::new(1.0, 0.0, 0.0, 0.0, 2.5, 0.0);
        for cell in grid.cells.iter_mut() {
            cell.u = interior;
        }
        reconstruct_walls(&mut grid, &config);
        compute_fluxes(&mut grid, &config);

        let prescribed = config.dirichlet[0].unwrap().to_conserved(config.constants.gamma);
        for wall in grid.walls.iter().filter(|w| w.boundary_id.map_or(false, |id| id == 1 || id == 2)) {
            assert_eq!(wall.kind, WallKind::UserDirichlet);
            assert!((wall.f_l_star[0] - wall.f_r_star[0]).abs() < 1e-12);
            assert_ne!(prescribed.density(), interior.density());
        }
    }

    #[test]
    fn uniform_state_has_zero_net_flux_divergence() {
        let config = uniform_config();
        let mut grid = Grid::build(&config).unwrap();
        grid.assign_stencils(config.order);
        let u = Conserved::new(1.2, 0.3, 0.0, 0.0, 3.0, 0.0);
        for cell in grid.cells.iter_mut() {
            cell.u = u;
        }
        reconstruct_walls(&mut grid, &config);
        for wall in &grid.walls {
            for k in 0..5 {
                assert!((wall.ul[k] - u[k]).abs() < 1e-8);
                assert!((wall.ur[k] - u[k]).abs() < 1e-8);
            }
        }
        compute_fluxes(&mut grid, &config);
        for wall in &grid.walls {
            assert!(wall.f_l_star[0].is_finite());
        }
    }
}
