use crate::config::{Config, SourceMode};
use crate::grid::Grid;
use crate::physics::{gamma_of, pressure_from_energy};
use crate::reconstruction::reconstruct;
use crate::state::{Axis, Conserved};

/// Reconstructs the hydrostatic-equilibrium state `Ue` at every z-wall and
/// derives each cell's pressure-gradient correction `s_corr[3]` (spec §4.5).
/// Must run after `Cell::ue` has been populated and before `compute_source`.
pub fn equilibrium_reconstruction(grid: &mut Grid, config: &Config) {
    let n_walls = grid.walls.len();
    for wall_id in 0..n_walls {
        if grid.walls[wall_id].axis != Axis::Z {
            continue;
        }
        let (cell_l, cell_r) = (grid.walls[wall_id].cell_l, grid.walls[wall_id].cell_r);
        let st_l = grid.cells[cell_l].st_z;
        let st_r = grid.cells[cell_r].st_z;

        let mut ule = Conserved::ZERO;
        let mut ure = Conserved::ZERO;
        for k in 0..6 {
            let phi_l: Vec<f64> = (0..st_l.size).map(|i| grid.cells[st_l.members[i]].ue[k]).collect();
            let (_, right) = reconstruct(&phi_l, st_l.size, config.reconstruction, &config.tolerances);
            ule[k] = right;

            let phi_r: Vec<f64> = (0..st_r.size).map(|i| grid.cells[st_r.members[i]].ue[k]).collect();
            let (left, _) = reconstruct(&phi_r, st_r.size, config.reconstruction, &config.tolerances);
            ure[k] = left;
        }

        let gamma_l = gamma_of(&ule, config);
        let gamma_r = gamma_of(&ure, config);
        let ple = pressure_from_energy(gamma_l, ule.energy(), ule.velocity(), ule.density(), grid.walls[wall_id].z, config);
        let pre = pressure_from_energy(gamma_r, ure.energy(), ure.velocity(), ure.density(), grid.walls[wall_id].z, config);

        let wall = &mut grid.walls[wall_id];
        wall.ule = ule;
        wall.ure = ure;
        wall.ple = ple;
        wall.pre = pre;
    }

    for n in 0..grid.zc {
        for m in 0..grid.yc {
            for l in 0..grid.xc {
                let idx = grid.cell_index(l, m, n);
                let neg_z = grid.cells[idx].walls[4];
                let pos_z = grid.cells[idx].walls[5];
                let ue0 = grid.cells[idx].ue.density();
                let dz = grid.cells[idx].extent[2];
                let mut s_corr = Conserved::ZERO;
                s_corr[3] = (grid.walls[pos_z].ple - grid.walls[neg_z].pre) / dz + config.constants.gravity * ue0;
                grid.cells[idx].s_corr = s_corr;
            }
        }
    }
}

/// Fills `cell.s` with the gravitational source term for the configured
/// mode (spec §4.5). `z_has_extent` disables the vertical momentum term
/// under `Augmented` only, when the domain is effectively 2-D in z (a
/// single cell thick); `Perturbation` sets it unconditionally, matching
/// the reference solver's ST==1 vs ST==2 treatment.
pub fn compute_source(u: &Conserved, ue: &Conserved, s_corr: &Conserved, config: &Config, z_has_extent: bool) -> Conserved {
    let g = config.constants.gravity;
    let mut s = Conserved::ZERO;
    match config.source_mode {
        SourceMode::None => {}
        SourceMode::Augmented => {
            s[3] = -g * u.density() + s_corr[3];
            if z_has_extent {
                s[4] = -g * u.momentum()[2];
            }
        }
        SourceMode::Perturbation => {
            s[3] = -g * (u.density() - ue.density());
            s[4] = -g * u.momentum()[2];
        }
        SourceMode::PerturbationTotalEnergy => {
            s[3] = -g * (u.density() - ue.density());
            s[4] = 0.0;
        }
    }
    s
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryCondition, Constants, ReconstructionFamily, RiemannSolver, Tolerances};

    fn config_with(source_mode: SourceMode, riemann_solver: RiemannSolver) -> Config {
        Config {
            xcells: 4, ycells: 4, zcells: 6,
            lx: 1.0, ly: 1.0, lz: 1.0,
            boundaries: [BoundaryCondition::Periodic; 6],
            final_time: 1.0, output_interval: 0.1, cfl: 0.5,
            order: 3,
            reconstruction: ReconstructionFamily::Weno,
            riemann_solver,
            source_mode,
            multicomponent: false,
            multicomponent_gamma: Default::default(),
            dirichlet: [None; 6],
            constants: Constants::default(),
            tolerances: Tolerances::default(),
            num_threads: 2,
        }
    }

    #[test]
    fn no_source_mode_yields_zero() {
        let config = config_with(SourceMode::None, RiemannSolver::Hllc);
        let u = Conserved::new(1.0, 0.0, 0.0, 1.0, 2.5, 0.0);
        let s = compute_source(&u, &Conserved::ZERO, &Conserved::ZERO, &config, true);
        assert_eq!(s, Conserved::ZERO);
    }

    #[test]
    fn perturbation_total_energy_zeroes_energy_source() {
        let config = config_with(SourceMode::PerturbationTotalEnergy, RiemannSolver::Hlle);
        let u = Conserved::new(1.2, 0.0, 0.0, 0.3, 2.5, 0.0);
        let ue = Conserved::new(1.0, 0.0, 0.0, 0.0, 2.5, 0.0);
        let s = compute_source(&u, &ue, &Conserved::ZERO, &config, true);
        assert_eq!(s[4], 0.0);
        assert!((s[3] - (-config.constants.gravity * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn augmented_mode_includes_pressure_correction() {
        let config = config_with(SourceMode::Augmented, RiemannSolver::Hlls);
        let u = Conserved::new(1.0, 0.0, 0.0, 0.0, 2.5, 0.0);
        let mut s_corr = Conserved::ZERO;
        s_corr[3] = 3.0;
        let s = compute_source(&u, &Conserved::ZERO, &s_corr, &config, true);
        assert!((s[3] - (-config.constants.gravity * 1.0 + 3.0)).abs() < 1e-12);
    }
}
