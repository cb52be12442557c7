use crate::config::{BoundaryCondition, Config};
use crate::error::{Recovery, SolverError};
use crate::state::{Axis, Cell, CellKind, Conserved, Node, Stencil, Wall, WallKind};

/// A structured, axis-aligned Cartesian grid: cells, walls, and nodes.
///
/// Each axis gets one more wall plane than it has cells (`xc+1` planes for
/// `xc` cells), so the low and high domain boundaries are always distinct
/// `Wall` objects, even when that axis is periodic (in which case both
/// planes carry the same physical interface, wired to each other's cells
/// by wraparound, and both stay tagged `Inner`).
pub struct Grid {
    pub xc: usize,
    pub yc: usize,
    pub zc: usize,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,

    pub cells: Vec<Cell>,
    pub walls: Vec<Wall>,
    pub nodes: Vec<Node>,

    pub periodic_x: bool,
    pub periodic_y: bool,
    pub periodic_z: bool,

    n_wall_x: usize,
    n_wall_y: usize,
}

impl Grid {
    #[inline]
    pub fn cell_index(&self, l: usize, m: usize, n: usize) -> usize {
        (n * self.yc + m) * self.xc + l
    }

    #[inline]
    fn wrap(i: i64, count: usize) -> usize {
        i.rem_euclid(count as i64) as usize
    }

    /// Wall plane at position `l` (0..=xc) separating cell `l-1` from cell `l`.
    fn wall_x_id(&self, l: usize, m: usize, n: usize) -> usize {
        (n * self.yc + m) * (self.xc + 1) + l
    }
    fn wall_y_id(&self, l: usize, m: usize, n: usize) -> usize {
        self.n_wall_x + (n * (self.yc + 1) + m) * self.xc + l
    }
    fn wall_z_id(&self, l: usize, m: usize, n: usize) -> usize {
        self.n_wall_x + self.n_wall_y + (n * self.yc + m) * self.xc + l
    }

    pub fn build(config: &Config) -> Result<Grid, SolverError> {
        let (xc, yc, zc) = (config.xcells, config.ycells, config.zcells);
        let (dx, dy, dz) = (config.lx / xc as f64, config.ly / yc as f64, config.lz / zc as f64);
        let n_cells = xc * yc * zc;

        let mut cells = Vec::with_capacity(n_cells);
        for n in 0..zc {
            for m in 0..yc {
                for l in 0..xc {
                    let center = [(l as f64 + 0.5) * dx, (m as f64 + 0.5) * dy, (n as f64 + 0.5) * dz];
                    cells.push(Cell {
                        index: (l, m, n),
                        center,
                        extent: [dx, dy, dz],
                        walls: [0; 6],
                        nodes: [0; 8],
                        u: Conserved::ZERO,
                        u_aux: Conserved::ZERO,
                        ue: Conserved::ZERO,
                        s: Conserved::ZERO,
                        s_corr: Conserved::ZERO,
                        kind: CellKind::Fluid,
                        ghost: false,
                        image_point: [0.0; 3],
                        image_neighbors: [0; 8],
                        image_weights: [0.0; 8],
                        triangle: None,
                        dist_solid: [f64::INFINITY; 3],
                        st_x: Stencil::first_order(0),
                        st_y: Stencil::first_order(0),
                        st_z: Stencil::first_order(0),
                    });
                }
            }
        }

        let n_wall_x = (xc + 1) * yc * zc;
        let n_wall_y = xc * (yc + 1) * zc;
        let n_wall_z = xc * yc * (zc + 1);

        let blank_wall = Wall {
            axis: Axis::X, z: 0.0, cell_l: 0, cell_r: 0,
            ul: Conserved::ZERO, ur: Conserved::ZERO, ule: Conserved::ZERO, ure: Conserved::ZERO,
            ple: 0.0, pre: 0.0,
            f_l_star: Conserved::ZERO, f_r_star: Conserved::ZERO,
            kind: WallKind::Inner, boundary_id: None, dirichlet: Conserved::ZERO, lambda_max: 0.0,
        };
        let mut walls = vec![blank_wall; n_wall_x + n_wall_y + n_wall_z];

        let mut grid = Grid {
            xc, yc, zc, dx, dy, dz,
            cells,
            walls: Vec::new(),
            nodes: Vec::new(),
            periodic_x: config.periodic_x(),
            periodic_y: config.periodic_y(),
            periodic_z: config.periodic_z(),
            n_wall_x, n_wall_y,
        };

        // x-planes: l = 0..=xc
        for n in 0..zc {
            for m in 0..yc {
                for l in 0..=xc {
                    let id = grid.wall_x_id(l, m, n);
                    let (cl, cr, boundary_id) = if l == 0 {
                        (grid.cell_index(Grid::wrap(-1, xc), m, n), grid.cell_index(0, m, n), Some(1u8))
                    } else if l == xc {
                        (grid.cell_index(xc - 1, m, n), grid.cell_index(0, m, n), Some(2u8))
                    } else {
                        (grid.cell_index(l - 1, m, n), grid.cell_index(l, m, n), None)
                    };
                    walls[id] = Wall {
                        axis: Axis::X, z: grid.cells[cr].center[2],
                        cell_l: cl, cell_r: cr,
                        ul: Conserved::ZERO, ur: Conserved::ZERO, ule: Conserved::ZERO, ure: Conserved::ZERO,
                        ple: 0.0, pre: 0.0,
                        f_l_star: Conserved::ZERO, f_r_star: Conserved::ZERO,
                        kind: WallKind::Inner, boundary_id, dirichlet: Conserved::ZERO, lambda_max: 0.0,
                    };
                }
            }
        }

        // y-planes: m = 0..=yc
        for n in 0..zc {
            for m in 0..=yc {
                for l in 0..xc {
                    let id = grid.wall_y_id(l, m, n);
                    let (cl, cr, boundary_id) = if m == 0 {
                        (grid.cell_index(l, Grid::wrap(-1, yc), n), grid.cell_index(l, 0, n), Some(3u8))
                    } else if m == yc {
                        (grid.cell_index(l, yc - 1, n), grid.cell_index(l, 0, n), Some(4u8))
                    } else {
                        (grid.cell_index(l, m - 1, n), grid.cell_index(l, m, n), None)
                    };
                    walls[id] = Wall {
                        axis: Axis::Y, z: grid.cells[cr].center[2],
                        cell_l: cl, cell_r: cr,
                        ul: Conserved::ZERO, ur: Conserved::ZERO, ule: Conserved::ZERO, ure: Conserved::ZERO,
                        ple: 0.0, pre: 0.0,
                        f_l_star: Conserved::ZERO, f_r_star: Conserved::ZERO,
                        kind: WallKind::Inner, boundary_id, dirichlet: Conserved::ZERO, lambda_max: 0.0,
                    };
                }
            }
        }

        // z-planes: n = 0..=zc. Wall height follows the reference mesh
        // builder's convention of placing gravity-relevant face heights at
        // the cell-center offset by half a cell, not at the node plane.
        for n in 0..=zc {
            for m in 0..yc {
                for l in 0..xc {
                    let id = grid.wall_z_id(l, m, n);
                    let (cl, cr, boundary_id) = if n == 0 {
                        (grid.cell_index(l, m, Grid::wrap(-1, zc)), grid.cell_index(l, m, 0), Some(5u8))
                    } else if n == zc {
                        (grid.cell_index(l, m, zc - 1), grid.cell_index(l, m, 0), Some(6u8))
                    } else {
                        (grid.cell_index(l, m, n - 1), grid.cell_index(l, m, n), None)
                    };
                    let z = grid.cells[cr].center[2] - 0.5 * dz;
                    walls[id] = Wall {
                        axis: Axis::Z, z,
                        cell_l: cl, cell_r: cr,
                        ul: Conserved::ZERO, ur: Conserved::ZERO, ule: Conserved::ZERO, ure: Conserved::ZERO,
                        ple: 0.0, pre: 0.0,
                        f_l_star: Conserved::ZERO, f_r_star: Conserved::ZERO,
                        kind: WallKind::Inner, boundary_id, dirichlet: Conserved::ZERO, lambda_max: 0.0,
                    };
                }
            }
        }

        grid.walls = walls;
        grid.wire_cell_walls();
        grid.apply_boundary_tags(config);
        grid.build_nodes();
        Ok(grid)
    }

    fn wire_cell_walls(&mut self) {
        let (xc, yc, zc) = (self.xc, self.yc, self.zc);
        for n in 0..zc {
            for m in 0..yc {
                for l in 0..xc {
                    let idx = self.cell_index(l, m, n);
                    let neg_x = self.wall_x_id(l, m, n);
                    let pos_x = self.wall_x_id(l + 1, m, n);
                    let neg_y = self.wall_y_id(l, m, n);
                    let pos_y = self.wall_y_id(l, m + 1, n);
                    let neg_z = self.wall_z_id(l, m, n);
                    let pos_z = self.wall_z_id(l, m, n + 1);
                    self.cells[idx].walls = [neg_y, pos_x, pos_y, neg_x, neg_z, pos_z];
                }
            }
        }
    }

    /// Retags the six boundary-id families of walls (1..=6, ordered
    /// [-x, +x, -y, +y, -z, +z]) according to the configured BC codes.
    /// Periodic faces keep `WallKind::Inner`; their wraparound cell wiring
    /// from `build` is already the physically correct neighbor. A `User`
    /// face is flagged `WallKind::UserDirichlet` and carries the configured
    /// prescribed state; the flux dispatch overwrites the wraparound side
    /// with it before running the Riemann solver, the same way `Transmissive`
    /// and `Solid` discard that side's wrapped reconstruction.
    fn apply_boundary_tags(&mut self, config: &Config) {
        for wall in self.walls.iter_mut() {
            let Some(boundary_id) = wall.boundary_id else { continue };
            let bc = config.boundaries[(boundary_id - 1) as usize];
            wall.kind = match bc {
                BoundaryCondition::Periodic => WallKind::Inner,
                BoundaryCondition::User => {
                    let state = config.dirichlet[(boundary_id - 1) as usize]
                        .expect("validate() requires a dirichlet state for every User face");
                    wall.dirichlet = state.to_conserved(config.constants.gamma);
                    WallKind::UserDirichlet
                }
                BoundaryCondition::Transmissive => WallKind::Transmissive,
                BoundaryCondition::Solid => WallKind::SolidWall,
            };
        }
    }

    fn build_nodes(&mut self) {
        let (xc, yc, zc) = (self.xc, self.yc, self.zc);
        let nxn = xc + 1;
        let nyn = yc + 1;
        let mut nodes = Vec::with_capacity(nxn * nyn * (zc + 1));
        for n in 0..=zc {
            for m in 0..=yc {
                for l in 0..=xc {
                    nodes.push(Node {
                        position: [l as f64 * self.dx, m as f64 * self.dy, n as f64 * self.dz],
                    });
                }
            }
        }
        for n in 0..zc {
            for m in 0..yc {
                for l in 0..xc {
                    let idx = self.cell_index(l, m, n);
                    let node_id = |dl: usize, dm: usize, dn: usize| {
                        ((n + dn) * nyn + (m + dm)) * nxn + (l + dl)
                    };
                    self.cells[idx].nodes = [
                        node_id(0, 0, 0), node_id(1, 0, 0), node_id(1, 1, 0), node_id(0, 1, 0),
                        node_id(0, 0, 1), node_id(1, 0, 1), node_id(1, 1, 1), node_id(0, 1, 1),
                    ];
                }
            }
        }
        self.nodes = nodes;
    }

    /// Assigns per-axis reconstruction stencils (spec §4.1): size starts at
    /// `order`, is clamped near a non-periodic domain edge, then further
    /// clamped by the cartesian distance to the nearest solid cell.
    pub fn assign_stencils(&mut self, order: usize) -> Vec<Recovery> {
        let mut recoveries = Vec::new();

        if self.periodic_x && self.xc < order {
            self.periodic_x = false;
            recoveries.push(Recovery::DomainTooSmallForStencil { axis: 'x' });
        }
        if self.periodic_y && self.yc < order {
            self.periodic_y = false;
            recoveries.push(Recovery::DomainTooSmallForStencil { axis: 'y' });
        }
        if self.periodic_z && self.zc < order {
            self.periodic_z = false;
            recoveries.push(Recovery::DomainTooSmallForStencil { axis: 'z' });
        }

        let (xc, yc, zc) = (self.xc, self.yc, self.zc);
        for n in 0..zc {
            for m in 0..yc {
                for l in 0..xc {
                    let idx = self.cell_index(l, m, n);
                    let dist_solid = self.cells[idx].dist_solid;

                    let sx = Self::stencil_size(order, l, xc, self.periodic_x, dist_solid[0]);
                    let sy = Self::stencil_size(order, m, yc, self.periodic_y, dist_solid[1]);
                    let sz = Self::stencil_size(order, n, zc, self.periodic_z, dist_solid[2]);

                    self.cells[idx].st_x = self.build_axis_stencil(sx, l, m, n, Axis::X);
                    self.cells[idx].st_y = self.build_axis_stencil(sy, l, m, n, Axis::Y);
                    self.cells[idx].st_z = self.build_axis_stencil(sz, l, m, n, Axis::Z);
                }
            }
        }
        recoveries
    }

    fn stencil_size(order: usize, pos: usize, count: usize, periodic: bool, dist_solid: f64) -> usize {
        let mut size = order;
        if !periodic {
            let edge_distance = pos.min(count - 1 - pos);
            size = size.min(2 * edge_distance + 1);
        }
        if dist_solid.is_finite() {
            let solid_limit = (2.0 * dist_solid - 1.0).floor().max(1.0) as usize;
            size = size.min(solid_limit);
        }
        if size % 2 == 0 { size -= 1; }
        size.max(1)
    }

    fn build_axis_stencil(&self, size: usize, l: usize, m: usize, n: usize, axis: Axis) -> Stencil {
        let half = (size / 2) as i64;
        let mut members = [self.cell_index(l, m, n); 9];
        for (k, offset) in (-half..=half).enumerate() {
            let (ll, mm, nn) = match axis {
                Axis::X => (Grid::wrap(l as i64 + offset, self.xc), m, n),
                Axis::Y => (l, Grid::wrap(m as i64 + offset, self.yc), n),
                Axis::Z => (l, m, Grid::wrap(n as i64 + offset, self.zc)),
            };
            members[k] = self.cell_index(ll, mm, nn);
        }
        Stencil { size, members }
    }
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Constants, ReconstructionFamily, RiemannSolver, SourceMode, Tolerances};

    fn small_config() -> Config {
        Config {
            xcells: 6, ycells: 6, zcells: 6,
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
    fn wall_count_and_wiring() {
        let grid = Grid::build(&small_config()).unwrap();
        assert_eq!(grid.walls.len(), 7 * 6 * 6 + 6 * 7 * 6 + 6 * 6 * 7);
        assert_eq!(grid.cells.len(), 6 * 6 * 6);
        for cell in &grid.cells {
            for &w in &cell.walls {
                assert!(w < grid.walls.len());
            }
        }
    }

    #[test]
    fn periodic_stencil_is_full_order() {
        let mut grid = Grid::build(&small_config()).unwrap();
        grid.assign_stencils(5);
        for cell in &grid.cells {
            assert_eq!(cell.st_x.size, 5);
            assert_eq!(cell.st_y.size, 5);
            assert_eq!(cell.st_z.size, 5);
        }
    }

    #[test]
    fn non_periodic_boundaries_are_distinct_walls() {
        let mut config = small_config();
        config.boundaries = [BoundaryCondition::Transmissive; 6];
        let grid = Grid::build(&config).unwrap();
        let low = grid.wall_x_id(0, 0, 0);
        let high = grid.wall_x_id(grid.xc, 0, 0);
        assert_ne!(low, high);
        assert_eq!(grid.walls[low].boundary_id, Some(1));
        assert_eq!(grid.walls[high].boundary_id, Some(2));
    }
}
