use crate::error::Recovery;
use crate::grid::Grid;
use crate::state::{CellKind, Conserved, Triangle};

/// Fraction of the largest cell edge used to bound how far a cell center
/// may sit from a triangle's plane and still be considered a candidate
/// ghost cell (spec §4.6).
const SURFACE_TOLERANCE: f64 = 2.0;

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}
fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

/// Tags every cell as `Fluid`/`Solid` and marks the `Fluid` cells adjacent
/// to a triangulated surface as ghost cells with an image point (spec
/// §4.6). Three passes, mirroring the reference solver's `assign_cell_type`:
///
/// 1. For each triangle, cells in its bounding box whose center lies just
///    below the surface plane and projects inside the triangle become
///    ghost candidates, keeping whichever triangle is closest.
/// 2. Interior (non-ghost) cells are ray-cast against the ghost layer
///    along x and y; a cell straddled by an inward-facing ghost crossing
///    on both axes is solid.
/// 3. A solid cell with fewer than two solid face-neighbors is an orphan
///    and reverts to fluid.
///
/// Finally records, per cell and per axis, the cartesian distance (in
/// cell units) to the nearest solid cell, used by `Grid::assign_stencils`
/// to shrink reconstruction stencils near a body.
pub fn classify(grid: &mut Grid, triangles: &[Triangle]) -> Vec<Recovery> {
    for cell in grid.cells.iter_mut() {
        cell.kind = CellKind::Fluid;
        cell.ghost = false;
        cell.triangle = None;
    }
    if triangles.is_empty() {
        return Vec::new();
    }

    let dp = SURFACE_TOLERANCE * grid.dx.max(grid.dy).max(grid.dz);
    let mut closest = vec![f64::INFINITY; grid.cells.len()];

    for (tri_idx, triangle) in triangles.iter().enumerate() {
        let v1 = sub(triangle.p2, triangle.p1);
        let v2 = sub(triangle.p3, triangle.p2);
        let v3 = sub(triangle.p1, triangle.p3);
        let normal = triangle.unit_normal();
        let ([xlo, xhi], [ylo, yhi], [zlo, zhi]) =
            ([triangle.bbox[0].0, triangle.bbox[0].1], [triangle.bbox[1].0, triangle.bbox[1].1], [triangle.bbox[2].0, triangle.bbox[2].1]);

        for n in zlo..=zhi {
            for m in ylo..=yhi {
                for l in xlo..=xhi {
                    let idx = grid.cell_index(l, m, n);
                    let center = grid.cells[idx].center;
                    let dist = dot(sub(center, triangle.p1), normal);

                    if dist > 0.0 && grid.cells[idx].ghost && dist.abs() < closest[idx] {
                        grid.cells[idx].ghost = false;
                        continue;
                    }
                    if dist > 0.0 || dist.abs() >= dp {
                        continue;
                    }

                    let xc = [center[0] - dist * normal[0], center[1] - dist * normal[1], center[2] - dist * normal[2]];
                    let vp1 = cross(v1, sub(xc, triangle.p1));
                    let vp2 = cross(v2, sub(xc, triangle.p2));
                    let vp3 = cross(v3, sub(xc, triangle.p3));
                    let inside = dot(vp1, vp2) > 0.0 && dot(vp2, vp3) > 0.0 && dot(vp3, vp1) > 0.0;
                    if !inside || dist.abs() >= closest[idx] {
                        continue;
                    }

                    let signed = if dist.abs() < 1e-14 { -1e-14 } else { dist };
                    closest[idx] = signed.abs();
                    grid.cells[idx].ghost = true;
                    grid.cells[idx].triangle = Some(tri_idx);
                    grid.cells[idx].image_point =
                        [center[0] - 2.0 * signed * normal[0], center[1] - 2.0 * signed * normal[1], center[2] - 2.0 * signed * normal[2]];
                }
            }
        }
    }

    ray_cast_solid_interior(grid, triangles);
    remove_orphan_solids(grid);
    compute_distance_to_solid(grid);
    Vec::new()
}

fn ray_cast_solid_interior(grid: &mut Grid, triangles: &[Triangle]) {
    let (xc, yc, zc) = (grid.xc, grid.yc, grid.zc);
    for n in 0..zc {
        for m in 0..yc {
            for l in 0..xc {
                let idx = grid.cell_index(l, m, n);
                if grid.cells[idx].ghost {
                    continue;
                }
                let crosses_x = nearest_ghost_crossing(grid, triangles, idx, 0, |i| grid.cell_index(i, m, n), l, xc);
                let crosses_y = nearest_ghost_crossing(grid, triangles, idx, 1, |i| grid.cell_index(l, i, n), m, yc);
                if crosses_x && crosses_y {
                    grid.cells[idx].kind = CellKind::Solid;
                }
            }
        }
    }
}

/// Scans the full line through `idx` along one axis, finds the closest
/// ghost cell, and reports whether its surface normal points back toward
/// `idx` — i.e. `idx` sits on the interior side of that crossing.
fn nearest_ghost_crossing(
    grid: &Grid,
    triangles: &[Triangle],
    idx: usize,
    axis_component: usize,
    line_index: impl Fn(usize) -> usize,
    pos: usize,
    count: usize,
) -> bool {
    let mut closest: Option<usize> = None;
    let mut best_df = count;
    let mut ghost_count = 0;
    for i in 0..count {
        let na = line_index(i);
        if grid.cells[na].ghost {
            ghost_count += 1;
            let df = (i as i64 - pos as i64).unsigned_abs() as usize;
            if df <= best_df {
                best_df = df;
                closest = Some(na);
            }
        }
    }
    let Some(na) = closest else { return false };
    if ghost_count <= 1 {
        return false;
    }
    let tri = triangles[grid.cells[na].triangle.expect("ghost cell always has a triangle")].unit_normal();
    let toward = grid.cells[na].center[axis_component] - grid.cells[idx].center[axis_component];
    toward * tri[axis_component] > 0.0
}

fn remove_orphan_solids(grid: &mut Grid) {
    let n_cells = grid.cells.len();
    for idx in 0..n_cells {
        if grid.cells[idx].ghost || grid.cells[idx].kind != CellKind::Solid {
            continue;
        }
        let walls = grid.cells[idx].walls;
        let solid_neighbors = [
            grid.walls[walls[0]].cell_l,
            grid.walls[walls[1]].cell_r,
            grid.walls[walls[2]].cell_r,
            grid.walls[walls[3]].cell_l,
            grid.walls[walls[4]].cell_l,
            grid.walls[walls[5]].cell_r,
        ]
        .iter()
        .filter(|&&n| grid.cells[n].kind == CellKind::Solid)
        .count();
        if solid_neighbors < 2 {
            grid.cells[idx].kind = CellKind::Fluid;
        }
    }
}

fn compute_distance_to_solid(grid: &mut Grid) {
    let (xc, yc, zc) = (grid.xc, grid.yc, grid.zc);
    for n in 0..zc {
        for m in 0..yc {
            for l in 0..xc {
                let idx = grid.cell_index(l, m, n);
                if grid.cells[idx].kind != CellKind::Fluid {
                    continue;
                }
                let mut dist = [f64::INFINITY; 3];
                for i in 0..xc {
                    if grid.cells[grid.cell_index(i, m, n)].kind == CellKind::Solid {
                        dist[0] = dist[0].min((l as i64 - i as i64).unsigned_abs() as f64);
                    }
                }
                for j in 0..yc {
                    if grid.cells[grid.cell_index(l, j, n)].kind == CellKind::Solid {
                        dist[1] = dist[1].min((m as i64 - j as i64).unsigned_abs() as f64);
                    }
                }
                for k in 0..zc {
                    if grid.cells[grid.cell_index(l, m, k)].kind == CellKind::Solid {
                        dist[2] = dist[2].min((n as i64 - k as i64).unsigned_abs() as f64);
                    }
                }
                grid.cells[idx].dist_solid = dist;
            }
        }
    }
}

/// Locates the 8 cells surrounding each ghost cell's image point and
/// computes inverse-distance-squared interpolation weights (spec §4.6). A
/// ghost whose image point falls outside the domain, or whose neighbor
/// weights all vanish (every neighbor is itself a ghost), is demoted to a
/// solid cell and reported via `Recovery::IsolatedGhost`.
pub fn assign_image_points(grid: &mut Grid) -> Vec<Recovery> {
    let mut recoveries = Vec::new();
    let n_cells = grid.cells.len();

    for idx in 0..n_cells {
        if !grid.cells[idx].ghost {
            continue;
        }
        let p = grid.cells[idx].image_point;
        let lx = grid.xc as f64 * grid.dx;
        let ly = grid.yc as f64 * grid.dy;
        let lz = grid.zc as f64 * grid.dz;
        let inside = p[0] > 0.0 && p[0] < lx && p[1] > 0.0 && p[1] < ly && p[2] > 0.0 && p[2] < lz;
        if !inside {
            grid.cells[idx].kind = CellKind::Solid;
            grid.cells[idx].ghost = false;
            recoveries.push(Recovery::IsolatedGhost { cell_index: idx });
            continue;
        }

        let imin = ((p[0] - grid.dx / 2.0) / grid.dx).max(0.0) as usize;
        let imax = (imin + 1).min(grid.xc - 1);
        let jmin = ((p[1] - grid.dy / 2.0) / grid.dy).max(0.0) as usize;
        let jmax = (jmin + 1).min(grid.yc - 1);
        let kmin = ((p[2] - grid.dz / 2.0) / grid.dz).max(0.0) as usize;
        let kmax = (kmin + 1).min(grid.zc - 1);

        let neighbors = [
            grid.cell_index(imin, jmin, kmin),
            grid.cell_index(imax, jmin, kmin),
            grid.cell_index(imax, jmax, kmin),
            grid.cell_index(imin, jmax, kmin),
            grid.cell_index(imin, jmin, kmax),
            grid.cell_index(imax, jmin, kmax),
            grid.cell_index(imax, jmax, kmax),
            grid.cell_index(imin, jmax, kmax),
        ];

        let mut weights = [0.0; 8];
        let mut sum = 0.0;
        for (q, &na) in neighbors.iter().enumerate() {
            let c = grid.cells[na].center;
            let d2 = (p[0] - c[0]).powi(2) + (p[1] - c[1]).powi(2) + (p[2] - c[2]).powi(2);
            let w = if grid.cells[na].ghost { 0.0 } else { 1.0 / (d2 + 1e-14) };
            weights[q] = w;
            sum += w;
        }

        if sum < 1e-14 {
            grid.cells[idx].kind = CellKind::Solid;
            grid.cells[idx].ghost = false;
            recoveries.push(Recovery::IsolatedGhost { cell_index: idx });
            continue;
        }

        for w in weights.iter_mut() {
            *w /= sum;
        }
        grid.cells[idx].image_neighbors = neighbors;
        grid.cells[idx].image_weights = weights;
    }

    recoveries
}

/// Fills each ghost cell's conserved state from an image-point
/// interpolation of its neighbors, with the momentum reflected across the
/// surface normal so the no-penetration condition holds at the wall (spec
/// §4.6). Must run after `assign_image_points` and every time the
/// neighbors' `u` changes.
pub fn update_ghost_cells(grid: &mut Grid, triangles: &[Triangle]) {
    let n_cells = grid.cells.len();
    for idx in 0..n_cells {
        if !grid.cells[idx].ghost {
            continue;
        }
        let cell = &grid.cells[idx];
        let mut interpolated = Conserved::ZERO;
        for q in 0..8 {
            let neighbor = grid.cells[cell.image_neighbors[q]].u;
            for k in 0..6 {
                interpolated[k] += cell.image_weights[q] * neighbor[k];
            }
        }

        let normal = triangles[cell.triangle.expect("ghost cell always has a triangle")].unit_normal();
        let momentum = interpolated.momentum();
        let dot = momentum[0] * normal[0] + momentum[1] * normal[1] + momentum[2] * normal[2];
        let reflected = [
            momentum[0] - 2.0 * dot * normal[0],
            momentum[1] - 2.0 * dot * normal[1],
            momentum[2] - 2.0 * dot * normal[2],
        ];
        grid.cells[idx].u = Conserved::new(
            interpolated.density(), reflected[0], reflected[1], reflected[2],
            interpolated.energy(), interpolated.scalar(),
        );
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryCondition, Constants, ReconstructionFamily, RiemannSolver, SourceMode, Tolerances};
    use crate::config::Config;

    fn config() -> Config {
        Config {
            xcells: 10, ycells: 10, zcells: 10,
            lx: 1.0, ly: 1.0, lz: 1.0,
            boundaries: [BoundaryCondition::Transmissive; 6],
            final_time: 1.0, output_interval: 0.1, cfl: 0.5,
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

    fn unit_cube_triangles() -> Vec<Triangle> {
        // A single downward-facing triangle near the domain's low-z
        // region, large enough that its bounding box spans several cells.
        let p1 = [0.2, 0.2, 0.3];
        let p2 = [0.8, 0.2, 0.3];
        let p3 = [0.5, 0.8, 0.3];
        let v1 = sub(p2, p1);
        let v2 = sub(p3, p1);
        let n = cross(v1, v2);
        let mag = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        vec![Triangle { normal: n, normal_mag: mag, p1, p2, p3, bbox: [(1, 8), (1, 8), (1, 4)] }]
    }

    #[test]
    fn classify_with_no_solids_leaves_all_cells_fluid() {
        let mut grid = Grid::build(&config()).unwrap();
        let recoveries = classify(&mut grid, &[]);
        assert!(recoveries.is_empty());
        assert!(grid.cells.iter().all(|c| c.kind == CellKind::Fluid && !c.ghost));
    }

    #[test]
    fn classify_marks_some_ghost_cells_near_the_surface() {
        let mut grid = Grid::build(&config()).unwrap();
        classify(&mut grid, &unit_cube_triangles());
        assert!(grid.cells.iter().any(|c| c.ghost));
    }
}
