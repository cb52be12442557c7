use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub};

/// Number of conserved components carried per cell: `[rho, rho*u, rho*v, rho*w, E, rho*phi]`.
pub const N_VAR: usize = 6;




/**
 * A fixed-length conserved-variable vector. Kept as a value type (no heap
 * indirection) since every cell, wall, and reconstruction stencil entry
 * carries exactly `N_VAR` components (spec §9: "scalar-field vector of
 * length 6").
 */
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Conserved(pub [f64; N_VAR]);

impl Conserved {
    pub const ZERO: Conserved = Conserved([0.0; N_VAR]);

    pub fn new(rho: f64, rho_u: f64, rho_v: f64, rho_w: f64, energy: f64, rho_phi: f64) -> Self {
        Conserved([rho, rho_u, rho_v, rho_w, energy, rho_phi])
    }

    pub fn density(&self) -> f64 { self.0[0] }
    pub fn momentum(&self) -> [f64; 3] { [self.0[1], self.0[2], self.0[3]] }
    pub fn energy(&self) -> f64 { self.0[4] }
    pub fn scalar(&self) -> f64 { self.0[5] }

    pub fn velocity(&self) -> [f64; 3] {
        let rho = self.density();
        [self.0[1] / rho, self.0[2] / rho, self.0[3] / rho]
    }
}

impl Index<usize> for Conserved {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 { &self.0[i] }
}

impl IndexMut<usize> for Conserved {
    fn index_mut(&mut self, i: usize) -> &mut f64 { &mut self.0[i] }
}

impl Add for Conserved {
    type Output = Conserved;
    fn add(self, rhs: Conserved) -> Conserved {
        let mut out = self.0;
        for k in 0..N_VAR { out[k] += rhs.0[k]; }
        Conserved(out)
    }
}

impl Sub for Conserved {
    type Output = Conserved;
    fn sub(self, rhs: Conserved) -> Conserved {
        let mut out = self.0;
        for k in 0..N_VAR { out[k] -= rhs.0[k]; }
        Conserved(out)
    }
}

impl Mul<f64> for Conserved {
    type Output = Conserved;
    fn mul(self, rhs: f64) -> Conserved {
        let mut out = self.0;
        for k in 0..N_VAR { out[k] *= rhs; }
        Conserved(out)
    }
}

impl AddAssign for Conserved {
    fn add_assign(&mut self, rhs: Conserved) {
        for k in 0..N_VAR { self.0[k] += rhs.0[k]; }
    }
}




/// Which axis a wall's unit normal is aligned with. The mesh is axis-aligned
/// so a normal is always one of these three rather than an arbitrary unit
/// vector (spec §9, rotation open question).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis { X, Y, Z }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellKind { Fluid, Solid }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WallKind { Inner, Transmissive, SolidWall, UserDirichlet, Inactive }




/// A per-axis 1-D reconstruction stencil: up to 9 member cell indices
/// (enough for order 7), with only the first `size` entries valid.
#[derive(Copy, Clone, Debug)]
pub struct Stencil {
    pub size: usize,
    pub members: [usize; 9],
}

impl Stencil {
    pub fn first_order(own: usize) -> Self {
        let mut members = [own; 9];
        members[0] = own;
        Stencil { size: 1, members }
    }
}




#[derive(Clone)]
pub struct Cell {
    pub index: (usize, usize, usize),
    pub center: [f64; 3],
    pub extent: [f64; 3],

    /// Wall references in the order [-y, +x, +y, -x, -z, +z], matching the
    /// face numbering of the reference mesh builder.
    pub walls: [usize; 6],
    pub nodes: [usize; 8],

    pub u: Conserved,
    pub u_aux: Conserved,
    pub ue: Conserved,
    pub s: Conserved,
    pub s_corr: Conserved,

    pub kind: CellKind,
    pub ghost: bool,

    pub image_point: [f64; 3],
    pub image_neighbors: [usize; 8],
    pub image_weights: [f64; 8],
    pub triangle: Option<usize>,

    /// Cartesian distance, in cell units, to the nearest solid cell along
    /// each axis. `f64::INFINITY` when no solid cell has been found yet.
    pub dist_solid: [f64; 3],

    pub st_x: Stencil,
    pub st_y: Stencil,
    pub st_z: Stencil,
}

impl Cell {
    pub fn volume(&self) -> f64 {
        self.extent[0] * self.extent[1] * self.extent[2]
    }
}




#[derive(Clone)]
pub struct Wall {
    pub axis: Axis,
    /// Face-center height along z, used by the gravity source (spec §3).
    pub z: f64,

    pub cell_l: usize,
    pub cell_r: usize,

    pub ul: Conserved,
    pub ur: Conserved,
    pub ule: Conserved,
    pub ure: Conserved,
    pub ple: f64,
    pub pre: f64,

    pub f_l_star: Conserved,
    pub f_r_star: Conserved,

    pub kind: WallKind,
    pub boundary_id: Option<u8>,

    /// Prescribed exterior state for a `WallKind::UserDirichlet` face (spec
    /// §4.7 BC code 2); unused (left at `Conserved::ZERO`) otherwise.
    pub dirichlet: Conserved,

    /// Largest wave speed seen at this wall this sub-step (feeds the
    /// global `lambda_max` max-reduction, spec §4.3/§4.7).
    pub lambda_max: f64,
}




#[derive(Copy, Clone, Debug)]
pub struct Node {
    pub position: [f64; 3],
}




/// A triangulated-surface facet supplied by the STL collaborator (spec §6).
#[derive(Clone)]
pub struct Triangle {
    pub normal: [f64; 3],
    pub normal_mag: f64,
    pub p1: [f64; 3],
    pub p2: [f64; 3],
    pub p3: [f64; 3],
    /// Inclusive per-axis cell-index bounding box, already clamped to the grid.
    pub bbox: [(usize, usize); 3],
}

impl Triangle {
    pub fn unit_normal(&self) -> [f64; 3] {
        [self.normal[0] / self.normal_mag, self.normal[1] / self.normal_mag, self.normal[2] / self.normal_mag]
    }
}
