use serde::{Deserialize, Serialize};
use crate::error::SolverError;
use crate::state::Conserved;




/// Reconstruction family used for every interior wall (spec §4.2).
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionFamily {
    Weno,
    Teno,
    Uwc,
}




/// Approximate Riemann solver used for every inner wall (spec §4.3).
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiemannSolver {
    Hlle,
    Hllc,
    Hlls,
}




/// Gravitational source treatment (spec §4.5).
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// No gravity source.
    None,
    /// Well-balanced augmented form; requires `RiemannSolver::Hlls`.
    Augmented,
    /// Perturbation-from-equilibrium form.
    Perturbation,
    /// Perturbation form with the total-energy convention (S[4] = 0).
    PerturbationTotalEnergy,
}




/// Prescribed exterior state for a `BoundaryCondition::User` face (spec
/// §4.7 BC code 2: "user Dirichlet on cell averages"). Given in primitive
/// form since that is what a case file author supplies; converted to a
/// conserved vector once, at grid build time, with the configured gamma.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirichletState {
    pub density: f64,
    pub velocity: [f64; 3],
    pub pressure: f64,
    #[serde(default)]
    pub scalar: f64,
}

impl DirichletState {
    pub fn to_conserved(&self, gamma: f64) -> Conserved {
        let kinetic = 0.5 * self.density
            * (self.velocity[0].powi(2) + self.velocity[1].powi(2) + self.velocity[2].powi(2));
        let energy = self.pressure / (gamma - 1.0) + kinetic;
        Conserved::new(
            self.density,
            self.density * self.velocity[0],
            self.density * self.velocity[1],
            self.density * self.velocity[2],
            energy,
            self.density * self.scalar,
        )
    }
}

/// Which Roe-averaging convention the multicomponent γ̂ uses (spec §4.3:
/// "averaged in the same Roe manner, either directly on γ or on 1/(γ−1)
/// depending on the configured variant"). Mirrors the original solver's
/// `MULTI_TYPE` switch; `ReciprocalAverage` is its recommended default.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MulticomponentGamma {
    /// The scalar field carries γ directly.
    DirectAverage,
    /// The scalar field carries 1/(γ−1); recovered γ̂ by inverting the
    /// Roe average instead of averaging γ itself.
    ReciprocalAverage,
}

impl Default for MulticomponentGamma {
    fn default() -> Self {
        MulticomponentGamma::ReciprocalAverage
    }
}

/// One of the six grid faces (−x, +x, −y, +y, −z, +z in that order).
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryCondition {
    Periodic,
    User,
    Transmissive,
    Solid,
}




/// Physical constants. Defaults match spec §6 exactly.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constants {
    #[serde(default = "Constants::default_gravity")]
    pub gravity: f64,

    #[serde(default = "Constants::default_gamma")]
    pub gamma: f64,

    #[serde(default = "Constants::default_gas_constant")]
    pub gas_constant: f64,

    #[serde(default = "Constants::default_reference_pressure")]
    pub reference_pressure: f64,
}

impl Constants {
    fn default_gravity() -> f64 { 9.8 }
    fn default_gamma() -> f64 { 1.4 }
    fn default_gas_constant() -> f64 { 287.058 }
    fn default_reference_pressure() -> f64 { 1.0e5 }
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            gravity: Self::default_gravity(),
            gamma: Self::default_gamma(),
            gas_constant: Self::default_gas_constant(),
            reference_pressure: Self::default_reference_pressure(),
        }
    }
}




/// Reconstruction tolerances (spec §6). These are rarely overridden; they
/// exist as config fields rather than bare constants so a test can probe
/// sensitivity without recompiling.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tolerances {
    #[serde(default = "Tolerances::default_weno_epsilon")]
    pub weno_epsilon: f64,

    #[serde(default = "Tolerances::default_teno_epsilon")]
    pub teno_epsilon: f64,

    #[serde(default = "Tolerances::default_teno_cutoff")]
    pub teno_cutoff: f64,

    #[serde(default = "Tolerances::default_teno_q")]
    pub teno_q: f64,
}

impl Tolerances {
    fn default_weno_epsilon() -> f64 { 1e-6 }
    fn default_teno_epsilon() -> f64 { 1e-40 }
    fn default_teno_cutoff() -> f64 { 1e-6 }
    fn default_teno_q() -> f64 { 6.0 }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            weno_epsilon: Self::default_weno_epsilon(),
            teno_epsilon: Self::default_teno_epsilon(),
            teno_cutoff: Self::default_teno_cutoff(),
            teno_q: Self::default_teno_q(),
        }
    }
}




/// Everything needed to build and run a `Simulation`, deserializable from a
/// YAML case file (`Config::from_file`) or assembled directly in tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub xcells: usize,
    pub ycells: usize,
    pub zcells: usize,

    pub lx: f64,
    pub ly: f64,
    pub lz: f64,

    /// One code per face, ordered [-x, +x, -y, +y, -z, +z].
    pub boundaries: [BoundaryCondition; 6],

    /// Prescribed state for each face configured `BoundaryCondition::User`;
    /// `None` elsewhere. Indexed the same as `boundaries`.
    #[serde(default)]
    pub dirichlet: [Option<DirichletState>; 6],

    pub final_time: f64,
    pub output_interval: f64,
    pub cfl: f64,

    /// Reconstruction stencil order; one of 1, 3, 5, 7.
    pub order: usize,

    pub reconstruction: ReconstructionFamily,
    pub riemann_solver: RiemannSolver,
    pub source_mode: SourceMode,

    /// Track a second ratio of specific heats via the passive scalar.
    #[serde(default)]
    pub multicomponent: bool,

    /// Which convention the multicomponent scalar carries, and how its
    /// Roe-averaged γ̂ is recovered. Ignored when `multicomponent` is false.
    #[serde(default)]
    pub multicomponent_gamma: MulticomponentGamma,

    #[serde(default)]
    pub constants: Constants,

    #[serde(default)]
    pub tolerances: Tolerances,

    /// Worker count for the fork-join loops; defaults like the teacher's
    /// `Control::num_threads` to twice the visible core count.
    #[serde(default = "Config::default_num_threads")]
    pub num_threads: usize,
}

impl Config {
    fn default_num_threads() -> usize {
        num_cpus::get() * 2
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, SolverError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field invariants of spec §7 that cannot be expressed
    /// as single-field constraints in the deserializer.
    pub fn validate(&self) -> Result<(), SolverError> {
        if ![1, 3, 5, 7].contains(&self.order) {
            return Err(SolverError::ConfigurationInconsistent(format!(
                "order must be one of 1, 3, 5, 7, got {}", self.order
            )));
        }
        if self.source_mode == SourceMode::Augmented && self.riemann_solver != RiemannSolver::Hlls {
            return Err(SolverError::ConfigurationInconsistent(
                "augmented source mode requires the HLLS Riemann solver".into(),
            ));
        }
        if self.riemann_solver == RiemannSolver::Hlls && self.source_mode != SourceMode::Augmented {
            return Err(SolverError::ConfigurationInconsistent(
                "HLLS is only well-balanced under the augmented source mode".into(),
            ));
        }
        for (id, bc) in self.boundaries.iter().enumerate() {
            if *bc == BoundaryCondition::User && self.dirichlet[id].is_none() {
                return Err(SolverError::ConfigurationInconsistent(format!(
                    "face {} is configured User but has no dirichlet state", id + 1
                )));
            }
        }
        for (axis, lo, hi) in [('x', self.boundaries[0], self.boundaries[1]),
                               ('y', self.boundaries[2], self.boundaries[3]),
                               ('z', self.boundaries[4], self.boundaries[5])]
        {
            let lo_periodic = lo == BoundaryCondition::Periodic;
            let hi_periodic = hi == BoundaryCondition::Periodic;
            if lo_periodic != hi_periodic {
                return Err(SolverError::ConfigurationInconsistent(format!(
                    "axis {} has only one periodic face; periodicity must pair", axis
                )));
            }
        }
        if self.cfl <= 0.0 || self.cfl > 1.0 {
            return Err(SolverError::ConfigurationInconsistent(
                "cfl must lie in (0, 1]".into(),
            ));
        }
        Ok(())
    }

    pub fn periodic_x(&self) -> bool { self.boundaries[0] == BoundaryCondition::Periodic }
    pub fn periodic_y(&self) -> bool { self.boundaries[2] == BoundaryCondition::Periodic }
    pub fn periodic_z(&self) -> bool { self.boundaries[4] == BoundaryCondition::Periodic }
}
