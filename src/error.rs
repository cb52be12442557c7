use thiserror::Error;




/**
 * Everything that can go wrong building or advancing a simulation.
 */
#[derive(Error, Debug)]
pub enum SolverError {

    #[error("configuration inconsistent: {0}")]
    ConfigurationInconsistent(String),

    #[error("cell ({l}, {m}, {n}) has non-positive density or pressure")]
    NegativeDensityOrPressure { l: usize, m: usize, n: usize },

    #[error("triangle {index} lies outside the domain and was excluded")]
    TriangleOutsideDomain { index: usize },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}




/**
 * Non-fatal conditions that are recovered from automatically but are worth
 * surfacing to a caller that wants to know about them (used by `tracing`
 * warnings and returned alongside setup results for tests to assert on).
 */
#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    /// An axis requested as periodic was too small for the reconstruction
    /// stencil and was downgraded to transmissive.
    DomainTooSmallForStencil { axis: char },

    /// A ghost cell's image-point interpolation weights summed below the
    /// tolerance and it was demoted to a solid cell.
    IsolatedGhost { cell_index: usize },
}
