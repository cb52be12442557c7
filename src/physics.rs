use crate::config::{Config, MulticomponentGamma, SourceMode};
use crate::state::Conserved;

/// Effective ratio of specific heats for a conserved state. In
/// multicomponent mode the sixth component carries a mass-weighted
/// scalar indicator phi = U[5]/U[0] (spec §9 Open Question 3), read as
/// gamma directly or as 1/(gamma-1) depending on `config.multicomponent_gamma`
/// (spec §4.3); otherwise the configured constant gamma is used everywhere.
pub fn gamma_of(u: &Conserved, config: &Config) -> f64 {
    if config.multicomponent {
        let phi = u.scalar() / u.density();
        match config.multicomponent_gamma {
            MulticomponentGamma::DirectAverage => phi,
            MulticomponentGamma::ReciprocalAverage => 1.0 + 1.0 / phi,
        }
    } else {
        config.constants.gamma
    }
}

/// Recovers pressure from the conserved energy, subtracting the
/// gravitational potential term when the energy convention includes it
/// (source mode `PerturbationTotalEnergy`, spec §4.5/§6).
pub fn pressure_from_energy(gamma: f64, energy: f64, velocity: [f64; 3], rho: f64, z: f64, config: &Config) -> f64 {
    let kinetic = 0.5 * rho * (velocity[0].powi(2) + velocity[1].powi(2) + velocity[2].powi(2));
    let potential = if config.source_mode == SourceMode::PerturbationTotalEnergy {
        rho * config.constants.gravity * z
    } else {
        0.0
    };
    (gamma - 1.0) * (energy - kinetic - potential)
}

pub fn sound_speed(gamma: f64, pressure: f64, rho: f64) -> f64 {
    (gamma * pressure / rho).sqrt()
}

/// Potential temperature, using the configured reference pressure and gas
/// constant (spec §6, exposed-to-output-collaborator derived scalar).
pub fn potential_temperature(pressure: f64, rho: f64, gamma: f64, config: &Config) -> f64 {
    let r = config.constants.gas_constant;
    let p0 = config.constants.reference_pressure;
    (pressure / (r * rho)) * (pressure / p0).powf(-(gamma - 1.0) / gamma)
}
