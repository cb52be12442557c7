use crate::config::{Config, MulticomponentGamma, SourceMode};
use crate::physics::{gamma_of, pressure_from_energy};
use crate::state::{Axis, Conserved, Wall, WallKind};

/// Roe-averaged gamma at a wall, honoring the configured multicomponent
/// convention (spec §4.3): a direct sqrt(rho)-weighted average of gamma
/// itself, or the same average taken on 1/(gamma-1) and then inverted.
fn roe_gamma_hat(config: &Config, l: &Rotated, r: &Rotated, raise_rho_l: f64, raise_rho_r: f64, sum: f64) -> f64 {
    if config.multicomponent && config.multicomponent_gamma == MulticomponentGamma::ReciprocalAverage {
        let phi_l = 1.0 / (l.gamma - 1.0);
        let phi_r = 1.0 / (r.gamma - 1.0);
        let phi_hat = (phi_r * raise_rho_r + phi_l * raise_rho_l) / sum;
        1.0 + 1.0 / phi_hat
    } else {
        (r.gamma * raise_rho_r + l.gamma * raise_rho_l) / sum
    }
}

/// Rotates a momentum triple into the wall-normal frame. The mesh is
/// axis-aligned with normals always pointing toward increasing coordinate
/// (spec §9 Open Question 1), so the general rotation collapses to one of
/// three fixed permutations rather than a 3x3 matrix multiply.
fn rotate_in(axis: Axis, m: [f64; 3]) -> [f64; 3] {
    match axis {
        Axis::X => [m[0], m[1], m[2]],
        Axis::Y => [m[1], -m[0], m[2]],
        Axis::Z => [m[2], m[1], -m[0]],
    }
}

fn rotate_out(axis: Axis, w: [f64; 3]) -> [f64; 3] {
    match axis {
        Axis::X => [w[0], w[1], w[2]],
        Axis::Y => [-w[1], w[0], w[2]],
        Axis::Z => [-w[2], w[1], w[0]],
    }
}

/// The five Euler flux components in the wall-normal frame, reusable
/// between solvers.
struct Rotated {
    rho: f64,
    mn: f64, mt1: f64, mt2: f64,
    energy: f64,
    velocity_n: f64, velocity_t1: f64, velocity_t2: f64,
    pressure: f64,
    sound_speed: f64,
    gamma: f64,
    enthalpy: f64,
}

fn rotate_state(u: &Conserved, axis: Axis, z: f64, config: &Config) -> Rotated {
    let rho = u.density();
    let [mn, mt1, mt2] = rotate_in(axis, u.momentum());
    let energy = u.energy();
    let velocity_n = mn / rho;
    let velocity_t1 = mt1 / rho;
    let velocity_t2 = mt2 / rho;
    let gamma = gamma_of(u, config);
    let pressure = pressure_from_energy(gamma, energy, [velocity_n, velocity_t1, velocity_t2], rho, z, config);
    let sound_speed = (gamma * pressure / rho).sqrt();
    let enthalpy = if config.source_mode == SourceMode::PerturbationTotalEnergy {
        (energy - rho * config.constants.gravity * z + pressure) / rho
    } else {
        (energy + pressure) / rho
    };
    Rotated { rho, mn, mt1, mt2, energy, velocity_n, velocity_t1, velocity_t2, pressure, sound_speed, gamma, enthalpy }
}

/// Physical normal-direction Euler flux of a rotated state, with the
/// equilibrium-pressure correction folded in when the jump is taken
/// relative to a hydrostatic background (source modes 2/3).
fn physical_flux(s: &Rotated, pressure_offset: f64) -> [f64; 5] {
    [
        s.mn,
        s.mn * s.velocity_n + (s.pressure - pressure_offset),
        s.mn * s.velocity_t1,
        s.mn * s.velocity_t2,
        s.velocity_n * (s.energy + s.pressure),
    ]
}

fn unrotate_flux(axis: Axis, f: [f64; 5]) -> Conserved {
    let [m0, m1, m2] = rotate_out(axis, [f[1], f[2], f[3]]);
    Conserved::new(f[0], m0, m1, m2, f[4], 0.0)
}

/// HLLE two-wave solver (spec §4.3). In source modes 2/3 the jump term
/// uses the perturbation-from-equilibrium state while the physical fluxes
/// `F_L`/`F_R` always use the physical state — reproduced exactly per
/// spec §9 Open Question 2.
pub fn hlle(wall: &mut Wall, config: &Config) {
    let l = rotate_state(&wall.ul, wall.axis, wall.z, config);
    let r = rotate_state(&wall.ur, wall.axis, wall.z, config);

    let raise_rho_l = l.rho.sqrt();
    let raise_rho_r = r.rho.sqrt();
    let sum = raise_rho_l + raise_rho_r;
    let u_hat = (r.velocity_n * raise_rho_r + l.velocity_n * raise_rho_l) / sum;
    let v_hat = (r.velocity_t1 * raise_rho_r + l.velocity_t1 * raise_rho_l) / sum;
    let w_hat = (r.velocity_t2 * raise_rho_r + l.velocity_t2 * raise_rho_l) / sum;
    let h_hat = (r.enthalpy * raise_rho_r + l.enthalpy * raise_rho_l) / sum;
    let gamma_hat = roe_gamma_hat(config, &l, &r, raise_rho_l, raise_rho_r, sum);
    let c_hat = ((gamma_hat - 1.0) * (h_hat - 0.5 * (u_hat * u_hat + v_hat * v_hat + w_hat * w_hat))).sqrt();

    let uses_equilibrium = matches!(config.source_mode, SourceMode::Perturbation | SourceMode::PerturbationTotalEnergy);
    let (pressure_offset_l, pressure_offset_r) = if uses_equilibrium { (wall.ple, wall.pre) } else { (0.0, 0.0) };

    let fl = physical_flux(&l, pressure_offset_l);
    let fr = physical_flux(&r, pressure_offset_r);

    let (prime_l, prime_r) = if uses_equilibrium {
        let le = rotate_state(&wall.ule, wall.axis, wall.z, config);
        let re = rotate_state(&wall.ure, wall.axis, wall.z, config);
        // Perturbation from equilibrium in every component except the
        // normal momentum, which stays physical (spec §9 Open Question 2).
        let wl = [l.rho - le.rho, l.mn, l.mt1 - le.mt1, l.mt2 - le.mt2, l.energy - le.energy];
        let wr = [r.rho - re.rho, r.mn, r.mt1 - re.mt1, r.mt2 - re.mt2, r.energy - re.energy];
        (wl, wr)
    } else {
        ([l.rho, l.mn, l.mt1, l.mt2, l.energy], [r.rho, r.mn, r.mt1, r.mt2, r.energy])
    };

    let s1 = (l.velocity_n - l.sound_speed).min(u_hat - c_hat);
    let s2 = (r.velocity_n + r.sound_speed).max(u_hat + c_hat);
    let max_s = s1.abs().max(s2.abs());
    let diff_s = s2 - s1;

    let mut f_star = [0.0; 5];
    for m in 0..5 {
        f_star[m] = if s1 >= 0.0 {
            fl[m]
        } else if s2 <= 0.0 {
            fr[m]
        } else {
            (s2 * fl[m] - s1 * fr[m] + s1 * s2 * (prime_r[m] - prime_l[m])) / diff_s
        };
    }

    let flux = unrotate_flux(wall.axis, f_star);
    wall.f_r_star = flux;
    wall.f_l_star = flux;
    wall.lambda_max = max_s;
}

/// HLLC three-wave solver with a resolved contact discontinuity (spec §4.3).
pub fn hllc(wall: &mut Wall, config: &Config) {
    let l = rotate_state(&wall.ul, wall.axis, wall.z, config);
    let r = rotate_state(&wall.ur, wall.axis, wall.z, config);

    let raise_rho_l = l.rho.sqrt();
    let raise_rho_r = r.rho.sqrt();
    let sum = raise_rho_l + raise_rho_r;
    let u_hat = (r.velocity_n * raise_rho_r + l.velocity_n * raise_rho_l) / sum;
    let v_hat = (r.velocity_t1 * raise_rho_r + l.velocity_t1 * raise_rho_l) / sum;
    let w_hat = (r.velocity_t2 * raise_rho_r + l.velocity_t2 * raise_rho_l) / sum;
    let h_hat = (r.enthalpy * raise_rho_r + l.enthalpy * raise_rho_l) / sum;
    let c_hat = ((config.constants.gamma - 1.0) * (h_hat - 0.5 * (u_hat * u_hat + v_hat * v_hat + w_hat * w_hat))).sqrt();

    let fl = physical_flux(&l, 0.0);
    let fr = physical_flux(&r, 0.0);

    let s1 = (l.velocity_n - l.sound_speed).min(u_hat - c_hat);
    let s2 = (r.velocity_n + r.sound_speed).max(u_hat + c_hat);
    let max_s = s1.abs().max(s2.abs());

    let s_star = (r.pressure - l.pressure + l.mn * (s1 - l.velocity_n) - r.mn * (s2 - r.velocity_n))
        / (l.rho * (s1 - l.velocity_n) - r.rho * (s2 - r.velocity_n));

    let f_star = if s1 >= 0.0 {
        fl
    } else if s2 <= 0.0 {
        fr
    } else {
        let (uk, vk, wk, rho_k, sk, pk, ek, fk, sidek) = if s_star <= 0.0 {
            (r.velocity_n, r.velocity_t1, r.velocity_t2, r.rho, s2, r.pressure, r.energy, fr, [r.rho, r.mn, r.mt1, r.mt2, r.energy])
        } else {
            (l.velocity_n, l.velocity_t1, l.velocity_t2, l.rho, s1, l.pressure, l.energy, fl, [l.rho, l.mn, l.mt1, l.mt2, l.energy])
        };
        let aux = rho_k * (sk - uk) / (sk - s_star);
        let w_star = [
            aux,
            aux * s_star,
            aux * vk,
            aux * wk,
            aux * (ek / rho_k + (s_star - uk) * (s_star + pk / (rho_k * (sk - uk)))),
        ];
        let mut out = [0.0; 5];
        for m in 0..5 {
            out[m] = fk[m] + sk * (w_star[m] - sidek[m]);
        }
        out
    };

    let flux = unrotate_flux(wall.axis, f_star);
    wall.f_r_star = flux;
    wall.f_l_star = flux;
    wall.lambda_max = max_s;
}

/// Well-balanced HLLS solver (spec §4.3). Produces distinct `f_l_star` /
/// `f_r_star` fluxes whose difference is exactly the reconstructed
/// hydrostatic source, delivering machine-precision preservation of the
/// equilibrium state. Requires `SourceMode::Augmented`.
pub fn hlls(wall: &mut Wall, config: &Config) {
    const TOL14: f64 = 1e-14;

    let l = rotate_state(&wall.ul, wall.axis, wall.z, config);
    let r = rotate_state(&wall.ur, wall.axis, wall.z, config);

    let raise_rho_l = l.rho.sqrt();
    let raise_rho_r = r.rho.sqrt();
    let sum = raise_rho_l + raise_rho_r;
    let u_hat = (r.velocity_n * raise_rho_r + l.velocity_n * raise_rho_l) / sum;
    let v_hat = (r.velocity_t1 * raise_rho_r + l.velocity_t1 * raise_rho_l) / sum;
    let w_hat = (r.velocity_t2 * raise_rho_r + l.velocity_t2 * raise_rho_l) / sum;
    let h_hat = (r.enthalpy * raise_rho_r + l.enthalpy * raise_rho_l) / sum;
    let gamma_hat = roe_gamma_hat(config, &l, &r, raise_rho_l, raise_rho_r, sum);
    let c_hat = ((gamma_hat - 1.0) * (h_hat - 0.5 * (u_hat * u_hat + v_hat * v_hat + w_hat * w_hat))).sqrt();

    let fl = physical_flux(&l, 0.0);
    let fr = physical_flux(&r, 0.0);

    let s1 = u_hat - c_hat;
    let s2 = u_hat + c_hat;
    let max_s = s1.abs().max(s2.abs());
    let diff_s = s2 - s1;

    let p_re = wall.pre;
    let p_le = wall.ple;
    let rho_re = wall.ure.density();
    let rho_le = wall.ule.density();

    let mut source = [0.0; 5];
    if wall.axis == Axis::Z {
        source[1] = (r.rho + l.rho) * (p_re - p_le) / (rho_re + rho_le);
    }
    source[4] = source[1] * u_hat;

    let psi = (rho_re - rho_le) * c_hat * c_hat / (p_re - p_le + TOL14);
    let chi = 0.5 * (psi - 1.0) * (v_hat * v_hat + w_hat * w_hat);

    let mut background = [0.0; 5];
    background[0] = -psi * source[1] / (s1 * s2);
    background[2] = -psi * v_hat / (s1 * s2) * source[1];
    background[3] = -psi * w_hat / (s1 * s2) * source[1];
    background[4] = -(h_hat - u_hat * u_hat + chi) / (s1 * s2) * source[1];

    let u_l = [l.rho, l.mn, l.mt1, l.mt2, l.energy];
    let u_r = [r.rho, r.mn, r.mt1, r.mt2, r.energy];

    let mut f_left_side = [0.0; 5];
    let mut f_right_side = [0.0; 5];
    for m in 0..5 {
        f_left_side[m] = if s1 >= 0.0 {
            fl[m]
        } else if s2 <= 0.0 {
            fr[m] - source[m]
        } else {
            (s2 * fl[m] - s1 * fr[m] + s1 * s2 * (u_r[m] - u_l[m]) + s1 * (source[m] - s2 * background[m])) / diff_s
        };
        f_right_side[m] = if s1 >= 0.0 {
            fl[m] + source[m]
        } else if s2 <= 0.0 {
            fr[m]
        } else {
            (s2 * fl[m] - s1 * fr[m] + s1 * s2 * (u_r[m] - u_l[m]) + s2 * (source[m] - s1 * background[m])) / diff_s
        };
    }

    wall.f_l_star = unrotate_flux(wall.axis, f_left_side);
    wall.f_r_star = unrotate_flux(wall.axis, f_right_side);
    wall.lambda_max = max_s;
}

/// Transmissive (zero-gradient outflow) boundary: the inner cell's own
/// physical flux is copied straight to the face, no upwinding.
pub fn transmissive(wall: &mut Wall, config: &Config, inner_is_left: bool) {
    let l = rotate_state(&wall.ul, wall.axis, wall.z, config);
    let r = rotate_state(&wall.ur, wall.axis, wall.z, config);
    let fl = physical_flux(&l, 0.0);
    let fr = physical_flux(&r, 0.0);
    let f_star = if inner_is_left { fr } else { fl };
    let flux = unrotate_flux(wall.axis, f_star);
    wall.f_r_star = flux;
    wall.f_l_star = flux;
}

/// Solid-wall flux: mirrors the interior state (negating the normal
/// velocity, copying the rest) and runs HLLE on the mirrored pair so the
/// wave-speed estimate remains consistent with the interior solver.
pub fn solid_wall(wall: &mut Wall, config: &Config, inner_is_left: bool) {
    let interior = if inner_is_left { wall.ul } else { wall.ur };

    let [mn, mt1, mt2] = rotate_in(wall.axis, interior.momentum());
    let mirrored_momentum = rotate_out(wall.axis, [-mn, mt1, mt2]);
    let mirrored = Conserved::new(
        interior.density(),
        mirrored_momentum[0], mirrored_momentum[1], mirrored_momentum[2],
        interior.energy(),
        interior.scalar(),
    );

    if inner_is_left {
        wall.ur = mirrored;
    } else {
        wall.ul = mirrored;
    }
    hlle(wall, config);
}

/// Prescribed-state (Dirichlet) boundary (spec §4.7 BC code 2): the
/// exterior side of the wall is replaced by the configured face state
/// instead of the interior's own extrapolation or its mirror, discarding
/// whatever the wraparound stencil reconstructed there, then HLLE runs
/// against the pair exactly as at a solid wall.
pub fn dirichlet(wall: &mut Wall, config: &Config, inner_is_left: bool) {
    let prescribed = wall.dirichlet;
    if inner_is_left {
        wall.ur = prescribed;
    } else {
        wall.ul = prescribed;
    }
    hlle(wall, config);
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Constants, ReconstructionFamily, RiemannSolver, SourceMode, Tolerances, BoundaryCondition};

    fn test_config() -> Config {
        Config {
            xcells: 4, ycells: 4, zcells: 4,
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
            num_threads: 1,
        }
    }

    fn uniform_wall(axis: Axis, u: Conserved) -> Wall {
        Wall {
            axis, z: 0.0, cell_l: 0, cell_r: 1,
            ul: u, ur: u, ule: Conserved::ZERO, ure: Conserved::ZERO,
            ple: 0.0, pre: 0.0,
            f_l_star: Conserved::ZERO, f_r_star: Conserved::ZERO,
            kind: WallKind::Inner, boundary_id: None, dirichlet: Conserved::ZERO, lambda_max: 0.0,
        }
    }

    #[test]
    fn hlle_consistency_with_equal_states() {
        let config = test_config();
        let u = Conserved::new(1.0, 0.2, 0.0, 0.0, 2.5, 0.0);
        let mut wall = uniform_wall(Axis::X, u);
        hlle(&mut wall, &config);
        let l = rotate_state(&u, Axis::X, 0.0, &config);
        let expected = physical_flux(&l, 0.0);
        let expected = unrotate_flux(Axis::X, expected);
        for k in 0..5 {
            assert!((wall.f_r_star[k] - expected[k]).abs() < 1e-10);
        }
    }

    #[test]
    fn hllc_consistency_with_equal_states() {
        let config = test_config();
        let u = Conserved::new(1.0, 0.2, 0.1, 0.0, 2.5, 0.0);
        let mut wall = uniform_wall(Axis::Y, u);
        hllc(&mut wall, &config);
        let l = rotate_state(&u, Axis::Y, 0.0, &config);
        let expected = physical_flux(&l, 0.0);
        let expected = unrotate_flux(Axis::Y, expected);
        for k in 0..5 {
            assert!((wall.f_r_star[k] - expected[k]).abs() < 1e-8);
        }
    }

    #[test]
    fn solid_wall_reflects_normal_velocity_only() {
        let config = test_config();
        let u = Conserved::new(1.0, 0.5, 0.3, 0.1, 2.5, 0.0);
        let mut wall = uniform_wall(Axis::X, u);
        solid_wall(&mut wall, &config, true);
        // mass flux through a solid wall should vanish identically.
        assert!(wall.f_r_star[0].abs() < 1e-10);
    }
}
