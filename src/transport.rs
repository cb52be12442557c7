use crate::state::Wall;

/// Upwind passive-scalar flux, consistent with the already-computed mass
/// flux at this wall (spec §4.4). Runs after the Riemann solver has set
/// `f_l_star`/`f_r_star`[0..4]; fills in index 5.
pub fn compute_transport(wall: &mut Wall) {
    let mass_flux = wall.f_r_star[0];
    let scalar_flux = if mass_flux < 0.0 {
        mass_flux * wall.ur.scalar() / wall.ur.density()
    } else {
        wall.f_l_star[0] * wall.ul.scalar() / wall.ul.density()
    };
    wall.f_r_star[5] = scalar_flux;
    wall.f_l_star[5] = scalar_flux;
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Axis, Conserved, WallKind};

    fn wall_with(ul: Conserved, ur: Conserved, mass_flux: f64) -> Wall {
        let mut f_r = Conserved::ZERO;
        f_r[0] = mass_flux;
        Wall {
            axis: Axis::X, z: 0.0, cell_l: 0, cell_r: 1,
            ul, ur, ule: Conserved::ZERO, ure: Conserved::ZERO,
            ple: 0.0, pre: 0.0,
            f_l_star: f_r, f_r_star: f_r,
            kind: WallKind::Inner, boundary_id: None, dirichlet: Conserved::ZERO, lambda_max: 0.0,
        }
    }

    #[test]
    fn takes_scalar_from_upwind_side_when_flux_negative() {
        let ul = Conserved::new(1.0, 0.0, 0.0, 0.0, 1.0, 3.0);
        let ur = Conserved::new(1.0, 0.0, 0.0, 0.0, 1.0, 7.0);
        let mut wall = wall_with(ul, ur, -2.0);
        compute_transport(&mut wall);
        assert!((wall.f_r_star[5] - (-2.0 * 7.0)).abs() < 1e-12);
    }

    #[test]
    fn takes_scalar_from_left_when_flux_positive() {
        let ul = Conserved::new(1.0, 0.0, 0.0, 0.0, 1.0, 3.0);
        let ur = Conserved::new(1.0, 0.0, 0.0, 0.0, 1.0, 7.0);
        let mut wall = wall_with(ul, ur, 2.0);
        compute_transport(&mut wall);
        assert!((wall.f_r_star[5] - (2.0 * 3.0)).abs() < 1e-12);
    }
}
