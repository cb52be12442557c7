use crate::config::{ReconstructionFamily, Tolerances};

/**
 * Interface extrapolation from a centered 1-D stencil of cell averages.
 * `phi` holds `order` entries centered on the owning cell; returns the
 * left- and right-extrapolated interface values (spec §4.2).
 *
 * Order 1 is a trivial pass-through (first-order upwind at the cell
 * boundary); orders 3/5/7 dispatch to the WENO/TENO/UWC family selected by
 * `family`, sharing the Jiang-Shu smoothness indicators between the L and R
 * extrapolations and only reversing the optimal linear weights.
 */
pub fn reconstruct(phi: &[f64], order: usize, family: ReconstructionFamily, tol: &Tolerances) -> (f64, f64) {
    match order {
        1 => (phi[0], phi[0]),
        3 => (weno3(phi, family, tol, Side::Left), weno3(phi, family, tol, Side::Right)),
        5 => (weno5(phi, family, tol, Side::Left), weno5(phi, family, tol, Side::Right)),
        7 => (weno7(phi, family, tol, Side::Left), weno7(phi, family, tol, Side::Right)),
        _ => unreachable!("Config::validate rejects orders other than 1, 3, 5, 7"),
    }
}

#[derive(Copy, Clone, PartialEq)]
enum Side { Left, Right }

/// Nonlinear blending of N sub-stencil candidates into final weights,
/// shared by every order. `gamma` are the optimal linear weights, `beta`
/// the smoothness indicators, both already in sub-stencil order.
fn nonlinear_weights(gamma: &[f64], beta: &[f64], family: ReconstructionFamily, tol: &Tolerances) -> Vec<f64> {
    let k = gamma.len();
    match family {
        ReconstructionFamily::Uwc => gamma.to_vec(),
        ReconstructionFamily::Weno => {
            let alpha: Vec<f64> = (0..k).map(|i| gamma[i] / (beta[i] + tol.weno_epsilon).powi(2)).collect();
            let sum: f64 = alpha.iter().sum();
            alpha.iter().map(|a| a / sum).collect()
        }
        ReconstructionFamily::Teno => {
            let raw: Vec<f64> = (0..k).map(|i| 1.0 / (beta[i] + tol.teno_epsilon).powf(tol.teno_q)).collect();
            let raw_sum: f64 = raw.iter().sum();
            let cutoff: Vec<f64> = raw.iter().map(|a| if a / raw_sum < tol.teno_cutoff { 0.0 } else { 1.0 }).collect();
            let alpha: Vec<f64> = (0..k).map(|i| gamma[i] * cutoff[i]).collect();
            let sum: f64 = alpha.iter().sum();
            alpha.iter().map(|a| a / sum).collect()
        }
    }
}

fn weno3(phi: &[f64], family: ReconstructionFamily, tol: &Tolerances, side: Side) -> f64 {
    let b0 = (phi[1] - phi[0]).powi(2);
    let b1 = (phi[2] - phi[1]).powi(2);
    let beta = [b0, b1];

    let gamma = match side {
        Side::Right => [2.0 / 3.0, 1.0 / 3.0],
        Side::Left => [1.0 / 3.0, 2.0 / 3.0],
    };
    let w = nonlinear_weights(&gamma, &beta, family, tol);

    match side {
        Side::Right => w[0] * (0.5 * phi[1] + 0.5 * phi[0]) + w[1] * (-0.5 * phi[2] + 1.5 * phi[1]),
        Side::Left => w[0] * (-0.5 * phi[0] + 1.5 * phi[1]) + w[1] * (0.5 * phi[1] + 0.5 * phi[2]),
    }
}

fn weno5(phi: &[f64], family: ReconstructionFamily, tol: &Tolerances, side: Side) -> f64 {
    let b0 = 13.0 / 12.0 * (phi[0] - 2.0 * phi[1] + phi[2]).powi(2)
        + 0.25 * (phi[0] - 4.0 * phi[1] + 3.0 * phi[2]).powi(2);
    let b1 = 13.0 / 12.0 * (phi[1] - 2.0 * phi[2] + phi[3]).powi(2)
        + 0.25 * (phi[1] - phi[3]).powi(2);
    let b2 = 13.0 / 12.0 * (phi[2] - 2.0 * phi[3] + phi[4]).powi(2)
        + 0.25 * (3.0 * phi[2] - 4.0 * phi[3] + phi[4]).powi(2);
    let beta = [b0, b1, b2];

    let gamma = match side {
        Side::Right => [3.0 / 10.0, 3.0 / 5.0, 1.0 / 10.0],
        Side::Left => [1.0 / 10.0, 3.0 / 5.0, 3.0 / 10.0],
    };
    let w = nonlinear_weights(&gamma, &beta, family, tol);

    match side {
        Side::Right => {
            w[0] * (1.0 / 3.0 * phi[2] + 5.0 / 6.0 * phi[1] - 1.0 / 6.0 * phi[0])
                + w[1] * (-1.0 / 6.0 * phi[3] + 5.0 / 6.0 * phi[2] + 1.0 / 3.0 * phi[1])
                + w[2] * (1.0 / 3.0 * phi[4] - 7.0 / 6.0 * phi[3] + 11.0 / 6.0 * phi[2])
        }
        Side::Left => {
            w[2] * (1.0 / 3.0 * phi[2] + 5.0 / 6.0 * phi[3] - 1.0 / 6.0 * phi[4])
                + w[1] * (-1.0 / 6.0 * phi[1] + 5.0 / 6.0 * phi[2] + 1.0 / 3.0 * phi[3])
                + w[0] * (1.0 / 3.0 * phi[0] - 7.0 / 6.0 * phi[1] + 11.0 / 6.0 * phi[2])
        }
    }
}

fn weno7_beta(phi: &[f64]) -> [f64; 4] {
    let b0 = phi[0] * (547.0 * phi[0] - 3882.0 * phi[1] + 4642.0 * phi[2] - 1854.0 * phi[3])
        + phi[1] * (7043.0 * phi[1] - 17246.0 * phi[2] + 7042.0 * phi[3])
        + phi[2] * (11003.0 * phi[2] - 9402.0 * phi[3])
        + phi[3] * 2107.0 * phi[3];
    let b1 = phi[1] * (267.0 * phi[1] - 1642.0 * phi[2] + 1602.0 * phi[3] - 494.0 * phi[4])
        + phi[2] * (2843.0 * phi[2] - 5966.0 * phi[3] + 1922.0 * phi[4])
        + phi[3] * (3443.0 * phi[3] - 2522.0 * phi[4])
        + phi[4] * 547.0 * phi[4];
    let b2 = phi[2] * (547.0 * phi[2] - 2522.0 * phi[3] + 1922.0 * phi[4] - 494.0 * phi[5])
        + phi[3] * (3443.0 * phi[3] - 5966.0 * phi[4] + 1602.0 * phi[5])
        + phi[4] * (2843.0 * phi[4] - 1642.0 * phi[5])
        + phi[5] * 267.0 * phi[5];
    let b3 = phi[3] * (2107.0 * phi[3] - 9402.0 * phi[4] + 7042.0 * phi[5] - 1854.0 * phi[6])
        + phi[4] * (11003.0 * phi[4] - 17246.0 * phi[5] + 4642.0 * phi[6])
        + phi[5] * (7043.0 * phi[5] - 3882.0 * phi[6])
        + phi[6] * 547.0 * phi[6];
    [b0, b1, b2, b3]
}

fn weno7(phi: &[f64], family: ReconstructionFamily, tol: &Tolerances, side: Side) -> f64 {
    let beta = weno7_beta(phi);

    let gamma = match side {
        Side::Right => [4.0 / 35.0, 18.0 / 35.0, 12.0 / 35.0, 1.0 / 35.0],
        Side::Left => [1.0 / 35.0, 12.0 / 35.0, 18.0 / 35.0, 4.0 / 35.0],
    };
    let w = nonlinear_weights(&gamma, &beta, family, tol);

    match side {
        Side::Right => {
            w[0] * (1.0 / 4.0 * phi[3] + 13.0 / 12.0 * phi[2] - 5.0 / 12.0 * phi[1] + 1.0 / 12.0 * phi[0])
                + w[1] * (-1.0 / 12.0 * phi[4] + 7.0 / 12.0 * phi[3] + 7.0 / 12.0 * phi[2] - 1.0 / 12.0 * phi[1])
                + w[2] * (1.0 / 12.0 * phi[5] - 5.0 / 12.0 * phi[4] + 13.0 / 12.0 * phi[3] + 1.0 / 4.0 * phi[2])
                + w[3] * (-1.0 / 4.0 * phi[6] + 13.0 / 12.0 * phi[5] - 23.0 / 12.0 * phi[4] + 25.0 / 12.0 * phi[3])
        }
        Side::Left => {
            w[0] * (-1.0 / 4.0 * phi[0] + 13.0 / 12.0 * phi[1] - 23.0 / 12.0 * phi[2] + 25.0 / 12.0 * phi[3])
                + w[1] * (1.0 / 12.0 * phi[1] - 5.0 / 12.0 * phi[2] + 13.0 / 12.0 * phi[3] + 1.0 / 4.0 * phi[4])
                + w[2] * (-1.0 / 12.0 * phi[2] + 7.0 / 12.0 * phi[3] + 7.0 / 12.0 * phi[4] - 1.0 / 12.0 * phi[5])
                + w[3] * (1.0 / 4.0 * phi[3] + 13.0 / 12.0 * phi[4] - 5.0 / 12.0 * phi[5] + 1.0 / 12.0 * phi[6])
        }
    }
}
