//! Solvers for the quasiparticle equation `ω = ε⁰_p + (Σ_x - v_xc)_pp + Re Σ_c,p(ω)`.
//!
//! Both solvers read a tabulated [`SigmaSeries`]. The linearized solver expands the
//! self-energy to first order around the reference energy; the graphical solver looks for
//! upward zero crossings of the residual on the grid and keeps the root nearest the
//! linearized one. Between the poles of `Σ_c` the residual has slope `1 - dReΣ/dω > 0`, so
//! a downward sign change marks a pole of the self-energy rather than a solution.

use super::state::QuasiparticleRecord;
use super::table::SigmaSeries;
use crate::core::models::ids::OrbitalIndex;
use crate::core::models::orbitals::Occupation;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("No quasiparticle solution crosses the frequency grid of state {state}")]
    NoCrossingFound { state: OrbitalIndex },

    #[error(
        "Reference energy of state {state} is not an interior point of its frequency grid"
    )]
    ReferenceNotInterior { state: OrbitalIndex },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearizedSolution {
    pub energy: f64,
    /// Renormalization factor `Z = 1 / (1 - dReΣ/dω)`.
    pub renormalization: f64,
    pub slope: f64,
    pub sigma_at_reference: f64,
}

impl LinearizedSolution {
    pub fn is_physical(&self) -> bool {
        self.renormalization > 0.0 && self.renormalization <= 1.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicalSolution {
    pub energy: f64,
    /// Every root found on the grid, in ascending frequency.
    pub crossings: Vec<f64>,
}

pub fn solve_linearized(
    series: &SigmaSeries,
    e0: f64,
    correction: f64,
) -> Result<LinearizedSolution, SolverError> {
    let j = match series.reference_index() {
        Some(j) if j > 0 && j + 1 < series.len() => j,
        _ => {
            return Err(SolverError::ReferenceNotInterior {
                state: series.state(),
            });
        }
    };
    let omega = series.frequencies();
    let sigma = series.values();

    let slope = (sigma[j + 1].re - sigma[j - 1].re) / (omega[j + 1] - omega[j - 1]);
    let renormalization = 1.0 / (1.0 - slope);
    let sigma_at_reference = sigma[j].re;
    let reference = series.reference();
    let energy = reference + renormalization * (e0 + correction + sigma_at_reference - reference);

    Ok(LinearizedSolution {
        energy,
        renormalization,
        slope,
        sigma_at_reference,
    })
}

/// Roots of `ω - e0 - correction - Re Σ(ω)` on the grid, choosing the one nearest `near`.
///
/// Only intervals where the residual rises from negative to positive are bracketed, plus
/// grid points where it vanishes exactly.
pub fn solve_graphical(
    series: &SigmaSeries,
    e0: f64,
    correction: f64,
    near: f64,
) -> Result<GraphicalSolution, SolverError> {
    let omega = series.frequencies();
    let residual: Vec<f64> = omega
        .iter()
        .zip(series.values())
        .map(|(&w, s)| w - e0 - correction - s.re)
        .collect();

    let mut crossings = Vec::new();
    for j in 0..residual.len() {
        let f = residual[j];
        if f == 0.0 {
            crossings.push(omega[j]);
            continue;
        }
        if let Some(&next) = residual.get(j + 1) {
            if f < 0.0 && next > 0.0 {
                crossings.push(omega[j] - f * (omega[j + 1] - omega[j]) / (next - f));
            }
        }
    }

    let energy = crossings
        .iter()
        .copied()
        .min_by(|a, b| (a - near).abs().total_cmp(&(b - near).abs()))
        .ok_or(SolverError::NoCrossingFound {
            state: series.state(),
        })?;

    if crossings.len() > 1 {
        debug!(
            state = %series.state(),
            crossings = crossings.len(),
            chosen = energy,
            "Several quasiparticle solutions on the grid; keeping the one nearest the linearized energy."
        );
    }
    Ok(GraphicalSolution { energy, crossings })
}

/// Solves both forms of the quasiparticle equation for one state.
///
/// A missing graphical solution is recorded in the result rather than returned as an error,
/// so that callers can fall back to the linearized energy.
pub fn solve(
    series: &SigmaSeries,
    occupation: Occupation,
    e0: f64,
    correction: f64,
) -> Result<QuasiparticleRecord, SolverError> {
    let linearized = solve_linearized(series, e0, correction)?;
    if !linearized.is_physical() {
        warn!(
            state = %series.state(),
            z = linearized.renormalization,
            "Renormalization factor outside (0, 1]; the quasiparticle picture may not hold."
        );
    }
    let graphical = solve_graphical(series, e0, correction, linearized.energy);
    if let Err(err) = &graphical {
        warn!(
            state = %series.state(),
            "{}; using the linearized energy.", err
        );
    }

    let sigma_c = series
        .value_at_reference()
        .ok_or(SolverError::ReferenceNotInterior {
            state: series.state(),
        })?;

    Ok(QuasiparticleRecord {
        state: series.state(),
        occupation,
        e0,
        reference: series.reference(),
        correction,
        sigma_c,
        z: linearized.renormalization,
        e_lin: linearized.energy,
        graphical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::FrequencyGrid;
    use num_complex::Complex64;

    fn series(reference: f64, sigma: impl Fn(f64) -> f64) -> SigmaSeries {
        let grid = FrequencyGrid::centered(11, 0.05).unwrap();
        let values = grid
            .points_around(reference)
            .into_iter()
            .map(|w| Complex64::new(sigma(w), 0.0))
            .collect();
        SigmaSeries::new(OrbitalIndex(0), reference, &grid, values)
    }

    #[test]
    fn linear_self_energy_gives_identical_solutions() {
        // Σ(ω) = a + b (ω - ref) solved exactly by the linearized form.
        let (a, b) = (0.03, -0.2);
        let reference = -0.5;
        let s = series(reference, |w| a + b * (w - reference));
        let record = solve(&s, Occupation::Occupied, -0.48, -0.01).unwrap();

        let z = 1.0 / (1.0 - b);
        assert!((record.z - z).abs() < 1e-12);
        let expected = reference + z * (-0.48 - 0.01 + a - reference);
        assert!((record.e_lin - expected).abs() < 1e-12);
        let graphical = record.graphical.as_ref().unwrap();
        assert!((graphical.energy - expected).abs() < 1e-12);
        assert_eq!(record.qp_energy(), graphical.energy);
        assert!(record.is_z_physical());
    }

    #[test]
    fn constant_shift_outside_the_window_has_no_crossing() {
        let s = series(0.2, |_| 5.0);
        let record = solve(&s, Occupation::Virtual, 0.2, 0.0).unwrap();
        assert_eq!(
            record.graphical,
            Err(SolverError::NoCrossingFound {
                state: OrbitalIndex(0)
            })
        );
        assert!((record.e_lin - 5.2).abs() < 1e-12);
        assert_eq!(record.qp_energy(), record.e_lin);
    }

    #[test]
    fn nearest_crossing_to_the_linearized_energy_is_chosen() {
        // Residual 0.02 sin(60 ω) + 0.01 rises through zero twice on the grid.
        let s = series(0.0, |w| w - 0.02 * (60.0 * w).sin() - 0.01);
        let solution = solve_graphical(&s, 0.0, 0.0, 0.12).unwrap();
        assert_eq!(solution.crossings.len(), 2);
        let best = solution
            .crossings
            .iter()
            .map(|c| (c - 0.12).abs())
            .fold(f64::INFINITY, f64::min);
        assert_eq!((solution.energy - 0.12).abs(), best);
    }

    #[test]
    fn pole_of_the_self_energy_is_not_a_root() {
        // Σ(ω) = 0.01 / (ω - 0.12): the residual jumps from + to - across the pole between
        // grid points 0.10 and 0.15. The true roots are (0.12 ± √0.0544) / 2.
        let s = series(0.0, |w| 0.01 / (w - 0.12));
        let solution = solve_graphical(&s, 0.0, 0.0, 0.13).unwrap();

        assert_eq!(solution.crossings.len(), 2);
        assert!(solution.crossings.iter().all(|&c| !(0.10..=0.15).contains(&c)));
        let upper = (0.12 + 0.0544_f64.sqrt()) / 2.0;
        let lower = (0.12 - 0.0544_f64.sqrt()) / 2.0;
        assert!((solution.crossings[0] - lower).abs() < 0.01);
        assert!((solution.crossings[1] - upper).abs() < 0.02);
        // Linear interpolation between 0.15 and 0.20.
        let expected = 0.15 + (0.01 / 0.03 - 0.15) * 0.05 / (0.2 - 0.125 - 0.15 + 0.01 / 0.03);
        assert!((solution.energy - expected).abs() < 1e-12);
    }

    #[test]
    fn grid_point_exactly_on_the_root_is_found_once() {
        let s = series(0.0, |w| 0.5 * w);
        let solution = solve_graphical(&s, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(solution.crossings.len(), 1);
        assert_eq!(solution.energy, 0.0);
    }

    #[test]
    fn reference_must_be_interior() {
        let grid = FrequencyGrid::new(0.0, 0.1, 3).unwrap();
        let s = SigmaSeries::new(
            OrbitalIndex(2),
            0.3,
            &grid,
            vec![Complex64::new(0.0, 0.0); 3],
        );
        assert_eq!(
            solve_linearized(&s, 0.3, 0.0),
            Err(SolverError::ReferenceNotInterior {
                state: OrbitalIndex(2)
            })
        );
    }

    #[test]
    fn strong_positive_slope_is_flagged_unphysical() {
        let s = series(0.0, |w| 2.0 * w);
        let solution = solve_linearized(&s, 0.0, 0.0).unwrap();
        assert!(solution.renormalization < 0.0);
        assert!(!solution.is_physical());
    }
}
