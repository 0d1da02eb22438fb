use super::{POLE_TOLERANCE, ScreenedInteractionSample, ScreeningError};
use nalgebra::DMatrix;
use num_complex::Complex64;

/// Screened interaction from a read-in set of neutral excitations.
///
/// `W^c_PQ(z) = Σ_s ρ^s_P ρ^s_Q 2Ω_s / (z² - Ω_s²)`, where `Ω_s` are excitation energies
/// and `ρ^s` their amplitudes in the auxiliary basis (one row of `amplitudes` per
/// excitation). This representation does not depend on the orbital energies and is
/// therefore held fixed across evGW iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralScreening {
    energies: Vec<f64>,
    amplitudes: DMatrix<f64>,
}

impl SpectralScreening {
    pub fn new(energies: Vec<f64>, amplitudes: DMatrix<f64>) -> Result<Self, ScreeningError> {
        if amplitudes.nrows() != energies.len() {
            return Err(ScreeningError::AmplitudeShape {
                expected: energies.len(),
                found: amplitudes.nrows(),
            });
        }
        for (index, &energy) in energies.iter().enumerate() {
            if !energy.is_finite() || energy <= 0.0 {
                return Err(ScreeningError::InvalidExcitation {
                    index,
                    reason: format!("energy {} is not finite and positive", energy),
                });
            }
        }
        if amplitudes.iter().any(|v| !v.is_finite()) {
            return Err(ScreeningError::InvalidExcitation {
                index: 0,
                reason: "amplitudes contain non-finite values".to_string(),
            });
        }
        Ok(Self {
            energies,
            amplitudes,
        })
    }

    pub fn naux(&self) -> usize {
        self.amplitudes.ncols()
    }

    pub fn excitation_count(&self) -> usize {
        self.energies.len()
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn amplitudes(&self) -> &DMatrix<f64> {
        &self.amplitudes
    }

    pub fn evaluate_with_broadening(
        &self,
        z: Complex64,
        eta: f64,
    ) -> Result<ScreenedInteractionSample, ScreeningError> {
        let on_pole = self.energies.iter().any(|&omega| {
            (z - omega).norm() < POLE_TOLERANCE || (z + omega).norm() < POLE_TOLERANCE
        });
        let z = if on_pole {
            z + Complex64::new(0.0, eta)
        } else {
            z
        };

        let naux = self.naux();
        let mut correlation = DMatrix::<Complex64>::zeros(naux, naux);
        for (s, &omega) in self.energies.iter().enumerate() {
            let factor = 2.0 * omega / (z * z - omega * omega);
            let row = self.amplitudes.row(s);
            for q in 0..naux {
                let scaled = factor * row[q];
                for p in 0..naux {
                    correlation[(p, q)] += scaled * row[p];
                }
            }
        }
        Ok(ScreenedInteractionSample::new(z, correlation))
    }
}
