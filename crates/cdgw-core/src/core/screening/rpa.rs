use super::{
    POLE_TOLERANCE, ScreenedInteraction, ScreenedInteractionSample, ScreeningError,
    correlation_from_polarizability,
};
use crate::core::models::orbitals::OrbitalSet;
use crate::core::models::ri::RiTensor;
use nalgebra::DMatrix;
use num_complex::Complex64;

/// Analytic RPA screening built from orbital energies and RI factors.
///
/// The closed-shell independent-particle polarizability is
/// `Π_PQ(z) = 2 Σ_ia B^P_ia B^Q_ia [1/(z - Ω_ia) - 1/(z + Ω_ia)]` with `Ω_ia = ε_a - ε_i`.
#[derive(Debug, Clone)]
pub struct RpaScreening {
    pairs: DMatrix<f64>,
    excitations: Vec<f64>,
    eta: f64,
}

impl RpaScreening {
    pub fn new(orbitals: &OrbitalSet, ri: &RiTensor, eta: f64) -> Self {
        Self {
            pairs: ri.transition_block(orbitals),
            excitations: orbitals.transitions().map(|t| t.energy).collect(),
            eta,
        }
    }

    pub fn transition_count(&self) -> usize {
        self.excitations.len()
    }

    pub fn polarizability(&self, z: Complex64) -> DMatrix<Complex64> {
        let naux = self.pairs.ncols();
        let mut pi = DMatrix::<Complex64>::zeros(naux, naux);
        for (t, &omega) in self.excitations.iter().enumerate() {
            let factor = 2.0 * (1.0 / (z - omega) - 1.0 / (z + omega));
            let row = self.pairs.row(t);
            for q in 0..naux {
                let scaled = factor * row[q];
                for p in 0..naux {
                    pi[(p, q)] += scaled * row[p];
                }
            }
        }
        pi
    }

    fn regularize(&self, z: Complex64) -> Complex64 {
        let on_pole = self
            .excitations
            .iter()
            .any(|&omega| (z - omega).norm() < POLE_TOLERANCE || (z + omega).norm() < POLE_TOLERANCE);
        if on_pole {
            z + Complex64::new(0.0, self.eta)
        } else {
            z
        }
    }
}

impl ScreenedInteraction for RpaScreening {
    fn naux(&self) -> usize {
        self.pairs.ncols()
    }

    fn evaluate(&self, z: Complex64) -> Result<ScreenedInteractionSample, ScreeningError> {
        let z = self.regularize(z);
        let correlation = correlation_from_polarizability(z, self.polarizability(z))?;
        Ok(ScreenedInteractionSample::new(z, correlation))
    }
}
