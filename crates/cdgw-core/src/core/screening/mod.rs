//! # Screening Module
//!
//! Evaluators of the correlation part of the screened Coulomb interaction at arbitrary
//! complex frequency.
//!
//! ## Overview
//!
//! In an orthonormalized auxiliary basis the screened interaction between orbital pairs is
//! `W_pq,rs(z) = Σ_PQ B^P_pq W_PQ(z) B^Q_rs`. The evaluators here produce the correlation
//! matrix `W^c_PQ(z) = [(1 - Π(z))^{-1} - 1]_PQ`, which excludes the bare (exchange) part.
//!
//! - [`rpa`] - Analytic RPA from the independent-particle polarizability
//! - [`spectral`] - Read-in neutral excitations with auxiliary-basis amplitudes
//!
//! Both are pure functions of `z`. The caller supplies the `+iη` shift for real arguments;
//! an evaluator applies it itself only when a denominator would otherwise vanish exactly.

pub mod rpa;
pub mod spectral;

use nalgebra::DMatrix;
use num_complex::Complex64;
use thiserror::Error;

use self::rpa::RpaScreening;
use self::spectral::SpectralScreening;

/// Distance below which a frequency is treated as sitting on a pole of the response.
pub(crate) const POLE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScreeningError {
    #[error("Dielectric matrix is singular at frequency {frequency}")]
    SingularDielectric { frequency: Complex64 },

    #[error("Invalid excitation {index}: {reason}")]
    InvalidExcitation { index: usize, reason: String },

    #[error("Amplitude matrix has {found} rows but {expected} excitation energies were given")]
    AmplitudeShape { expected: usize, found: usize },
}

/// `W^c_PQ` at a single complex frequency.
#[derive(Debug, Clone)]
pub struct ScreenedInteractionSample {
    frequency: Complex64,
    correlation: DMatrix<Complex64>,
}

impl ScreenedInteractionSample {
    pub fn new(frequency: Complex64, correlation: DMatrix<Complex64>) -> Self {
        Self {
            frequency,
            correlation,
        }
    }

    pub fn frequency(&self) -> Complex64 {
        self.frequency
    }

    pub fn correlation(&self) -> &DMatrix<Complex64> {
        &self.correlation
    }

    /// `W_pm(z) = b_pmᵀ W^c(z) b_pm` for every column `b_pm` of `block` (`naux × nmo`).
    pub fn contract_block(&self, block: &DMatrix<Complex64>) -> Vec<Complex64> {
        let projected = &self.correlation * block;
        (0..block.ncols())
            .map(|m| {
                block
                    .column(m)
                    .iter()
                    .zip(projected.column(m).iter())
                    .map(|(b, wb)| b * wb)
                    .sum::<Complex64>()
            })
            .collect()
    }

    /// `W_pm(z)` for the single column `m` of `block`.
    pub fn contract_column(&self, block: &DMatrix<Complex64>, m: usize) -> Complex64 {
        let pair = block.column(m);
        let projected = &self.correlation * pair;
        pair.dot(&projected)
    }

    pub fn size_in_bytes(&self) -> usize {
        self.correlation.len() * std::mem::size_of::<Complex64>()
    }
}

pub trait ScreenedInteraction: Send + Sync {
    fn naux(&self) -> usize;

    fn evaluate(&self, z: Complex64) -> Result<ScreenedInteractionSample, ScreeningError>;
}

/// The screening model selected for one self-energy evaluation.
pub enum ScreeningModel<'a> {
    Rpa(RpaScreening),
    Spectral {
        poles: &'a SpectralScreening,
        eta: f64,
    },
}

impl ScreenedInteraction for ScreeningModel<'_> {
    fn naux(&self) -> usize {
        match self {
            ScreeningModel::Rpa(rpa) => rpa.naux(),
            ScreeningModel::Spectral { poles, .. } => poles.naux(),
        }
    }

    fn evaluate(&self, z: Complex64) -> Result<ScreenedInteractionSample, ScreeningError> {
        match self {
            ScreeningModel::Rpa(rpa) => rpa.evaluate(z),
            ScreeningModel::Spectral { poles, eta } => poles.evaluate_with_broadening(z, *eta),
        }
    }
}

/// Inverts `1 - Π` and subtracts the identity.
pub(crate) fn correlation_from_polarizability(
    z: Complex64,
    polarizability: DMatrix<Complex64>,
) -> Result<DMatrix<Complex64>, ScreeningError> {
    let n = polarizability.nrows();
    let identity = DMatrix::<Complex64>::identity(n, n);
    let dielectric = &identity - polarizability;
    let inverse = dielectric
        .try_inverse()
        .ok_or(ScreeningError::SingularDielectric { frequency: z })?;
    Ok(inverse - identity)
}
