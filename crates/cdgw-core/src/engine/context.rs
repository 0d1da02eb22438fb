use super::progress::ProgressReporter;
use crate::core::models::ids::OrbitalIndex;
use crate::core::models::orbitals::OrbitalSet;
use crate::core::models::ri::RiTensor;
use crate::core::quadrature::ImaginaryAxisQuadrature;
use crate::core::screening::ScreenedInteraction;
use nalgebra::DMatrix;
use num_complex::Complex64;

/// Distance below which a real frequency is treated as coinciding with a pole of G.
pub(crate) const POLE_COINCIDENCE_TOLERANCE: f64 = 1e-10;

/// Pair vectors `b_pm` of one requested state, stored as complex columns for contraction.
pub struct StateBlock {
    pub pairs: DMatrix<Complex64>,
}

impl StateBlock {
    pub fn new(ri: &RiTensor, state: OrbitalIndex) -> Self {
        Self {
            pairs: ri.state_block(state).map(|b| Complex64::new(b, 0.0)),
        }
    }
}

/// Everything one self-energy evaluation pass reads.
pub struct SigmaContext<'a, W: ScreenedInteraction> {
    pub screening: &'a W,
    /// Orbital energies acting as the poles of G.
    pub poles: &'a OrbitalSet,
    pub fermi_level: f64,
    pub eta: f64,
    pub quadrature: &'a ImaginaryAxisQuadrature,
    pub blocks: &'a [StateBlock],
    /// Evaluation frequencies per state. A frequency may sit exactly on a pole of G.
    pub frequencies: &'a [Vec<f64>],
    pub reporter: &'a ProgressReporter<'a>,
}

impl<W: ScreenedInteraction> SigmaContext<'_, W> {
    pub fn cell_count(&self) -> usize {
        self.frequencies.iter().map(Vec::len).sum()
    }
}

/// Signed distance `omega - pole`, snapped to zero when the two coincide.
pub(crate) fn pole_offset(omega: f64, pole: f64) -> f64 {
    let d = omega - pole;
    if d.abs() <= POLE_COINCIDENCE_TOLERANCE {
        0.0
    } else {
        d
    }
}

/// Sign function with `sign(0) = 0`.
pub(crate) fn sign(d: f64) -> f64 {
    if d > 0.0 {
        1.0
    } else if d < 0.0 {
        -1.0
    } else {
        0.0
    }
}
