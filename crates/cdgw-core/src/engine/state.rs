use super::solver::{GraphicalSolution, SolverError};
use crate::core::models::ids::OrbitalIndex;
use crate::core::models::orbitals::Occupation;
use num_complex::Complex64;

/// Solution of the quasiparticle equation for one state, in Hartree.
#[derive(Debug, Clone, PartialEq)]
pub struct QuasiparticleRecord {
    pub state: OrbitalIndex,
    pub occupation: Occupation,
    /// Mean-field energy `ε⁰_p`.
    pub e0: f64,
    /// Energy around which the self-energy grid was centered.
    pub reference: f64,
    /// `(Σ_x - v_xc)_pp`.
    pub correction: f64,
    /// `Σ_c(reference)`.
    pub sigma_c: Complex64,
    pub z: f64,
    pub e_lin: f64,
    pub graphical: Result<GraphicalSolution, SolverError>,
}

impl QuasiparticleRecord {
    /// Graphical energy when one was found, otherwise the linearized energy.
    pub fn qp_energy(&self) -> f64 {
        match &self.graphical {
            Ok(solution) => solution.energy,
            Err(_) => self.e_lin,
        }
    }

    pub fn graphical_energy(&self) -> Option<f64> {
        self.graphical.as_ref().ok().map(|s| s.energy)
    }

    pub fn is_z_physical(&self) -> bool {
        self.z > 0.0 && self.z <= 1.0
    }
}

/// Outcome of one evGW iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    /// Full set of orbital energies after the update.
    pub energies: Vec<f64>,
    /// Largest change of a targeted energy in this iteration.
    pub max_delta: f64,
    pub records: Vec<QuasiparticleRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConvergenceStatus {
    OneShot,
    Converged { iterations: usize },
    NotConverged { iterations: usize, max_delta: f64 },
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        !matches!(self, ConvergenceStatus::NotConverged { .. })
    }

    pub fn iterations(&self) -> usize {
        match self {
            ConvergenceStatus::OneShot => 0,
            ConvergenceStatus::Converged { iterations }
            | ConvergenceStatus::NotConverged { iterations, .. } => *iterations,
        }
    }
}
