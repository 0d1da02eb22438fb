use thiserror::Error;

use super::config::ConfigError;
use super::solver::SolverError;
use crate::core::models::ModelError;
use crate::core::models::ids::OrbitalIndex;
use crate::core::quadrature::QuadratureError;
use crate::core::screening::ScreeningError;

#[derive(Debug, Error)]
pub enum GwError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Quadrature setup failed: {0}")]
    Quadrature(#[from] QuadratureError),

    #[error("Invalid mean-field data: {0}")]
    Model(#[from] ModelError),

    #[error("Screened interaction evaluation failed: {0}")]
    Screening(#[from] ScreeningError),

    #[error("Quasiparticle solver failed: {0}")]
    Solver(#[from] SolverError),

    #[error(
        "Memory budget exceeded: the low-memory strategy needs {required_mb:.1} MB but the ceiling is {budget_mb:.1} MB"
    )]
    MemoryBudgetExceeded { required_mb: f64, budget_mb: f64 },

    #[error(
        "Insufficient frequency grid resolution: step {step:.4e} Ha exceeds {limit:.4e} Ha for a smallest transition of {min_transition:.4e} Ha"
    )]
    InsufficientGridResolution {
        step: f64,
        limit: f64,
        min_transition: f64,
    },

    #[error("Quasiparticle state {state} is outside the orbital set of {norb} orbitals")]
    StateOutOfRange { state: OrbitalIndex, norb: usize },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
