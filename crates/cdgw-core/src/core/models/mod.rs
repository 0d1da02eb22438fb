//! # Core Models Module
//!
//! Data structures describing the mean-field reference that a GW calculation starts from.
//!
//! ## Key Components
//!
//! - [`ids`] - The `OrbitalIndex` handle used to address orbitals everywhere else
//! - [`orbitals`] - Ordered orbital energies with an occupied count and a Fermi level
//! - [`ri`] - The three-index resolution-of-identity factor `B^P_pq`
//! - [`meanfield`] - Orbitals, RI factors and per-orbital corrections bundled and validated
//!
//! ## Usage
//!
//! ```ignore
//! use cdgw::core::models::{meanfield::MeanField, orbitals::OrbitalSet, ri::RiTensor};
//!
//! let orbitals = OrbitalSet::new(vec![-0.6, 0.3, 1.5], 1)?;
//! let ri = RiTensor::new(2, 3, values)?;
//! let meanfield = MeanField::new(orbitals, ri, vec![-0.34, 0.14, 0.0])?;
//! ```

pub mod ids;
pub mod meanfield;
pub mod orbitals;
pub mod ri;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Orbital set has {norb} orbitals but {nocc} are occupied (need 1 <= nocc < norb)")]
    InvalidOccupation { nocc: usize, norb: usize },

    #[error("Orbital energy at index {index} is not finite: {value}")]
    NonFiniteEnergy { index: usize, value: f64 },

    #[error("Occupied orbital energy {homo} is not below virtual orbital energy {lumo}")]
    FermiOrdering { homo: f64, lumo: f64 },

    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Orbital index {index} is out of range for {norb} orbitals")]
    OrbitalOutOfRange { index: usize, norb: usize },

    #[error("Invalid value in {what}: {reason}")]
    InvalidValue { what: &'static str, reason: String },
}
