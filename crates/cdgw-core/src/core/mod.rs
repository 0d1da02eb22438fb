//! # Core Module
//!
//! Fundamental data structures and numerical building blocks for contour-deformation GW.
//!
//! ## Overview
//!
//! Everything in this module is stateless: orbital energies and RI factors are validated once
//! and never mutated, quadratures and grids are built once and reused across orbitals and
//! iterations, and the screened-interaction evaluators are pure functions of a complex
//! frequency.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Orbital sets, the three-index RI tensor and the mean-field bundle
//! - **Quadrature** ([`quadrature`]) - Gauss-Legendre nodes mapped onto the positive imaginary axis
//! - **Frequency Grid** ([`grid`]) - Real-frequency offsets around each reference energy
//! - **Screening** ([`screening`]) - RPA and read-in spectral models of the screened interaction
//! - **Units** ([`units`]) - Energy unit names and Hartree conversion factors
//! - **File I/O** ([`io`]) - Mean-field TOML input
//!
//! ## Conventions
//!
//! All energies are Hartree internally. Conversion to electronvolts happens only when
//! results are reported.

pub mod grid;
pub mod io;
pub mod models;
pub mod quadrature;
pub mod screening;
pub mod units;
