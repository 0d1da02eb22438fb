//! Provides input functionality for mean-field reference data.
//!
//! The mean-field collaborator (an SCF or DFT code) exports orbital energies, the RI factor
//! and the static `Σ_x - V_xc` corrections as a TOML document. This module parses and
//! validates that document into a [`MeanField`](crate::core::models::meanfield::MeanField).

pub mod meanfield;
