//! # Workflows Module
//!
//! High-level entry points that run complete GW calculations on top of [`crate::engine`].
//!
//! ## Overview
//!
//! Workflows resolve the targeted states, build the self-energy engine once, and drive it
//! either for a single one-shot G0W0 evaluation or through the evGW fixed-point iteration.
//! They own the only mutable state of a calculation, the current vector of orbital energies,
//! and return the complete iteration history alongside the final quasiparticle records.
//!
//! ## Architecture
//!
//! - **GW Workflow** ([`evgw`]) - One-shot G0W0 and evGW with scissor shifts of untargeted orbitals
//! - **Memory Estimate** ([`estimate`]) - Strategy plan for a configuration without evaluating anything
//! - **Reports** ([`report`]) - CSV output of quasiparticle records and evGW history in eV
//!
//! ## Key Capabilities
//!
//! - **Warm starts** from mean-field, linearized one-shot or caller-supplied energies
//! - **Per-state fallback** to the linearized energy when no graphical solution exists
//! - **Non-fatal convergence reporting** returning the last iterate with its status

pub mod estimate;
pub mod evgw;
pub mod report;
