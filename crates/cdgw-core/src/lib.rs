//! # cdgw Core Library
//!
//! Quasiparticle energies in the GW approximation, evaluated with the contour-deformation
//! technique and optionally iterated to eigenvalue self-consistency (evGW).
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that the numerics stay pure and
//! testable while the orchestration remains small.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`OrbitalSet`, `RiTensor`,
//!   `MeanField`), the imaginary-axis quadrature, the real-frequency grid, the screened
//!   interaction evaluators and the mean-field input reader.
//!
//! - **[`engine`]: The Logic Core.** Configuration, error types, the memory-budgeted
//!   self-energy engine (residue and imaginary-axis tasks under a high- or low-memory
//!   contraction strategy) and the quasiparticle equation solver.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into complete
//!   procedures: one-shot G0W0 and evGW runs, and the memory estimate used to plan a run.

pub mod core;
pub mod engine;
pub mod workflows;
