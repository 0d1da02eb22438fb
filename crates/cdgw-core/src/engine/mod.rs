//! # Engine Module
//!
//! This module implements the numerical engine of cdgw: the contour-deformation evaluation of
//! the correlation self-energy and the solution of the quasiparticle equation.
//!
//! ## Overview
//!
//! For every requested state and real frequency the self-energy is split into the residues
//! of the poles of G enclosed by the deformed contour and an integral along the imaginary
//! frequency axis. The engine plans the memory needed for that contraction, chooses between a
//! high-memory and a low-memory strategy, evaluates both terms and hands the tabulated
//! self-energy to the solvers.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Targets, grids, quadrature, screening, memory and evGW settings
//! - **Memory Planning** ([`memory`]) - Strategy estimates and selection under a memory ceiling
//! - **Self-Energy Engine** ([`selfenergy`]) - Orchestrates the residue and imaginary-axis tasks
//! - **Self-Energy Tables** ([`table`]) - Per-state self-energy on the real-frequency grid
//! - **Solvers** ([`solver`]) - Linearized and graphical solutions of the quasiparticle equation
//! - **State Tracking** ([`state`]) - Quasiparticle records, iteration history and convergence status
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-level error types
//!
//! ## Key Capabilities
//!
//! - **Strategy-independent results** so the high- and low-memory paths agree to summation order
//! - **Parallel computation** of self-energy cells and quadrature samples behind the `parallel` feature
//! - **Up-front memory checks** that fail before any large buffer is allocated
//! - **Grid resolution checks** against the smallest transition energy of the system

pub mod config;
pub(crate) mod context;
pub mod error;
pub mod memory;
pub mod progress;
pub mod selfenergy;
pub mod solver;
pub mod state;
pub mod table;
pub(crate) mod tasks;
