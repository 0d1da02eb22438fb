//! Memory planning for the self-energy contraction.
//!
//! The choice between strategies is a pure function of the problem dimensions, made once per
//! self-energy evaluation and before any large buffer is allocated.

use super::error::GwError;
use std::fmt;

const REAL_BYTES: usize = std::mem::size_of::<f64>();
const COMPLEX_BYTES: usize = 2 * std::mem::size_of::<f64>();
/// Matrices alive while one screened-interaction sample is built: polarizability,
/// dielectric matrix and its inverse.
const SAMPLE_WORKSPACE_MATRICES: usize = 3;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractionStrategy {
    /// Evaluate `W^c(iu_k)` for every quadrature node up front and keep the contracted
    /// `W_pm(iu_k)` table for all states, orbitals and nodes.
    HighMemory,
    /// Stream quadrature nodes, folding each contracted sample into per-cell accumulators.
    LowMemory,
}

impl fmt::Display for ContractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractionStrategy::HighMemory => write!(f, "high-memory"),
            ContractionStrategy::LowMemory => write!(f, "low-memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractionDims {
    pub states: usize,
    pub orbitals: usize,
    pub naux: usize,
    pub transitions: usize,
    pub quadrature_order: usize,
    pub frequencies: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEstimate {
    pub high_memory_bytes: usize,
    pub low_memory_bytes: usize,
}

impl MemoryEstimate {
    pub fn for_dims(dims: &ContractionDims) -> Self {
        let naux_sq = dims.naux * dims.naux;
        let ri_tensor = dims.naux * dims.orbitals * dims.orbitals * REAL_BYTES;
        let pair_blocks = dims.states * dims.naux * dims.orbitals * COMPLEX_BYTES;
        let transition_block = dims.transitions * dims.naux * REAL_BYTES;
        // Residue, imaginary-axis and total self-energy per cell.
        let table = dims.states * dims.frequencies * (2 * COMPLEX_BYTES + REAL_BYTES);
        let static_limit = dims.states * dims.orbitals * REAL_BYTES;
        let workspace = SAMPLE_WORKSPACE_MATRICES * naux_sq * COMPLEX_BYTES;
        let shared =
            ri_tensor + pair_blocks + transition_block + table + static_limit + workspace;

        let held_samples = dims.quadrature_order * naux_sq * COMPLEX_BYTES;
        let contracted_table = dims.states * dims.orbitals * dims.quadrature_order * REAL_BYTES;
        let streamed_row = dims.states * dims.orbitals * REAL_BYTES;

        Self {
            high_memory_bytes: shared + held_samples + contracted_table,
            low_memory_bytes: shared + streamed_row,
        }
    }

    pub fn high_memory_mb(&self) -> f64 {
        self.high_memory_bytes as f64 / BYTES_PER_MB
    }

    pub fn low_memory_mb(&self) -> f64 {
        self.low_memory_bytes as f64 / BYTES_PER_MB
    }

    pub fn bytes_for(&self, strategy: ContractionStrategy) -> usize {
        match strategy {
            ContractionStrategy::HighMemory => self.high_memory_bytes,
            ContractionStrategy::LowMemory => self.low_memory_bytes,
        }
    }
}

pub fn select_strategy(
    estimate: &MemoryEstimate,
    budget_bytes: usize,
    force_low_memory: bool,
) -> Result<ContractionStrategy, GwError> {
    if !force_low_memory && estimate.high_memory_bytes <= budget_bytes {
        return Ok(ContractionStrategy::HighMemory);
    }
    if estimate.low_memory_bytes <= budget_bytes {
        return Ok(ContractionStrategy::LowMemory);
    }
    Err(GwError::MemoryBudgetExceeded {
        required_mb: estimate.low_memory_mb(),
        budget_mb: budget_bytes as f64 / BYTES_PER_MB,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ContractionDims {
        ContractionDims {
            states: 4,
            orbitals: 50,
            naux: 200,
            transitions: 10 * 40,
            quadrature_order: 100,
            frequencies: 81,
        }
    }

    #[test]
    fn high_memory_estimate_exceeds_low_memory_estimate() {
        let estimate = MemoryEstimate::for_dims(&dims());
        assert!(estimate.high_memory_bytes > estimate.low_memory_bytes);
        let difference = estimate.high_memory_bytes - estimate.low_memory_bytes;
        let expected = 100 * 200 * 200 * 16 + 4 * 50 * 100 * 8 - 4 * 50 * 8;
        assert_eq!(difference, expected);
    }

    #[test]
    fn estimate_grows_with_quadrature_order_only_for_high_memory() {
        let small = MemoryEstimate::for_dims(&dims());
        let large = MemoryEstimate::for_dims(&ContractionDims {
            quadrature_order: 400,
            ..dims()
        });
        assert!(large.high_memory_bytes > small.high_memory_bytes);
        assert_eq!(large.low_memory_bytes, small.low_memory_bytes);
    }

    #[test]
    fn prefers_high_memory_when_it_fits() {
        let estimate = MemoryEstimate {
            high_memory_bytes: 1000,
            low_memory_bytes: 100,
        };
        assert_eq!(
            select_strategy(&estimate, 1000, false).unwrap(),
            ContractionStrategy::HighMemory
        );
    }

    #[test]
    fn falls_back_to_low_memory_when_high_memory_does_not_fit() {
        let estimate = MemoryEstimate {
            high_memory_bytes: 1000,
            low_memory_bytes: 100,
        };
        assert_eq!(
            select_strategy(&estimate, 999, false).unwrap(),
            ContractionStrategy::LowMemory
        );
    }

    #[test]
    fn forced_low_memory_is_honored_even_if_high_memory_fits() {
        let estimate = MemoryEstimate {
            high_memory_bytes: 1000,
            low_memory_bytes: 100,
        };
        assert_eq!(
            select_strategy(&estimate, usize::MAX, true).unwrap(),
            ContractionStrategy::LowMemory
        );
    }

    #[test]
    fn fails_when_even_low_memory_exceeds_ceiling() {
        let estimate = MemoryEstimate {
            high_memory_bytes: 4 * 1024 * 1024,
            low_memory_bytes: 2 * 1024 * 1024,
        };
        let result = select_strategy(&estimate, 1024 * 1024, false);
        match result {
            Err(GwError::MemoryBudgetExceeded {
                required_mb,
                budget_mb,
            }) => {
                assert_eq!(required_mb, 2.0);
                assert_eq!(budget_mb, 1.0);
            }
            other => panic!("expected MemoryBudgetExceeded, got {:?}", other),
        }
    }
}
