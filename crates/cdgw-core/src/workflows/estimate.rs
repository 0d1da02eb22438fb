use super::evgw::resolve_targets;
use crate::core::models::meanfield::MeanField;
use crate::engine::config::GwConfig;
use crate::engine::error::GwError;
use crate::engine::memory::{ContractionStrategy, MemoryEstimate, select_strategy};
use crate::engine::progress::ProgressReporter;
use crate::engine::selfenergy::SelfEnergyEngine;
use tracing::{info, instrument};

/// Memory plan for a run, computed without evaluating anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryPlan {
    pub states: usize,
    pub estimate: MemoryEstimate,
    pub budget_mb: f64,
    /// `None` when even the low-memory strategy exceeds the ceiling.
    pub strategy: Option<ContractionStrategy>,
}

#[instrument(skip_all, name = "memory_estimate")]
pub fn run(meanfield: &MeanField, config: &GwConfig) -> Result<MemoryPlan, GwError> {
    let targets = resolve_targets(meanfield.orbitals(), &config.targets)?;
    let reporter = ProgressReporter::new();
    let engine = SelfEnergyEngine::new(meanfield, config, &reporter)?;
    let estimate = engine.estimate_memory(targets.len(), &config.sigma_grid);

    let strategy = match select_strategy(
        &estimate,
        config.memory_budget_bytes(),
        config.memory.force_low_memory,
    ) {
        Ok(strategy) => Some(strategy),
        Err(GwError::MemoryBudgetExceeded { .. }) => None,
        Err(e) => return Err(e),
    };
    info!(
        high_memory_mb = estimate.high_memory_mb(),
        low_memory_mb = estimate.low_memory_mb(),
        budget_mb = config.memory.max_memory_mb,
        "Memory estimate computed."
    );

    Ok(MemoryPlan {
        states: targets.len(),
        estimate,
        budget_mb: config.memory.max_memory_mb,
        strategy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::orbitals::OrbitalSet;
    use crate::core::models::ri::RiTensor;
    use crate::engine::config::GwConfigBuilder;

    fn meanfield() -> MeanField {
        let orbitals = OrbitalSet::new(vec![-0.5, 0.4, 0.9], 1).unwrap();
        let ri = RiTensor::from_fn(3, 3, |aux, p, q| 0.1 * (aux + p + q) as f64).unwrap();
        MeanField::new(orbitals, ri, vec![0.0; 3]).unwrap()
    }

    fn builder() -> GwConfigBuilder {
        GwConfigBuilder::new()
            .no_qp(1)
            .nv_qp(2)
            .nomega_sigma(81)
            .step_sigma(0.01)
            .gl_npoint(100)
    }

    #[test]
    fn plan_prefers_high_memory_under_a_generous_ceiling() {
        let plan = run(&meanfield(), &builder().build().unwrap()).unwrap();
        assert_eq!(plan.states, 3);
        assert_eq!(plan.strategy, Some(ContractionStrategy::HighMemory));
        assert!(plan.estimate.high_memory_bytes > plan.estimate.low_memory_bytes);
    }

    #[test]
    fn plan_reports_no_strategy_when_nothing_fits() {
        let plan = run(&meanfield(), &builder().max_memory_mb(1e-6).build().unwrap()).unwrap();
        assert_eq!(plan.strategy, None);
    }

    #[test]
    fn plan_honours_forced_low_memory() {
        let plan = run(&meanfield(), &builder().low_mem(true).build().unwrap()).unwrap();
        assert_eq!(plan.strategy, Some(ContractionStrategy::LowMemory));
    }
}
