use super::config::{ConfigError, GridResolutionCheck, GwConfig};
use super::context::{SigmaContext, StateBlock};
use super::error::GwError;
use super::memory::{ContractionDims, ContractionStrategy, MemoryEstimate, select_strategy};
use super::progress::{Progress, ProgressReporter};
use super::table::{SelfEnergyTable, SigmaSeries};
use super::tasks;
use crate::core::grid::FrequencyGrid;
use crate::core::models::ModelError;
use crate::core::models::ids::OrbitalIndex;
use crate::core::models::meanfield::MeanField;
use crate::core::models::orbitals::OrbitalSet;
use crate::core::quadrature::ImaginaryAxisQuadrature;
use crate::core::screening::ScreeningModel;
use crate::core::screening::rpa::RpaScreening;
use tracing::{debug, info, instrument, warn};

/// Contour-deformation evaluator of the correlation self-energy `Σ_c(ω)`.
///
/// For each requested state `p` and real frequency `ω` the self-energy is the sum of the
/// residues of the poles of G enclosed by the deformed contour, minus the integral along
/// the imaginary axis. At `ω = ε_p` the pole of G sits on the contour; it contributes half
/// its residue and drops out of the static part of the integral, so `Σ_c` takes its limit
/// there.
pub struct SelfEnergyEngine<'a> {
    meanfield: &'a MeanField,
    config: &'a GwConfig,
    quadrature: ImaginaryAxisQuadrature,
    reporter: &'a ProgressReporter<'a>,
}

impl<'a> SelfEnergyEngine<'a> {
    pub fn new(
        meanfield: &'a MeanField,
        config: &'a GwConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Result<Self, GwError> {
        let quadrature =
            ImaginaryAxisQuadrature::new(config.quadrature.order, config.quadrature.scale)?;
        if !config.screening.analytic && meanfield.spectral_screening().is_none() {
            return Err(ConfigError::InvalidValue {
                parameter: "analytic_w",
                reason: "the read-in screening model was requested but the mean-field data carries none"
                    .to_string(),
            }
            .into());
        }
        Ok(Self {
            meanfield,
            config,
            quadrature,
            reporter,
        })
    }

    pub fn quadrature(&self) -> &ImaginaryAxisQuadrature {
        &self.quadrature
    }

    pub fn dims(&self, states: usize, grid: &FrequencyGrid) -> ContractionDims {
        let orbitals = self.meanfield.orbitals();
        ContractionDims {
            states,
            orbitals: orbitals.len(),
            naux: self.meanfield.ri().naux(),
            transitions: orbitals.transition_count(),
            quadrature_order: self.quadrature.order(),
            frequencies: grid.count(),
        }
    }

    pub fn estimate_memory(&self, states: usize, grid: &FrequencyGrid) -> MemoryEstimate {
        MemoryEstimate::for_dims(&self.dims(states, grid))
    }

    /// Chooses the contraction strategy for `states` requested states, logging both estimates.
    pub fn plan(
        &self,
        states: usize,
        grid: &FrequencyGrid,
    ) -> Result<(ContractionStrategy, MemoryEstimate), GwError> {
        let estimate = self.estimate_memory(states, grid);
        info!(
            high_memory_mb = estimate.high_memory_mb(),
            low_memory_mb = estimate.low_memory_mb(),
            budget_mb = self.config.memory.max_memory_mb,
            forced_low_memory = self.config.memory.force_low_memory,
            "Estimated self-energy memory requirements."
        );
        let strategy = select_strategy(
            &estimate,
            self.config.memory_budget_bytes(),
            self.config.memory.force_low_memory,
        )?;
        info!(%strategy, "Selected contraction strategy.");
        Ok((strategy, estimate))
    }

    /// `Σ_c(p, E_p + offset_j)` for every requested state `p` and grid offset, where `E_p` is
    /// taken from `energies`. `energies` also provides the poles of G and, when screening
    /// updates are enabled, the transition energies of W.
    #[instrument(skip_all, name = "sigma_evaluation")]
    pub fn compute_sigma(
        &self,
        states: &[OrbitalIndex],
        grid: &FrequencyGrid,
        energies: &OrbitalSet,
    ) -> Result<SelfEnergyTable, GwError> {
        let bare = self.meanfield.orbitals();
        if energies.len() != bare.len() || energies.nocc() != bare.nocc() {
            return Err(ModelError::DimensionMismatch {
                what: "quasiparticle energies",
                expected: bare.len(),
                found: energies.len(),
            }
            .into());
        }
        if let Some(&state) = states.iter().find(|s| !bare.contains(**s)) {
            return Err(GwError::StateOutOfRange {
                state,
                norb: bare.len(),
            });
        }

        let screening_orbitals = if self.config.screening.update_with_qp_energies {
            energies
        } else {
            bare
        };
        self.check_grid_resolution(grid, energies.min_transition_energy())?;

        let (strategy, estimate) = self.plan(states.len(), grid)?;
        self.reporter.report(Progress::Message(format!(
            "Memory estimate: {:.1} MB high-memory, {:.1} MB low-memory; using {}",
            estimate.high_memory_mb(),
            estimate.low_memory_mb(),
            strategy
        )));

        let eta = self.config.screening.eta;
        let screening = if self.config.screening.analytic {
            ScreeningModel::Rpa(RpaScreening::new(
                screening_orbitals,
                self.meanfield.ri(),
                eta,
            ))
        } else {
            let poles = self.meanfield.spectral_screening().ok_or_else(|| {
                GwError::Internal("read-in screening vanished after validation".to_string())
            })?;
            ScreeningModel::Spectral { poles, eta }
        };

        let fermi_level = energies.fermi_level();
        let blocks: Vec<StateBlock> = states
            .iter()
            .map(|&state| StateBlock::new(self.meanfield.ri(), state))
            .collect();
        let frequencies: Vec<Vec<f64>> = states
            .iter()
            .map(|&state| grid.points_around(energies.energy(state)))
            .collect();

        let ctx = SigmaContext {
            screening: &screening,
            poles: energies,
            fermi_level,
            eta,
            quadrature: &self.quadrature,
            blocks: &blocks,
            frequencies: &frequencies,
            reporter: self.reporter,
        };
        debug!(
            states = states.len(),
            frequencies = grid.count(),
            quadrature_order = self.quadrature.order(),
            fermi_level,
            "Evaluating correlation self-energy."
        );

        // === Imaginary-axis integral ===
        self.reporter.report(Progress::PhaseStart {
            name: "Imaginary-axis integral",
        });
        let w_static = tasks::imaginary_axis::static_limit(&ctx)?;
        let integrals = match strategy {
            ContractionStrategy::HighMemory => {
                tasks::imaginary_axis::run_high_memory(&ctx, &w_static)?
            }
            ContractionStrategy::LowMemory => tasks::imaginary_axis::run_low_memory(&ctx, &w_static)?,
        };
        self.reporter.report(Progress::PhaseFinish);

        // === Residues of enclosed poles ===
        self.reporter.report(Progress::PhaseStart { name: "Residues" });
        let residues = tasks::residue::run(&ctx)?;
        self.reporter.report(Progress::PhaseFinish);

        let series = states
            .iter()
            .zip(residues)
            .zip(integrals)
            .map(|((&state, residue), integral)| {
                SigmaSeries::from_parts(state, energies.energy(state), grid, residue, integral)
            })
            .collect();

        Ok(SelfEnergyTable::new(series, strategy, estimate))
    }

    fn check_grid_resolution(&self, grid: &FrequencyGrid, min_transition: f64) -> Result<(), GwError> {
        let (fraction, fatal) = match self.config.grid_check {
            GridResolutionCheck::Off => return Ok(()),
            GridResolutionCheck::Warn { fraction } => (fraction, false),
            GridResolutionCheck::Fatal { fraction } => (fraction, true),
        };
        let limit = fraction * min_transition;
        if grid.step() <= limit {
            return Ok(());
        }
        if fatal {
            return Err(GwError::InsufficientGridResolution {
                step: grid.step(),
                limit,
                min_transition,
            });
        }
        warn!(
            step = grid.step(),
            limit,
            min_transition,
            "Frequency grid step is coarse compared with the smallest transition energy."
        );
        Ok(())
    }
}
