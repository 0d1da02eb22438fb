use crate::core::models::ModelError;
use crate::core::models::ids::OrbitalIndex;
use crate::core::models::meanfield::MeanField;
use crate::core::models::orbitals::{Occupation, OrbitalSet};
use crate::engine::config::{ConfigError, EvgwStart, GwConfig, TargetConfig};
use crate::engine::error::GwError;
use crate::engine::memory::{ContractionStrategy, MemoryEstimate};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::selfenergy::SelfEnergyEngine;
use crate::engine::solver;
use crate::engine::state::{ConvergenceStatus, IterationRecord, QuasiparticleRecord};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct GwResult {
    pub targets: Vec<OrbitalIndex>,
    /// Records of the last self-energy evaluation, one per target.
    pub records: Vec<QuasiparticleRecord>,
    pub history: Vec<IterationRecord>,
    pub status: ConvergenceStatus,
    /// Final energies of every orbital, targets included.
    pub energies: Vec<f64>,
    pub strategy: ContractionStrategy,
    pub memory: MemoryEstimate,
}

impl GwResult {
    pub fn record(&self, state: OrbitalIndex) -> Option<&QuasiparticleRecord> {
        self.records.iter().find(|r| r.state == state)
    }
}

/// The `no_qp` highest occupied and `nv_qp` lowest virtual orbitals, in ascending order.
pub fn resolve_targets(
    orbitals: &OrbitalSet,
    targets: &TargetConfig,
) -> Result<Vec<OrbitalIndex>, ConfigError> {
    if targets.no_qp > orbitals.nocc() {
        return Err(ConfigError::InvalidValue {
            parameter: "no_qp",
            reason: format!(
                "{} occupied states requested but only {} are occupied",
                targets.no_qp,
                orbitals.nocc()
            ),
        });
    }
    if targets.nv_qp > orbitals.nvirt() {
        return Err(ConfigError::InvalidValue {
            parameter: "nv_qp",
            reason: format!(
                "{} virtual states requested but only {} are virtual",
                targets.nv_qp,
                orbitals.nvirt()
            ),
        });
    }
    let first = orbitals.nocc() - targets.no_qp;
    let last = orbitals.nocc() + targets.nv_qp;
    Ok((first..last).map(OrbitalIndex).collect())
}

/// One-shot G0W0 (`evgw_iter = 0`) or evGW starting from the mean-field energies, or from
/// the linearized one-shot energies when configured.
#[instrument(skip_all, name = "gw_workflow")]
pub fn run(
    meanfield: &MeanField,
    config: &GwConfig,
    reporter: &ProgressReporter,
) -> Result<GwResult, GwError> {
    // === Phase 0: Preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let targets = resolve_targets(meanfield.orbitals(), &config.targets)?;
    let engine = SelfEnergyEngine::new(meanfield, config, reporter)?;
    info!(
        targets = targets.len(),
        orbitals = meanfield.orbitals().len(),
        naux = meanfield.ri().naux(),
        evgw_iter = config.evgw.max_iterations,
        "Starting GW workflow."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Starting energies ===
    let start = if !config.is_one_shot() && config.evgw.start == EvgwStart::LinearizedOneShot {
        info!("Starting evGW from the linearized one-shot energies.");
        let (records, _, _) = evaluate(&engine, meanfield, config, &targets, meanfield.orbitals())?;
        let updated: Vec<(OrbitalIndex, f64)> =
            records.iter().map(|r| (r.state, r.e_lin)).collect();
        let energies = apply_scissor(meanfield.orbitals(), &updated);
        meanfield.orbitals().with_energies(energies)?
    } else {
        meanfield.orbitals().clone()
    };

    iterate(&engine, meanfield, config, targets, start, reporter)
}

/// Same as [`run`], with the iteration seeded by explicit orbital energies (Hartree).
#[instrument(skip_all, name = "gw_workflow")]
pub fn run_from(
    meanfield: &MeanField,
    config: &GwConfig,
    start: &[f64],
    reporter: &ProgressReporter,
) -> Result<GwResult, GwError> {
    let norb = meanfield.orbitals().len();
    if start.len() != norb {
        return Err(ModelError::DimensionMismatch {
            what: "starting energies",
            expected: norb,
            found: start.len(),
        }
        .into());
    }
    let targets = resolve_targets(meanfield.orbitals(), &config.targets)?;
    let engine = SelfEnergyEngine::new(meanfield, config, reporter)?;
    let start = meanfield.orbitals().with_energies(start.to_vec())?;
    info!(
        targets = targets.len(),
        evgw_iter = config.evgw.max_iterations,
        "Starting GW workflow from supplied energies."
    );
    iterate(&engine, meanfield, config, targets, start, reporter)
}

fn iterate(
    engine: &SelfEnergyEngine,
    meanfield: &MeanField,
    config: &GwConfig,
    targets: Vec<OrbitalIndex>,
    start: OrbitalSet,
    reporter: &ProgressReporter,
) -> Result<GwResult, GwError> {
    let mut current = start;
    let mut history = Vec::new();

    // === Phase 2: One-shot G0W0 ===
    if config.is_one_shot() {
        reporter.report(Progress::PhaseStart { name: "G0W0" });
        let (records, strategy, memory) = evaluate(engine, meanfield, config, &targets, &current)?;
        let (energies, max_delta) = next_energies(&current, &records);
        reporter.report(Progress::PhaseFinish);

        for r in &records {
            info!(
                state = %r.state,
                e_lin = r.e_lin,
                z = r.z,
                e_qp = r.qp_energy(),
                "Quasiparticle energy."
            );
        }
        history.push(IterationRecord {
            iteration: 1,
            energies: energies.clone(),
            max_delta,
            records: records.clone(),
        });
        return Ok(GwResult {
            targets,
            records,
            history,
            status: ConvergenceStatus::OneShot,
            energies,
            strategy,
            memory,
        });
    }

    // === Phase 2: evGW iterations ===
    let max_iterations = config.evgw.max_iterations;
    let tolerance = config.evgw.tolerance;
    let mut last = None;

    for iteration in 1..=max_iterations {
        reporter.report(Progress::PhaseStart { name: "evGW iteration" });
        let (records, strategy, memory) = evaluate(engine, meanfield, config, &targets, &current)?;
        let (energies, max_delta) = next_energies(&current, &records);
        reporter.report(Progress::PhaseFinish);

        info!(iteration, max_delta, "evGW iteration finished.");
        reporter.report(Progress::IterationFinish {
            iteration,
            max_delta,
        });

        history.push(IterationRecord {
            iteration,
            energies: energies.clone(),
            max_delta,
            records: records.clone(),
        });
        current = current.with_energies(energies)?;
        last = Some((records, strategy, memory));

        if max_delta < tolerance {
            info!(iterations = iteration, "evGW converged.");
            let (records, strategy, memory) = take_last(last)?;
            return Ok(GwResult {
                targets,
                records,
                history,
                status: ConvergenceStatus::Converged {
                    iterations: iteration,
                },
                energies: current.energies().to_vec(),
                strategy,
                memory,
            });
        }
    }

    let max_delta = history.last().map_or(f64::INFINITY, |h| h.max_delta);
    warn!(
        iterations = max_iterations,
        max_delta, tolerance, "evGW did not converge; returning the last iterate."
    );
    let (records, strategy, memory) = take_last(last)?;
    Ok(GwResult {
        targets,
        records,
        history,
        status: ConvergenceStatus::NotConverged {
            iterations: max_iterations,
            max_delta,
        },
        energies: current.energies().to_vec(),
        strategy,
        memory,
    })
}

type Evaluation = (Vec<QuasiparticleRecord>, ContractionStrategy, MemoryEstimate);

fn take_last(last: Option<Evaluation>) -> Result<Evaluation, GwError> {
    last.ok_or_else(|| GwError::Internal("evGW finished without any iteration".to_string()))
}

/// Self-energy around `current` and the quasiparticle solution of every target.
fn evaluate(
    engine: &SelfEnergyEngine,
    meanfield: &MeanField,
    config: &GwConfig,
    targets: &[OrbitalIndex],
    current: &OrbitalSet,
) -> Result<Evaluation, GwError> {
    let table = engine.compute_sigma(targets, &config.sigma_grid, current)?;
    let bare = meanfield.orbitals();
    let records = table
        .iter()
        .map(|series| {
            let state = series.state();
            solver::solve(
                series,
                bare.occupation(state),
                bare.energy(state),
                meanfield.correction(state),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((records, table.strategy(), *table.memory()))
}

/// Energies for the next iterate and the largest change among the targets.
fn next_energies(current: &OrbitalSet, records: &[QuasiparticleRecord]) -> (Vec<f64>, f64) {
    let updated: Vec<(OrbitalIndex, f64)> =
        records.iter().map(|r| (r.state, r.qp_energy())).collect();
    let max_delta = updated
        .iter()
        .map(|&(state, energy)| (energy - current.energy(state)).abs())
        .fold(0.0, f64::max);
    (apply_scissor(current, &updated), max_delta)
}

/// Replaces target energies and shifts the untargeted orbitals rigidly.
///
/// Occupied orbitals below the deepest occupied target move with it; virtual orbitals above
/// the highest virtual target move with it. Orbitals of a kind with no target stay put.
fn apply_scissor(current: &OrbitalSet, updated: &[(OrbitalIndex, f64)]) -> Vec<f64> {
    let old = current.energies();
    let mut energies = old.to_vec();
    for &(state, energy) in updated {
        energies[state.get()] = energy;
    }

    let occupied = updated
        .iter()
        .filter(|(s, _)| current.occupation(*s) == Occupation::Occupied)
        .map(|(s, _)| s.get())
        .min();
    if let Some(deepest) = occupied {
        let shift = energies[deepest] - old[deepest];
        for m in 0..deepest {
            energies[m] = old[m] + shift;
        }
    }

    let virtuals = updated
        .iter()
        .filter(|(s, _)| current.occupation(*s) == Occupation::Virtual)
        .map(|(s, _)| s.get())
        .max();
    if let Some(highest) = virtuals {
        let shift = energies[highest] - old[highest];
        for m in highest + 1..old.len() {
            energies[m] = old[m] + shift;
        }
    }
    energies
}
