use cdgw::core::models::orbitals::Occupation;
use cdgw::core::units::hartree_to_ev;
use cdgw::engine::state::{ConvergenceStatus, QuasiparticleRecord};
use cdgw::workflows::evgw::GwResult;
use std::fmt::Write;

/// Label relative to the frontier orbitals: `HOMO`, `HOMO-1`, `LUMO`, `LUMO+2`, ...
pub fn frontier_label(state: usize, nocc: usize) -> String {
    if state < nocc {
        match nocc - 1 - state {
            0 => "HOMO".to_string(),
            k => format!("HOMO-{}", k),
        }
    } else {
        match state - nocc {
            0 => "LUMO".to_string(),
            k => format!("LUMO+{}", k),
        }
    }
}

fn format_row(out: &mut String, record: &QuasiparticleRecord, nocc: usize) {
    let graphical = match record.graphical_energy() {
        Some(e) => format!("{:>12.5}", hartree_to_ev(e)),
        None => format!("{:>12}", "n/a"),
    };
    let occupation = match record.occupation {
        Occupation::Occupied => "occ",
        Occupation::Virtual => "virt",
    };
    let _ = writeln!(
        out,
        "{:>5} {:<8} {:<4} {:>12.5} {:>12.5} {:>12.5} {:>8.5} {:>12.5} {}",
        record.state.get(),
        frontier_label(record.state.get(), nocc),
        occupation,
        hartree_to_ev(record.e0),
        hartree_to_ev(record.correction),
        hartree_to_ev(record.sigma_c.re),
        record.z,
        hartree_to_ev(record.e_lin),
        graphical,
    );
}

pub fn status_line(status: &ConvergenceStatus) -> String {
    match status {
        ConvergenceStatus::OneShot => "One-shot G0W0 evaluation.".to_string(),
        ConvergenceStatus::Converged { iterations } => {
            format!("evGW converged after {} iteration(s).", iterations)
        }
        ConvergenceStatus::NotConverged {
            iterations,
            max_delta,
        } => format!(
            "evGW NOT converged after {} iteration(s); last max |ΔE| = {:.6} eV.",
            iterations,
            hartree_to_ev(*max_delta)
        ),
    }
}

/// Human-readable summary of a GW run, energies in eV.
pub fn format_summary(result: &GwResult, nocc: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5} {:<8} {:<4} {:>12} {:>12} {:>12} {:>8} {:>12} {:>12}",
        "state", "label", "occ", "E0 (eV)", "Sx-Vxc (eV)", "ReSc (eV)", "Z", "E_lin (eV)", "E_graph (eV)"
    );
    let _ = writeln!(out, "{}", "-".repeat(103));
    for record in &result.records {
        format_row(&mut out, record, nocc);
    }
    let _ = writeln!(out, "{}", "-".repeat(103));
    let _ = writeln!(out, "{}", status_line(&result.status));
    let _ = writeln!(
        out,
        "Contraction strategy: {} ({:.1} MB estimated).",
        result.strategy,
        result.memory.bytes_for(result.strategy) as f64 / (1024.0 * 1024.0)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdgw::core::models::ids::OrbitalIndex;
    use cdgw::engine::memory::{ContractionStrategy, MemoryEstimate};
    use cdgw::engine::solver::{GraphicalSolution, SolverError};
    use num_complex::Complex64;

    fn record(state: usize, occupation: Occupation, graphical: Option<f64>) -> QuasiparticleRecord {
        QuasiparticleRecord {
            state: OrbitalIndex(state),
            occupation,
            e0: -0.5,
            reference: -0.5,
            correction: -0.1,
            sigma_c: Complex64::new(0.02, -1e-4),
            z: 0.91,
            e_lin: -0.57,
            graphical: match graphical {
                Some(energy) => Ok(GraphicalSolution {
                    energy,
                    crossings: vec![energy],
                }),
                None => Err(SolverError::NoCrossingFound {
                    state: OrbitalIndex(state),
                }),
            },
        }
    }

    #[test]
    fn frontier_labels_count_away_from_the_gap() {
        assert_eq!(frontier_label(4, 5), "HOMO");
        assert_eq!(frontier_label(2, 5), "HOMO-2");
        assert_eq!(frontier_label(5, 5), "LUMO");
        assert_eq!(frontier_label(7, 5), "LUMO+2");
    }

    #[test]
    fn summary_lists_every_record_and_the_status() {
        let result = GwResult {
            targets: vec![OrbitalIndex(0), OrbitalIndex(1)],
            records: vec![
                record(0, Occupation::Occupied, Some(-0.56)),
                record(1, Occupation::Virtual, None),
            ],
            history: Vec::new(),
            status: ConvergenceStatus::OneShot,
            energies: vec![-0.56, 0.4],
            strategy: ContractionStrategy::HighMemory,
            memory: MemoryEstimate {
                high_memory_bytes: 2 * 1024 * 1024,
                low_memory_bytes: 1024 * 1024,
            },
        };

        let summary = format_summary(&result, 1);
        assert!(summary.contains("HOMO"));
        assert!(summary.contains("LUMO"));
        assert!(summary.contains("n/a"));
        assert!(summary.contains(&format!("{:.5}", hartree_to_ev(-0.56))));
        assert!(summary.contains("One-shot G0W0"));
        assert!(summary.contains("high-memory (2.0 MB"));
    }

    #[test]
    fn status_line_reports_non_convergence_in_ev() {
        let line = status_line(&ConvergenceStatus::NotConverged {
            iterations: 4,
            max_delta: 1.0 / 27.211386245988,
        });
        assert!(line.contains("NOT converged after 4"));
        assert!(line.contains("1.000000 eV"));
    }
}
