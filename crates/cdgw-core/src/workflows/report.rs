//! CSV reports of quasiparticle results, with energies in electronvolts.

use crate::core::models::orbitals::Occupation;
use crate::core::units::hartree_to_ev;
use crate::engine::state::{IterationRecord, QuasiparticleRecord};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to create report file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct QuasiparticleRow {
    state: usize,
    occupation: &'static str,
    e0_ev: f64,
    sigma_x_minus_vxc_ev: f64,
    sigma_c_re_ev: f64,
    sigma_c_im_ev: f64,
    z: f64,
    e_lin_ev: f64,
    e_graph_ev: Option<f64>,
    crossings: usize,
    e_qp_ev: f64,
}

impl From<&QuasiparticleRecord> for QuasiparticleRow {
    fn from(record: &QuasiparticleRecord) -> Self {
        Self {
            state: record.state.get(),
            occupation: match record.occupation {
                Occupation::Occupied => "occupied",
                Occupation::Virtual => "virtual",
            },
            e0_ev: hartree_to_ev(record.e0),
            sigma_x_minus_vxc_ev: hartree_to_ev(record.correction),
            sigma_c_re_ev: hartree_to_ev(record.sigma_c.re),
            sigma_c_im_ev: hartree_to_ev(record.sigma_c.im),
            z: record.z,
            e_lin_ev: hartree_to_ev(record.e_lin),
            e_graph_ev: record.graphical_energy().map(hartree_to_ev),
            crossings: record
                .graphical
                .as_ref()
                .map_or(0, |solution| solution.crossings.len()),
            e_qp_ev: hartree_to_ev(record.qp_energy()),
        }
    }
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    iteration: usize,
    state: usize,
    energy_ev: f64,
    max_delta_ev: f64,
}

pub fn write_quasiparticle_csv<W: Write>(
    writer: W,
    records: &[QuasiparticleRecord],
) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(QuasiparticleRow::from(record))?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// One row per iteration and targeted state.
pub fn write_history_csv<W: Write>(
    writer: W,
    history: &[IterationRecord],
) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for entry in history {
        for record in &entry.records {
            csv.serialize(HistoryRow {
                iteration: entry.iteration,
                state: record.state.get(),
                energy_ev: hartree_to_ev(entry.energies[record.state.get()]),
                max_delta_ev: hartree_to_ev(entry.max_delta),
            })?;
        }
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_quasiparticle_file(
    path: &Path,
    records: &[QuasiparticleRecord],
) -> Result<(), ReportError> {
    write_quasiparticle_csv(create(path)?, records)
}

pub fn write_history_file(path: &Path, history: &[IterationRecord]) -> Result<(), ReportError> {
    write_history_csv(create(path)?, history)
}

fn create(path: &Path) -> Result<std::fs::File, ReportError> {
    std::fs::File::create(path).map_err(|e| ReportError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}
