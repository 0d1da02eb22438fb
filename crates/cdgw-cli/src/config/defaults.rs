use cdgw::core::units::EnergyUnit;
use cdgw::engine::config::{
    DEFAULT_ETA, DEFAULT_EVGW_TOLERANCE, DEFAULT_GRID_FRACTION, DEFAULT_MAX_MEMORY_MB,
    DEFAULT_QUADRATURE_SCALE,
};

use super::file::{GridPolicy, StartPolicy};

/// Values used when neither the command line, `--set` nor the config file gives one.
/// Energies are in Hartree.
pub struct DefaultsConfig {
    pub energy_unit: EnergyUnit,
    pub no_qp: usize,
    pub nv_qp: usize,
    pub nomega_sigma: usize,
    pub step_sigma: f64,
    pub gl_npoint: usize,
    pub quadrature_scale: f64,
    pub analytic_w: bool,
    pub eta: f64,
    pub update_screening: bool,
    pub low_mem: bool,
    pub max_memory_mb: f64,
    pub evgw_iter: usize,
    pub evgw_tolerance: f64,
    pub evgw_start: StartPolicy,
    pub grid_policy: GridPolicy,
    pub grid_fraction: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            energy_unit: EnergyUnit::Hartree,
            no_qp: 1,
            nv_qp: 1,
            nomega_sigma: 81,
            step_sigma: 0.01,
            gl_npoint: 100,
            quadrature_scale: DEFAULT_QUADRATURE_SCALE,
            analytic_w: true,
            eta: DEFAULT_ETA,
            update_screening: true,
            low_mem: false,
            max_memory_mb: DEFAULT_MAX_MEMORY_MB,
            evgw_iter: 0,
            evgw_tolerance: DEFAULT_EVGW_TOLERANCE,
            evgw_start: StartPolicy::MeanField,
            grid_policy: GridPolicy::Warn,
            grid_fraction: DEFAULT_GRID_FRACTION,
        }
    }
}
