use crate::core::grid::{FrequencyGrid, GridError};
use crate::core::quadrature::{ImaginaryAxisQuadrature, QuadratureError};
use thiserror::Error;

pub const DEFAULT_ETA: f64 = 1e-3;
pub const DEFAULT_QUADRATURE_SCALE: f64 = 0.5;
pub const DEFAULT_MAX_MEMORY_MB: f64 = 8000.0;
pub const DEFAULT_EVGW_TOLERANCE: f64 = 1e-5;
pub const DEFAULT_GRID_FRACTION: f64 = 0.5;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("Invalid frequency grid: {0}")]
    Grid(#[from] GridError),

    #[error("Invalid imaginary-axis quadrature: {0}")]
    Quadrature(#[from] QuadratureError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetConfig {
    /// Occupied states ending at the HOMO.
    pub no_qp: usize,
    /// Virtual states starting at the LUMO.
    pub nv_qp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureConfig {
    pub order: usize,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreeningConfig {
    /// Analytic RPA screening; `false` selects the read-in spectral model.
    pub analytic: bool,
    /// Imaginary broadening added to real frequencies, in Hartree.
    pub eta: f64,
    /// Rebuild W from the current quasiparticle energies in every evGW iteration.
    pub update_with_qp_energies: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryConfig {
    pub max_memory_mb: f64,
    pub force_low_memory: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvgwStart {
    #[default]
    MeanField,
    LinearizedOneShot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvgwConfig {
    /// Zero runs a single one-shot evaluation.
    pub max_iterations: usize,
    pub tolerance: f64,
    pub start: EvgwStart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridResolutionCheck {
    Off,
    Warn { fraction: f64 },
    Fatal { fraction: f64 },
}

impl Default for GridResolutionCheck {
    fn default() -> Self {
        GridResolutionCheck::Warn {
            fraction: DEFAULT_GRID_FRACTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GwConfig {
    pub targets: TargetConfig,
    pub sigma_grid: FrequencyGrid,
    pub quadrature: QuadratureConfig,
    pub screening: ScreeningConfig,
    pub memory: MemoryConfig,
    pub evgw: EvgwConfig,
    pub grid_check: GridResolutionCheck,
}

impl GwConfig {
    pub fn is_one_shot(&self) -> bool {
        self.evgw.max_iterations == 0
    }

    pub fn memory_budget_bytes(&self) -> usize {
        (self.memory.max_memory_mb * 1024.0 * 1024.0) as usize
    }
}

#[derive(Default)]
pub struct GwConfigBuilder {
    no_qp: Option<usize>,
    nv_qp: Option<usize>,
    nomega_sigma: Option<usize>,
    step_sigma: Option<f64>,
    sigma_grid_start: Option<f64>,
    gl_npoint: Option<usize>,
    quadrature_scale: Option<f64>,
    analytic_w: Option<bool>,
    eta: Option<f64>,
    update_screening: Option<bool>,
    low_mem: Option<bool>,
    max_memory_mb: Option<f64>,
    evgw_iter: Option<usize>,
    evgw_tolerance: Option<f64>,
    evgw_start: Option<EvgwStart>,
    grid_check: Option<GridResolutionCheck>,
}

impl GwConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_qp(mut self, n: usize) -> Self {
        self.no_qp = Some(n);
        self
    }
    pub fn nv_qp(mut self, n: usize) -> Self {
        self.nv_qp = Some(n);
        self
    }
    pub fn nomega_sigma(mut self, n: usize) -> Self {
        self.nomega_sigma = Some(n);
        self
    }
    /// Grid spacing in Hartree.
    pub fn step_sigma(mut self, step: f64) -> Self {
        self.step_sigma = Some(step);
        self
    }
    /// Offset of the first grid point from the reference energy; defaults to a centered grid.
    pub fn sigma_grid_start(mut self, start: f64) -> Self {
        self.sigma_grid_start = Some(start);
        self
    }
    pub fn gl_npoint(mut self, n: usize) -> Self {
        self.gl_npoint = Some(n);
        self
    }
    pub fn quadrature_scale(mut self, scale: f64) -> Self {
        self.quadrature_scale = Some(scale);
        self
    }
    pub fn analytic_w(mut self, analytic: bool) -> Self {
        self.analytic_w = Some(analytic);
        self
    }
    pub fn eta(mut self, eta: f64) -> Self {
        self.eta = Some(eta);
        self
    }
    pub fn update_screening(mut self, update: bool) -> Self {
        self.update_screening = Some(update);
        self
    }
    pub fn low_mem(mut self, low_mem: bool) -> Self {
        self.low_mem = Some(low_mem);
        self
    }
    pub fn max_memory_mb(mut self, mb: f64) -> Self {
        self.max_memory_mb = Some(mb);
        self
    }
    pub fn evgw_iter(mut self, iterations: usize) -> Self {
        self.evgw_iter = Some(iterations);
        self
    }
    pub fn evgw_tolerance(mut self, tolerance: f64) -> Self {
        self.evgw_tolerance = Some(tolerance);
        self
    }
    pub fn evgw_start(mut self, start: EvgwStart) -> Self {
        self.evgw_start = Some(start);
        self
    }
    pub fn grid_check(mut self, check: GridResolutionCheck) -> Self {
        self.grid_check = Some(check);
        self
    }

    pub fn build(self) -> Result<GwConfig, ConfigError> {
        let targets = TargetConfig {
            no_qp: self.no_qp.ok_or(ConfigError::MissingParameter("no_qp"))?,
            nv_qp: self.nv_qp.ok_or(ConfigError::MissingParameter("nv_qp"))?,
        };
        if targets.no_qp + targets.nv_qp == 0 {
            return Err(invalid("no_qp", "at least one quasiparticle state is required"));
        }

        let nomega = self
            .nomega_sigma
            .ok_or(ConfigError::MissingParameter("nomega_sigma"))?;
        let step = self
            .step_sigma
            .ok_or(ConfigError::MissingParameter("step_sigma"))?;
        if nomega < 3 {
            return Err(invalid(
                "nomega_sigma",
                "at least three points are needed for the centered derivative",
            ));
        }
        let sigma_grid = match self.sigma_grid_start {
            Some(start) => FrequencyGrid::new(start, step, nomega)?,
            None => FrequencyGrid::centered(nomega, step)?,
        };
        match sigma_grid.reference_index() {
            Some(index) if index > 0 && index + 1 < nomega => {}
            _ => {
                return Err(invalid(
                    "nomega_sigma",
                    "the reference energy must be an interior grid point (use an odd count for a centered grid)",
                ));
            }
        }

        let quadrature = QuadratureConfig {
            order: self
                .gl_npoint
                .ok_or(ConfigError::MissingParameter("gl_npoint"))?,
            scale: self.quadrature_scale.unwrap_or(DEFAULT_QUADRATURE_SCALE),
        };
        ImaginaryAxisQuadrature::new(quadrature.order, quadrature.scale)?;

        let screening = ScreeningConfig {
            analytic: self.analytic_w.unwrap_or(true),
            eta: self.eta.unwrap_or(DEFAULT_ETA),
            update_with_qp_energies: self.update_screening.unwrap_or(true),
        };
        if !screening.eta.is_finite() || screening.eta <= 0.0 {
            return Err(invalid("eta", "broadening must be finite and positive"));
        }

        let memory = MemoryConfig {
            max_memory_mb: self.max_memory_mb.unwrap_or(DEFAULT_MAX_MEMORY_MB),
            force_low_memory: self.low_mem.unwrap_or(false),
        };
        if !memory.max_memory_mb.is_finite() || memory.max_memory_mb <= 0.0 {
            return Err(invalid("max_memory_mb", "memory ceiling must be positive"));
        }

        let evgw = EvgwConfig {
            max_iterations: self.evgw_iter.unwrap_or(0),
            tolerance: self.evgw_tolerance.unwrap_or(DEFAULT_EVGW_TOLERANCE),
            start: self.evgw_start.unwrap_or_default(),
        };
        if !evgw.tolerance.is_finite() || evgw.tolerance <= 0.0 {
            return Err(invalid("evgw_tolerance", "tolerance must be positive"));
        }

        let grid_check = self.grid_check.unwrap_or_default();
        if let GridResolutionCheck::Warn { fraction } | GridResolutionCheck::Fatal { fraction } =
            grid_check
        {
            if !fraction.is_finite() || fraction <= 0.0 {
                return Err(invalid("grid_check", "fraction must be positive"));
            }
        }

        Ok(GwConfig {
            targets,
            sigma_grid,
            quadrature,
            screening,
            memory,
            evgw,
            grid_check,
        })
    }
}

fn invalid(parameter: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        parameter,
        reason: reason.to_string(),
    }
}
