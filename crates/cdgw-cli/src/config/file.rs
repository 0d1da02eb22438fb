use crate::error::{CliError, Result};
use cdgw::engine::config::EvgwStart;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StartPolicy {
    MeanField,
    LinearizedOneShot,
}

impl From<StartPolicy> for EvgwStart {
    fn from(p: StartPolicy) -> Self {
        match p {
            StartPolicy::MeanField => EvgwStart::MeanField,
            StartPolicy::LinearizedOneShot => EvgwStart::LinearizedOneShot,
        }
    }
}

impl FromStr for StartPolicy {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean-field" => Ok(StartPolicy::MeanField),
            "linearized-one-shot" => Ok(StartPolicy::LinearizedOneShot),
            other => Err(CliError::Config(format!(
                "Unknown evGW start '{}'. Expected 'mean-field' or 'linearized-one-shot'.",
                other
            ))),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GridPolicy {
    Off,
    Warn,
    Fatal,
}

impl FromStr for GridPolicy {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "off" => Ok(GridPolicy::Off),
            "warn" => Ok(GridPolicy::Warn),
            "fatal" => Ok(GridPolicy::Fatal),
            other => Err(CliError::Config(format!(
                "Unknown grid-check policy '{}'. Expected 'off', 'warn' or 'fatal'.",
                other
            ))),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileTargetsConfig {
    pub no_qp: Option<usize>,
    pub nv_qp: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSigmaGridConfig {
    pub nomega: Option<usize>,
    pub step: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileQuadratureConfig {
    pub gl_npoint: Option<usize>,
    pub scale: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileScreeningConfig {
    pub analytic_w: Option<bool>,
    pub eta: Option<f64>,
    pub update_screening: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileMemoryConfig {
    pub max_memory_mb: Option<f64>,
    pub low_mem: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileEvgwConfig {
    pub iterations: Option<usize>,
    pub tolerance: Option<f64>,
    pub start: Option<StartPolicy>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileGridCheckConfig {
    pub policy: Option<GridPolicy>,
    pub fraction: Option<f64>,
}

/// Partial configuration as read from a TOML file; every key is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub energy_unit: Option<String>,
    pub targets: Option<FileTargetsConfig>,
    pub sigma_grid: Option<FileSigmaGridConfig>,
    pub quadrature: Option<FileQuadratureConfig>,
    pub screening: Option<FileScreeningConfig>,
    pub memory: Option<FileMemoryConfig>,
    pub evgw: Option<FileEvgwConfig>,
    pub grid_check: Option<FileGridCheckConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
