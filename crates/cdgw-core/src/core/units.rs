use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// CODATA 2018 Hartree energy in electronvolts.
pub const HARTREE_TO_EV: f64 = 27.211386245988;

static UNIT_ALIASES: Map<&'static str, EnergyUnit> = phf_map! {
    "ha" => EnergyUnit::Hartree, "hartree" => EnergyUnit::Hartree, "au" => EnergyUnit::Hartree,
    "a.u." => EnergyUnit::Hartree, "eh" => EnergyUnit::Hartree,
    "ev" => EnergyUnit::ElectronVolt, "electronvolt" => EnergyUnit::ElectronVolt,
    "ry" => EnergyUnit::Rydberg, "rydberg" => EnergyUnit::Rydberg,
    "mev" => EnergyUnit::MilliElectronVolt,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown energy unit: '{0}'")]
pub struct UnknownUnitError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnergyUnit {
    #[default]
    Hartree,
    ElectronVolt,
    MilliElectronVolt,
    Rydberg,
}

impl EnergyUnit {
    pub fn hartree_per_unit(self) -> f64 {
        match self {
            EnergyUnit::Hartree => 1.0,
            EnergyUnit::ElectronVolt => 1.0 / HARTREE_TO_EV,
            EnergyUnit::MilliElectronVolt => 1.0e-3 / HARTREE_TO_EV,
            EnergyUnit::Rydberg => 0.5,
        }
    }

    #[inline]
    pub fn to_hartree(self, value: f64) -> f64 {
        value * self.hartree_per_unit()
    }

    #[inline]
    pub fn from_hartree(self, value: f64) -> f64 {
        value / self.hartree_per_unit()
    }
}

impl FromStr for EnergyUnit {
    type Err = UnknownUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UNIT_ALIASES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| UnknownUnitError(s.to_string()))
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnergyUnit::Hartree => "Ha",
            EnergyUnit::ElectronVolt => "eV",
            EnergyUnit::MilliElectronVolt => "meV",
            EnergyUnit::Rydberg => "Ry",
        };
        write!(f, "{}", s)
    }
}

#[inline]
pub fn hartree_to_ev(value: f64) -> f64 {
    value * HARTREE_TO_EV
}

#[inline]
pub fn ev_to_hartree(value: f64) -> f64 {
    value / HARTREE_TO_EV
}
