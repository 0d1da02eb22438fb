use crate::core::models::ModelError;
use crate::core::models::meanfield::MeanField;
use crate::core::models::orbitals::OrbitalSet;
use crate::core::models::ri::RiTensor;
use crate::core::screening::ScreeningError;
use crate::core::screening::spectral::SpectralScreening;
use crate::core::units::{EnergyUnit, UnknownUnitError};
use nalgebra::DMatrix;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeanFieldLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Unit(#[from] UnknownUnitError),
    #[error("Invalid mean-field data: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid spectral screening data: {0}")]
    Screening(#[from] ScreeningError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct MeanFieldDocument {
    #[serde(default = "default_unit")]
    energy_unit: String,
    nocc: usize,
    orbital_energies: Vec<f64>,
    sigma_x_minus_vxc: Vec<f64>,
    ri: RiSection,
    screening: Option<ScreeningSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RiSection {
    naux: usize,
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ScreeningSection {
    excitation_energies: Vec<f64>,
    amplitudes: Vec<f64>,
}

fn default_unit() -> String {
    "hartree".to_string()
}

/// Reads a mean-field TOML document from disk.
pub fn load(path: &Path) -> Result<MeanField, MeanFieldLoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| MeanFieldLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let document: MeanFieldDocument =
        toml::from_str(&content).map_err(|e| MeanFieldLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
    build(document)
}

/// Parses a mean-field TOML document held in memory.
pub fn from_toml_str(content: &str) -> Result<MeanField, MeanFieldLoadError> {
    let document: MeanFieldDocument =
        toml::from_str(content).map_err(|e| MeanFieldLoadError::Toml {
            path: "<memory>".to_string(),
            source: e,
        })?;
    build(document)
}

fn build(document: MeanFieldDocument) -> Result<MeanField, MeanFieldLoadError> {
    let unit: EnergyUnit = document.energy_unit.parse()?;
    let to_hartree = |values: Vec<f64>| -> Vec<f64> {
        values.into_iter().map(|v| unit.to_hartree(v)).collect()
    };

    let nmo = document.orbital_energies.len();
    let orbitals = OrbitalSet::new(to_hartree(document.orbital_energies), document.nocc)?;
    let ri = RiTensor::new(document.ri.naux, nmo, document.ri.values)?;
    let meanfield = MeanField::new(orbitals, ri, to_hartree(document.sigma_x_minus_vxc))?;

    match document.screening {
        Some(section) => {
            let naux = document.ri.naux;
            let nexc = section.excitation_energies.len();
            if section.amplitudes.len() != nexc * naux {
                return Err(ModelError::DimensionMismatch {
                    what: "spectral screening amplitudes",
                    expected: nexc * naux,
                    found: section.amplitudes.len(),
                }
                .into());
            }
            let amplitudes = DMatrix::from_row_slice(nexc, naux, &section.amplitudes);
            let screening =
                SpectralScreening::new(to_hartree(section.excitation_energies), amplitudes)?;
            Ok(meanfield.with_spectral_screening(screening)?)
        }
        None => Ok(meanfield),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::OrbitalIndex;
    use crate::core::units::HARTREE_TO_EV;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    const TWO_ORBITAL_DOCUMENT: &str = r#"
        nocc = 1
        orbital-energies = [-0.5, 0.25]
        sigma-x-minus-vxc = [-0.2, 0.1]

        [ri]
        naux = 1
        values = [0.1, 0.4, 0.4, 0.2]
    "#;

    #[test]
    fn load_succeeds_with_valid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("meanfield.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{}", TWO_ORBITAL_DOCUMENT).unwrap();

        let mf = load(&file_path).unwrap();
        assert_eq!(mf.orbitals().nocc(), 1);
        assert_eq!(mf.orbitals().energies(), &[-0.5, 0.25]);
        assert_eq!(mf.ri().get(0, 0, 1), 0.4);
        assert_eq!(mf.correction(OrbitalIndex(1)), 0.1);
        assert!(mf.spectral_screening().is_none());
    }

    #[test]
    fn energies_in_electronvolts_are_converted() {
        let content = r#"
            energy-unit = "eV"
            nocc = 1
            orbital-energies = [-27.211386245988, 13.605693122994]
            sigma-x-minus-vxc = [0.0, 0.0]
            [ri]
            naux = 1
            values = [0.0, 0.1, 0.1, 0.0]
        "#;
        let mf = from_toml_str(content).unwrap();
        assert!((mf.orbitals().energies()[0] + 1.0).abs() < 1e-12);
        assert!((mf.orbitals().energies()[1] - 0.5).abs() < 1e-12);
        assert!((HARTREE_TO_EV * mf.orbitals().energies()[1] - 13.605693122994).abs() < 1e-9);
    }

    #[test]
    fn optional_screening_section_is_attached() {
        let content = format!(
            "{}\n[screening]\nexcitation-energies = [0.9]\namplitudes = [0.3]\n",
            TWO_ORBITAL_DOCUMENT
        );
        let mf = from_toml_str(&content).unwrap();
        let screening = mf.spectral_screening().unwrap();
        assert_eq!(screening.excitation_count(), 1);
        assert_eq!(screening.amplitudes()[(0, 0)], 0.3);
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(MeanFieldLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("malformed.toml");
        fs::write(&file_path, "this is not toml").unwrap();
        assert!(matches!(
            load(&file_path),
            Err(MeanFieldLoadError::Toml { .. })
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let content = format!("extra-key = 1\n{}", TWO_ORBITAL_DOCUMENT);
        assert!(matches!(
            from_toml_str(&content),
            Err(MeanFieldLoadError::Toml { .. })
        ));
    }

    #[test]
    fn unknown_unit_is_reported() {
        let content = format!("energy-unit = \"furlong\"\n{}", TWO_ORBITAL_DOCUMENT);
        assert!(matches!(
            from_toml_str(&content),
            Err(MeanFieldLoadError::Unit(_))
        ));
    }

    #[test]
    fn inconsistent_ri_size_is_a_model_error() {
        let content =
            TWO_ORBITAL_DOCUMENT.replace("values = [0.1, 0.4, 0.4, 0.2]", "values = [0.1]");
        assert!(matches!(
            from_toml_str(&content),
            Err(MeanFieldLoadError::Model(ModelError::DimensionMismatch { .. }))
        ));
    }
}
