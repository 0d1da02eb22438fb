use super::ModelError;
use super::ids::OrbitalIndex;
use super::orbitals::OrbitalSet;
use super::ri::RiTensor;
use crate::core::screening::spectral::SpectralScreening;

/// Everything a GW calculation takes from the preceding mean-field run.
///
/// `sigma_x_minus_vxc[p]` is the static correction `<p|Σ_x - V_xc|p>` for orbital `p`, in
/// Hartree. The optional spectral screening is a read-in representation of the screened
/// interaction used instead of the analytic RPA model.
#[derive(Debug, Clone)]
pub struct MeanField {
    orbitals: OrbitalSet,
    ri: RiTensor,
    sigma_x_minus_vxc: Vec<f64>,
    spectral_screening: Option<SpectralScreening>,
}

impl MeanField {
    pub fn new(
        orbitals: OrbitalSet,
        ri: RiTensor,
        sigma_x_minus_vxc: Vec<f64>,
    ) -> Result<Self, ModelError> {
        if ri.nmo() != orbitals.len() {
            return Err(ModelError::DimensionMismatch {
                what: "RI tensor orbital dimension",
                expected: orbitals.len(),
                found: ri.nmo(),
            });
        }
        if sigma_x_minus_vxc.len() != orbitals.len() {
            return Err(ModelError::DimensionMismatch {
                what: "exchange minus exchange-correlation corrections",
                expected: orbitals.len(),
                found: sigma_x_minus_vxc.len(),
            });
        }
        if sigma_x_minus_vxc.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidValue {
                what: "exchange minus exchange-correlation corrections",
                reason: "contains non-finite values".to_string(),
            });
        }
        Ok(Self {
            orbitals,
            ri,
            sigma_x_minus_vxc,
            spectral_screening: None,
        })
    }

    pub fn with_spectral_screening(
        mut self,
        screening: SpectralScreening,
    ) -> Result<Self, ModelError> {
        if screening.naux() != self.ri.naux() {
            return Err(ModelError::DimensionMismatch {
                what: "spectral screening auxiliary dimension",
                expected: self.ri.naux(),
                found: screening.naux(),
            });
        }
        self.spectral_screening = Some(screening);
        Ok(self)
    }

    pub fn orbitals(&self) -> &OrbitalSet {
        &self.orbitals
    }

    pub fn ri(&self) -> &RiTensor {
        &self.ri
    }

    pub fn sigma_x_minus_vxc(&self) -> &[f64] {
        &self.sigma_x_minus_vxc
    }

    #[inline]
    pub fn correction(&self, index: OrbitalIndex) -> f64 {
        self.sigma_x_minus_vxc[index.0]
    }

    pub fn spectral_screening(&self) -> Option<&SpectralScreening> {
        self.spectral_screening.as_ref()
    }
}
