use super::ModelError;
use super::ids::OrbitalIndex;
use super::orbitals::OrbitalSet;
use nalgebra::DMatrix;

/// Three-index resolution-of-identity factor `B^P_pq` in an orthonormalized auxiliary basis,
/// so that `(pq|rs) ≈ Σ_P B^P_pq B^P_rs`.
///
/// Stored densely with the auxiliary index slowest: `data[(P * nmo + p) * nmo + q]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RiTensor {
    naux: usize,
    nmo: usize,
    data: Vec<f64>,
}

impl RiTensor {
    pub fn new(naux: usize, nmo: usize, data: Vec<f64>) -> Result<Self, ModelError> {
        if naux == 0 {
            return Err(ModelError::InvalidValue {
                what: "RI tensor",
                reason: "auxiliary dimension must be positive".to_string(),
            });
        }
        let expected = naux * nmo * nmo;
        if data.len() != expected {
            return Err(ModelError::DimensionMismatch {
                what: "RI tensor values",
                expected,
                found: data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidValue {
                what: "RI tensor",
                reason: "contains non-finite values".to_string(),
            });
        }
        Ok(Self { naux, nmo, data })
    }

    pub fn from_fn<F>(naux: usize, nmo: usize, mut f: F) -> Result<Self, ModelError>
    where
        F: FnMut(usize, usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(naux * nmo * nmo);
        for aux in 0..naux {
            for p in 0..nmo {
                for q in 0..nmo {
                    data.push(f(aux, p, q));
                }
            }
        }
        Self::new(naux, nmo, data)
    }

    pub fn naux(&self) -> usize {
        self.naux
    }

    pub fn nmo(&self) -> usize {
        self.nmo
    }

    pub fn size_in_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f64>()
    }

    #[inline]
    pub fn get(&self, aux: usize, p: usize, q: usize) -> f64 {
        self.data[(aux * self.nmo + p) * self.nmo + q]
    }

    /// Pair vectors `b_pm = B^·_pm` for one state `p` and every orbital `m`, as an
    /// `naux × nmo` matrix whose column `m` is `b_pm`.
    pub fn state_block(&self, state: OrbitalIndex) -> DMatrix<f64> {
        DMatrix::from_fn(self.naux, self.nmo, |aux, m| self.get(aux, state.0, m))
    }

    /// Occupied-to-virtual pair vectors, one row per transition in
    /// [`OrbitalSet::transitions`] order (`ntrans × naux`).
    pub fn transition_block(&self, orbitals: &OrbitalSet) -> DMatrix<f64> {
        let transitions: Vec<_> = orbitals.transitions().collect();
        DMatrix::from_fn(transitions.len(), self.naux, |t, aux| {
            let tr = transitions[t];
            self.get(aux, tr.occupied.0, tr.virtual_.0)
        })
    }
}
