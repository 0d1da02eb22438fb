use super::ModelError;
use super::ids::OrbitalIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupation {
    Occupied,
    Virtual,
}

/// An occupied-to-virtual excitation `i -> a` with energy `ε_a - ε_i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub occupied: OrbitalIndex,
    pub virtual_: OrbitalIndex,
    pub energy: f64,
}

/// Orbital energies in Hartree, occupied levels first, with the number of occupied
/// (doubly occupied, closed-shell) orbitals.
///
/// Every occupied energy lies strictly below every virtual energy. The set is never
/// mutated; updated energies produce a new set through [`OrbitalSet::with_energies`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalSet {
    energies: Vec<f64>,
    nocc: usize,
}

impl OrbitalSet {
    pub fn new(energies: Vec<f64>, nocc: usize) -> Result<Self, ModelError> {
        let norb = energies.len();
        if nocc == 0 || nocc >= norb {
            return Err(ModelError::InvalidOccupation { nocc, norb });
        }
        if let Some((index, &value)) = energies.iter().enumerate().find(|(_, e)| !e.is_finite()) {
            return Err(ModelError::NonFiniteEnergy { index, value });
        }

        let homo = energies[..nocc]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let lumo = energies[nocc..]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        if homo >= lumo {
            return Err(ModelError::FermiOrdering { homo, lumo });
        }

        Ok(Self { energies, nocc })
    }

    pub fn with_energies(&self, energies: Vec<f64>) -> Result<Self, ModelError> {
        if energies.len() != self.energies.len() {
            return Err(ModelError::DimensionMismatch {
                what: "orbital energies",
                expected: self.energies.len(),
                found: energies.len(),
            });
        }
        Self::new(energies, self.nocc)
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    pub fn nocc(&self) -> usize {
        self.nocc
    }

    pub fn nvirt(&self) -> usize {
        self.energies.len() - self.nocc
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    #[inline]
    pub fn energy(&self, index: OrbitalIndex) -> f64 {
        self.energies[index.0]
    }

    pub fn contains(&self, index: OrbitalIndex) -> bool {
        index.0 < self.energies.len()
    }

    pub fn occupation(&self, index: OrbitalIndex) -> Occupation {
        if index.0 < self.nocc {
            Occupation::Occupied
        } else {
            Occupation::Virtual
        }
    }

    pub fn homo(&self) -> OrbitalIndex {
        OrbitalIndex(self.nocc - 1)
    }

    pub fn lumo(&self) -> OrbitalIndex {
        OrbitalIndex(self.nocc)
    }

    /// Chemical potential placed halfway between the highest occupied and the lowest
    /// virtual energy.
    pub fn fermi_level(&self) -> f64 {
        let homo = self.energies[..self.nocc]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let lumo = self.energies[self.nocc..]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        0.5 * (homo + lumo)
    }

    pub fn indices(&self) -> impl Iterator<Item = OrbitalIndex> {
        (0..self.energies.len()).map(OrbitalIndex)
    }

    pub fn occupied(&self) -> impl Iterator<Item = OrbitalIndex> {
        (0..self.nocc).map(OrbitalIndex)
    }

    pub fn virtuals(&self) -> impl Iterator<Item = OrbitalIndex> {
        (self.nocc..self.energies.len()).map(OrbitalIndex)
    }

    /// All occupied-to-virtual transitions, occupied index slowest.
    pub fn transitions(&self) -> impl Iterator<Item = Transition> + '_ {
        self.occupied().flat_map(move |i| {
            self.virtuals().map(move |a| Transition {
                occupied: i,
                virtual_: a,
                energy: self.energy(a) - self.energy(i),
            })
        })
    }

    pub fn transition_count(&self) -> usize {
        self.nocc * self.nvirt()
    }

    pub fn min_transition_energy(&self) -> f64 {
        self.transitions()
            .map(|t| t.energy)
            .fold(f64::INFINITY, f64::min)
    }
}
