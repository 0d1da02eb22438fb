use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an orbital in its `OrbitalSet`, counting from the deepest occupied level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrbitalIndex(pub usize);

impl OrbitalIndex {
    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for OrbitalIndex {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl fmt::Display for OrbitalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
