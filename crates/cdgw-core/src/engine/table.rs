use super::memory::{ContractionStrategy, MemoryEstimate};
use crate::core::grid::FrequencyGrid;
use crate::core::models::ids::OrbitalIndex;
use num_complex::Complex64;

/// Correlation self-energy of one state on its real-frequency grid.
///
/// Frequencies are the grid values around the reference energy; the reference point itself
/// coincides with a pole of G and holds the limit of `Σ_c` there.
#[derive(Debug, Clone, PartialEq)]
pub struct SigmaSeries {
    state: OrbitalIndex,
    reference: f64,
    reference_index: Option<usize>,
    frequencies: Vec<f64>,
    residue: Vec<Complex64>,
    imaginary_axis: Vec<f64>,
    sigma: Vec<Complex64>,
}

impl SigmaSeries {
    /// Series from a total self-energy, with no residue/integral split recorded.
    ///
    /// Both [`residue_part`](Self::residue_part) and
    /// [`imaginary_axis_part`](Self::imaginary_axis_part) read as zero.
    pub fn new(
        state: OrbitalIndex,
        reference: f64,
        grid: &FrequencyGrid,
        sigma: Vec<Complex64>,
    ) -> Self {
        Self {
            state,
            reference,
            reference_index: grid.reference_index(),
            frequencies: grid.points_around(reference),
            residue: vec![Complex64::new(0.0, 0.0); sigma.len()],
            imaginary_axis: vec![0.0; sigma.len()],
            sigma,
        }
    }

    pub(crate) fn from_parts(
        state: OrbitalIndex,
        reference: f64,
        grid: &FrequencyGrid,
        residue: Vec<Complex64>,
        imaginary_axis: Vec<f64>,
    ) -> Self {
        let sigma = residue
            .iter()
            .zip(&imaginary_axis)
            .map(|(&r, &i)| r - i)
            .collect();
        Self {
            state,
            reference,
            reference_index: grid.reference_index(),
            frequencies: grid.points_around(reference),
            residue,
            imaginary_axis,
            sigma,
        }
    }

    pub fn state(&self) -> OrbitalIndex {
        self.state
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    pub fn reference_index(&self) -> Option<usize> {
        self.reference_index
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn values(&self) -> &[Complex64] {
        &self.sigma
    }

    pub fn residue_part(&self) -> &[Complex64] {
        &self.residue
    }

    pub fn imaginary_axis_part(&self) -> &[f64] {
        &self.imaginary_axis
    }

    pub fn value_at_reference(&self) -> Option<Complex64> {
        self.reference_index.map(|j| self.sigma[j])
    }
}

/// Self-energies for every requested state from one evaluation pass.
#[derive(Debug, Clone)]
pub struct SelfEnergyTable {
    series: Vec<SigmaSeries>,
    strategy: ContractionStrategy,
    memory: MemoryEstimate,
}

impl SelfEnergyTable {
    pub(crate) fn new(
        series: Vec<SigmaSeries>,
        strategy: ContractionStrategy,
        memory: MemoryEstimate,
    ) -> Self {
        Self {
            series,
            strategy,
            memory,
        }
    }

    pub fn get(&self, state: OrbitalIndex) -> Option<&SigmaSeries> {
        self.series.iter().find(|s| s.state == state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SigmaSeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn strategy(&self) -> ContractionStrategy {
        self.strategy
    }

    pub fn memory(&self) -> &MemoryEstimate {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_residue_minus_imaginary_axis_term() {
        let grid = FrequencyGrid::centered(3, 0.1).unwrap();
        let series = SigmaSeries::from_parts(
            OrbitalIndex(2),
            -0.5,
            &grid,
            vec![
                Complex64::new(0.0, 0.0),
                Complex64::new(0.3, -0.01),
                Complex64::new(0.0, 0.0),
            ],
            vec![0.1, 0.2, 0.3],
        );
        assert_eq!(series.len(), 3);
        assert_eq!(series.values()[0], Complex64::new(-0.1, 0.0));
        assert!((series.values()[1] - Complex64::new(0.1, -0.01)).norm() < 1e-15);
        assert_eq!(series.value_at_reference(), Some(series.values()[1]));
        assert!((series.frequencies()[0] + 0.6).abs() < 1e-15);
    }

    #[test]
    fn series_from_a_total_records_no_split() {
        let grid = FrequencyGrid::centered(3, 0.1).unwrap();
        let total = vec![
            Complex64::new(0.2, -0.01),
            Complex64::new(0.1, 0.0),
            Complex64::new(-0.3, 0.02),
        ];
        let series = SigmaSeries::new(OrbitalIndex(0), 0.0, &grid, total.clone());
        assert_eq!(series.values(), total.as_slice());
        assert!(series.residue_part().iter().all(|r| r.norm() == 0.0));
        assert!(series.imaginary_axis_part().iter().all(|&i| i == 0.0));
    }

    #[test]
    fn table_looks_up_series_by_state() {
        let grid = FrequencyGrid::centered(3, 0.1).unwrap();
        let make = |p| SigmaSeries::new(OrbitalIndex(p), 0.0, &grid, vec![Complex64::new(0.0, 0.0); 3]);
        let table = SelfEnergyTable::new(
            vec![make(0), make(3)],
            ContractionStrategy::LowMemory,
            MemoryEstimate {
                high_memory_bytes: 2,
                low_memory_bytes: 1,
            },
        );
        assert_eq!(table.len(), 2);
        assert!(table.get(OrbitalIndex(3)).is_some());
        assert!(table.get(OrbitalIndex(1)).is_none());
        assert_eq!(table.strategy(), ContractionStrategy::LowMemory);
    }
}
