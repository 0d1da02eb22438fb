use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Frequency grid must contain at least one point")]
    Empty,
    #[error("Invalid frequency grid step: {0} (must be finite and positive)")]
    InvalidStep(f64),
    #[error("Invalid frequency grid start offset: {0}")]
    InvalidStart(f64),
}

/// Real-frequency offsets `start + j * step`, `j = 0..count`, applied around a reference
/// energy for each quasiparticle state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyGrid {
    start: f64,
    step: f64,
    count: usize,
}

impl FrequencyGrid {
    pub fn new(start: f64, step: f64, count: usize) -> Result<Self, GridError> {
        if count == 0 {
            return Err(GridError::Empty);
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(GridError::InvalidStep(step));
        }
        if !start.is_finite() {
            return Err(GridError::InvalidStart(start));
        }
        Ok(Self { start, step, count })
    }

    /// Grid whose middle point is the reference energy itself.
    ///
    /// An even `count` has no middle point; callers that need the reference on the grid
    /// must use an odd count.
    pub fn centered(count: usize, step: f64) -> Result<Self, GridError> {
        let start = -(count.saturating_sub(1) as f64) * 0.5 * step;
        Self::new(start, step, count)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn offset(&self, index: usize) -> f64 {
        self.start + index as f64 * self.step
    }

    pub fn offsets(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(|j| self.offset(j))
    }

    pub fn points_around(&self, center: f64) -> Vec<f64> {
        self.offsets().map(|o| center + o).collect()
    }

    /// Index of the grid point with zero offset, if the reference energy lies on the grid.
    pub fn reference_index(&self) -> Option<usize> {
        let position = -self.start / self.step;
        let nearest = position.round();
        if nearest < 0.0 || nearest >= self.count as f64 {
            return None;
        }
        if (position - nearest).abs() > 1e-9 {
            return None;
        }
        Some(nearest as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_grid_is_symmetric_around_zero() {
        let grid = FrequencyGrid::centered(5, 0.1).unwrap();
        let offsets: Vec<f64> = grid.offsets().collect();
        assert_eq!(offsets.len(), 5);
        assert!((offsets[0] + 0.2).abs() < 1e-15);
        assert!(offsets[2].abs() < 1e-15);
        assert!((offsets[4] - 0.2).abs() < 1e-15);
        assert_eq!(grid.reference_index(), Some(2));
    }

    #[test]
    fn even_centered_grid_has_no_reference_point() {
        let grid = FrequencyGrid::centered(4, 0.1).unwrap();
        assert_eq!(grid.reference_index(), None);
    }

    #[test]
    fn reference_outside_grid_is_not_found() {
        let grid = FrequencyGrid::new(0.5, 0.1, 3).unwrap();
        assert_eq!(grid.reference_index(), None);
        let grid = FrequencyGrid::new(-0.5, 0.1, 3).unwrap();
        assert_eq!(grid.reference_index(), None);
    }

    #[test]
    fn points_are_shifted_by_the_center() {
        let grid = FrequencyGrid::new(-0.1, 0.05, 3).unwrap();
        let points = grid.points_around(1.0);
        assert!((points[0] - 0.9).abs() < 1e-15);
        assert!((points[1] - 0.95).abs() < 1e-15);
        assert!((points[2] - 1.0).abs() < 1e-15);
        assert_eq!(grid.reference_index(), Some(2));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert_eq!(FrequencyGrid::new(0.0, 0.1, 0), Err(GridError::Empty));
        assert_eq!(
            FrequencyGrid::new(0.0, -0.1, 3),
            Err(GridError::InvalidStep(-0.1))
        );
        assert!(matches!(
            FrequencyGrid::new(f64::INFINITY, 0.1, 3),
            Err(GridError::InvalidStart(_))
        ));
    }
}
